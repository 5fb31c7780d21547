//! GD32VF103: 128 KB of uniform 1 KB pages behind the FMC. Page erase takes
//! the page address through a dedicated `FMC_ADDR` register instead of an
//! index field; programming is halfword-wide. The family's RISC-V debug
//! tooling additionally expects results in `a0` followed by an `ebreak`,
//! which `EbreakProbe` provides when built for the target.

use crate::algorithm::{self, Error, FlashAlgorithm, Function};
use crate::controller::{FmcDriver, ProgramUnit, RegisterMap, SectorSelect};
use crate::device::table::DeviceTable;
use crate::device::{Descriptor, MemoryClass, SectorRange};
use crate::mmio::MemoryBus;

/// FMC key register.
pub const KEY: u32 = 0x4002_2004;
/// FMC status register.
pub const STAT: u32 = 0x4002_200C;
/// FMC control register.
pub const CTL: u32 = 0x4002_2010;
/// FMC erase address register.
pub const ADDR: u32 = 0x4002_2014;

/// First unlock key.
pub const KEY1: u32 = 0x4567_0123;
/// Second unlock key.
pub const KEY2: u32 = 0xCDEF_89AB;

bitflags::bitflags! {
    /// Status register (`FMC_STAT`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Stat: u32 {
        /// Operation in progress.
        const BUSY = 1 << 0;
        /// Programming error.
        const PGERR = 1 << 2;
        /// Write protection error.
        const WPERR = 1 << 4;
        /// End of operation.
        const ENDF = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Control register (`FMC_CTL`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctl: u32 {
        /// Program enable.
        const PG = 1 << 0;
        /// Page erase enable.
        const PER = 1 << 1;
        /// Mass erase enable.
        const MER = 1 << 2;
        /// Start strobe.
        const START = 1 << 6;
        /// Controller lock.
        const LOCK = 1 << 7;
    }
}

const SECTORS: [SectorRange; 1] = [SectorRange {
    size: 0x400,
    address: 0x0800_0000,
}];

/// Flash geometry and timing of the GD32VF103.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "GD32VF103 128 KB Flash",
    class: MemoryClass::Onchip,
    base_address: 0x0800_0000,
    total_size: 0x0002_0000,
    page_size: 1024,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 3000,
    sectors: &SECTORS,
};

/// Host-readable image of [`DESCRIPTOR`].
pub static DEVICE_TABLE: DeviceTable<2> = DeviceTable::from_descriptor(&DESCRIPTOR);

/// Register-and-bitfield map of the FMC.
pub static REGISTERS: RegisterMap = RegisterMap {
    key_register: KEY,
    status_register: STAT,
    control_register: CTL,
    unlock_keys: [KEY1, KEY2],
    busy: Stat::BUSY.bits(),
    sticky_flags: Stat::PGERR.union(Stat::WPERR).union(Stat::ENDF).bits(),
    error_flags: Stat::PGERR.union(Stat::WPERR).bits(),
    lock: Ctl::LOCK.bits(),
    start: Ctl::START.bits(),
    program: Ctl::PG.bits(),
    sector_erase: Ctl::PER.bits(),
    mass_erase: Ctl::MER.bits(),
    sector_select: SectorSelect::AddressRegister { register: ADDR },
    unit: ProgramUnit::Halfword,
    width: None,
};

/// Flash algorithm for the GD32VF103 family.
#[derive(Debug)]
pub struct Algorithm<B: MemoryBus> {
    driver: FmcDriver<B>,
}

impl<B: MemoryBus> Algorithm<B> {
    /// Create the algorithm over a memory bus.
    pub fn new(bus: B) -> Self {
        Self {
            driver: FmcDriver::new(bus, &REGISTERS, &DESCRIPTOR),
        }
    }
}

impl<B: MemoryBus> FlashAlgorithm for Algorithm<B> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    fn init(&mut self, _address: u32, _clock_hz: u32, _function: Function) -> Result<(), Error> {
        // Discard stale faults; interrupts stay disabled in the loaded image.
        self.driver.clear_errors();
        Ok(())
    }

    fn uninit(&mut self, _function: Function) -> Result<(), Error> {
        Ok(())
    }

    fn erase_all(&mut self) -> Result<(), Error> {
        self.driver.erase_all().map_err(Error::from)
    }

    fn erase_sector(&mut self, address: u32) -> Result<(), Error> {
        self.driver.erase_sector(address).map_err(Error::from)
    }

    fn program_page(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        self.driver.program(address, data).map_err(Error::from)
    }

    fn verify(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        algorithm::verify_readback(self.driver.bus_mut(), &DESCRIPTOR, address, data)
    }
}

/// Debugger notification the way this family's tooling expects it: the
/// return code goes into `a0` and an `ebreak` hands control to the probe.
///
/// Only compiled for RISC-V targets; hosts use
/// [`SilentProbe`](crate::algorithm::SilentProbe) and read the return value.
#[cfg(target_arch = "riscv32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EbreakProbe;

#[cfg(target_arch = "riscv32")]
impl crate::algorithm::DebugNotifier for EbreakProbe {
    fn notify(&mut self, code: u32) {
        // SAFETY: traps into the attached debugger, which resumes execution.
        unsafe { core::arch::asm!("ebreak", in("a0") code) };
    }
}
