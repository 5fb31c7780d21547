//! STM32F071: 128 KB of uniform 2 KB pages behind the F0 flash interface,
//! the same address-register erase shape as the GD32VF103, with halfword
//! programming.

use crate::algorithm::{self, Error, FlashAlgorithm, Function};
use crate::controller::{FmcDriver, ProgramUnit, RegisterMap, SectorSelect};
use crate::device::table::DeviceTable;
use crate::device::{Descriptor, MemoryClass, SectorRange};
use crate::mmio::MemoryBus;

/// Flash key register.
pub const KEYR: u32 = 0x4002_2004;
/// Flash status register.
pub const SR: u32 = 0x4002_200C;
/// Flash control register.
pub const CR: u32 = 0x4002_2010;
/// Flash erase address register.
pub const AR: u32 = 0x4002_2014;

/// First unlock key.
pub const KEY1: u32 = 0x4567_0123;
/// Second unlock key.
pub const KEY2: u32 = 0xCDEF_89AB;

bitflags::bitflags! {
    /// Status register (`FLASH_SR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        /// Operation in progress.
        const BSY = 1 << 0;
        /// Programming error.
        const PGERR = 1 << 2;
        /// Write protection error.
        const WRPRTERR = 1 << 4;
        /// End of operation.
        const EOP = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Control register (`FLASH_CR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr: u32 {
        /// Program enable.
        const PG = 1 << 0;
        /// Page erase enable.
        const PER = 1 << 1;
        /// Mass erase enable.
        const MER = 1 << 2;
        /// Start strobe.
        const STRT = 1 << 6;
        /// Controller lock.
        const LOCK = 1 << 7;
    }
}

const SECTORS: [SectorRange; 1] = [SectorRange {
    size: 0x800,
    address: 0x0800_0000,
}];

/// Flash geometry and timing of the STM32F071.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "STM32F071 128 KB Flash",
    class: MemoryClass::Onchip,
    base_address: 0x0800_0000,
    total_size: 0x0002_0000,
    page_size: 2048,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 10000,
    sectors: &SECTORS,
};

/// Host-readable image of [`DESCRIPTOR`].
pub static DEVICE_TABLE: DeviceTable<2> = DeviceTable::from_descriptor(&DESCRIPTOR);

/// Register-and-bitfield map of the F0 flash interface.
pub static REGISTERS: RegisterMap = RegisterMap {
    key_register: KEYR,
    status_register: SR,
    control_register: CR,
    unlock_keys: [KEY1, KEY2],
    busy: Sr::BSY.bits(),
    sticky_flags: Sr::PGERR.union(Sr::WRPRTERR).union(Sr::EOP).bits(),
    error_flags: Sr::PGERR.union(Sr::WRPRTERR).bits(),
    lock: Cr::LOCK.bits(),
    start: Cr::STRT.bits(),
    program: Cr::PG.bits(),
    sector_erase: Cr::PER.bits(),
    mass_erase: Cr::MER.bits(),
    sector_select: SectorSelect::AddressRegister { register: AR },
    unit: ProgramUnit::Halfword,
    width: None,
};

/// Flash algorithm for the STM32F071 family.
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
