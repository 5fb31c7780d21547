//! STM32L486: 1 MB of flash in two 512 KB banks of uniform 2 KB pages.
//! Page numbering is a flat shift of the address; pages past the first bank
//! flip the bank-select bit and renumber from zero. Programming is by
//! 64-bit double-word, issued as two word writes; a partial trailing
//! double-word is completed with erased-value padding.

use crate::algorithm::{self, Error, FlashAlgorithm, Function};
use crate::controller::{Bank, FmcDriver, Numbering, ProgramUnit, RegisterMap, SectorSelect};
use crate::device::table::DeviceTable;
use crate::device::{Descriptor, MemoryClass, SectorRange};
use crate::mmio::MemoryBus;

/// Flash key register.
pub const KEYR: u32 = 0x4002_3C04;
/// Flash status register.
pub const SR: u32 = 0x4002_3C0C;
/// Flash control register.
pub const CR: u32 = 0x4002_3C10;

/// First unlock key.
pub const KEY1: u32 = 0x4567_0123;
/// Second unlock key.
pub const KEY2: u32 = 0xCDEF_89AB;

bitflags::bitflags! {
    /// Status register (`FLASH_SR`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        /// End of operation.
        const EOP = 1 << 0;
        /// Operation error.
        const OPERR = 1 << 1;
        /// Programming error.
        const PROGERR = 1 << 3;
        /// Write protection error.
        const WRPERR = 1 << 4;
        /// Programming alignment error.
        const PGAERR = 1 << 5;
        /// Size error.
        const SIZERR = 1 << 6;
        /// Programming sequence error.
        const PGSERR = 1 << 7;
        /// Fast-programming miss error.
        const MISERR = 1 << 8;
        /// Fast-programming error.
        const FASTERR = 1 << 9;
        /// Read protection error.
        const RDERR = 1 << 14;
        /// Option validity error.
        const OPTVERR = 1 << 15;
        /// Operation in progress.
        const BSY = 1 << 16;
    }
}

bitflags::bitflags! {
    /// Control register (`FLASH_CR`) bits outside the multi-bit fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr: u32 {
        /// Program enable.
        const PG = 1 << 0;
        /// Page erase enable.
        const PER = 1 << 1;
        /// Bank 1 mass erase enable.
        const MER1 = 1 << 2;
        /// Bank selector for page erase.
        const BKER = 1 << 11;
        /// Bank 2 mass erase enable.
        const MER2 = 1 << 15;
        /// Start strobe.
        const STRT = 1 << 16;
        /// Controller lock.
        const LOCK = 1 << 31;
    }
}

const SECTORS: [SectorRange; 1] = [SectorRange {
    size: 0x800,
    address: 0x0800_0000,
}];

/// Flash geometry and timing of the STM32L486.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "STM32L486 1024 KB Flash",
    class: MemoryClass::Onchip,
    base_address: 0x0800_0000,
    total_size: 0x0010_0000,
    page_size: 1024,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 10000,
    sectors: &SECTORS,
};

/// Host-readable image of [`DESCRIPTOR`].
pub static DEVICE_TABLE: DeviceTable<2> = DeviceTable::from_descriptor(&DESCRIPTOR);

/// Register-and-bitfield map of the L4 flash interface.
///
/// A chip erase must erase both banks, so the mass-erase mask folds `MER1`
/// and `MER2` together.
pub static REGISTERS: RegisterMap = RegisterMap {
    key_register: KEYR,
    status_register: SR,
    control_register: CR,
    unlock_keys: [KEY1, KEY2],
    busy: Sr::BSY.bits(),
    sticky_flags: Sr::EOP
        .union(Sr::OPERR)
        .union(Sr::PROGERR)
        .union(Sr::WRPERR)
        .union(Sr::PGAERR)
        .union(Sr::SIZERR)
        .union(Sr::PGSERR)
        .union(Sr::MISERR)
        .union(Sr::FASTERR)
        .union(Sr::RDERR)
        .union(Sr::OPTVERR)
        .bits(),
    error_flags: Sr::OPERR
        .union(Sr::PROGERR)
        .union(Sr::WRPERR)
        .union(Sr::PGAERR)
        .union(Sr::SIZERR)
        .union(Sr::PGSERR)
        .union(Sr::MISERR)
        .union(Sr::FASTERR)
        .union(Sr::RDERR)
        .bits(),
    lock: Cr::LOCK.bits(),
    start: Cr::STRT.bits(),
    program: Cr::PG.bits(),
    sector_erase: Cr::PER.bits(),
    mass_erase: Cr::MER1.union(Cr::MER2).bits(),
    sector_select: SectorSelect::Index {
        shift: 3,
        mask: 0x7F8,
        numbering: Numbering::Shift(11),
        bank: Some(Bank {
            select: Cr::BKER.bits(),
            capacity: 256,
        }),
    },
    unit: ProgramUnit::DoubleWord,
    width: None,
};

/// Flash algorithm for the STM32L486 family.
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
