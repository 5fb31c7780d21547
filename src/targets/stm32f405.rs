//! STM32F405: 1 MB of single-bank flash with non-uniform sectors (4 x 16 KB,
//! 1 x 64 KB, 7 x 128 KB) behind the F4 flash interface. Sectors are erased
//! by index through the `SNB` field; programming is word-wide with the
//! `PSIZE` selector, falling back to a halfword for a trailing partial word.

use crate::algorithm::{self, Error, FlashAlgorithm, Function};
use crate::controller::{
    FmcDriver, Numbering, ProgramUnit, RegisterMap, SectorSelect, WidthSelect,
};
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
        /// Write protection error.
        const WRPERR = 1 << 4;
        /// Programming alignment error.
        const PGAERR = 1 << 5;
        /// Programming parallelism error.
        const PGPERR = 1 << 6;
        /// Programming sequence error.
        const PGSERR = 1 << 7;
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
        /// Sector erase enable.
        const SER = 1 << 1;
        /// Mass erase enable.
        const MER = 1 << 2;
        /// Start strobe.
        const STRT = 1 << 16;
        /// Controller lock.
        const LOCK = 1 << 31;
    }
}

const SECTORS: [SectorRange; 3] = [
    SectorRange {
        size: 0x4000,
        address: 0x0800_0000,
    },
    SectorRange {
        size: 0x1_0000,
        address: 0x0801_0000,
    },
    SectorRange {
        size: 0x2_0000,
        address: 0x0802_0000,
    },
];

/// Flash geometry and timing of the STM32F405.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "STM32F405 1024 KB Flash",
    class: MemoryClass::Onchip,
    base_address: 0x0800_0000,
    total_size: 0x0010_0000,
    page_size: 512,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 10000,
    sectors: &SECTORS,
};

/// Host-readable image of [`DESCRIPTOR`].
pub static DEVICE_TABLE: DeviceTable<4> = DeviceTable::from_descriptor(&DESCRIPTOR);

/// Register-and-bitfield map of the F4 flash interface.
pub static REGISTERS: RegisterMap = RegisterMap {
    key_register: KEYR,
    status_register: SR,
    control_register: CR,
    unlock_keys: [KEY1, KEY2],
    busy: Sr::BSY.bits(),
    sticky_flags: Sr::EOP
        .union(Sr::OPERR)
        .union(Sr::WRPERR)
        .union(Sr::PGAERR)
        .union(Sr::PGPERR)
        .union(Sr::PGSERR)
        .bits(),
    error_flags: Sr::OPERR
        .union(Sr::WRPERR)
        .union(Sr::PGAERR)
        .union(Sr::PGPERR)
        .union(Sr::PGSERR)
        .bits(),
    lock: Cr::LOCK.bits(),
    start: Cr::STRT.bits(),
    program: Cr::PG.bits(),
    sector_erase: Cr::SER.bits(),
    mass_erase: Cr::MER.bits(),
    sector_select: SectorSelect::Index {
        shift: 3,
        mask: 0x78,
        numbering: Numbering::Table,
        bank: None,
    },
    unit: ProgramUnit::Word,
    width: Some(WidthSelect {
        mask: 0x300,
        halfword: 0x100,
        word: 0x200,
    }),
};

/// Flash algorithm for the STM32F405 family.
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
        // No special init necessary beyond discarding stale faults.
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
