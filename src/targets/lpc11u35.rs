//! LPC11U35: 64 KB of uniform 4 KB sectors programmed through the on-chip
//! IAP ROM. There is no host-visible flash controller; `init` instead
//! selects the internal RC oscillator as the main clock (the rate the ROM
//! is told about) and maps user flash in at address zero before any command
//! is issued.

use crate::algorithm::{Error, FlashAlgorithm, Function};
use crate::device::table::DeviceTable;
use crate::device::{Descriptor, MemoryClass, SectorRange};
use crate::iap::{IapConfig, IapDriver, RomEntry, RomGateway};
use crate::mmio::MemoryBus;

/// Factory-fixed IAP entry point.
pub const IAP_ENTRY: u32 = 0x1FFF_1FF1;

/// Memory mapping control register (byte-wide).
pub const MEMMAP: u32 = 0x4004_8000;
/// Main clock source select register.
pub const MAINCLKSEL: u32 = 0x4004_8070;
/// Main clock source update enable register.
pub const MAINCLKUEN: u32 = 0x4004_8074;
/// Main clock divider register.
pub const MAINCLKDIV: u32 = 0x4004_8078;

/// `MEMMAP` value mapping user flash at address zero.
pub const MEMMAP_USER_FLASH: u8 = 0x02;

/// Internal RC oscillator rate in kHz, as reported to the ROM.
pub const CCLK_KHZ: u32 = 12_000;

const SECTORS: [SectorRange; 1] = [SectorRange {
    size: 0x1000,
    address: 0x0000_0000,
}];

/// Flash geometry and timing of the LPC11U35.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "LPC11U35 64 KB Flash",
    class: MemoryClass::Onchip,
    base_address: 0x0000_0000,
    total_size: 0x0001_0000,
    page_size: 1024,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 3000,
    sectors: &SECTORS,
};

/// Host-readable image of [`DESCRIPTOR`].
pub static DEVICE_TABLE: DeviceTable<2> = DeviceTable::from_descriptor(&DESCRIPTOR);

/// IAP configuration: 4 KB sectors, 256-byte copy granularity, IRC clock.
pub static CONFIG: IapConfig = IapConfig {
    sector_shift: 12,
    last_sector: 15,
    block_size: 256,
    cclk_khz: CCLK_KHZ,
};

/// The device's real ROM gateway.
///
/// The entry constant is the documented IAP address for this family; the
/// result is only meaningful on the running part, like
/// [`Direct`](crate::mmio::Direct) itself.
pub const fn rom() -> RomEntry {
    // SAFETY: `IAP_ENTRY` is the factory-fixed entry point of this family.
    unsafe { RomEntry::new(IAP_ENTRY) }
}

/// Flash algorithm for the LPC11U35 family.
///
/// Carries both seams: the ROM gateway for the flash operations and a
/// memory bus for the clock and memory-map setup done in `init`.
#[derive(Debug)]
pub struct Algorithm<B: MemoryBus, G: RomGateway> {
    bus: B,
    driver: IapDriver<G>,
}

impl<B: MemoryBus, G: RomGateway> Algorithm<B, G> {
    /// Create the algorithm over a memory bus and a ROM gateway.
    pub fn new(bus: B, gateway: G) -> Self {
        Self {
            bus,
            driver: IapDriver::new(gateway, &CONFIG, &DESCRIPTOR),
        }
    }
}

impl<B: MemoryBus, G: RomGateway> FlashAlgorithm for Algorithm<B, G> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    fn init(&mut self, _address: u32, _clock_hz: u32, _function: Function) -> Result<(), Error> {
        // Run from the internal RC oscillator so CCLK matches what the ROM
        // is told. The update register latches on a 0 -> 1 edge.
        self.bus.write_u32(MAINCLKSEL, 0);
        self.bus.write_u32(MAINCLKUEN, 1);
        self.bus.write_u32(MAINCLKUEN, 0);
        self.bus.write_u32(MAINCLKUEN, 1);
        self.bus.write_u32(MAINCLKDIV, 1);

        // Fetch from user flash, not the boot ROM.
        self.bus.write_u8(MEMMAP, MEMMAP_USER_FLASH);
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
        self.driver.compare(address, data).map_err(Error::from)
    }
}
