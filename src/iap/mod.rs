//! # IAP programming strategy
//!
//! Some parts keep their flash controller out of reach and instead expose a
//! manufacturer-programmed routine in ROM, "in-application programming",
//! at a factory-fixed entry point. The caller fills in a fixed-format
//! [`CommandBlock`] (command code, up to four parameter words), jumps into
//! the ROM, and reads a status word plus up to four result words back out of
//! the same block.
//!
//! Each logical flash operation maps to a short sequence of ROM calls
//! sharing one block: erasing needs a prepare call before the erase proper,
//! programming needs prepare, copy-RAM-to-flash and compare. Every call is
//! checked independently; the first non-zero status short-circuits the whole
//! operation. A status of zero is the sole success signal; every other
//! value is reported verbatim and never decoded.
//!
//! The ROM also wants to know the current core clock (it times its own flash
//! pulses) and only copies in fixed block sizes; both are configuration
//! carried by [`IapConfig`].

pub mod error;


pub use error::Error;

use crate::device::Descriptor;

/// ROM command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Command {
    /// Prepare a sector range for erase or write.
    PrepareSectors = 50,
    /// Copy a RAM buffer into prepared flash.
    CopyRamToFlash = 51,
    /// Erase a prepared sector range.
    EraseSectors = 52,
    /// Compare flash contents against a RAM buffer.
    Compare = 56,
}

/// Fixed-format request/response block passed by reference to the ROM.
///
/// Layout is part of the ROM's ABI and must not change: the command word is
/// followed directly by the parameters, the status word directly by the
/// results.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct CommandBlock {
    /// Command code (see [`Command`]).
    pub command: u32,
    /// Command parameters; unused slots stay zero.
    pub params: [u32; 4],
    /// Status word written by the ROM; `0` means success.
    pub status: u32,
    /// Result words written by the ROM.
    pub results: [u32; 4],
}

impl CommandBlock {
    /// A zeroed block, ready for the first call of an operation.
    pub const fn new() -> Self {
        Self {
            command: 0,
            params: [0; 4],
            status: 0,
            results: [0; 4],
        }
    }
}

impl Default for CommandBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Call seam to the ROM routine.
///
/// Production code binds this to the device's fixed entry point
/// ([`RomEntry`]); tests bind it to a mock that scripts status words and
/// records the call sequence.
pub trait RomGateway {
    /// Execute one ROM call against the block.
    fn invoke(&mut self, block: &mut CommandBlock);
}

impl<G: RomGateway + ?Sized> RomGateway for &mut G {
    fn invoke(&mut self, block: &mut CommandBlock) {
        (**self).invoke(block)
    }
}

/// Production gateway: jumps to the factory-fixed ROM entry point.
#[derive(Debug, Clone, Copy)]
pub struct RomEntry {
    entry: u32,
}

impl RomEntry {
    /// Bind to the ROM entry point at `entry`.
    ///
    /// # Safety
    ///
    /// `entry` must be the IAP entry address documented for the running
    /// device; calling through anything else is undefined behavior.
    pub const unsafe fn new(entry: u32) -> Self {
        Self { entry }
    }
}

impl RomGateway for RomEntry {
    fn invoke(&mut self, block: &mut CommandBlock) {
        type Entry = unsafe extern "C" fn(*mut u32, *mut u32);
        // SAFETY: `entry` was asserted to be the device's IAP address at
        // construction, and `CommandBlock` is `repr(C)` so the command and
        // status words lead their halves of the block.
        unsafe {
            let rom: Entry = core::mem::transmute(self.entry as usize);
            rom(&mut block.command as *mut u32, &mut block.status as *mut u32);
        }
    }
}

/// Static configuration for one IAP device.
#[derive(Debug, Clone, Copy)]
pub struct IapConfig {
    /// log2 of the uniform sector size; the sector index is the address
    /// offset shifted right by this.
    pub sector_shift: u32,
    /// Index of the last sector.
    pub last_sector: u32,
    /// Fixed copy granularity of the ROM (256, 512, 1024 or 4096 bytes).
    /// Byte counts are rounded **down** to a multiple of this.
    pub block_size: u32,
    /// Core clock in kHz, passed to the ROM for its internal timing.
    pub cclk_khz: u32,
}

/// Driver that renders the flash operations as ROM call sequences.
#[derive(Debug)]
pub struct IapDriver<G: RomGateway> {
    gateway: G,
    config: &'static IapConfig,
    descriptor: &'static Descriptor,
}

impl<G: RomGateway> IapDriver<G> {
    /// Create a driver for one IAP device.
    pub fn new(gateway: G, config: &'static IapConfig, descriptor: &'static Descriptor) -> Self {
        Self {
            gateway,
            config,
            descriptor,
        }
    }

    /// The device this driver programs.
    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    /// Shared access to the underlying gateway.
    pub fn gateway_ref(&self) -> &G {
        &self.gateway
    }

    /// Exclusive access to the underlying gateway.
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Erase every sector on the device.
    pub fn erase_all(&mut self) -> Result<(), Error> {
        self.erase_sectors(0, self.config.last_sector)
    }

    /// Erase the sector containing `address`.
    pub fn erase_sector(&mut self, address: u32) -> Result<(), Error> {
        let sector = self.sector_of(address)?;
        self.erase_sectors(sector, sector)
    }

    /// Program `data` at `address`: prepare, copy RAM to flash, compare.
    ///
    /// The byte count handed to the ROM is `data.len()` rounded down to the
    /// configured block size, exactly as the ROM requires.
    pub fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        let sector = self.sector_of(address)?;
        let source = data.as_ptr() as usize as u32;
        let count = (data.len() as u32 / self.config.block_size) * self.config.block_size;
        let cclk = self.config.cclk_khz;

        let mut block = CommandBlock::new();
        self.issue(&mut block, Command::PrepareSectors, [sector, sector, 0, 0])?;
        self.issue(
            &mut block,
            Command::CopyRamToFlash,
            [address, source, count, cclk],
        )?;
        self.issue(&mut block, Command::Compare, [address, source, count, cclk])
    }

    /// Compare flash contents at `address` against `data` via the ROM's
    /// compare call. Read-only; no prepare is needed.
    ///
    /// The compared byte count is rounded down to the block size like every
    /// other count handed to the ROM.
    pub fn compare(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        self.sector_of(address)?;
        let source = data.as_ptr() as usize as u32;
        let count = (data.len() as u32 / self.config.block_size) * self.config.block_size;

        let mut block = CommandBlock::new();
        self.issue(
            &mut block,
            Command::Compare,
            [address, source, count, self.config.cclk_khz],
        )
    }

    fn erase_sectors(&mut self, start: u32, end: u32) -> Result<(), Error> {
        let mut block = CommandBlock::new();
        self.issue(&mut block, Command::PrepareSectors, [start, end, 0, 0])?;
        self.issue(
            &mut block,
            Command::EraseSectors,
            [start, end, self.config.cclk_khz, 0],
        )
    }

    fn sector_of(&self, address: u32) -> Result<u32, Error> {
        if !self.descriptor.contains(address) {
            return Err(Error::OutOfRange);
        }
        Ok((address - self.descriptor.base_address) >> self.config.sector_shift)
    }

    /// One ROM call; a non-zero status fails the whole operation.
    fn issue(
        &mut self,
        block: &mut CommandBlock,
        command: Command,
        params: [u32; 4],
    ) -> Result<(), Error> {
        block.command = command as u32;
        block.params = params;
        block.status = 0;
        self.gateway.invoke(block);
        match block.status {
            0 => Ok(()),
            code => Err(Error::Status(code)),
        }
    }
}
