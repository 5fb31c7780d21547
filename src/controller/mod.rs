//! # Register-based programming strategy
//!
//! Flash controllers of the kind this module drives all share one protocol
//! shape, whatever their bit layouts look like:
//!
//! ```text
//! unlock ──▶ await idle ──▶ clear stale ──▶ arm operation ──▶ start
//!  (keys)    (busy poll)     error flags     (enable bits,     (strobe)
//!                                            sector/width)        │
//!                                                                 ▼
//!            check ◀── disarm ◀────────── await idle ◀────────────┘
//!          (errors,    (enable
//!           verify)     bits)
//! ```
//!
//! The differences between parts (one or two mass-erase bits, a
//! sector-number bit-field versus a dedicated erase-address register, bank
//! selection, program width selection) are pure data, captured in a
//! [`RegisterMap`]. One engine, [`FmcDriver`], executes the protocol against
//! any map; nothing about the sequence is ever duplicated per device.
//!
//! # Hardware Contract
//!
//! - The unlock key sequence is written blind: the hardware either accepts
//!   it or stays locked, observable only on the next command
//! - Busy polls have **no timeout**. A controller that never clears its busy
//!   flag hangs the call; the external host recovers by resetting the target
//! - Error flags are write-one-to-clear and are cleared before every
//!   command so new faults are unambiguous
//! - Enable bits are cleared on every exit path, success or failure, so the
//!   controller is left idle regardless of outcome
//! - Programmed units are read back immediately; the first mismatch aborts
//!   the operation without touching the remaining units

pub mod error;


pub use error::Error;

use crate::device::Descriptor;
use crate::mmio::MemoryBus;

/// How a sector index is derived from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// Walk the descriptor's sector table (non-uniform geometries).
    Table,
    /// Shift the offset from the flash base (uniform geometries).
    Shift(u32),
}

/// Bank selection for dual-bank controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bank {
    /// Control-register bit that selects the second bank.
    pub select: u32,
    /// Number of sectors in the first bank.
    pub capacity: u32,
}

/// How a controller is told which sector to erase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorSelect {
    /// Encode the sector index into a control-register bit-field.
    Index {
        /// Bit position of the sector-number field.
        shift: u32,
        /// Mask of the sector-number field, already in place.
        mask: u32,
        /// Index derivation.
        numbering: Numbering,
        /// Present on dual-bank parts.
        bank: Option<Bank>,
    },
    /// Write the sector base address to a dedicated erase-address register.
    AddressRegister {
        /// Absolute address of the erase-address register.
        register: u32,
    },
}

/// Smallest unit a program operation writes to the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramUnit {
    /// 16-bit halfword writes.
    Halfword,
    /// 32-bit word writes, with a trailing halfword permitted.
    Word,
    /// 64-bit double-word instructions, issued as two word writes.
    DoubleWord,
}

/// Program-width selector field, on controllers that expose one.
///
/// The matching width must be selected before the first data write of an
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthSelect {
    /// Mask of the whole width field.
    pub mask: u32,
    /// Field value selecting 16-bit programming.
    pub halfword: u32,
    /// Field value selecting 32-bit programming.
    pub word: u32,
}

/// Register-and-bitfield map for one controller variant.
///
/// All register addresses are absolute; all masks are in-place within their
/// register. The map is configuration data, created in `const` context next
/// to the device's [`Descriptor`].
#[derive(Debug, Clone, Copy)]
pub struct RegisterMap {
    /// Key register the unlock sequence is written to.
    pub key_register: u32,
    /// Status register holding the busy and error flags.
    pub status_register: u32,
    /// Control register holding lock, enable, start and field bits.
    pub control_register: u32,
    /// The two unlock key constants, written in order.
    pub unlock_keys: [u32; 2],
    /// Busy flag in the status register.
    pub busy: u32,
    /// Every write-one-to-clear status bit reset before a command,
    /// including end-of-operation style flags.
    pub sticky_flags: u32,
    /// The subset of status bits that mean a command failed.
    pub error_flags: u32,
    /// Lock bit in the control register.
    pub lock: u32,
    /// Start/strobe bit in the control register.
    pub start: u32,
    /// Program-enable bit in the control register.
    pub program: u32,
    /// Sector-erase-enable bit in the control register.
    pub sector_erase: u32,
    /// Mass-erase-enable bit or bits (dual-bank parts fold both into one
    /// mask) in the control register.
    pub mass_erase: u32,
    /// Sector selection scheme.
    pub sector_select: SectorSelect,
    /// Programming unit of the array.
    pub unit: ProgramUnit,
    /// Width selector field, where the controller has one.
    pub width: Option<WidthSelect>,
}

impl RegisterMap {
    const fn width_mask(&self) -> u32 {
        match self.width {
            Some(w) => w.mask,
            None => 0,
        }
    }
}

/// Sector selection resolved for one erase command.
enum Selection {
    /// Bits to fold into the control register alongside the erase enable.
    Field { set: u32, clear: u32 },
    /// Value for the dedicated erase-address register.
    Address { register: u32, value: u32 },
}

/// The protocol engine for register-based flash controllers.
///
/// Owns its [`MemoryBus`] and executes the unlock → idle → clear → arm →
/// start → idle → disarm → check sequence for the three hardware
/// operations. Registers are never shadowed; every read goes back to the
/// bus.
#[derive(Debug)]
pub struct FmcDriver<B: MemoryBus> {
    bus: B,
    map: &'static RegisterMap,
    descriptor: &'static Descriptor,
}

impl<B: MemoryBus> FmcDriver<B> {
    /// Create a driver for one controller variant.
    pub fn new(bus: B, map: &'static RegisterMap, descriptor: &'static Descriptor) -> Self {
        Self {
            bus,
            map,
            descriptor,
        }
    }

    /// The device this driver programs.
    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    /// Direct access to the underlying bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Clear stale error flags (write-one-to-clear).
    ///
    /// Also part of one-time initialization, so faults from a previous
    /// session never masquerade as results of the next command.
    pub fn clear_errors(&mut self) {
        self.bus
            .write_u32(self.map.status_register, self.map.sticky_flags);
    }

    /// Erase the whole array with one mass-erase command.
    pub fn erase_all(&mut self) -> Result<(), Error> {
        self.begin();
        self.modify_control(self.map.mass_erase, self.map.width_mask());
        self.strobe();
        self.wait_idle();
        self.modify_control(0, self.map.mass_erase);
        self.check_faults()
    }

    /// Erase the sector containing `address`.
    pub fn erase_sector(&mut self, address: u32) -> Result<(), Error> {
        let selection = self.select_sector(address)?;
        self.begin();
        match selection {
            Selection::Field { set, clear } => {
                self.modify_control(self.map.sector_erase | set, clear);
            }
            Selection::Address { register, value } => {
                self.modify_control(self.map.sector_erase, 0);
                self.bus.write_u32(register, value);
            }
        }
        self.strobe();
        self.wait_idle();
        self.modify_control(0, self.map.sector_erase);
        self.check_faults()
    }

    /// Program `data` at `address`, verifying every unit by read-back.
    ///
    /// `address` must be aligned to the descriptor's page size; `data` is
    /// written in the controller's program unit, with the documented
    /// trailing-unit handling (a final halfword at 16-bit width on
    /// word-programming parts, an erased-value-padded full double-word on
    /// double-word parts).
    pub fn program(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }
        // Padding of a trailing partial unit still lands in flash, so bound
        // the write at the padded length.
        let granularity: u32 = match self.map.unit {
            ProgramUnit::Halfword | ProgramUnit::Word => 2,
            ProgramUnit::DoubleWord => 8,
        };
        let written = (data.len() as u32)
            .checked_next_multiple_of(granularity)
            .ok_or(Error::OutOfRange)?;
        let end = address.checked_add(written).ok_or(Error::OutOfRange)?;
        if !self.descriptor.contains(address) || end > self.descriptor.end_address() {
            return Err(Error::OutOfRange);
        }

        self.begin();
        let outcome = match self.map.unit {
            ProgramUnit::Halfword => self.program_halfwords(address, data),
            ProgramUnit::Word => self.program_words(address, data),
            ProgramUnit::DoubleWord => self.program_doublewords(address, data),
        };
        self.modify_control(0, self.map.program | self.map.width_mask());
        outcome.and_then(|()| self.check_faults())
    }

    /// Unlock if locked, drain a running operation, clear stale faults.
    fn begin(&mut self) {
        if self.bus.read_u32(self.map.control_register) & self.map.lock != 0 {
            self.bus
                .write_u32(self.map.key_register, self.map.unlock_keys[0]);
            self.bus
                .write_u32(self.map.key_register, self.map.unlock_keys[1]);
        }
        self.wait_idle();
        self.clear_errors();
    }

    /// Busy-poll until the controller reports idle. No timeout by contract.
    fn wait_idle(&mut self) {
        while self.bus.read_u32(self.map.status_register) & self.map.busy != 0 {}
    }

    fn strobe(&mut self) {
        self.modify_control(self.map.start, 0);
    }

    /// Read-modify-write the control register.
    fn modify_control(&mut self, set: u32, clear: u32) {
        let cr = self.bus.read_u32(self.map.control_register);
        self.bus
            .write_u32(self.map.control_register, (cr & !clear) | set);
    }

    /// Fail if any error flag is raised. Which one is not reported; the
    /// protocol carries no finer taxonomy.
    fn check_faults(&mut self) -> Result<(), Error> {
        if self.bus.read_u32(self.map.status_register) & self.map.error_flags != 0 {
            return Err(Error::Fault);
        }
        Ok(())
    }

    fn select_sector(&mut self, address: u32) -> Result<Selection, Error> {
        match self.map.sector_select {
            SectorSelect::Index {
                shift,
                mask,
                numbering,
                bank,
            } => {
                let index = match numbering {
                    Numbering::Table => self
                        .descriptor
                        .sector_index(address)
                        .map_err(|_| Error::OutOfRange)?,
                    Numbering::Shift(s) => {
                        if !self.descriptor.contains(address) {
                            return Err(Error::OutOfRange);
                        }
                        (address - self.descriptor.base_address) >> s
                    }
                };
                let (index, bank_bit) = match bank {
                    Some(bank) if index >= bank.capacity => (index - bank.capacity, bank.select),
                    _ => (index, 0),
                };
                let mut clear = mask;
                if let Some(bank) = bank {
                    clear |= bank.select;
                }
                let mut set = ((index << shift) & mask) | bank_bit;
                // Parts with a width selector erase at word width.
                if let Some(width) = self.map.width {
                    clear |= width.mask;
                    set |= width.word;
                }
                Ok(Selection::Field { set, clear })
            }
            SectorSelect::AddressRegister { register } => {
                let sector = self
                    .descriptor
                    .resolve_sector(address)
                    .map_err(|_| Error::OutOfRange)?;
                Ok(Selection::Address {
                    register,
                    value: sector.address,
                })
            }
        }
    }

    /// Arm program-enable, selecting `width` where the controller has a
    /// selector. Must precede the data write of each unit.
    fn arm_program(&mut self, halfword: bool) {
        let (set, clear) = match self.map.width {
            Some(width) => {
                let value = if halfword { width.halfword } else { width.word };
                (self.map.program | value, width.mask)
            }
            None => (self.map.program, 0),
        };
        self.modify_control(set, clear);
    }

    fn program_halfwords(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        for (i, chunk) in data.chunks(2).enumerate() {
            let target = address + (i as u32) * 2;
            let value = self.halfword(chunk);
            self.arm_program(true);
            self.bus.write_u16(target, value);
            self.wait_idle();
            if self.bus.read_u16(target) != value {
                return Err(Error::Mismatch);
            }
        }
        Ok(())
    }

    fn program_words(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        let body = data.len() - data.len() % 4;
        for (i, chunk) in data[..body].chunks_exact(4).enumerate() {
            let target = address + (i as u32) * 4;
            let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.arm_program(false);
            self.bus.write_u32(target, value);
            self.wait_idle();
            if self.bus.read_u32(target) != value {
                return Err(Error::Mismatch);
            }
        }
        // Trailing partial word is written at halfword width.
        self.program_halfwords(address + body as u32, &data[body..])
    }

    fn program_doublewords(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        for (i, chunk) in data.chunks(8).enumerate() {
            let target = address + (i as u32) * 8;
            let mut unit = [self.descriptor.erased_value; 8];
            unit[..chunk.len()].copy_from_slice(chunk);
            let low = u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]);
            let high = u32::from_le_bytes([unit[4], unit[5], unit[6], unit[7]]);
            self.arm_program(false);
            // A double-word instruction is two consecutive word writes.
            self.bus.write_u32(target, low);
            self.bus.write_u32(target + 4, high);
            self.wait_idle();
            if self.bus.read_u32(target) != low || self.bus.read_u32(target + 4) != high {
                return Err(Error::Mismatch);
            }
        }
        Ok(())
    }

    /// Compose a halfword from up to two bytes, padding a lone trailing
    /// byte with the erased value.
    fn halfword(&self, chunk: &[u8]) -> u16 {
        let low = chunk[0];
        let high = chunk.get(1).copied().unwrap_or(self.descriptor.erased_value);
        u16::from_le_bytes([low, high])
    }
}
