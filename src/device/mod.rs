//! # Flash device descriptors
//!
//! This module holds the static configuration that describes one device's
//! flash array: where it lives, how it is paged, how it is erased, and how
//! long the host should wait for each operation. A [`Descriptor`] is created
//! once, in `const` context, and is immutable for the lifetime of the device.
//!
//! # Design Philosophy
//!
//! - **Configuration, not state**: a descriptor carries no mutable data; the
//!   hardware registers are the only mutable state in the crate
//! - **Geometry from data**: irregular sector layouts (a few small boot
//!   sectors followed by progressively larger ones) fall out of the ordered
//!   sector table, never out of special-cased code
//! - **Host visible**: the same information is exported as a `#[repr(C)]`
//!   table ([`table::DeviceTable`]) read by the programming host before it
//!   calls any entry point, and as JSON for host-side tooling
//!
//! # Usage Examples
//!
//! ```rust
//! use libflash::device::{Descriptor, MemoryClass, SectorRange};
//!
//! static SECTORS: [SectorRange; 2] = [
//!     SectorRange { size: 0x1000, address: 0x0800_0000 },
//!     SectorRange { size: 0x8000, address: 0x0800_8000 },
//! ];
//!
//! static DESCRIPTOR: Descriptor = Descriptor {
//!     name: "EXAMPLE 96 KB Flash",
//!     class: MemoryClass::Onchip,
//!     base_address: 0x0800_0000,
//!     total_size: 0x0001_8000,
//!     page_size: 256,
//!     erased_value: 0xFF,
//!     program_timeout_ms: 1000,
//!     erase_timeout_ms: 10000,
//!     sectors: &SECTORS,
//! };
//!
//! let sector = DESCRIPTOR.resolve_sector(0x0800_9000).unwrap();
//! assert_eq!(sector.address, 0x0800_9000 - 0x1000);
//! ```

pub mod error;
pub mod table;

#[cfg(test)]
mod tests;

pub use error::Error;

use serde::Serialize;

/// Memory class of a flash device, as reported to the programming host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u16)]
pub enum MemoryClass {
    /// Unknown or unspecified memory.
    Unknown = 0,
    /// On-chip flash behind the device's own flash controller.
    Onchip = 1,
    /// External memory on an 8-bit parallel bus.
    Ext8Bit = 2,
    /// External memory on a 16-bit parallel bus.
    Ext16Bit = 3,
    /// External memory on a 32-bit parallel bus.
    Ext32Bit = 4,
    /// External serial (SPI/QSPI) flash.
    ExtSpi = 5,
}

/// One contiguous run of uniformly sized sectors.
///
/// A device's sector table is an ordered sequence of these, in strictly
/// increasing `address`. Each entry's `size` applies from its `address` up to
/// the next entry's `address` (or the end of flash for the last entry).
/// Addresses are absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorRange {
    /// Erase granularity of every sector in this run, in bytes.
    pub size: u32,
    /// Absolute address of the first sector in this run.
    pub address: u32,
}

/// A single erase unit resolved from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Flat sector index counted from the flash base across all runs.
    pub index: u32,
    /// Absolute address of the first byte of the sector.
    pub address: u32,
    /// Size of the sector in bytes.
    pub size: u32,
}

impl Sector {
    /// Address one past the last byte of the sector.
    pub fn end(&self) -> u32 {
        self.address + self.size
    }

    /// Check whether an address falls inside this sector.
    pub fn contains(&self, address: u32) -> bool {
        (address >= self.address) && (address < self.end())
    }
}

/// Static description of one device's flash array.
///
/// Mirrors the information a programming host reads before invoking any
/// operation: address range, programming page size, erased fill value,
/// per-operation timeouts, and the sector geometry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Descriptor {
    /// Human-readable device name.
    pub name: &'static str,
    /// Memory class tag.
    pub class: MemoryClass,
    /// Absolute address of the first byte of flash.
    pub base_address: u32,
    /// Total size of the flash array in bytes.
    pub total_size: u32,
    /// Programming page size: the unit and alignment of a program operation.
    pub page_size: u32,
    /// Value every byte assumes after an erase.
    pub erased_value: u8,
    /// Host-side timeout for programming one page, in milliseconds.
    pub program_timeout_ms: u32,
    /// Host-side timeout for erasing one sector, in milliseconds.
    pub erase_timeout_ms: u32,
    /// Ordered sector table. Must not be empty and must start at
    /// `base_address`.
    pub sectors: &'static [SectorRange],
}

impl Descriptor {
    /// Address one past the last byte of flash.
    pub const fn end_address(&self) -> u32 {
        self.base_address + self.total_size
    }

    /// Check whether an address falls inside the flash array.
    pub const fn contains(&self, address: u32) -> bool {
        (address >= self.base_address) && (address < self.end_address())
    }

    /// Total number of sectors across all runs.
    pub fn sector_count(&self) -> u32 {
        let mut count = 0;
        for (i, range) in self.sectors.iter().enumerate() {
            let bound = self.run_end(i);
            count += (bound - range.address) / range.size;
        }
        count
    }

    /// Resolve an address to the erase unit that contains it.
    ///
    /// Scans the ordered sector table for the entry with the greatest start
    /// address not exceeding `address`; that entry's size gives the erase
    /// granularity and the sector base is `address` rounded down to it.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `address` is outside
    /// `[base_address, base_address + total_size)`.
    pub fn resolve_sector(&self, address: u32) -> Result<Sector, Error> {
        if !self.contains(address) {
            return Err(Error::OutOfRange);
        }
        let mut index = 0;
        for (i, range) in self.sectors.iter().enumerate() {
            let bound = self.run_end(i);
            if address < bound {
                let offset = address - range.address;
                return Ok(Sector {
                    index: index + offset / range.size,
                    address: address - offset % range.size,
                    size: range.size,
                });
            }
            index += (bound - range.address) / range.size;
        }
        // contains() passed, so the last run's bound is end_address() and the
        // loop above must have returned.
        Err(Error::OutOfRange)
    }

    /// Flat sector index of the sector containing `address`.
    ///
    /// This is the numbering that register-based controllers encode into
    /// their sector-number bit-field.
    pub fn sector_index(&self, address: u32) -> Result<u32, Error> {
        Ok(self.resolve_sector(address)?.index)
    }

    /// Encode the descriptor as JSON into a fixed-capacity string.
    ///
    /// Intended for host-side tooling that wants the geometry in a portable
    /// form rather than the raw `#[repr(C)]` image.
    ///
    /// # Errors
    ///
    /// [`Error::Encode`] if the descriptor does not fit in `N` bytes.
    pub fn to_json<const N: usize>(&self) -> Result<heapless::String<N>, Error> {
        serde_json_core::to_string(self).map_err(|_| Error::Encode)
    }

    /// End address of sector run `i`: the next run's start, or the end of
    /// flash for the last run.
    fn run_end(&self, i: usize) -> u32 {
        match self.sectors.get(i + 1) {
            Some(next) => next.address,
            None => self.end_address(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Sector {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Sector {{ index: {}, address: {}, size: {} }}",
            self.index,
            self.address,
            self.size
        )
    }
}
