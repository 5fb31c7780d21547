//! Host-readable device table image.
//!
//! The programming host reads a fixed-layout, read-only table out of the
//! loaded algorithm image before invoking any operation. This module renders
//! a [`Descriptor`](super::Descriptor) into that `#[repr(C)]` layout: a
//! format version tag, a NUL-padded device name, the memory class tag, the
//! address range and page size, a reserved word that must stay zero, the
//! erased fill value, the per-operation timeouts, and a sector table
//! terminated by [`SECTOR_END`]. Sector addresses in the image are relative
//! to the device base address.

use super::Descriptor;

/// Table format version tag (major.minor packed as `0x0101`).
pub const DRIVER_VERSION: u16 = 0x0101;

/// Fixed length of the NUL-padded device name field.
pub const NAME_LENGTH: usize = 128;

/// Sentinel that terminates the sector table.
pub const SECTOR_END: RawSector = RawSector {
    size: 0xFFFF_FFFF,
    address: 0xFFFF_FFFF,
};

/// One `(size, address)` sector entry as the host reads it.
///
/// `address` is relative to the device base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RawSector {
    /// Sector size in bytes, or the sentinel value.
    pub size: u32,
    /// Sector run start relative to the flash base, or the sentinel value.
    pub address: u32,
}

/// The raw device table read by the programming host.
///
/// `SECTORS` is the capacity of the embedded sector table and must hold
/// every descriptor run plus the terminating sentinel. Unused trailing slots
/// are filled with [`SECTOR_END`].
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct DeviceTable<const SECTORS: usize> {
    /// Format version tag, [`DRIVER_VERSION`].
    pub version: u16,
    /// NUL-padded device name.
    pub name: [u8; NAME_LENGTH],
    /// Memory class tag.
    pub class: u16,
    /// Absolute address of the first byte of flash.
    pub base_address: u32,
    /// Total flash size in bytes.
    pub total_size: u32,
    /// Programming page size in bytes.
    pub page_size: u32,
    /// Reserved, must be zero.
    pub reserved: u32,
    /// Value of an erased byte.
    pub erased_value: u8,
    /// Program-page timeout in milliseconds.
    pub program_timeout_ms: u32,
    /// Erase-sector timeout in milliseconds.
    pub erase_timeout_ms: u32,
    /// Sentinel-terminated sector table.
    pub sectors: [RawSector; SECTORS],
}

impl<const SECTORS: usize> DeviceTable<SECTORS> {
    /// Build the host-facing image of a descriptor.
    ///
    /// # Panics
    ///
    /// In `const` evaluation, fails the build if the descriptor's sector
    /// runs plus the sentinel do not fit in `SECTORS` entries.
    pub const fn from_descriptor(descriptor: &Descriptor) -> Self {
        assert!(descriptor.sectors.len() < SECTORS, "sector table overflow");

        let mut name = [0u8; NAME_LENGTH];
        let bytes = descriptor.name.as_bytes();
        assert!(bytes.len() < NAME_LENGTH, "device name too long");
        let mut i = 0;
        while i < bytes.len() {
            name[i] = bytes[i];
            i += 1;
        }

        let mut sectors = [SECTOR_END; SECTORS];
        let mut s = 0;
        while s < descriptor.sectors.len() {
            sectors[s] = RawSector {
                size: descriptor.sectors[s].size,
                address: descriptor.sectors[s].address - descriptor.base_address,
            };
            s += 1;
        }

        Self {
            version: DRIVER_VERSION,
            name,
            class: descriptor.class as u16,
            base_address: descriptor.base_address,
            total_size: descriptor.total_size,
            page_size: descriptor.page_size,
            reserved: 0,
            erased_value: descriptor.erased_value,
            program_timeout_ms: descriptor.program_timeout_ms,
            erase_timeout_ms: descriptor.erase_timeout_ms,
            sectors,
        }
    }
}
