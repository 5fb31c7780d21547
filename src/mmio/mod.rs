//! # Memory bus abstraction
//!
//! Flash controllers are driven through a handful of memory-mapped registers
//! whose state (the busy flag above all) changes outside the driver's
//! control, and programming writes go straight into the flash array's
//! address space. Both kinds of access are routed through the [`MemoryBus`]
//! trait so that:
//!
//! - production code binds the bus to the live hardware addresses with
//!   volatile accesses ([`Direct`]), and
//! - tests bind it to an in-memory register file with programmable fault
//!   injection, without any hardware in the loop
//!
//! Nothing is ever cached: every call reaches the backing store again, which
//! is exactly the contract a busy-poll loop needs.

/// Typed access to absolute memory addresses.
///
/// Implementations must not buffer or reorder accesses; each method call
/// corresponds to exactly one access of the given width.
pub trait MemoryBus {
    /// Read one byte.
    fn read_u8(&mut self, address: u32) -> u8;

    /// Read one halfword (16 bits).
    fn read_u16(&mut self, address: u32) -> u16;

    /// Read one word (32 bits).
    fn read_u32(&mut self, address: u32) -> u32;

    /// Write one byte.
    fn write_u8(&mut self, address: u32, value: u8);

    /// Write one halfword (16 bits).
    fn write_u16(&mut self, address: u32, value: u16);

    /// Write one word (32 bits).
    fn write_u32(&mut self, address: u32, value: u32);
}

impl<T: MemoryBus + ?Sized> MemoryBus for &mut T {
    fn read_u8(&mut self, address: u32) -> u8 {
        (**self).read_u8(address)
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        (**self).read_u16(address)
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        (**self).read_u32(address)
    }

    fn write_u8(&mut self, address: u32, value: u8) {
        (**self).write_u8(address, value)
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        (**self).write_u16(address, value)
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        (**self).write_u32(address, value)
    }
}

/// Production bus: volatile accesses to the physical address space.
///
/// Every method compiles down to a single volatile load or store at the
/// given address. This only makes sense on the target device itself, where
/// the addresses handed to it come out of a
/// [`RegisterMap`](crate::controller::RegisterMap) or a
/// [`Descriptor`](crate::device::Descriptor) and therefore point at real
/// registers or real flash. Dereferencing those addresses anywhere else is
/// undefined behavior, which is why host-side tests substitute their own
/// [`MemoryBus`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

impl MemoryBus for Direct {
    fn read_u8(&mut self, address: u32) -> u8 {
        // SAFETY: addresses come from device descriptors and register maps
        // that describe the running target's memory map.
        unsafe { core::ptr::read_volatile(address as usize as *const u8) }
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        // SAFETY: as above; the address is halfword-aligned by construction.
        unsafe { core::ptr::read_volatile(address as usize as *const u16) }
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        // SAFETY: as above; the address is word-aligned by construction.
        unsafe { core::ptr::read_volatile(address as usize as *const u32) }
    }

    fn write_u8(&mut self, address: u32, value: u8) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile(address as usize as *mut u8, value) }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile(address as usize as *mut u16, value) }
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        // SAFETY: as above.
        unsafe { core::ptr::write_volatile(address as usize as *mut u32, value) }
    }
}
