//! # The algorithm contract
//!
//! The programming host sees every device the same way: five entry points
//! and a binary return code. This module defines that contract, the
//! [`FlashAlgorithm`] trait, and the glue that normalizes both programming
//! strategies into it.
//!
//! # Lifecycle
//!
//! ```text
//!                  init(addr, clock, function) == Ok
//!  Uninitialized ───────────────────────────────────▶ Ready
//!        ▲                                             │
//!        │              uninit(function)               │ erase_all()
//!        └─────────────────────────────────────────────┤ erase_sector(addr)
//!                                                      │ program_page(addr, data)
//!                                                      ▼ verify(addr, data)
//!                                               (any sequence)
//! ```
//!
//! `init` is called once before any operation: it clears stale error state
//! and performs whatever one-time setup the part needs (switching the boot
//! memory map, selecting a clock source). It does **not** unlock or erase
//! anything. `uninit` is a successful no-op on every supported part, kept
//! for symmetry. Calling an operation outside `Ready` is a host-side
//! contract violation: implementations do not track lifecycle state across
//! calls; each operation independently re-derives what it needs, such as
//! unlocking a locked controller.
//!
//! # Return Codes
//!
//! Operations internally use [`Error`], but the host boundary carries only
//! pass/fail: [`return_code`] collapses any error to [`FAIL`]. Targets that
//! additionally signal the result to an attached debugger through a trap
//! instruction route it through a [`DebugNotifier`]; the integer return
//! value stays authoritative and the core logic never depends on the
//! notifier.

pub mod error;


pub use error::Error;

use crate::device::Descriptor;
use crate::mmio::MemoryBus;

/// Host return code for a successful operation.
pub const PASS: u32 = 0;

/// Canonical host return code for a failed operation.
pub const FAIL: u32 = 1;

/// Function codes the host passes to `init` and `uninit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Function {
    /// The host is about to erase.
    Erase = 1,
    /// The host is about to program.
    Program = 2,
    /// The host is about to verify.
    Verify = 3,
}

impl Function {
    /// Decode a raw host function code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Function::Erase),
            2 => Some(Function::Program),
            3 => Some(Function::Verify),
            _ => None,
        }
    }
}

/// The five-operation contract every supported device implements, plus the
/// optional verify pass of the original interface.
///
/// All operations are synchronous and blocking; see the crate-level
/// execution model. Implementations live in [`targets`](crate::targets),
/// layered over one of the two strategy engines.
pub trait FlashAlgorithm {
    /// The device this algorithm programs.
    fn descriptor(&self) -> &'static Descriptor;

    /// One-time setup before any operation: clear stale faults, switch
    /// memory maps or clocks where the part requires it.
    fn init(&mut self, address: u32, clock_hz: u32, function: Function) -> Result<(), Error>;

    /// Counterpart of [`init`](Self::init); a successful no-op on all
    /// supported parts.
    fn uninit(&mut self, function: Function) -> Result<(), Error>;

    /// Erase the entire flash array.
    fn erase_all(&mut self) -> Result<(), Error>;

    /// Erase the sector containing `address`.
    fn erase_sector(&mut self, address: u32) -> Result<(), Error>;

    /// Program one page of data at a page-aligned address.
    fn program_page(&mut self, address: u32, data: &[u8]) -> Result<(), Error>;

    /// Compare flash contents at `address` against `data`.
    fn verify(&mut self, address: u32, data: &[u8]) -> Result<(), Error>;

    /// Erase every sector overlapping `[from, to)`.
    ///
    /// Convenience for hosts that think in address ranges; walks the
    /// resolved sector chain and erases each one in turn.
    fn erase_range(&mut self, from: u32, to: u32) -> Result<(), Error> {
        let mut address = from;
        while address < to {
            let sector = self
                .descriptor()
                .resolve_sector(address)
                .map_err(|_| Error::OutOfRange)?;
            self.erase_sector(sector.address)?;
            address = sector.end();
        }
        Ok(())
    }
}

/// Collapse an operation result to the host's binary return code.
pub fn return_code(result: Result<(), Error>) -> u32 {
    match result {
        Ok(()) => PASS,
        Err(_) => FAIL,
    }
}

/// Secondary result channel for targets that signal an attached debugger.
///
/// On some bare-metal families every operation writes its result code into a
/// general register and executes a debug-trap instruction just before
/// returning. That side effect is layered here, outside the core logic; a
/// host that reads return values uses [`SilentProbe`] and loses nothing.
pub trait DebugNotifier {
    /// Signal a finished operation's return code.
    fn notify(&mut self, code: u32);
}

/// A notifier that signals nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProbe;

impl DebugNotifier for SilentProbe {
    fn notify(&mut self, _code: u32) {}
}

/// Collapse a result to its return code and mirror it to the notifier.
pub fn report<N: DebugNotifier>(notifier: &mut N, result: Result<(), Error>) -> u32 {
    let code = return_code(result);
    notifier.notify(code);
    code
}

/// Byte-wise read-back comparison of flash against a source buffer.
///
/// The shared verify pass of the register-based targets. Reports only the
/// fact of a mismatch, never its position.
pub fn verify_readback<B: MemoryBus>(
    bus: &mut B,
    descriptor: &Descriptor,
    address: u32,
    data: &[u8],
) -> Result<(), Error> {
    let end = address
        .checked_add(data.len() as u32)
        .ok_or(Error::OutOfRange)?;
    if !data.is_empty() && (!descriptor.contains(address) || end > descriptor.end_address()) {
        return Err(Error::OutOfRange);
    }
    for (offset, &expected) in data.iter().enumerate() {
        if bus.read_u8(address + offset as u32) != expected {
            return Err(Error::Mismatch);
        }
    }
    Ok(())
}

/// CRC-32 over a flashed region.
///
/// For hosts that spot-check large images without reading them back in
/// full. Purely a read path; never part of an operation's pass/fail.
pub fn region_crc32<B: MemoryBus>(bus: &mut B, address: u32, length: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    let mut offset = 0;
    while offset < length {
        hasher.update(&[bus.read_u8(address + offset)]);
        offset += 1;
    }
    hasher.finalize()
}
