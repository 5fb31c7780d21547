//! Common error types for IAP operations

/// A common error type for IAP operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An address fell outside the device's flash address range.
    OutOfRange,
    /// The ROM routine returned a non-zero status word. The code is opaque:
    /// it is carried for diagnostics but never decoded by this crate.
    Status(u32),
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
            Error::Status(code) => defmt::write!(f, "Status({})", code),
        }
    }
}
