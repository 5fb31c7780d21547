//! Common error types for device descriptor operations

/// A common error type for device descriptor operations.
///
/// This enum defines the errors that can occur when resolving addresses
/// against a device's sector geometry or exporting a descriptor. It is
/// designed to be simple and portable for `no_std` environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An address fell outside the device's flash address range.
    OutOfRange,
    /// A descriptor could not be encoded into the requested buffer.
    Encode,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
            Error::Encode => defmt::write!(f, "Encode"),
        }
    }
}
