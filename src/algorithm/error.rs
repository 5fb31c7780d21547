//! Common error types for algorithm operations

/// A common error type for the five-operation algorithm contract.
///
/// Deliberately no richer than the protocol it fronts: the host only ever
/// sees the binary collapse through
/// [`return_code`](super::return_code), and nothing here reports positions,
/// registers or decoded fault categories.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An address fell outside the device's flash address range.
    OutOfRange,
    /// The flash controller raised an error flag.
    Fault,
    /// Programmed or verified data read back differently from its source.
    Mismatch,
    /// An IAP ROM call returned this opaque non-zero status.
    Iap(u32),
}

impl From<crate::controller::Error> for Error {
    fn from(error: crate::controller::Error) -> Self {
        match error {
            crate::controller::Error::OutOfRange => Error::OutOfRange,
            crate::controller::Error::Fault => Error::Fault,
            crate::controller::Error::Mismatch => Error::Mismatch,
        }
    }
}

impl From<crate::iap::Error> for Error {
    fn from(error: crate::iap::Error) -> Self {
        match error {
            crate::iap::Error::OutOfRange => Error::OutOfRange,
            crate::iap::Error::Status(code) => Error::Iap(code),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
            Error::Fault => defmt::write!(f, "Fault"),
            Error::Mismatch => defmt::write!(f, "Mismatch"),
            Error::Iap(code) => defmt::write!(f, "Iap({})", code),
        }
    }
}
