//! Common error types for register controller operations

/// A common error type for register controller operations.
///
/// The protocol deliberately reports no more detail than this across the
/// host boundary: controller faults are not decoded into sub-categories and
/// the position of a verification mismatch is not carried.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An address fell outside the device's flash address range.
    OutOfRange,
    /// The controller reported an error flag after a command completed.
    Fault,
    /// A programmed unit read back differently from its source data.
    Mismatch,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfRange => defmt::write!(f, "OutOfRange"),
            Error::Fault => defmt::write!(f, "Fault"),
            Error::Mismatch => defmt::write!(f, "Mismatch"),
        }
    }
}
