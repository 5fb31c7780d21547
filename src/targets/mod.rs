//! # Supported parts
//!
//! One module per device family, each exporting the same four things:
//!
//! - `DESCRIPTOR`: the [`Descriptor`](crate::device::Descriptor) for the
//!   part's flash array
//! - `DEVICE_TABLE`: the host-readable
//!   [`DeviceTable`](crate::device::table::DeviceTable) image of it
//! - the register map or IAP configuration the part's strategy engine needs
//! - `Algorithm`: the part's
//!   [`FlashAlgorithm`](crate::algorithm::FlashAlgorithm) implementation
//!
//! The modules contain no protocol logic of their own: a target is data
//! (addresses, masks, geometry) plus whatever one-time setup its `init`
//! must perform. Register bit layouts are declared with `bitflags` so the
//! maps read like the reference manuals they come from.

pub mod gd32vf103;
pub mod lpc11u35;
pub mod stm32f071;
pub mod stm32f405;
pub mod stm32l486;
