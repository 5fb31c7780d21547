//! # libflash - Rust flash programming algorithms
//!
//! A Rust library of target-resident flash programming algorithms. The code in
//! this crate runs on the microcontroller being programmed: an external debug
//! or programming host loads it into RAM and calls a small set of fixed entry
//! points to erase and write the device's own on-chip flash. This library is
//! designed for embedded systems and supports `no_std` environments.
//!
//! ## Features
//!
//! ### Programming Strategies
//! - **Register controller driver**: drives a memory-mapped flash controller
//!   directly (unlock sequence, command setup, busy polling, read-back
//!   verification), parametrized over per-device register layouts
//! - **IAP driver**: drives a manufacturer-supplied in-ROM routine through a
//!   fixed-format command block for parts whose flash is only reachable that
//!   way
//!
//! ### Device Support
//! - Static device descriptors covering non-uniform sector geometries
//! - Host-readable `#[repr(C)]` device tables with sentinel-terminated
//!   sector lists
//! - Ready-made algorithms for STM32F405, STM32F071, STM32L486, GD32VF103
//!   and LPC11U35 class parts
//!
//! ### Host Contract
//! - Five-operation lifecycle (initialize, deinitialize, erase all, erase
//!   sector, program page) with a binary 0 / non-zero return-code model
//! - Optional debugger notification side channel for targets that report
//!   results through a debug trap
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libflash = "0.1.0"
//! ```
//!
//! ### Programming a page
//!
//! ```rust,no_run
//! use libflash::algorithm::{FlashAlgorithm, Function};
//! use libflash::mmio::Direct;
//! use libflash::targets::stm32f405;
//!
//! let mut algo = stm32f405::Algorithm::new(Direct);
//! algo.init(stm32f405::DESCRIPTOR.base_address, 8_000_000, Function::Program)?;
//!
//! let page = [0u8; 512];
//! algo.program_page(0x0800_0000, &page)?;
//! algo.uninit(Function::Program)?;
//! # Ok::<(), libflash::algorithm::Error>(())
//! ```
//!
//! ### Resolving a sector
//!
//! ```rust
//! use libflash::targets::stm32f405::DESCRIPTOR;
//!
//! let sector = DESCRIPTOR.resolve_sector(0x0802_4000)?;
//! assert_eq!(sector.index, 5);
//! assert_eq!(sector.size, 0x0002_0000);
//! # Ok::<(), libflash::device::Error>(())
//! ```
//!
//! ## Execution Model
//!
//! Every operation is fully synchronous: waits are tight busy-polls of a
//! hardware status flag on the calling thread, with no internal timeouts.
//! Recovering from a controller that never clears its busy flag is the
//! responsibility of the external host, which observes the absence of a
//! return against its own wall clock and resets the target. Operations must
//! never be issued concurrently; the single-threaded execution model of a
//! loaded algorithm is the only serialization.
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Host-side test and simulation environments via the
//!   [`mmio::MemoryBus`] seam
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![doc(html_root_url = "https://shishir-dey.github.io/libflash/")]

/// Static flash device descriptors and sector geometry resolution.
///
/// Contains the per-device configuration (base address, sizes, timeouts,
/// sector layout) consumed by both programming strategies and exposed to the
/// programming host as a read-only table.
pub mod device;

/// Memory bus abstraction for volatile register and flash array access.
///
/// Production code binds the bus to fixed memory addresses; tests bind it to
/// an in-memory simulated register file.
pub mod mmio;

/// Register-based programming strategy.
///
/// A single protocol engine that drives memory-mapped flash controllers
/// through their unlock, command, busy-wait and verify sequence, parametrized
/// over per-device register layouts.
pub mod controller;

/// IAP (in-application programming) strategy.
///
/// Drives a manufacturer-supplied ROM routine through a fixed-format
/// command/status block instead of touching controller registers directly.
pub mod iap;

/// The five-operation algorithm contract presented to the programming host.
pub mod algorithm;

/// Ready-made algorithms and descriptors for supported parts.
pub mod targets;
