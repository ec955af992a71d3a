//! Linewatch Hardware Abstraction Layer
//!
//! This crate defines the hardware traits consumed by `linewatch-core`,
//! implemented by chip-specific HALs. The same capture logic runs on any
//! platform that can provide a pin read and (optionally) an edge interrupt
//! route.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  linewatch-core (capture logic)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  linewatch-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip-specific HAL implementations      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`], [`gpio::OutputPin`] - Digital I/O
//! - [`irq::EdgeIrq`] - Edge interrupt routing
//!
//! Suspending and resuming interrupt delivery is deliberately not part of
//! these traits: the core uses the `critical-section` crate for that, and
//! the platform supplies its implementation (globally, not per pin).

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod irq;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin, PinId, Pull};
pub use irq::{EdgeIrq, IrqLine, RawIsr};
