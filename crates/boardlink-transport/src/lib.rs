//! Raw byte transport to the electronic chessboard.
//!
//! The board is a USB HID device speaking an opcode/length-prefixed binary
//! protocol over its interrupt endpoint. This crate provides the
//! [`LinkDriver`] capability trait consumed by the engine, plus the one
//! production implementation ([`HidLink`]). Everything above this layer is
//! transport-agnostic and testable against scripted drivers.

pub mod driver;
pub mod error;
pub mod hid;

pub use driver::LinkDriver;
pub use error::{Result, TransportError};
pub use hid::HidLink;
