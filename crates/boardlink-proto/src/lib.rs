//! Wire protocol for the electronic chessboard.
//!
//! Every unit on the wire is a frame: `[opcode, length, payload...]`, where
//! `length` counts the bytes following it, so the logical frame size is
//! `length + 2`. This crate is pure arithmetic on those buffers, no I/O:
//!
//! - [`wire`] classifies inbound frames by opcode,
//! - [`commands`] builds the fixed outgoing command buffers,
//! - [`fen`] decodes board-state payloads into FEN placement strings.

pub mod commands;
pub mod fen;
pub mod wire;

pub use commands::LedRowError;
pub use fen::board_to_fen;
pub use wire::{classify, frame_len, Event, LinkMode, VersionTarget};
