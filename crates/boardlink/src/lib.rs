//! Protocol engine for electronic chessboard peripherals.
//!
//! [`BoardLink`] turns the board's raw HID frames into typed events and
//! typed requests into raw frames: a background dispatch thread polls the
//! transport, classifies each inbound frame and routes it to a reply
//! mailbox, the stored-game spool, or the user's real-time callback. The
//! engine also owns pacing of outgoing writes, automatic reconnection and
//! the board-state FEN encoding.
//!
//! ```no_run
//! use boardlink::BoardLink;
//!
//! # fn main() -> boardlink::Result<()> {
//! let link = BoardLink::open_hid()?;
//! link.connect()?;
//! link.set_board_callback(|fen| println!("{fen}"));
//! link.switch_real_time_mode()?;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod mailbox;
mod port;
mod spool;

pub mod error;
pub mod link;

pub use error::{LinkError, Result};
pub use link::{BoardLink, LinkConfig};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Library version string reported to C callers.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lock a mutex, absorbing poisoning. A panicked holder leaves state that
/// is at worst stale, never structurally invalid.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
