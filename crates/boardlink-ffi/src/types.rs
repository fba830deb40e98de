use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

use boardlink::BoardLink;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlResult {
    Ok = 0,
    InvalidArgument = 1,
    TransportError = 2,
    NotConnected = 3,
    WriteRejected = 4,
    LedError = 5,
    Internal = 99,
}

#[allow(dead_code)]
pub const BL_OK: BlResult = BlResult::Ok;
#[allow(dead_code)]
pub const BL_ERR_INVALID_ARGUMENT: BlResult = BlResult::InvalidArgument;
#[allow(dead_code)]
pub const BL_ERR_TRANSPORT: BlResult = BlResult::TransportError;
#[allow(dead_code)]
pub const BL_ERR_NOT_CONNECTED: BlResult = BlResult::NotConnected;
#[allow(dead_code)]
pub const BL_ERR_WRITE_REJECTED: BlResult = BlResult::WriteRejected;
#[allow(dead_code)]
pub const BL_ERR_LED: BlResult = BlResult::LedError;
#[allow(dead_code)]
pub const BL_ERR_INTERNAL: BlResult = BlResult::Internal;

/// Opaque engine handle. One handle owns one board connection; unlike a
/// process-wide singleton, several boards can be driven side by side.
pub type BlLinkHandle = *mut c_void;

/// Real-time position callback: FEN text (NUL-terminated) and its length.
pub type BlBoardCallback = extern "C" fn(fen: *const c_char, len: c_int);

pub(crate) struct LinkHandle {
    pub(crate) link: BoardLink,
}
