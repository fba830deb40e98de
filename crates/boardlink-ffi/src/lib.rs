//! boardlink-ffi: C-ABI exports for the boardlink engine.

mod args;
mod error;
mod link;
mod types;

use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;

pub use link::{
    bl_beep, bl_connect, bl_disconnect, bl_free, bl_get_battery, bl_get_ble_version,
    bl_get_file, bl_get_file_count, bl_get_mcu_version, bl_led, bl_open, bl_set_board_callback,
    bl_switch_real_time_mode, bl_switch_upload_mode,
};
pub use types::{
    BlBoardCallback, BlLinkHandle, BlResult, BL_ERR_INTERNAL, BL_ERR_INVALID_ARGUMENT,
    BL_ERR_LED, BL_ERR_NOT_CONNECTED, BL_ERR_TRANSPORT, BL_ERR_WRITE_REJECTED, BL_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Write the library version into `buf`.
///
/// Returns the text length, or `-2` when the buffer cannot hold the text
/// plus its NUL terminator.
///
/// # Safety
/// `buf` must be writable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn bl_sdk_version(buf: *mut c_char, len: c_int) -> c_int {
    ffi_boundary(0, || {
        error::clear_error_state();
        args::write_text_out(buf, len, boardlink::SDK_VERSION)
    })
}

/// Message describing the most recent error on this thread. Never null;
/// empty when the last call succeeded.
#[no_mangle]
pub extern "C" fn bl_last_error() -> *const c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
