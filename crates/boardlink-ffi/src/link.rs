use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use boardlink::BoardLink;

use crate::args;
use crate::error;
use crate::types::{BlBoardCallback, BlLinkHandle, BlResult, LinkHandle};

fn with_link<T>(handle: BlLinkHandle, on_error: T, f: impl FnOnce(&LinkHandle) -> T) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("link handle cannot be null");
        return on_error;
    }

    let link_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &*(handle as *mut LinkHandle) }
    };

    f(link_handle)
}

fn result_of(outcome: boardlink::Result<()>) -> BlResult {
    match outcome {
        Ok(()) => BlResult::Ok,
        Err(err) => error::map_link_error(&err),
    }
}

/// Create an engine over the HID transport.
///
/// The board does not have to be plugged in yet; [`bl_connect`] arms
/// auto-reconnection and the engine picks the board up when it appears.
/// Returns null when the HID layer cannot be initialized.
#[no_mangle]
pub extern "C" fn bl_open() -> BlLinkHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match BoardLink::open_hid() {
            Ok(link) => {
                let handle = LinkHandle { link };
                Box::into_raw(Box::new(handle)) as BlLinkHandle
            }
            Err(err) => {
                let _ = error::map_link_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Free an engine handle, disconnecting and stopping its dispatch thread.
///
/// # Safety
/// `handle` must be null or a handle previously returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_free(handle: BlLinkHandle) {
    crate::ffi_boundary((), || {
        if handle.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by bl_open.
        unsafe {
            drop(Box::from_raw(handle as *mut LinkHandle));
        }
    });
}

/// Open the board and arm auto-reconnection.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_connect(handle: BlLinkHandle) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            result_of(link_handle.link.connect())
        })
    })
}

/// Close the board and disarm auto-reconnection.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_disconnect(handle: BlLinkHandle) {
    crate::ffi_boundary((), || {
        error::clear_error_state();

        with_link(handle, (), |link_handle| link_handle.link.disconnect());
    });
}

/// Switch the board to real-time mode.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_switch_real_time_mode(handle: BlLinkHandle) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            result_of(link_handle.link.switch_real_time_mode())
        })
    })
}

/// Switch the board to upload mode.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_switch_upload_mode(handle: BlLinkHandle) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            result_of(link_handle.link.switch_upload_mode())
        })
    })
}

/// Register the real-time position callback; pass null to disable it.
///
/// The callback runs on the engine's dispatch thread and receives the FEN
/// placement field as a NUL-terminated string plus its length. The pointer
/// is only valid for the duration of the call.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_set_board_callback(
    handle: BlLinkHandle,
    callback: Option<BlBoardCallback>,
) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            match callback {
                Some(callback) => link_handle.link.set_board_callback(move |fen| {
                    // FEN text never contains NUL; the guard is for safety only.
                    if let Ok(text) = CString::new(fen) {
                        callback(text.as_ptr(), fen.len() as c_int);
                    }
                }),
                None => link_handle.link.clear_board_callback(),
            }
            BlResult::Ok
        })
    })
}

/// Sound the buzzer: frequency in hertz, duration in milliseconds.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_beep(handle: BlLinkHandle, frequency: u16, duration: u16) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            result_of(link_handle.link.beep(frequency, duration))
        })
    })
}

/// Set the full LED grid from 8 strings of `'0'`/`'1'`, top row (rank 8)
/// first, file a leftmost.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`. `rows` must point
/// to 8 valid NUL-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn bl_led(handle: BlLinkHandle, rows: *const *const c_char) -> BlResult {
    crate::ffi_boundary(BlResult::Internal, || {
        error::clear_error_state();

        let rows = {
            // SAFETY: We validate null pointers and UTF-8 in the helper.
            match unsafe { args::led_rows_arg(rows) } {
                Some(v) => v,
                None => return BlResult::InvalidArgument,
            }
        };

        with_link(handle, BlResult::InvalidArgument, |link_handle| {
            result_of(link_handle.link.set_led_rows(rows))
        })
    })
}

/// Query the main-microcontroller firmware version into `buf`.
///
/// Returns the text length, `0` when the board did not answer, `-2` when
/// the buffer cannot hold the text plus its NUL terminator.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`. `buf` must be
/// writable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn bl_get_mcu_version(
    handle: BlLinkHandle,
    buf: *mut c_char,
    len: c_int,
) -> c_int {
    crate::ffi_boundary(0, || {
        error::clear_error_state();

        with_link(handle, 0, |link_handle| match link_handle.link.mcu_version() {
            Ok(version) => args::write_text_out(buf, len, &version),
            Err(err) => {
                let _ = error::map_link_error(&err);
                0
            }
        })
    })
}

/// Query the Bluetooth-controller firmware version into `buf`.
///
/// Same contract as [`bl_get_mcu_version`].
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`. `buf` must be
/// writable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn bl_get_ble_version(
    handle: BlLinkHandle,
    buf: *mut c_char,
    len: c_int,
) -> c_int {
    crate::ffi_boundary(0, || {
        error::clear_error_state();

        with_link(handle, 0, |link_handle| match link_handle.link.ble_version() {
            Ok(version) => args::write_text_out(buf, len, &version),
            Err(err) => {
                let _ = error::map_link_error(&err);
                0
            }
        })
    })
}

/// Battery level in percent, or `-1` on error.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_get_battery(handle: BlLinkHandle) -> c_int {
    crate::ffi_boundary(-1, || {
        error::clear_error_state();

        with_link(handle, -1, |link_handle| match link_handle.link.battery_level() {
            Ok(level) => c_int::from(level),
            Err(err) => {
                let _ = error::map_link_error(&err);
                -1
            }
        })
    })
}

/// Number of games in on-board storage, or `-1` on error.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`.
#[no_mangle]
pub unsafe extern "C" fn bl_get_file_count(handle: BlLinkHandle) -> c_int {
    crate::ffi_boundary(-1, || {
        error::clear_error_state();

        with_link(handle, -1, |link_handle| {
            match link_handle.link.stored_game_count() {
                Ok(count) => c_int::from(count),
                Err(err) => {
                    let _ = error::map_link_error(&err);
                    -1
                }
            }
        })
    })
}

/// Retrieve the stored game at the head of on-board storage, removing it
/// afterwards when `delete` is non-zero.
///
/// The game is written to `buf` as semicolon-separated FEN placements.
/// Returns the text length, `0` when no game is available or the transfer
/// timed out, `-1` on error, `-2` when the buffer is too small.
///
/// # Safety
/// `handle` must be a valid handle returned by `bl_open`. `buf` must be
/// writable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn bl_get_file(
    handle: BlLinkHandle,
    buf: *mut c_char,
    len: c_int,
    delete: c_int,
) -> c_int {
    crate::ffi_boundary(-1, || {
        error::clear_error_state();

        with_link(handle, -1, |link_handle| {
            match link_handle.link.fetch_stored_game(delete != 0) {
                Ok(game) if game.is_empty() => 0,
                Ok(game) => args::write_text_out(buf, len, &game.join(";")),
                Err(err) => {
                    let _ = error::map_link_error(&err);
                    -1
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_rejected() {
        // SAFETY: Null handles are explicitly valid input.
        unsafe {
            assert_eq!(bl_connect(std::ptr::null_mut()), BlResult::InvalidArgument);
            assert_eq!(
                bl_switch_upload_mode(std::ptr::null_mut()),
                BlResult::InvalidArgument
            );
            assert_eq!(bl_beep(std::ptr::null_mut(), 1000, 200), BlResult::InvalidArgument);
            assert_eq!(bl_get_battery(std::ptr::null_mut()), -1);
            assert_eq!(bl_get_file_count(std::ptr::null_mut()), -1);

            let mut buf = [0 as c_char; 100];
            assert_eq!(
                bl_get_mcu_version(std::ptr::null_mut(), buf.as_mut_ptr(), buf.len() as c_int),
                0
            );
            assert_eq!(
                bl_get_file(std::ptr::null_mut(), buf.as_mut_ptr(), buf.len() as c_int, 1),
                -1
            );
        }
    }

    #[test]
    fn null_led_rows_are_rejected_before_the_handle() {
        // SAFETY: Null pointers are explicitly valid input.
        unsafe {
            assert_eq!(
                bl_led(std::ptr::null_mut(), std::ptr::null()),
                BlResult::InvalidArgument
            );
        }
    }

    #[test]
    fn free_accepts_null() {
        // SAFETY: Null is explicitly valid input.
        unsafe { bl_free(std::ptr::null_mut()) };
    }
}
