use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::error;

/// Convert the 8-row LED argument into string slices.
///
/// # Safety
/// `rows` must be null or point to 8 readable pointers, each null or a
/// valid NUL-terminated C string.
pub(crate) unsafe fn led_rows_arg<'a>(rows: *const *const c_char) -> Option<[&'a str; 8]> {
    if rows.is_null() {
        let _ = error::set_invalid_argument("led rows cannot be null");
        return None;
    }

    let mut out = [""; 8];
    for (index, slot) in out.iter_mut().enumerate() {
        let row = {
            // SAFETY: The caller guarantees `rows` points to 8 pointers.
            unsafe { *rows.add(index) }
        };
        if row.is_null() {
            let _ = error::set_invalid_argument(format!("led row {index} cannot be null"));
            return None;
        }

        let as_cstr = {
            // SAFETY: The caller guarantees each row is a valid C string.
            unsafe { CStr::from_ptr(row) }
        };
        match as_cstr.to_str() {
            Ok(text) => *slot = text,
            Err(_) => {
                let _ = error::set_invalid_argument(format!("led row {index} must be valid UTF-8"));
                return None;
            }
        }
    }
    Some(out)
}

/// Copy `text` plus a terminating NUL into a caller-provided buffer.
///
/// Returns the number of text bytes written, `0` when there is nothing to
/// write, or `-2` when the buffer is too small.
pub(crate) fn write_text_out(buf: *mut c_char, len: c_int, text: &str) -> c_int {
    if text.is_empty() {
        return 0;
    }
    if buf.is_null() {
        let _ = error::set_invalid_argument("out buffer cannot be null");
        return 0;
    }

    let needed = text.len() + 1;
    if len <= 0 || (len as usize) < needed {
        return -2;
    }

    // SAFETY: The buffer was checked non-null and large enough above.
    unsafe {
        std::ptr::copy_nonoverlapping(text.as_ptr(), buf as *mut u8, text.len());
        *buf.add(text.len()) = 0;
    }
    text.len() as c_int
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_text_out_appends_nul() {
        let mut buf = [0 as c_char; 16];
        let written = write_text_out(buf.as_mut_ptr(), buf.len() as c_int, "1.2.3");
        assert_eq!(written, 5);
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn write_text_out_rejects_small_buffer() {
        let mut buf = [0 as c_char; 4];
        assert_eq!(write_text_out(buf.as_mut_ptr(), buf.len() as c_int, "1.2.3"), -2);
        // Exactly text length is still too small: the NUL must fit too.
        let mut buf = [0 as c_char; 5];
        assert_eq!(write_text_out(buf.as_mut_ptr(), buf.len() as c_int, "1.2.3"), -2);
    }

    #[test]
    fn write_text_out_empty_text_is_zero() {
        let mut buf = [0 as c_char; 4];
        assert_eq!(write_text_out(buf.as_mut_ptr(), buf.len() as c_int, ""), 0);
    }
}
