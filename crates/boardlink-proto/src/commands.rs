//! Outgoing command buffers.
//!
//! Every command the host can send is a fixed `[opcode, length, payload...]`
//! buffer; the builders here return the exact bytes to put on the wire.
//! Retry and pacing policy live in the engine, not here.

use crate::wire::{
    LinkMode, VersionTarget, OP_BATTERY_QUERY, OP_BEEP, OP_FILE_COUNT, OP_FILE_DELETE,
    OP_FILE_LIST_BEGIN, OP_FILE_LIST_CONFIRM, OP_LED_SET, OP_MODE_SWITCH, OP_VERSION_QUERY,
};

/// Switch the board between real-time and upload mode.
pub fn switch_mode(mode: LinkMode) -> [u8; 3] {
    [OP_MODE_SWITCH, 0x01, mode.code()]
}

/// Sound the buzzer. Frequency in hertz, duration in milliseconds, both
/// big-endian on the wire.
pub fn beep(frequency: u16, duration: u16) -> [u8; 6] {
    let [freq_hi, freq_lo] = frequency.to_be_bytes();
    let [dur_hi, dur_lo] = duration.to_be_bytes();
    [OP_BEEP, 0x04, freq_hi, freq_lo, dur_hi, dur_lo]
}

/// Set the full LED grid, one byte per row. Row 0 is the top row (rank 8);
/// bit 7 of each row is file a.
pub fn set_leds(rows: &[u8; 8]) -> [u8; 10] {
    [
        OP_LED_SET, 0x08, rows[0], rows[1], rows[2], rows[3], rows[4], rows[5], rows[6], rows[7],
    ]
}

/// Query a firmware version string.
pub fn version_query(target: VersionTarget) -> [u8; 3] {
    [OP_VERSION_QUERY, 0x01, target.code()]
}

/// Query the battery level.
pub fn battery_query() -> [u8; 3] {
    [OP_BATTERY_QUERY, 0x01, 0x00]
}

/// Query the number of stored game files.
pub fn file_count_query() -> [u8; 3] {
    [OP_FILE_COUNT, 0x01, 0x00]
}

/// Begin listing stored files. Must be followed by [`file_list_confirm`].
pub fn file_list_begin() -> [u8; 3] {
    [OP_FILE_LIST_BEGIN, 0x01, 0x00]
}

/// Confirm the listing and start the transfer of the head game.
pub fn file_list_confirm() -> [u8; 3] {
    [OP_FILE_LIST_CONFIRM, 0x01, 0x01]
}

/// Delete the game file at the head of on-board storage.
pub fn delete_current_file() -> [u8; 3] {
    [OP_FILE_DELETE, 0x01, 0x00]
}

/// A textual LED row could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedRowError {
    #[error("led row must be exactly 8 characters, got {0}")]
    BadLength(usize),
    #[error("led row may only contain '0' or '1', got {0:?}")]
    BadChar(char),
}

/// Parse an 8-character `'0'`/`'1'` row into its wire byte.
///
/// The first character is file a, which is bit 7 on the wire.
pub fn parse_led_row(row: &str) -> Result<u8, LedRowError> {
    if row.chars().count() != 8 {
        return Err(LedRowError::BadLength(row.chars().count()));
    }
    let mut bits = 0u8;
    for (idx, ch) in row.chars().enumerate() {
        match ch {
            '1' => bits |= 1 << (7 - idx),
            '0' => {}
            other => return Err(LedRowError::BadChar(other)),
        }
    }
    Ok(bits)
}
