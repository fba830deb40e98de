//! Inbound frame classification.
//!
//! The board is chatty: board-state frames, battery reports and file-transfer
//! markers arrive unsolicited, interleaved with replies to whatever command
//! was last written. Classification is by opcode alone; the device-declared
//! length byte is trusted.

/// Board-state frame (piece placement, 4-bit codes packed two per byte).
pub const OP_BOARD_STATE: u8 = 0x01;
/// LED set command (8 payload bytes, one per row).
pub const OP_LED_SET: u8 = 0x0A;
/// Buzzer command (frequency and duration, big-endian u16 each).
pub const OP_BEEP: u8 = 0x0B;
/// Mode switch command.
pub const OP_MODE_SWITCH: u8 = 0x21;
/// Version query (payload selects the BLE or MCU firmware).
pub const OP_VERSION_QUERY: u8 = 0x27;
/// Battery query command.
pub const OP_BATTERY_QUERY: u8 = 0x29;
/// Unsolicited battery report.
pub const OP_BATTERY_REPORT: u8 = 0x2A;
/// Stored-file count query.
pub const OP_FILE_COUNT: u8 = 0x31;
/// Begin file listing.
pub const OP_FILE_LIST_BEGIN: u8 = 0x33;
/// Confirm file listing / start transfer.
pub const OP_FILE_LIST_CONFIRM: u8 = 0x34;
/// File-transfer marker; payload byte distinguishes start from end.
pub const OP_FILE_MARKER: u8 = 0x37;
/// Delete the game file at the head of storage.
pub const OP_FILE_DELETE: u8 = 0x39;

/// File-marker payload sentinel: transfer starting.
pub const FILE_MARKER_START: u8 = 0xBE;
/// File-marker payload sentinel: transfer complete.
pub const FILE_MARKER_END: u8 = 0xED;

/// Mode switch wire code for real-time mode.
pub const MODE_REAL_TIME: u8 = 0x00;
/// Mode switch wire code for upload mode.
pub const MODE_UPLOAD: u8 = 0x01;

/// Board operating mode.
///
/// Real-time mode streams every placement change; upload mode suppresses
/// the stream and is required for retrieving stored games. The engine
/// remembers the last requested mode so it can be restored after a
/// reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    RealTime,
    Upload,
}

impl LinkMode {
    /// Wire code carried by the mode-switch command.
    pub fn code(self) -> u8 {
        match self {
            LinkMode::RealTime => MODE_REAL_TIME,
            LinkMode::Upload => MODE_UPLOAD,
        }
    }
}

/// Which firmware a version query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionTarget {
    /// Bluetooth controller firmware.
    Ble,
    /// Main microcontroller firmware.
    Mcu,
}

impl VersionTarget {
    pub fn code(self) -> u8 {
        match self {
            VersionTarget::Ble => 0x00,
            VersionTarget::Mcu => 0x01,
        }
    }
}

/// Classified inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Piece-placement frame.
    Board,
    /// A stored-game transfer is starting.
    FileStart,
    /// A stored-game transfer is complete.
    FileEnd,
    /// Battery report with a non-zero level byte.
    Battery,
    /// Reply to the most recent command.
    Reply,
    /// Frame that carries no information (e.g. a zero-level battery report).
    Ignored,
}

/// Logical size of a frame from its declared length byte.
///
/// Returns `None` until at least the opcode and length bytes are present;
/// a frame must never be acted on before then.
pub fn frame_len(frame: &[u8]) -> Option<usize> {
    if frame.len() < 2 {
        return None;
    }
    Some(frame[1] as usize + 2)
}

/// Classify an inbound frame by opcode.
pub fn classify(frame: &[u8]) -> Event {
    if frame.len() < 2 {
        return Event::Ignored;
    }
    match frame[0] {
        OP_BOARD_STATE => Event::Board,
        OP_FILE_MARKER if frame[1] == 0x01 => match frame.get(2) {
            Some(&FILE_MARKER_START) => Event::FileStart,
            Some(&FILE_MARKER_END) => Event::FileEnd,
            _ => Event::Reply,
        },
        // Newer firmware streams battery reports unsolicited; a zero level
        // byte is a placeholder and must not clobber the last real reading.
        OP_BATTERY_REPORT => match frame.get(2) {
            Some(0) | None => Event::Ignored,
            Some(_) => Event::Battery,
        },
        _ => Event::Reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_frames_classified() {
        assert_eq!(classify(&[OP_BOARD_STATE, 0x24, 0x00]), Event::Board);
    }

    #[test]
    fn file_markers_need_exact_shape() {
        assert_eq!(classify(&[0x37, 0x01, 0xBE]), Event::FileStart);
        assert_eq!(classify(&[0x37, 0x01, 0xED]), Event::FileEnd);
        // Wrong declared length or unknown sentinel falls back to a reply.
        assert_eq!(classify(&[0x37, 0x02, 0xBE, 0x00]), Event::Reply);
        assert_eq!(classify(&[0x37, 0x01, 0x55]), Event::Reply);
    }

    #[test]
    fn zero_level_battery_reports_dropped() {
        assert_eq!(classify(&[0x2A, 0x02, 0x00, 0x00]), Event::Ignored);
        assert_eq!(classify(&[0x2A, 0x02, 0x5F, 0x00]), Event::Battery);
        assert_eq!(classify(&[0x2A, 0x00]), Event::Ignored);
    }

    #[test]
    fn unknown_opcodes_are_replies() {
        assert_eq!(classify(&[0x27, 0x05, 0x01, b'1', b'.', b'2', b'3']), Event::Reply);
        assert_eq!(classify(&[0xF0, 0x00]), Event::Reply);
    }

    #[test]
    fn frame_len_requires_header() {
        assert_eq!(frame_len(&[0x01]), None);
        assert_eq!(frame_len(&[0x01, 0x24]), Some(0x26));
        assert_eq!(frame_len(&[0x37, 0x01, 0xBE]), Some(3));
    }
}
