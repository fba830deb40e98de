//! Board-state payload to FEN placement field.
//!
//! A board-state frame carries 32 bytes of placement data after the two
//! header bytes: one 4-bit occupant code per square, packed two per byte.
//! Square `(rank, file)` lives in payload byte `(rank*8 + file) / 2`, low
//! nibble for even files, high nibble for odd files. Ranks are emitted in
//! the order the device transmits them; within a rank, files run h down
//! to a.

/// Occupant code table, indexed by nibble. `'0'` is an empty square.
///
/// This is the device's own code assignment and deliberately not
/// alphabetic (0x06 is `R`, 0x07 is `P`); do not "fix" the ordering.
const PIECE_CODES: &[u8; 13] = b"0qkbpnRPrBNQK";

const HEADER_LEN: usize = 2;
const BOARD_BYTES: usize = 32;

/// Decode a raw board-state frame into a FEN placement field.
///
/// Returns the empty string when the frame is too short to hold a full
/// board. Callers must treat empty as "undecodable", not as an empty
/// board. Only the placement field is produced, without the side-to-move,
/// castling or en-passant suffix.
pub fn board_to_fen(frame: &[u8]) -> String {
    if frame.len() < HEADER_LEN + BOARD_BYTES {
        return String::new();
    }
    let board = &frame[HEADER_LEN..HEADER_LEN + BOARD_BYTES];

    let mut fen = String::with_capacity(72);
    for rank in 0..8usize {
        let mut empty = 0u32;
        for file in (0..8usize).rev() {
            let square = rank * 8 + file;
            let packed = board[square / 2];
            let code = if file % 2 == 0 {
                packed & 0x0F
            } else {
                packed >> 4
            };
            // Codes 13-15 are unassigned; treat them as empty squares.
            let piece = PIECE_CODES
                .get(code as usize)
                .copied()
                .unwrap_or(b'0');
            if piece == b'0' {
                empty += 1;
            } else {
                if empty > 0 {
                    fen.push_str(&empty.to_string());
                    empty = 0;
                }
                fen.push(piece as char);
            }
        }
        if empty > 0 {
            fen.push_str(&empty.to_string());
        }
        if rank < 7 {
            fen.push('/');
        }
    }
    fen
}
