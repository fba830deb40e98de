//! Background dispatch loop: poll, classify, route, reconnect.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use boardlink_proto::{commands, fen, wire, Event};
use bytes::Bytes;
use tracing::{debug, info};

use crate::link::LinkShared;
use crate::lock;

/// Read buffer large enough for any report the board emits.
const READ_BUF_LEN: usize = 256;

/// Loop body of the engine's one background thread.
///
/// Frames are handled strictly in arrival order; this thread is the sole
/// writer of the mailboxes and the sole driver of the game spool.
pub(crate) fn run(shared: Arc<LinkShared>) {
    let mut buf = [0u8; READ_BUF_LEN];
    while shared.running.load(Ordering::SeqCst) {
        if shared.port.is_connected() {
            match shared.port.read(&mut buf) {
                // No data in this poll window.
                Ok(0) => thread::sleep(shared.config.poll_idle),
                Ok(n) => route_frame(&shared, &buf[..n]),
                Err(err) => {
                    // The device is presumed gone; reconnection (if armed)
                    // happens on the next pass.
                    debug!(error = %err, "read failed, dropping connection");
                    shared.port.disconnect();
                }
            }
        } else {
            if shared.reconnect.load(Ordering::SeqCst) {
                reconnect(&shared);
            }
            thread::sleep(shared.config.poll_idle);
        }
    }
}

fn reconnect(shared: &LinkShared) {
    if shared.port.connect().is_err() {
        return;
    }
    info!("board reconnected");
    // Put the device back into whichever mode the caller last requested,
    // before any other traffic.
    let mode = *lock(&shared.mode);
    if let Err(err) = shared.port.send(&commands::switch_mode(mode)) {
        debug!(error = %err, "failed to restore mode after reconnect");
    }
}

fn route_frame(shared: &LinkShared, raw: &[u8]) {
    // Never act on a frame until the opcode and length bytes are present;
    // beyond that, the device-declared length is trusted.
    let Some(declared) = wire::frame_len(raw) else {
        return;
    };
    let frame = &raw[..declared.min(raw.len())];

    match wire::classify(frame) {
        Event::FileStart => shared.spool.begin(),
        Event::FileEnd => shared.spool.finish(),
        Event::Board => {
            let fen = fen::board_to_fen(frame);
            if shared.spool.is_accumulating() {
                shared.spool.push(fen);
            } else {
                let callback = lock(&shared.callback).clone();
                if let Some(callback) = callback {
                    callback(&fen);
                }
            }
        }
        Event::Battery => shared.battery.post(Bytes::copy_from_slice(frame)),
        Event::Reply => shared.replies.post(Bytes::copy_from_slice(frame)),
        Event::Ignored => {}
    }
}
