//! Stored-game accumulator (the file-transfer state machine).

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::lock;

#[derive(Default)]
struct SpoolState {
    /// True between a start marker and the matching end marker.
    accumulating: bool,
    frames: Vec<String>,
    /// Bumped on every completed transfer.
    generation: u64,
}

/// Accumulates the board-state frames of one stored game.
///
/// The dispatch thread drives the state machine (begin/push/finish); a
/// single fetch caller blocks in [`wait_complete`](Self::wait_complete).
/// While a transfer is accumulating, board frames belong here and must not
/// reach the real-time callback.
pub(crate) struct GameSpool {
    inner: Mutex<SpoolState>,
    completed: Condvar,
}

impl GameSpool {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(SpoolState::default()),
            completed: Condvar::new(),
        }
    }

    /// Start marker: discard any partial game and begin accumulating.
    pub(crate) fn begin(&self) {
        let mut state = lock(&self.inner);
        state.accumulating = true;
        state.frames.clear();
    }

    /// Append one translated frame. Ignored unless accumulating.
    pub(crate) fn push(&self, fen: String) {
        let mut state = lock(&self.inner);
        if state.accumulating {
            state.frames.push(fen);
        }
    }

    /// End marker: close the game and wake the fetch waiter.
    pub(crate) fn finish(&self) {
        let mut state = lock(&self.inner);
        state.accumulating = false;
        state.generation = state.generation.wrapping_add(1);
        self.completed.notify_all();
    }

    pub(crate) fn is_accumulating(&self) -> bool {
        lock(&self.inner).accumulating
    }

    /// Completion generation to snapshot before issuing transfer commands,
    /// so a transfer that finishes before the wait begins is not missed.
    pub(crate) fn generation(&self) -> u64 {
        lock(&self.inner).generation
    }

    /// Block until a transfer completes after `since`, or the timeout
    /// elapses. On completion the accumulated game is handed over
    /// atomically; on timeout the machine is forced back to idle and
    /// `None` is returned.
    pub(crate) fn wait_complete(&self, since: u64, timeout: Duration) -> Option<Vec<String>> {
        let mut state = lock(&self.inner);
        let deadline = Instant::now() + timeout;
        while state.generation == since {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                state.accumulating = false;
                return None;
            }
            let (guard, _) = self
                .completed
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        Some(std::mem::take(&mut state.frames))
    }
}
