//! Single-slot reply mailbox.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::lock;

#[derive(Default)]
struct Slot {
    value: Bytes,
    /// Bumped on every post; lets a receiver tell "posted during my wait"
    /// from "posted before I arrived".
    seq: u64,
}

/// Latest-value handoff between the dispatch thread and one request helper.
///
/// `post` unconditionally overwrites the slot; `recv` blocks until a post
/// lands or the timeout elapses, then returns whatever the slot holds,
/// possibly empty (no reply ever arrived) or stale (posted before the wait
/// began). This is deliberately not a queue: issuing a second request
/// before consuming the first reply silently discards the first reply.
pub(crate) struct Mailbox {
    slot: Mutex<Slot>,
    posted: Condvar,
    timeout: Duration,
}

impl Mailbox {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            posted: Condvar::new(),
            timeout,
        }
    }

    /// Replace the held value and wake waiters. Dispatch-thread only.
    pub(crate) fn post(&self, value: Bytes) {
        let mut slot = lock(&self.slot);
        slot.value = value;
        slot.seq = slot.seq.wrapping_add(1);
        self.posted.notify_all();
    }

    /// Wait for a post, up to the configured timeout, then return the
    /// current value.
    pub(crate) fn recv(&self) -> Bytes {
        let mut slot = lock(&self.slot);
        let entered = slot.seq;
        let deadline = Instant::now() + self.timeout;
        while slot.seq == entered {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let (guard, wait) = self
                .posted
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
            if wait.timed_out() {
                break;
            }
        }
        slot.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn returns_latest_value() {
        let mailbox = Mailbox::new(Duration::from_millis(20));
        mailbox.post(Bytes::from_static(b"first"));
        mailbox.post(Bytes::from_static(b"second"));
        assert_eq!(mailbox.recv(), Bytes::from_static(b"second"));
    }

    #[test]
    fn empty_when_nothing_posted() {
        let mailbox = Mailbox::new(Duration::from_millis(10));
        assert!(mailbox.recv().is_empty());
    }

    #[test]
    fn post_during_wait_wakes_receiver() {
        let mailbox = Arc::new(Mailbox::new(Duration::from_secs(5)));
        let poster = Arc::clone(&mailbox);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            poster.post(Bytes::from_static(b"reply"));
        });

        let started = Instant::now();
        let value = mailbox.recv();
        handle.join().expect("poster thread");

        assert_eq!(value, Bytes::from_static(b"reply"));
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "recv should wake on post, not ride out the timeout"
        );
    }

    #[test]
    fn stale_value_survives_timeout() {
        let mailbox = Mailbox::new(Duration::from_millis(10));
        mailbox.post(Bytes::from_static(b"stale"));
        // No post during this wait; the pre-existing value is returned.
        assert_eq!(mailbox.recv(), Bytes::from_static(b"stale"));
    }
}
