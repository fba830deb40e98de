//! Paced transport port: connection state plus rate-limited writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use boardlink_transport::LinkDriver;
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::lock;

/// Wraps the raw [`LinkDriver`] with connection tracking and a mandatory
/// minimum spacing between writes (the board drops reports that arrive
/// faster than it can service them).
///
/// Lock order is fixed globally: the connection-state lock (`driver`) is
/// always taken before the write-serialization lock (`pace`). Every path
/// that needs both follows that order, so a write in flight can never
/// deadlock against a concurrent disconnect.
pub(crate) struct PacedPort {
    /// Connection-state lock; owns the driver.
    driver: Mutex<Box<dyn LinkDriver>>,
    /// Write-serialization lock; holds the completion time of the last send.
    pace: Mutex<Option<Instant>>,
    connected: AtomicBool,
    interval: Duration,
}

impl PacedPort {
    pub(crate) fn new(driver: Box<dyn LinkDriver>, interval: Duration) -> Self {
        Self {
            driver: Mutex::new(driver),
            pace: Mutex::new(None),
            connected: AtomicBool::new(false),
            interval,
        }
    }

    /// Open the underlying device. Idempotent while connected.
    pub(crate) fn connect(&self) -> Result<()> {
        let mut driver = lock(&self.driver);
        if self.connected.load(Ordering::SeqCst) && driver.is_open() {
            return Ok(());
        }
        driver.open()?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Close the underlying device. Serializes against writes in flight.
    pub(crate) fn disconnect(&self) {
        let mut driver = lock(&self.driver);
        let _pace = lock(&self.pace);
        driver.close();
        self.connected.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Read one report. `Ok(0)` means no data in this poll window.
    pub(crate) fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut driver = lock(&self.driver);
        Ok(driver.read(buf)?)
    }

    /// Write one frame, spacing it at least `interval` after the previous
    /// send completed. Empty frames are a no-op and never touch the driver.
    pub(crate) fn send(&self, frame: &[u8]) -> Result<usize> {
        if frame.is_empty() {
            return Ok(0);
        }
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }

        let mut driver = lock(&self.driver);
        let mut last_send = lock(&self.pace);
        if let Some(previous) = *last_send {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        let written = driver.write(frame)?;
        *last_send = Some(Instant::now());
        debug!(len = written, opcode = frame[0], "frame sent");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use boardlink_transport::TransportError;

    use super::*;

    #[derive(Default)]
    struct CountingDriver {
        open: bool,
        writes: Arc<Mutex<Vec<(Instant, Vec<u8>)>>>,
        write_calls: Arc<AtomicUsize>,
    }

    impl LinkDriver for CountingDriver {
        fn open(&mut self) -> boardlink_transport::Result<()> {
            self.open = true;
            Ok(())
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn read(&mut self, _buf: &mut [u8]) -> boardlink_transport::Result<usize> {
            Ok(0)
        }

        fn write(&mut self, data: &[u8]) -> boardlink_transport::Result<usize> {
            if !self.open {
                return Err(TransportError::NotOpen);
            }
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.writes).push((Instant::now(), data.to_vec()));
            Ok(data.len())
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn consecutive_sends_are_spaced() {
        let driver = CountingDriver::default();
        let writes = Arc::clone(&driver.writes);
        let interval = Duration::from_millis(40);
        let port = PacedPort::new(Box::new(driver), interval);
        port.connect().unwrap();

        port.send(&[0x0B, 0x04, 0x03, 0xE8, 0x00, 0xC8]).unwrap();
        port.send(&[0x0B, 0x04, 0x03, 0xE8, 0x00, 0xC8]).unwrap();

        let writes = lock(&writes);
        assert_eq!(writes.len(), 2);
        let gap = writes[1].0.duration_since(writes[0].0);
        assert!(gap >= interval, "gap {gap:?} shorter than {interval:?}");
    }

    #[test]
    fn empty_send_skips_the_driver() {
        let driver = CountingDriver::default();
        let calls = Arc::clone(&driver.write_calls);
        let port = PacedPort::new(Box::new(driver), Duration::from_millis(1));
        port.connect().unwrap();

        assert_eq!(port.send(&[]).unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn send_while_disconnected_fails() {
        let port = PacedPort::new(
            Box::new(CountingDriver::default()),
            Duration::from_millis(1),
        );
        assert!(matches!(
            port.send(&[0x29, 0x01, 0x00]),
            Err(LinkError::NotConnected)
        ));
    }

    #[test]
    fn connect_is_idempotent() {
        let port = PacedPort::new(
            Box::new(CountingDriver::default()),
            Duration::from_millis(1),
        );
        port.connect().unwrap();
        port.connect().unwrap();
        assert!(port.is_connected());

        port.disconnect();
        assert!(!port.is_connected());
    }
}
