use crate::error::Result;

/// A duplex byte channel to the board.
///
/// This is a capability interface with exactly one production
/// implementation ([`HidLink`](crate::HidLink)); the engine and its tests
/// run against `Box<dyn LinkDriver>`.
///
/// `read` is expected to poll with a short internal timeout: `Ok(0)` means
/// "no data in this poll window", not end-of-stream. Any `Err` from `read`
/// or `write` means the device is presumed gone and the caller should drop
/// the connection.
pub trait LinkDriver: Send {
    /// Open the device. Opening an already-open driver is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Close the device. Closing an already-closed driver is a no-op.
    fn close(&mut self);

    /// Read one report into `buf`, returning the byte count.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write one report, returning the byte count accepted by the device.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;
}
