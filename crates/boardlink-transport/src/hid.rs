use std::ffi::CString;

use hidapi::{HidApi, HidDevice};
use tracing::{debug, info};

use crate::driver::LinkDriver;
use crate::error::{Result, TransportError};

/// Vendor ID shared by all board revisions.
pub const VENDOR_ID: u16 = 0x2D80;

/// Known product ID families. Only the high byte is significant; the low
/// byte varies with hardware revision.
pub const PRODUCT_FAMILIES: [u16; 7] = [
    0x8000, 0x8100, 0x8200, 0x8300, 0x8400, 0x8500, 0x8600,
];

/// HID usage page exposed by the board's vendor-specific interface.
pub const USAGE_PAGE: u16 = 0xFF00;

/// Per-call read timeout at the HID layer, in milliseconds.
const READ_TIMEOUT_MS: i32 = 100;

/// Returns true if a HID interface belongs to a supported board.
pub fn is_board(vendor_id: u16, product_id: u16, usage_page: u16) -> bool {
    vendor_id == VENDOR_ID
        && usage_page == USAGE_PAGE
        && PRODUCT_FAMILIES.contains(&(product_id & 0xFF00))
}

/// HID transport to the board.
///
/// Owns the hidapi context for its whole lifetime. `open` enumerates
/// attached HID interfaces, filters by [`is_board`], and opens the first
/// match; there is no support for addressing a specific board when several
/// are plugged in.
pub struct HidLink {
    api: HidApi,
    device: Option<HidDevice>,
}

impl HidLink {
    /// Initialize the HID backend. Does not open a device.
    pub fn new() -> Result<Self> {
        let api = HidApi::new()?;
        Ok(Self { api, device: None })
    }

    /// Paths of all attached interfaces that look like a board.
    pub fn list_devices(&self) -> Vec<CString> {
        self.api
            .device_list()
            .filter(|info| is_board(info.vendor_id(), info.product_id(), info.usage_page()))
            .map(|info| info.path().to_owned())
            .collect()
    }
}

impl LinkDriver for HidLink {
    fn open(&mut self) -> Result<()> {
        if self.device.is_some() {
            return Ok(());
        }

        self.api.refresh_devices()?;
        let path = self
            .list_devices()
            .into_iter()
            .next()
            .ok_or(TransportError::NoDevice)?;

        let device = self.api.open_path(&path)?;
        info!(?path, "opened chessboard hid device");
        self.device = Some(device);
        Ok(())
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("closed chessboard hid device");
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let device = self.device.as_ref().ok_or(TransportError::NotOpen)?;
        let n = device.read_timeout(buf, READ_TIMEOUT_MS)?;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let device = self.device.as_ref().ok_or(TransportError::NotOpen)?;
        let n = device.write(data)?;
        debug!(len = n, "wrote hid report");
        Ok(n)
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_every_product_family() {
        for family in PRODUCT_FAMILIES {
            assert!(is_board(VENDOR_ID, family, USAGE_PAGE));
            // Low byte is a hardware revision and must be ignored.
            assert!(is_board(VENDOR_ID, family | 0x42, USAGE_PAGE));
        }
    }

    #[test]
    fn rejects_foreign_interfaces() {
        assert!(!is_board(0x1234, 0x8000, USAGE_PAGE));
        assert!(!is_board(VENDOR_ID, 0x7000, USAGE_PAGE));
        assert!(!is_board(VENDOR_ID, 0x8000, 0x0001));
    }
}
