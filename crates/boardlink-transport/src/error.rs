/// Errors that can occur on the raw board transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HID backend reported a failure.
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// No board matching the vendor/product/usage-page filter is attached.
    #[error("no chessboard device found")]
    NoDevice,

    /// An operation was attempted on a closed transport.
    #[error("transport not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, TransportError>;
