/// Errors surfaced by the board engine.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] boardlink_transport::TransportError),

    /// A command was issued while the board is disconnected.
    #[error("board not connected")]
    NotConnected,

    /// The transport accepted zero bytes of a non-empty command.
    #[error("device rejected write")]
    WriteRejected,

    /// An LED cell coordinate is outside the 8x8 grid.
    #[error("led cell out of range: ({0}, {1})")]
    LedCellOutOfRange(u8, u8),

    /// A textual LED row could not be parsed.
    #[error(transparent)]
    LedRow(#[from] boardlink_proto::LedRowError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
