//! Error types for JLIP device control.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Argument validation, wire integrity,
//! device rejections and transport failures are all captured here.
//!
//! None of these are retried by the library. Retry policy belongs to the
//! caller.

use crate::types::{CommandStatus, VtrMode};

/// The error type for all JLIP operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed caller input: oversized payload, out-of-range JLIP id or
    /// channel. Raised before anything is written to the wire.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The checksum byte of a received frame does not match the checksum
    /// computed over its first ten bytes.
    #[error("checksum mismatch: expected 0x{expected:02X}, received 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the received header and payload.
        expected: u8,
        /// Checksum byte actually carried by the frame.
        actual: u8,
    },

    /// The device started answering but fewer bytes than a full frame
    /// arrived before the read timeout.
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead {
        /// Number of bytes in a complete frame.
        expected: usize,
        /// Number of bytes that actually arrived.
        received: usize,
    },

    /// Timed out waiting for a response from the device.
    ///
    /// This typically indicates the device is unplugged, powered down at
    /// the mains, or is not listening on the addressed JLIP id.
    #[error("timeout waiting for response")]
    Timeout,

    /// The device answered with a status other than accepted.
    ///
    /// Only raised when the connection is configured to raise on error
    /// responses.
    #[error("command rejected: {status}")]
    CommandRejected {
        /// The status the device reported.
        status: CommandStatus,
    },

    /// A response buffer did not have the shape its decoder expects.
    ///
    /// This points at a framing desynchronization and the link should no
    /// longer be trusted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A bounded wait gave up before the device reached the target state.
    #[error("device did not reach the target state (last mode {last_mode})")]
    WaitTimeout {
        /// The last transport mode the device reported.
        last_mode: VtrMode,
    },

    /// A transport-level error (serial port open/configure failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error outside the cases above (for example a
    /// scripted mock transport seeing an unexpected request).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` when the device simply did not answer in time.
    ///
    /// Covers both [`Error::Timeout`] and [`Error::ShortRead`]. Callers
    /// scanning a bus for devices treat these as "nobody home".
    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::Timeout | Error::ShortRead { .. })
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
