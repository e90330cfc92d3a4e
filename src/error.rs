//! Error types for helion-ble.
//!
//! The taxonomy follows the propagation policy of the engine: encode and
//! decode errors are local (logged, frame dropped, processing continues),
//! transport errors escalate to session teardown, and session errors are
//! what [`Session::connect`](crate::session::Session::connect) and the run
//! loop surface to the caller.

use thiserror::Error;

/// Error building an outgoing command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A numeric argument does not fit its declared fixed width.
    #[error("{what} value {value} is outside 0..={max} (fixed-width field)")]
    ValueOutOfRange {
        /// Which argument was rejected.
        what: &'static str,
        /// The offending value.
        value: i64,
        /// Largest value the field can carry.
        max: i64,
    },
}

/// Error classifying or parsing one inbound frame.
///
/// None of these are fatal to a session; the inbound path logs them and
/// moves on to the next frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-length frame.
    #[error("empty frame")]
    Empty,

    /// Frame does not start with the response sentinel `$`.
    #[error("frame does not start with the response sentinel (leading byte {leading:#04x})")]
    NotAResponse {
        /// The byte found where `$` was expected.
        leading: u8,
    },

    /// Sentinel present but no registered mnemonic matches.
    #[error("unknown mnemonic in response: {0:?}")]
    UnknownMnemonic(String),

    /// Mnemonic recognized but its payload fails the declared parse.
    #[error("malformed {mnemonic} payload: {raw:?}")]
    MalformedPayload {
        /// The matched mnemonic.
        mnemonic: &'static str,
        /// The raw payload text that failed to parse.
        raw: String,
    },
}

/// Error at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A write to the device failed.
    #[error("write failed: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// The link to the device is gone.
    #[error("disconnected")]
    Disconnected,

    /// Subscribing to inbound notifications failed.
    #[error("notification setup failed")]
    NotifySetupFailed,
}

/// Error establishing or running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Identity was still incomplete when the bring-up timeout expired.
    #[error("bring-up timed out before the device identity was complete")]
    BringUpTimeout,

    /// The transport failed while the session depended on it.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A background task died in a way the session cannot recover from.
    #[error("unrecoverable task failure: {0}")]
    UnrecoverableTaskFailure(String),
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
