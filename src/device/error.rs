// ABOUTME: Error surface for dispatcher operations, with partial response context where useful

use crate::pdu::PduError;
use std::io;
use thiserror::Error;

/// Errors returned by device operations.
#[derive(Debug, Error)]
pub enum AtError {
    /// The device has been closed; `lines` holds anything received before
    /// the close when the failure interrupted a wait.
    #[error("device is closed")]
    Closed { lines: Vec<String> },

    /// No final result line arrived within the command deadline. The lines
    /// received so far are preserved for inspection; the command is not
    /// retried at this layer.
    #[error("command timed out; received {lines:?}")]
    Timeout { lines: Vec<String> },

    /// The port accepted fewer bytes than the command contains.
    #[error("incomplete write: wrote {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },

    /// I/O failure on the underlying port.
    #[error("port error: {0}")]
    Io(#[from] io::Error),

    /// The response set did not contain what the caller required.
    #[error("expected response {expected:?} not found in {lines:?}")]
    UnexpectedResponse {
        expected: String,
        lines: Vec<String>,
    },

    /// A PDU could not be encoded or decoded.
    #[error("PDU codec: {0}")]
    Pdu(#[from] PduError),
}

/// Result alias for device operations.
pub type AtResult<T> = Result<T, AtError>;
