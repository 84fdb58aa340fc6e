// ABOUTME: SMS TPDU codec per 3GPP TS 23.040 with TS 23.038 alphabet handling
// ABOUTME: Separates wire-format parsing/encoding from the value objects the rest of the crate uses

pub mod address;
pub mod alphabet;
pub mod dcs;
pub mod deliver;
pub mod frame;
pub mod status_report;
pub mod submit;
pub mod timestamp;
pub mod tpdu;
pub mod udh;
pub mod user_data;

pub use address::{Address, NumberingPlan, TypeOfNumber};
pub use dcs::{Alphabet, Dcs, MessageClass};
pub use deliver::Deliver;
pub use frame::PduFrame;
pub use status_report::StatusReport;
pub use submit::Submit;
pub use timestamp::{Scts, ValidityPeriod};
pub use tpdu::Tpdu;
pub use udh::{Concatenation, InformationElement, UserDataHeader};
pub use user_data::UserData;

use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Codec errors with enough context to tell a malformed PDU from a
/// truncated one.
#[derive(Debug, Error)]
pub enum PduError {
    #[error("malformed PDU: {0}")]
    BadPdu(&'static str),

    #[error("unknown message type indicator: {0:#04x}")]
    UnknownMessageType(u8),

    #[error("malformed user data header: {0}")]
    BadUdh(&'static str),

    #[error("malformed address: {0}")]
    BadAddress(&'static str),

    #[error("character {0:?} is not representable in the selected alphabet")]
    UnsupportedAlphabet(char),

    #[error("duplicate segment {sequence} for reference {reference}")]
    DuplicateSegment { reference: u16, sequence: u8 },

    #[error("reassembly timed out for reference {reference} ({received} of {total} segments)")]
    ReassemblyTimeout {
        reference: u16,
        total: u8,
        received: u8,
    },
}

/// Trait for value objects that serialise to TPDU octets.
pub trait Encodable {
    /// Encode this value into the buffer.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError>;

    /// Convert this value to its wire octets.
    fn to_bytes(&self) -> Result<Bytes, PduError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Trait for value objects parsed from TPDU octets.
pub trait Decodable: Sized {
    /// Decode this value from the cursor, advancing past the consumed octets.
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, PduError>;
}

/// Decode a single octet.
pub(crate) fn decode_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, PduError> {
    if buf.remaining() < 1 {
        return Err(PduError::BadPdu(field));
    }
    Ok(buf.get_u8())
}

/// Decode exactly `n` octets.
pub(crate) fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    n: usize,
    field: &'static str,
) -> Result<Vec<u8>, PduError> {
    if buf.remaining() < n {
        return Err(PduError::BadPdu(field));
    }
    let mut out = vec![0u8; n];
    buf.copy_to_slice(&mut out);
    Ok(out)
}
