// ABOUTME: PDU-mode framing - the SMSC prefix plus TPDU form exchanged after a +CMGS prompt
// ABOUTME: Uppercase hex without separators, committed with Ctrl-Z or aborted with ESC

use crate::pdu::address::Address;
use crate::pdu::tpdu::Tpdu;
use crate::pdu::{Encodable, PduError};
use bytes::{Bytes, BytesMut};
use std::io::Cursor;

/// Byte committing a PDU-mode payload after the `>` prompt.
pub const CTRL_Z: char = '\u{1A}';
/// Byte aborting a PDU-mode payload after the `>` prompt.
pub const ESC: char = '\u{1B}';

/// The wire frame written to (or read from) the modem in PDU mode:
/// `SMSC prefix || TPDU`. The length announced in `+CMGS=<n>` counts the
/// TPDU alone, never the prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PduFrame {
    /// Service centre override; `None` encodes as the single octet `00`,
    /// telling the modem to use its configured default.
    pub smsc: Option<Address>,
    /// The TPDU octets.
    pub tpdu: Bytes,
}

impl PduFrame {
    /// Frame a TPDU with the default service centre.
    pub fn new(tpdu: &Tpdu) -> Result<Self, PduError> {
        Ok(PduFrame {
            smsc: None,
            tpdu: tpdu.to_bytes()?,
        })
    }

    /// Frame a TPDU with an explicit service centre.
    pub fn with_smsc(tpdu: &Tpdu, smsc: Address) -> Result<Self, PduError> {
        Ok(PduFrame {
            smsc: Some(smsc),
            tpdu: tpdu.to_bytes()?,
        })
    }

    /// The `<n>` for `+CMGS=<n>`: the TPDU octet count without the prefix.
    pub fn tpdu_len(&self) -> usize {
        self.tpdu.len()
    }

    /// Parse the carried TPDU.
    pub fn parse_tpdu(&self) -> Result<Tpdu, PduError> {
        Tpdu::parse(&self.tpdu)
    }

    /// Serialise to the uppercase hex form the modem accepts.
    pub fn to_hex(&self) -> Result<String, PduError> {
        let mut buf = BytesMut::with_capacity(1 + self.tpdu.len());
        Address::encode_smsc(self.smsc.as_ref(), &mut buf)?;
        buf.extend_from_slice(&self.tpdu);
        Ok(encode_hex(&buf))
    }

    /// Parse the hex form as reported by `+CMGL`/`+CMGR`.
    pub fn from_hex(hex: &str) -> Result<Self, PduError> {
        let octets = decode_hex(hex.trim())?;
        let mut cursor = Cursor::new(octets.as_slice());
        let smsc = Address::decode_smsc(&mut cursor)?;
        let offset = cursor.position() as usize;
        Ok(PduFrame {
            smsc,
            tpdu: Bytes::copy_from_slice(&octets[offset..]),
        })
    }
}

/// Uppercase hex, no separators.
pub fn encode_hex(octets: &[u8]) -> String {
    let mut out = String::with_capacity(octets.len() * 2);
    for octet in octets {
        out.push(hex_digit(octet >> 4));
        out.push(hex_digit(octet & 0x0F));
    }
    out
}

/// Inverse of [`encode_hex`]; accepts either case.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, PduError> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(PduError::BadPdu("hex string has odd length"));
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let high = hex_value(pair[0])?;
        let low = hex_value(pair[1])?;
        out.push(high << 4 | low);
    }
    Ok(out)
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

fn hex_value(digit: u8) -> Result<u8, PduError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        _ => Err(PduError::BadPdu("invalid hex digit")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::dcs::Dcs;
    use crate::pdu::submit::Submit;
    use crate::pdu::user_data::UserData;

    fn hello_submit() -> Tpdu {
        let dcs = Dcs::gsm7();
        let user_data = UserData::from_text("hello", &dcs).unwrap();
        Tpdu::Submit(Submit::new(Address::new("+8613800138000"), dcs, user_data))
    }

    #[test]
    fn default_smsc_prefix_is_double_zero() {
        let frame = PduFrame::new(&hello_submit()).unwrap();
        assert_eq!(frame.tpdu_len(), 19);
        assert_eq!(
            frame.to_hex().unwrap(),
            "0001000D91683108108300F0000005E8329BFD06"
        );
    }

    #[test]
    fn hex_round_trip_preserves_smsc() {
        let frame =
            PduFrame::with_smsc(&hello_submit(), Address::new("+8613800500")).unwrap();
        let hex = frame.to_hex().unwrap();
        let parsed = PduFrame::from_hex(&hex).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.parse_tpdu().unwrap().text().unwrap(), "hello");
        assert_eq!(parsed.smsc.unwrap().number, "+8613800500");
    }

    #[test]
    fn lowercase_hex_is_accepted() {
        let frame = PduFrame::new(&hello_submit()).unwrap();
        let hex = frame.to_hex().unwrap().to_lowercase();
        let parsed = PduFrame::from_hex(&hex).unwrap();
        assert_eq!(parsed.parse_tpdu().unwrap().text().unwrap(), "hello");
    }

    #[test]
    fn odd_length_hex_is_rejected() {
        assert!(matches!(
            PduFrame::from_hex("00112"),
            Err(PduError::BadPdu(_))
        ));
    }

    #[test]
    fn non_hex_digit_is_rejected() {
        assert!(matches!(decode_hex("0G"), Err(PduError::BadPdu(_))));
    }
}
