// ABOUTME: TP-UDL/TP-UD field codec shared by SUBMIT, DELIVER and STATUS-REPORT
// ABOUTME: Applies the deterministic septet alignment rule for GSM 7-bit text behind a UDH

use crate::pdu::alphabet;
use crate::pdu::dcs::{Alphabet, Dcs};
use crate::pdu::udh::UserDataHeader;
use crate::pdu::{decode_octets, decode_u8, Decodable, PduError};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// TP-UD payload in its on-wire unit of account: unpacked septet values for
/// the 7-bit alphabet, raw octets otherwise. Keeping the septets (rather
/// than decoded text) preserves TP-UDL bit-exactly across a parse/serialise
/// round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserData {
    /// GSM 7-bit septet values, including any escape pairs.
    Septets(Vec<u8>),
    /// 8-bit or UCS-2 payload octets.
    Octets(Vec<u8>),
}

impl UserData {
    /// Encode text in the alphabet `dcs` selects.
    pub fn from_text(text: &str, dcs: &Dcs) -> Result<Self, PduError> {
        match dcs.alphabet {
            Alphabet::Gsm7 => Ok(UserData::Septets(alphabet::encode_gsm7(text)?)),
            Alphabet::Ucs2 => Ok(UserData::Octets(alphabet::encode_ucs2(text))),
            Alphabet::EightBit => Ok(UserData::Octets(text.as_bytes().to_vec())),
        }
    }

    /// Payload length in the UDL unit: septets for 7-bit, octets otherwise.
    pub fn len_units(&self) -> usize {
        match self {
            UserData::Septets(septets) => septets.len(),
            UserData::Octets(octets) => octets.len(),
        }
    }

    /// Decode the payload to text under `dcs`. 8-bit data decodes as UTF-8
    /// with replacement characters, matching how listed binary messages are
    /// surfaced.
    pub fn text(&self, dcs: &Dcs) -> Result<String, PduError> {
        match (self, dcs.alphabet) {
            (UserData::Septets(septets), _) => Ok(alphabet::decode_gsm7(septets)),
            (UserData::Octets(octets), Alphabet::Ucs2) => alphabet::decode_ucs2(octets),
            (UserData::Octets(octets), _) => Ok(String::from_utf8_lossy(octets).into_owned()),
        }
    }
}

/// Septets occupied by a header of `udh_octets` total octets, and the
/// padding bits that realign the following text to a septet boundary.
fn udh_septet_geometry(udh_octets: usize) -> (usize, u32) {
    let bits = udh_octets * 8;
    let pad = ((7 - bits % 7) % 7) as u32;
    ((bits + pad as usize) / 7, pad)
}

/// Encode TP-UDL followed by TP-UD (header, padding, payload).
pub fn encode(
    buf: &mut BytesMut,
    dcs: &Dcs,
    udh: Option<&UserDataHeader>,
    user_data: &UserData,
) -> Result<(), PduError> {
    match (dcs.alphabet, user_data) {
        (Alphabet::Gsm7, UserData::Septets(septets)) => {
            let (udh_septets, pad) = match udh {
                Some(udh) => udh_septet_geometry(udh.encoded_len()),
                None => (0, 0),
            };
            let udl = udh_septets + septets.len();
            if udl > 0xFF {
                return Err(PduError::BadPdu("user data exceeds 255 septets"));
            }
            buf.put_u8(udl as u8);
            if let Some(udh) = udh {
                udh.encode(buf)?;
            }
            buf.put_slice(&alphabet::pack_septets(septets, pad));
            Ok(())
        }
        (Alphabet::EightBit | Alphabet::Ucs2, UserData::Octets(octets)) => {
            let udh_octets = udh.map_or(0, UserDataHeader::encoded_len);
            let udl = udh_octets + octets.len();
            if udl > 0xFF {
                return Err(PduError::BadPdu("user data exceeds 255 octets"));
            }
            buf.put_u8(udl as u8);
            if let Some(udh) = udh {
                udh.encode(buf)?;
            }
            buf.put_slice(octets);
            Ok(())
        }
        _ => Err(PduError::BadPdu("user data does not match coding scheme")),
    }
}

/// Decode TP-UDL and TP-UD. `has_udh` is the TP-UDHI flag from the first
/// octet.
pub fn decode(
    buf: &mut Cursor<&[u8]>,
    dcs: &Dcs,
    has_udh: bool,
) -> Result<(Option<UserDataHeader>, UserData), PduError> {
    let udl = usize::from(decode_u8(buf, "user data length")?);

    match dcs.alphabet {
        Alphabet::Gsm7 => {
            let total_octets = alphabet::packed_len(udl, 0);
            let octets = decode_octets(buf, total_octets, "user data")?;
            if !has_udh {
                return Ok((None, UserData::Septets(alphabet::unpack_septets(&octets, udl, 0))));
            }

            let mut cursor = Cursor::new(octets.as_slice());
            let udh = UserDataHeader::decode(&mut cursor)?;
            let consumed = cursor.position() as usize;
            let (udh_septets, pad) = udh_septet_geometry(consumed);
            let text_septets = udl
                .checked_sub(udh_septets)
                .ok_or(PduError::BadPdu("user data length shorter than header"))?;
            let septets = alphabet::unpack_septets(&octets[consumed..], text_septets, pad);
            if septets.len() < text_septets {
                return Err(PduError::BadPdu("user data shorter than declared length"));
            }
            Ok((Some(udh), UserData::Septets(septets)))
        }
        Alphabet::EightBit | Alphabet::Ucs2 => {
            let octets = decode_octets(buf, udl, "user data")?;
            if !has_udh {
                return Ok((None, UserData::Octets(octets)));
            }
            let mut cursor = Cursor::new(octets.as_slice());
            let udh = UserDataHeader::decode(&mut cursor)?;
            let consumed = cursor.position() as usize;
            Ok((Some(udh), UserData::Octets(octets[consumed..].to_vec())))
        }
    }
}
