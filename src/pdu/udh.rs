// ABOUTME: User-Data-Header codec - information elements and the two concatenation variants
// ABOUTME: Unknown IEIs are preserved opaquely per TS 23.040, malformed lengths fail

use crate::pdu::{decode_octets, decode_u8, Decodable, PduError};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// Concatenation with 8-bit reference (ref, total, seq).
pub const IEI_CONCAT_8: u8 = 0x00;
/// Concatenation with 16-bit reference (ref-hi, ref-lo, total, seq).
pub const IEI_CONCAT_16: u8 = 0x08;

/// A single information element: identifier plus up to 255 octets of data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InformationElement {
    pub id: u8,
    pub data: Vec<u8>,
}

/// Concatenation parameters extracted from a UDH. Sequence numbers are
/// 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Concatenation {
    pub reference: u16,
    pub total: u8,
    pub sequence: u8,
    /// True when the reference came from the 16-bit element (IEI 0x08).
    pub wide_reference: bool,
}

/// The optional header at the front of the TP-UD field.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct UserDataHeader {
    pub elements: Vec<InformationElement>,
}

impl UserDataHeader {
    /// Header carrying an 8-bit concatenation element.
    pub fn concat8(reference: u8, total: u8, sequence: u8) -> Self {
        UserDataHeader {
            elements: vec![InformationElement {
                id: IEI_CONCAT_8,
                data: vec![reference, total, sequence],
            }],
        }
    }

    /// Header carrying a 16-bit concatenation element.
    pub fn concat16(reference: u16, total: u8, sequence: u8) -> Self {
        let [hi, lo] = reference.to_be_bytes();
        UserDataHeader {
            elements: vec![InformationElement {
                id: IEI_CONCAT_16,
                data: vec![hi, lo, total, sequence],
            }],
        }
    }

    /// First recognisable concatenation element, if any. Elements whose data
    /// length does not match the variant are ignored.
    pub fn concatenation(&self) -> Option<Concatenation> {
        for element in &self.elements {
            match (element.id, element.data.as_slice()) {
                (IEI_CONCAT_8, &[reference, total, sequence]) => {
                    return Some(Concatenation {
                        reference: u16::from(reference),
                        total,
                        sequence,
                        wide_reference: false,
                    });
                }
                (IEI_CONCAT_16, &[hi, lo, total, sequence]) => {
                    return Some(Concatenation {
                        reference: u16::from_be_bytes([hi, lo]),
                        total,
                        sequence,
                        wide_reference: true,
                    });
                }
                _ => {}
            }
        }
        None
    }

    /// Total encoded length including the UDHL octet.
    pub fn encoded_len(&self) -> usize {
        1 + self
            .elements
            .iter()
            .map(|e| 2 + e.data.len())
            .sum::<usize>()
    }

    /// Encode as `UDHL || (IEI || IEDL || IED)*`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        let udhl = self.encoded_len() - 1;
        if udhl > 0xFF {
            return Err(PduError::BadUdh("header exceeds 255 octets"));
        }
        buf.put_u8(udhl as u8);
        for element in &self.elements {
            if element.data.len() > 0xFF {
                return Err(PduError::BadUdh("information element exceeds 255 octets"));
            }
            buf.put_u8(element.id);
            buf.put_u8(element.data.len() as u8);
            buf.put_slice(&element.data);
        }
        Ok(())
    }
}

impl Decodable for UserDataHeader {
    /// Decode a header, consuming exactly UDHL+1 octets from the cursor.
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, PduError> {
        let udhl = decode_u8(buf, "user data header length")?;
        let body = decode_octets(buf, usize::from(udhl), "user data header")
            .map_err(|_| PduError::BadUdh("header overruns user data"))?;

        let mut elements = Vec::new();
        let mut i = 0;
        while i < body.len() {
            if i + 2 > body.len() {
                return Err(PduError::BadUdh("truncated information element header"));
            }
            let id = body[i];
            let len = usize::from(body[i + 1]);
            if i + 2 + len > body.len() {
                return Err(PduError::BadUdh("information element overruns header"));
            }
            elements.push(InformationElement {
                id,
                data: body[i + 2..i + 2 + len].to_vec(),
            });
            i += 2 + len;
        }
        Ok(UserDataHeader { elements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat8_known_octets() {
        let udh = UserDataHeader::concat8(0x42, 2, 1);
        let mut buf = BytesMut::new();
        udh.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x05, 0x00, 0x03, 0x42, 0x02, 0x01]);
    }

    #[test]
    fn concat16_round_trip() {
        let udh = UserDataHeader::concat16(0x1234, 3, 2);
        let mut buf = BytesMut::new();
        udh.encode(&mut buf).unwrap();
        let decoded = UserDataHeader::decode(&mut Cursor::new(buf.as_ref())).unwrap();
        assert_eq!(decoded, udh);

        let concat = decoded.concatenation().unwrap();
        assert_eq!(concat.reference, 0x1234);
        assert_eq!(concat.total, 3);
        assert_eq!(concat.sequence, 2);
        assert!(concat.wide_reference);
    }

    #[test]
    fn unknown_elements_are_preserved() {
        let data: &[u8] = &[0x09, 0x24, 0x01, 0xAA, 0x00, 0x03, 0x07, 0x02, 0x01];
        let udh = UserDataHeader::decode(&mut Cursor::new(data)).unwrap();
        assert_eq!(udh.elements.len(), 2);
        assert_eq!(udh.elements[0].id, 0x24);

        // The concatenation element is still found behind the unknown one.
        let concat = udh.concatenation().unwrap();
        assert_eq!(concat.reference, 0x07);
    }

    #[test]
    fn element_overrunning_header_is_rejected() {
        let data: &[u8] = &[0x05, 0x00, 0x07, 0x42, 0x02, 0x01];
        let result = UserDataHeader::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(PduError::BadUdh(_))));
    }

    #[test]
    fn truncated_element_header_is_rejected() {
        let data: &[u8] = &[0x01, 0x00];
        let result = UserDataHeader::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(PduError::BadUdh(_))));
    }

    #[test]
    fn mismatched_concat_length_is_not_concatenation() {
        let udh = UserDataHeader {
            elements: vec![InformationElement {
                id: IEI_CONCAT_8,
                data: vec![0x42, 0x02],
            }],
        };
        assert!(udh.concatenation().is_none());
    }
}
