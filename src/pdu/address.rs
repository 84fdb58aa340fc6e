// ABOUTME: TS 23.040 address codec - phone numbers as nibble-swapped TBCD with a type-of-address octet
// ABOUTME: Alphanumeric addresses are GSM 7-bit packed without nibble swapping

use crate::pdu::alphabet;
use crate::pdu::{decode_octets, decode_u8, Decodable, PduError};
use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::fmt;
use std::io::Cursor;

/// Type of Number, bits 6-4 of the type-of-address octet.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeOfNumber {
    Unknown = 0b000,
    International = 0b001,
    National = 0b010,
    NetworkSpecific = 0b011,
    SubscriberNumber = 0b100,
    Alphanumeric = 0b101,
    Abbreviated = 0b110,
}

/// Numbering Plan Identification, bits 3-0 of the type-of-address octet.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumberingPlan {
    Unknown = 0b0000,
    Isdn = 0b0001,
    Data = 0b0011,
    Telex = 0b0100,
    LandMobile = 0b0110,
    National = 0b1000,
    Private = 0b1001,
    Ermes = 0b1010,
}

/// An originator, destination or service-centre address.
///
/// `number` holds the host representation: digits with a leading `+` for
/// international numbers (the `+` is never stored in the octets), or the
/// display name for alphanumeric addresses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub ton: TypeOfNumber,
    pub npi: NumberingPlan,
    pub number: String,
}

/// Upper bound on length-in-digits accepted from the wire; TS 23.040 caps
/// the address value at 10 octets (20 semi-octets).
const MAX_ADDRESS_DIGITS: u8 = 20;

impl Address {
    /// Build an address from a dialling string. Digits are kept, everything
    /// else is stripped; a leading `+` selects the international type
    /// (0x91), otherwise the type octet is 0x81.
    pub fn new(number: &str) -> Self {
        let international = number.starts_with('+');
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        let ton = if international {
            TypeOfNumber::International
        } else {
            TypeOfNumber::Unknown
        };
        let display = if international {
            format!("+{digits}")
        } else {
            digits
        };
        Address {
            ton,
            npi: NumberingPlan::Isdn,
            number: display,
        }
    }

    /// Build an alphanumeric address (type octet 0xD0).
    pub fn alphanumeric(name: &str) -> Self {
        Address {
            ton: TypeOfNumber::Alphanumeric,
            npi: NumberingPlan::Unknown,
            number: name.to_string(),
        }
    }

    /// The digits as stored on the wire, without the `+` prefix.
    pub fn digits(&self) -> &str {
        self.number.strip_prefix('+').unwrap_or(&self.number)
    }

    /// The type-of-address octet: bit 7 always set, TON in bits 6-4, NPI in
    /// bits 3-0.
    pub fn type_octet(&self) -> u8 {
        0x80 | (self.ton as u8) << 4 | self.npi as u8
    }

    fn from_type_octet(octet: u8, number: String) -> Result<Self, PduError> {
        let ton = TypeOfNumber::try_from((octet >> 4) & 0x07)
            .map_err(|_| PduError::BadAddress("reserved type of number"))?;
        let npi = NumberingPlan::try_from(octet & 0x0F)
            .map_err(|_| PduError::BadAddress("reserved numbering plan"))?;
        let number = if ton == TypeOfNumber::International {
            format!("+{number}")
        } else {
            number
        };
        Ok(Address { ton, npi, number })
    }

    /// Encode in TP-OA/TP-DA layout: length in digits, type octet, value.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        if self.ton == TypeOfNumber::Alphanumeric {
            let septets = alphabet::encode_gsm7(&self.number)
                .map_err(|_| PduError::BadAddress("alphanumeric address not GSM 7-bit"))?;
            let packed = alphabet::pack_septets(&septets, 0);
            if packed.len() * 2 > usize::from(MAX_ADDRESS_DIGITS) {
                return Err(PduError::BadAddress("address too long"));
            }
            buf.put_u8((packed.len() * 2) as u8);
            buf.put_u8(self.type_octet());
            buf.put_slice(&packed);
            return Ok(());
        }

        let digits = self.digits();
        if digits.len() > usize::from(MAX_ADDRESS_DIGITS) {
            return Err(PduError::BadAddress("address too long"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PduError::BadAddress("address contains non-digits"));
        }
        buf.put_u8(digits.len() as u8);
        buf.put_u8(self.type_octet());
        buf.put_slice(&digits_to_tbcd(digits));
        Ok(())
    }

    /// Encode in SMSC layout: length in octets (type octet + value), then
    /// the address. An absent address encodes as the single octet 0x00,
    /// meaning "use the default service centre".
    pub fn encode_smsc(address: Option<&Address>, buf: &mut BytesMut) -> Result<(), PduError> {
        let Some(address) = address else {
            buf.put_u8(0);
            return Ok(());
        };
        let digits = address.digits();
        if digits.len() > usize::from(MAX_ADDRESS_DIGITS) {
            return Err(PduError::BadAddress("address too long"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PduError::BadAddress("address contains non-digits"));
        }
        let tbcd = digits_to_tbcd(digits);
        buf.put_u8((1 + tbcd.len()) as u8);
        buf.put_u8(address.type_octet());
        buf.put_slice(&tbcd);
        Ok(())
    }

    /// Decode the SMSC layout; `None` means the default service centre.
    pub fn decode_smsc(buf: &mut Cursor<&[u8]>) -> Result<Option<Self>, PduError> {
        let octet_count = decode_u8(buf, "SMSC length")?;
        if octet_count == 0 {
            return Ok(None);
        }
        let type_octet = decode_u8(buf, "SMSC address type")?;
        let octets = decode_octets(buf, usize::from(octet_count) - 1, "SMSC address value")?;

        // The octet form carries no digit count, so a trailing filler
        // nibble marks an odd digit count.
        let mut digit_count = octets.len() * 2;
        if octets.last().is_some_and(|last| last >> 4 == 0xF) {
            digit_count -= 1;
        }
        let number = if (type_octet >> 4) & 0x07 == TypeOfNumber::Alphanumeric as u8 {
            let septets = alphabet::unpack_septets(&octets, octets.len() * 8 / 7, 0);
            alphabet::decode_gsm7(&septets)
        } else {
            tbcd_to_digits(&octets, digit_count)
        };
        Self::from_type_octet(type_octet, number).map(Some)
    }
}

impl Decodable for Address {
    /// Decode from TP-OA/TP-DA layout.
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, PduError> {
        let digit_count = decode_u8(buf, "address length")?;
        if digit_count > MAX_ADDRESS_DIGITS {
            return Err(PduError::BadAddress("address too long"));
        }
        let type_octet = decode_u8(buf, "address type")?;
        let octets = decode_octets(buf, (usize::from(digit_count) + 1) / 2, "address value")?;

        let number = if (type_octet >> 4) & 0x07 == TypeOfNumber::Alphanumeric as u8 {
            let septets = alphabet::unpack_septets(&octets, octets.len() * 8 / 7, 0);
            alphabet::decode_gsm7(&septets)
        } else {
            tbcd_to_digits(&octets, usize::from(digit_count))
        };
        Self::from_type_octet(type_octet, number)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)
    }
}

/// Swap each digit pair into TBCD octets, padding an odd count with 0xF.
fn digits_to_tbcd(digits: &str) -> Vec<u8> {
    let bytes = digits.as_bytes();
    let mut out = Vec::with_capacity((bytes.len() + 1) / 2);
    for pair in bytes.chunks(2) {
        let low = pair[0] - b'0';
        let high = if pair.len() == 2 { pair[1] - b'0' } else { 0xF };
        out.push(high << 4 | low);
    }
    out
}

/// Inverse of [`digits_to_tbcd`], truncated to `digit_count` digits.
fn tbcd_to_digits(octets: &[u8], digit_count: usize) -> String {
    let mut out = String::with_capacity(digit_count);
    for &octet in octets {
        for nibble in [octet & 0x0F, octet >> 4] {
            if out.len() >= digit_count {
                break;
            }
            if let Some(c) = char::from_digit(u32::from(nibble), 16) {
                out.push(c.to_ascii_uppercase());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(address: &Address) -> Address {
        let mut buf = BytesMut::new();
        address.encode(&mut buf).unwrap();
        Address::decode(&mut Cursor::new(buf.as_ref())).unwrap()
    }

    #[test]
    fn international_number_round_trip() {
        let address = Address::new("+8613800138000");
        assert_eq!(address.type_octet(), 0x91);
        assert_eq!(round_trip(&address), address);
    }

    #[test]
    fn local_number_round_trip() {
        let address = Address::new("13800138000");
        assert_eq!(address.type_octet(), 0x81);
        assert_eq!(round_trip(&address), address);
    }

    #[test]
    fn formatting_characters_are_stripped() {
        let address = Address::new("+86 138 0013 8000");
        assert_eq!(address.number, "+8613800138000");
    }

    #[test]
    fn odd_digit_count_round_trip() {
        let address = Address::new("+861380013800");
        assert_eq!(round_trip(&address), address);
    }

    #[test]
    fn known_tbcd_octets() {
        let address = Address::new("+8613800138000");
        let mut buf = BytesMut::new();
        address.encode(&mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            &[0x0D, 0x91, 0x68, 0x31, 0x08, 0x10, 0x83, 0x00, 0xF0]
        );
    }

    #[test]
    fn alphanumeric_round_trip() {
        let address = Address::alphanumeric("INFO");
        let decoded = round_trip(&address);
        assert_eq!(decoded.ton, TypeOfNumber::Alphanumeric);
        assert_eq!(decoded.number, "INFO");
    }

    #[test]
    fn smsc_default_is_single_zero_octet() {
        let mut buf = BytesMut::new();
        Address::encode_smsc(None, &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x00]);
        let decoded = Address::decode_smsc(&mut Cursor::new(buf.as_ref())).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn smsc_round_trip() {
        let address = Address::new("+31624000000");
        let mut buf = BytesMut::new();
        Address::encode_smsc(Some(&address), &mut buf).unwrap();
        let decoded = Address::decode_smsc(&mut Cursor::new(buf.as_ref()))
            .unwrap()
            .unwrap();
        assert_eq!(decoded, address);
    }

    #[test]
    fn smsc_odd_digit_count_round_trip() {
        let address = Address::new("+4912345");
        let mut buf = BytesMut::new();
        Address::encode_smsc(Some(&address), &mut buf).unwrap();
        let decoded = Address::decode_smsc(&mut Cursor::new(buf.as_ref()))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.number, "+4912345");
    }

    #[test]
    fn truncated_address_is_rejected() {
        let data: &[u8] = &[0x0D, 0x91, 0x68];
        let result = Address::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(PduError::BadPdu(_))));
    }

    #[test]
    fn oversized_address_is_rejected() {
        let data: &[u8] = &[0x30, 0x91, 0x68];
        let result = Address::decode(&mut Cursor::new(data));
        assert!(matches!(result, Err(PduError::BadAddress(_))));
    }
}
