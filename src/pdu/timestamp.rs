// ABOUTME: TP-SCTS semi-octet timestamp and TP-VP validity period codecs
// ABOUTME: Timezone is sign-magnitude quarter-hours with the sign in the high bit of the wire octet

use crate::pdu::{decode_octets, decode_u8, Decodable, PduError};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;

/// Service-centre timestamp: seven nibble-swapped semi-octets.
///
/// `year` is the two-digit wire value; [`Scts::full_year`] applies the
/// TS 23.040 window (00-69 maps to 2000-2069, 70-99 to 1970-1999).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Scts {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// UTC offset in quarter-hours, negative for west of Greenwich.
    pub tz_quarters: i8,
}

impl Scts {
    pub const ENCODED_LEN: usize = 7;

    /// Four-digit year under the 1970-2069 window.
    pub fn full_year(&self) -> u16 {
        if self.year < 70 {
            2000 + u16::from(self.year)
        } else {
            1900 + u16::from(self.year)
        }
    }

    /// UTC offset in minutes.
    pub fn offset_minutes(&self) -> i32 {
        i32::from(self.tz_quarters) * 15
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        for value in [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ] {
            if value > 99 {
                return Err(PduError::BadPdu("timestamp field exceeds two digits"));
            }
            buf.put_u8(bcd_swapped(value));
        }
        let magnitude = self.tz_quarters.unsigned_abs();
        if magnitude > 99 {
            return Err(PduError::BadPdu("timezone offset exceeds two digits"));
        }
        let mut tz = bcd_swapped(magnitude);
        if self.tz_quarters < 0 {
            tz |= 0x80;
        }
        buf.put_u8(tz);
        Ok(())
    }
}

impl Decodable for Scts {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, PduError> {
        let octets = decode_octets(buf, Self::ENCODED_LEN, "service centre timestamp")?;
        let mut fields = [0u8; 6];
        for (field, &octet) in fields.iter_mut().zip(&octets) {
            *field = bcd_unswapped(octet, "timestamp digit")?;
        }
        let tz_octet = octets[6];
        let magnitude = bcd_unswapped(tz_octet & 0x7F, "timezone digit")?;
        let tz_quarters = if tz_octet & 0x80 != 0 {
            -(magnitude as i8)
        } else {
            magnitude as i8
        };
        Ok(Scts {
            year: fields[0],
            month: fields[1],
            day: fields[2],
            hour: fields[3],
            minute: fields[4],
            second: fields[5],
            tz_quarters,
        })
    }
}

impl fmt::Display for Scts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.full_year(),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second
        )
    }
}

/// Two-digit value as a nibble-swapped BCD octet: units in the high nibble.
fn bcd_swapped(value: u8) -> u8 {
    (value % 10) << 4 | value / 10
}

fn bcd_unswapped(octet: u8, field: &'static str) -> Result<u8, PduError> {
    let high = octet >> 4;
    let low = octet & 0x0F;
    if high > 9 || low > 9 {
        return Err(PduError::BadPdu(field));
    }
    Ok(low * 10 + high)
}

/// TP-VP in its four TP-VPF forms.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ValidityPeriod {
    /// VPF 00: no validity period field.
    #[default]
    None,
    /// VPF 10: one octet, encoded per TS 23.040 §9.2.3.12.3 exactly as
    /// supplied by the caller.
    Relative(u8),
    /// VPF 01: seven octets of enhanced format.
    Enhanced([u8; 7]),
    /// VPF 11: seven octets of absolute (semi-octet timestamp) format.
    Absolute([u8; 7]),
}

impl ValidityPeriod {
    /// The two TP-VPF bits (bits 4-3 of the SUBMIT first octet).
    pub fn format_bits(&self) -> u8 {
        match self {
            ValidityPeriod::None => 0b00,
            ValidityPeriod::Enhanced(_) => 0b01,
            ValidityPeriod::Relative(_) => 0b10,
            ValidityPeriod::Absolute(_) => 0b11,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            ValidityPeriod::None => {}
            ValidityPeriod::Relative(octet) => buf.put_u8(*octet),
            ValidityPeriod::Enhanced(octets) | ValidityPeriod::Absolute(octets) => {
                buf.put_slice(octets)
            }
        }
    }

    pub fn decode(buf: &mut Cursor<&[u8]>, format_bits: u8) -> Result<Self, PduError> {
        match format_bits {
            0b00 => Ok(ValidityPeriod::None),
            0b10 => Ok(ValidityPeriod::Relative(decode_u8(
                buf,
                "relative validity period",
            )?)),
            0b01 | 0b11 => {
                let octets = decode_octets(buf, 7, "validity period")?;
                let mut array = [0u8; 7];
                array.copy_from_slice(&octets);
                if format_bits == 0b01 {
                    Ok(ValidityPeriod::Enhanced(array))
                } else {
                    Ok(ValidityPeriod::Absolute(array))
                }
            }
            _ => Err(PduError::BadPdu("invalid validity period format")),
        }
    }
}
