// ABOUTME: TS 23.038 alphabet codecs - GSM 7-bit default and extension tables, UCS-2
// ABOUTME: Implements septet packing/unpacking with bit-offset support for UDH alignment

use crate::pdu::PduError;
use std::sync::OnceLock;

/// The GSM 7-bit default alphabet (TS 23.038 §6.2.1), indexed by septet value.
/// Position 0x1B is the escape to the extension table.
const GSM7_DEFAULT: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞ\u{1b}ÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

/// Escape septet selecting the extension table for the next septet.
pub const ESCAPE: u8 = 0x1B;

fn default_table() -> &'static [char; 128] {
    static TABLE: OnceLock<[char; 128]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = ['\0'; 128];
        for (i, c) in GSM7_DEFAULT.chars().enumerate() {
            table[i] = c;
        }
        table
    })
}

/// Extension-table code for `c` (TS 23.038 §6.2.1.1), reached via [`ESCAPE`].
fn extension_code(c: char) -> Option<u8> {
    match c {
        '^' => Some(0x14),
        '{' => Some(0x28),
        '}' => Some(0x29),
        '\\' => Some(0x2F),
        '[' => Some(0x3C),
        '~' => Some(0x3D),
        ']' => Some(0x3E),
        '|' => Some(0x40),
        '€' => Some(0x65),
        _ => None,
    }
}

fn extension_char(code: u8) -> Option<char> {
    match code {
        0x14 => Some('^'),
        0x28 => Some('{'),
        0x29 => Some('}'),
        0x2F => Some('\\'),
        0x3C => Some('['),
        0x3D => Some('~'),
        0x3E => Some(']'),
        0x40 => Some('|'),
        0x65 => Some('€'),
        _ => None,
    }
}

/// Septet value(s) for a single character: the default-table septet, or the
/// escape pair when the character lives in the extension table.
pub(crate) fn char_septets(c: char) -> Option<(u8, Option<u8>)> {
    if let Some(code) = extension_code(c) {
        return Some((ESCAPE, Some(code)));
    }
    default_table()
        .iter()
        .position(|&t| t == c)
        .map(|i| (i as u8, None))
}

/// Number of septets `c` occupies, or `None` when it is not encodable.
pub(crate) fn char_cost(c: char) -> Option<usize> {
    char_septets(c).map(|(_, ext)| if ext.is_some() { 2 } else { 1 })
}

/// Encode text to a sequence of unpacked septet values. Extension characters
/// become an escape pair; an unmappable character fails so the caller can
/// fall back to UCS-2.
pub fn encode_gsm7(text: &str) -> Result<Vec<u8>, PduError> {
    let mut septets = Vec::with_capacity(text.len());
    for c in text.chars() {
        let (first, second) = char_septets(c).ok_or(PduError::UnsupportedAlphabet(c))?;
        septets.push(first);
        if let Some(second) = second {
            septets.push(second);
        }
    }
    Ok(septets)
}

/// Decode a sequence of septet values back to text. An escape followed by an
/// unassigned extension code decodes to nothing, matching common modem
/// behaviour for reserved codes.
pub fn decode_gsm7(septets: &[u8]) -> String {
    let table = default_table();
    let mut out = String::with_capacity(septets.len());
    let mut escape = false;
    for &septet in septets {
        if escape {
            if let Some(c) = extension_char(septet) {
                out.push(c);
            }
            escape = false;
        } else if septet == ESCAPE {
            escape = true;
        } else if (septet as usize) < table.len() {
            out.push(table[septet as usize]);
        }
    }
    out
}

/// Pack septet values into octets, little-endian bit order per TS 23.038
/// §6.1.2.1.1. `pad_bits` zero bits are inserted before the first septet so
/// that text following a UDH starts on the next septet boundary.
pub fn pack_septets(septets: &[u8], pad_bits: u32) -> Vec<u8> {
    let mut packed = Vec::with_capacity((septets.len() * 7 + pad_bits as usize + 7) / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = pad_bits;

    for &septet in septets {
        buffer |= u32::from(septet & 0x7F) << bits;
        bits += 7;
        while bits >= 8 {
            packed.push((buffer & 0xFF) as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }

    if bits > 0 {
        packed.push((buffer & 0xFF) as u8);
    }

    packed
}

/// Unpack `count` septet values from packed octets, the exact inverse of
/// [`pack_septets`]. `skip_bits` discards the low-order padding bits of the
/// first octet, per the alignment rule for user data behind a UDH.
pub fn unpack_septets(data: &[u8], count: usize, skip_bits: u32) -> Vec<u8> {
    let mut septets = Vec::with_capacity(count);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i == 0 && skip_bits > 0 {
            buffer |= u32::from(byte) >> skip_bits;
            bits += 8 - skip_bits;
        } else {
            buffer |= u32::from(byte) << bits;
            bits += 8;
        }

        while bits >= 7 && septets.len() < count {
            septets.push((buffer & 0x7F) as u8);
            buffer >>= 7;
            bits -= 7;
        }
        if septets.len() >= count {
            break;
        }
    }

    septets
}

/// Octets needed to carry `septets` septet values after `pad_bits` padding.
pub fn packed_len(septets: usize, pad_bits: u32) -> usize {
    (septets * 7 + pad_bits as usize + 7) / 8
}

/// Encode text as UCS-2: UTF-16 code units serialised big-endian, surrogate
/// pairs preserved.
pub fn encode_ucs2(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode big-endian UCS-2 octets. Unpaired surrogates decode to the
/// replacement character rather than failing.
pub fn decode_ucs2(data: &[u8]) -> Result<String, PduError> {
    if data.len() % 2 != 0 {
        return Err(PduError::BadPdu("UCS-2 user data has odd length"));
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
