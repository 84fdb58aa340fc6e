// ABOUTME: TS 23.038 data coding scheme byte - alphabet selection, message class, flash
// ABOUTME: Compression is never asserted on the wire

use num_enum::TryFromPrimitive;

/// Character alphabet selected by the data coding scheme.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Alphabet {
    /// GSM 7-bit default alphabet, septet packed.
    #[default]
    Gsm7,
    /// 8-bit data, passed through opaquely.
    EightBit,
    /// UCS-2, big-endian UTF-16 code units.
    Ucs2,
}

/// Message class per TS 23.038 §4. Class 0 is displayed immediately and not
/// stored (a "flash" message).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Flash = 0,
    MobileEquipment = 1,
    SimSpecific = 2,
    TerminalEquipment = 3,
}

/// Decoded TP-DCS value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Dcs {
    pub alphabet: Alphabet,
    pub class: Option<MessageClass>,
}

impl Dcs {
    /// GSM 7-bit, no message class.
    pub fn gsm7() -> Self {
        Dcs {
            alphabet: Alphabet::Gsm7,
            class: None,
        }
    }

    /// UCS-2, no message class.
    pub fn ucs2() -> Self {
        Dcs {
            alphabet: Alphabet::Ucs2,
            class: None,
        }
    }

    /// 8-bit data, no message class.
    pub fn eight_bit() -> Self {
        Dcs {
            alphabet: Alphabet::EightBit,
            class: None,
        }
    }

    /// Flash variant of this coding (class 0).
    pub fn flash(self) -> Self {
        Dcs {
            class: Some(MessageClass::Flash),
            ..self
        }
    }

    /// Whether this message should be displayed immediately.
    pub fn is_flash(&self) -> bool {
        self.class == Some(MessageClass::Flash)
    }

    /// Interpret a TP-DCS byte: bits 3-2 select the alphabet, bit 4 flags a
    /// message class carried in bits 1-0.
    pub fn from_byte(value: u8) -> Self {
        let alphabet = match value & 0x0C {
            0x08 => Alphabet::Ucs2,
            0x04 => Alphabet::EightBit,
            _ => Alphabet::Gsm7,
        };
        let class = if value & 0x10 != 0 {
            MessageClass::try_from(value & 0x03).ok()
        } else {
            None
        };
        Dcs { alphabet, class }
    }

    /// Produce the TP-DCS byte. Compression is always clear.
    pub fn to_byte(&self) -> u8 {
        let alphabet = match self.alphabet {
            Alphabet::Gsm7 => 0x00,
            Alphabet::EightBit => 0x04,
            Alphabet::Ucs2 => 0x08,
        };
        match self.class {
            Some(class) => alphabet | 0x10 | class as u8,
            None => alphabet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_bits() {
        assert_eq!(Dcs::from_byte(0x00).alphabet, Alphabet::Gsm7);
        assert_eq!(Dcs::from_byte(0x04).alphabet, Alphabet::EightBit);
        assert_eq!(Dcs::from_byte(0x08).alphabet, Alphabet::Ucs2);
    }

    #[test]
    fn flash_is_class_zero() {
        let dcs = Dcs::from_byte(0x10);
        assert!(dcs.is_flash());
        assert_eq!(dcs.alphabet, Alphabet::Gsm7);

        let dcs = Dcs::from_byte(0x18);
        assert!(dcs.is_flash());
        assert_eq!(dcs.alphabet, Alphabet::Ucs2);
    }

    #[test]
    fn byte_round_trip() {
        for value in [0x00u8, 0x04, 0x08, 0x10, 0x11, 0x18, 0x1B] {
            assert_eq!(Dcs::from_byte(value).to_byte(), value, "value {value:#04x}");
        }
    }

    #[test]
    fn no_class_encodes_without_bit_four() {
        assert_eq!(Dcs::ucs2().to_byte(), 0x08);
        assert_eq!(Dcs::gsm7().to_byte(), 0x00);
        assert_eq!(Dcs::gsm7().flash().to_byte(), 0x10);
    }
}
