// ABOUTME: SMS-SUBMIT TPDU codec (mobile-originated), bit-exact per TS 23.040 §9.2.2.2

use crate::pdu::address::Address;
use crate::pdu::dcs::Dcs;
use crate::pdu::timestamp::ValidityPeriod;
use crate::pdu::udh::UserDataHeader;
use crate::pdu::user_data::{self, UserData};
use crate::pdu::{decode_u8, Decodable, Encodable, PduError};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// A mobile-originated short message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submit {
    /// TP-RD: reject a duplicate of a still-pending message.
    pub reject_duplicates: bool,
    /// TP-SRR: request a status report for this message.
    pub status_report_request: bool,
    /// TP-RP: a reply path is set.
    pub reply_path: bool,
    /// TP-MR, assigned by the mobile; 0 lets the modem pick.
    pub message_reference: u8,
    /// TP-DA.
    pub destination: Address,
    /// TP-PID.
    pub protocol_id: u8,
    /// TP-DCS.
    pub dcs: Dcs,
    /// TP-VP; the variant selects TP-VPF.
    pub validity: ValidityPeriod,
    /// TP-UDH; presence sets TP-UDHI.
    pub udh: Option<UserDataHeader>,
    /// TP-UD payload.
    pub user_data: UserData,
}

impl Submit {
    const MTI: u8 = 0b01;

    /// A plain submit to `destination` with everything else defaulted.
    pub fn new(destination: Address, dcs: Dcs, user_data: UserData) -> Self {
        Submit {
            reject_duplicates: false,
            status_report_request: false,
            reply_path: false,
            message_reference: 0,
            destination,
            protocol_id: 0,
            dcs,
            validity: ValidityPeriod::None,
            udh: None,
            user_data,
        }
    }

    fn first_octet(&self) -> u8 {
        let mut octet = Self::MTI;
        if self.reject_duplicates {
            octet |= 0x04;
        }
        octet |= self.validity.format_bits() << 3;
        if self.status_report_request {
            octet |= 0x20;
        }
        if self.udh.is_some() {
            octet |= 0x40;
        }
        if self.reply_path {
            octet |= 0x80;
        }
        octet
    }

    /// Parse the fields following an already-consumed SUBMIT first octet.
    pub(crate) fn parse_after_first_octet(
        first_octet: u8,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, PduError> {
        let message_reference = decode_u8(buf, "message reference")?;
        let destination = Address::decode(buf)?;
        let protocol_id = decode_u8(buf, "protocol identifier")?;
        let dcs = Dcs::from_byte(decode_u8(buf, "data coding scheme")?);
        let validity = ValidityPeriod::decode(buf, (first_octet >> 3) & 0x03)?;
        let (udh, user_data) = user_data::decode(buf, &dcs, first_octet & 0x40 != 0)?;

        Ok(Submit {
            reject_duplicates: first_octet & 0x04 != 0,
            status_report_request: first_octet & 0x20 != 0,
            reply_path: first_octet & 0x80 != 0,
            message_reference,
            destination,
            protocol_id,
            dcs,
            validity,
            udh,
            user_data,
        })
    }
}

impl Encodable for Submit {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        buf.put_u8(self.first_octet());
        buf.put_u8(self.message_reference);
        self.destination.encode(buf)?;
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.dcs.to_byte());
        self.validity.encode(buf);
        user_data::encode(buf, &self.dcs, self.udh.as_ref(), &self.user_data)
    }
}
