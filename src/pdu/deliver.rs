// ABOUTME: SMS-DELIVER TPDU codec (network-originated), bit-exact per TS 23.040 §9.2.2.1

use crate::pdu::address::Address;
use crate::pdu::dcs::Dcs;
use crate::pdu::timestamp::Scts;
use crate::pdu::udh::UserDataHeader;
use crate::pdu::user_data::{self, UserData};
use crate::pdu::{decode_u8, Decodable, Encodable, PduError};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// A short message delivered from the service centre.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deliver {
    /// TP-MMS inverted: true while the service centre holds further
    /// messages (the wire bit is set when there are none).
    pub more_messages: bool,
    /// TP-LP: the message was forwarded or spawned by a loop.
    pub loop_prevention: bool,
    /// TP-SRI: a status report will be returned to the sender.
    pub status_report_indication: bool,
    /// TP-RP: a reply path is set.
    pub reply_path: bool,
    /// TP-OA.
    pub originator: Address,
    /// TP-PID.
    pub protocol_id: u8,
    /// TP-DCS.
    pub dcs: Dcs,
    /// TP-SCTS.
    pub timestamp: Scts,
    /// TP-UDH; presence sets TP-UDHI.
    pub udh: Option<UserDataHeader>,
    /// TP-UD payload.
    pub user_data: UserData,
}

impl Deliver {
    const MTI: u8 = 0b00;

    /// A plain deliver from `originator` with everything else defaulted.
    pub fn new(originator: Address, dcs: Dcs, timestamp: Scts, user_data: UserData) -> Self {
        Deliver {
            more_messages: false,
            loop_prevention: false,
            status_report_indication: false,
            reply_path: false,
            originator,
            protocol_id: 0,
            dcs,
            timestamp,
            udh: None,
            user_data,
        }
    }

    fn first_octet(&self) -> u8 {
        let mut octet = Self::MTI;
        if !self.more_messages {
            octet |= 0x04;
        }
        if self.loop_prevention {
            octet |= 0x08;
        }
        if self.status_report_indication {
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

    /// Parse the fields following an already-consumed DELIVER first octet.
    pub(crate) fn parse_after_first_octet(
        first_octet: u8,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, PduError> {
        let originator = Address::decode(buf)?;
        let protocol_id = decode_u8(buf, "protocol identifier")?;
        let dcs = Dcs::from_byte(decode_u8(buf, "data coding scheme")?);
        let timestamp = Scts::decode(buf)?;
        let (udh, user_data) = user_data::decode(buf, &dcs, first_octet & 0x40 != 0)?;

        Ok(Deliver {
            more_messages: first_octet & 0x04 == 0,
            loop_prevention: first_octet & 0x08 != 0,
            status_report_indication: first_octet & 0x20 != 0,
            reply_path: first_octet & 0x80 != 0,
            originator,
            protocol_id,
            dcs,
            timestamp,
            udh,
            user_data,
        })
    }
}

impl Encodable for Deliver {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        buf.put_u8(self.first_octet());
        self.originator.encode(buf)?;
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.dcs.to_byte());
        self.timestamp.encode(buf)?;
        user_data::encode(buf, &self.dcs, self.udh.as_ref(), &self.user_data)
    }
}
