// ABOUTME: The TPDU tagged variant with first-octet dispatch between the three message types

use crate::pdu::address::Address;
use crate::pdu::dcs::Dcs;
use crate::pdu::deliver::Deliver;
use crate::pdu::status_report::StatusReport;
use crate::pdu::submit::Submit;
use crate::pdu::timestamp::Scts;
use crate::pdu::udh::{Concatenation, UserDataHeader};
use crate::pdu::user_data::UserData;
use crate::pdu::{decode_u8, Encodable, PduError};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// An SMS transfer-layer protocol data unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tpdu {
    Submit(Submit),
    Deliver(Deliver),
    StatusReport(StatusReport),
}

impl Tpdu {
    /// Parse a complete TPDU octet string. Trailing octets beyond the
    /// message are rejected; a codec that tolerated them could not satisfy
    /// the serialise/parse round-trip law.
    pub fn parse(bytes: &[u8]) -> Result<Tpdu, PduError> {
        let mut buf = Cursor::new(bytes);
        let first_octet = decode_u8(&mut buf, "first octet")?;

        let tpdu = match first_octet & 0x03 {
            0b00 => Tpdu::Deliver(Deliver::parse_after_first_octet(first_octet, &mut buf)?),
            0b01 => Tpdu::Submit(Submit::parse_after_first_octet(first_octet, &mut buf)?),
            0b10 => {
                Tpdu::StatusReport(StatusReport::parse_after_first_octet(first_octet, &mut buf)?)
            }
            mti => return Err(PduError::UnknownMessageType(mti)),
        };

        if buf.has_remaining() {
            return Err(PduError::BadPdu("trailing octets after user data"));
        }
        Ok(tpdu)
    }

    /// The other party of the message: originator for DELIVER, destination
    /// for SUBMIT, recipient for STATUS-REPORT.
    pub fn peer(&self) -> &Address {
        match self {
            Tpdu::Submit(submit) => &submit.destination,
            Tpdu::Deliver(deliver) => &deliver.originator,
            Tpdu::StatusReport(report) => &report.recipient,
        }
    }

    /// The user data header, when one is present.
    pub fn udh(&self) -> Option<&UserDataHeader> {
        match self {
            Tpdu::Submit(submit) => submit.udh.as_ref(),
            Tpdu::Deliver(deliver) => deliver.udh.as_ref(),
            Tpdu::StatusReport(report) => report.udh.as_ref(),
        }
    }

    /// Concatenation parameters, when the UDH carries them.
    pub fn concatenation(&self) -> Option<Concatenation> {
        self.udh().and_then(UserDataHeader::concatenation)
    }

    /// The effective data coding scheme.
    pub fn dcs(&self) -> Dcs {
        match self {
            Tpdu::Submit(submit) => submit.dcs,
            Tpdu::Deliver(deliver) => deliver.dcs,
            Tpdu::StatusReport(report) => report.dcs.unwrap_or_default(),
        }
    }

    /// The user data payload, when one is present.
    pub fn user_data(&self) -> Option<&UserData> {
        match self {
            Tpdu::Submit(submit) => Some(&submit.user_data),
            Tpdu::Deliver(deliver) => Some(&deliver.user_data),
            Tpdu::StatusReport(report) => report.user_data.as_ref(),
        }
    }

    /// The service-centre timestamp, for message types that carry one.
    pub fn timestamp(&self) -> Option<&Scts> {
        match self {
            Tpdu::Submit(_) => None,
            Tpdu::Deliver(deliver) => Some(&deliver.timestamp),
            Tpdu::StatusReport(report) => Some(&report.timestamp),
        }
    }

    /// Decode the user data to text; empty when there is no payload.
    pub fn text(&self) -> Result<String, PduError> {
        match self.user_data() {
            Some(user_data) => user_data.text(&self.dcs()),
            None => Ok(String::new()),
        }
    }
}

impl Encodable for Tpdu {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        match self {
            Tpdu::Submit(submit) => submit.encode(buf),
            Tpdu::Deliver(deliver) => deliver.encode(buf),
            Tpdu::StatusReport(report) => report.encode(buf),
        }
    }
}
