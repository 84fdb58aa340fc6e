// ABOUTME: SMS-STATUS-REPORT TPDU codec per TS 23.040 §9.2.2.3
// ABOUTME: Mandatory delivery outcome fields plus the TP-PI optional extension

use crate::pdu::address::Address;
use crate::pdu::dcs::Dcs;
use crate::pdu::timestamp::Scts;
use crate::pdu::udh::UserDataHeader;
use crate::pdu::user_data::{self, UserData};
use crate::pdu::{decode_u8, Decodable, Encodable, PduError};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Delivery outcome for a previously submitted message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// TP-MMS inverted, as for DELIVER.
    pub more_messages: bool,
    /// TP-LP.
    pub loop_prevention: bool,
    /// TP-SRQ: false reports a SUBMIT, true an SMS-COMMAND.
    pub command_report: bool,
    /// TP-MR of the message being reported.
    pub message_reference: u8,
    /// TP-RA: the recipient whose delivery is reported.
    pub recipient: Address,
    /// TP-SCTS of the original submission.
    pub timestamp: Scts,
    /// TP-DT: when the message reached the recipient (or failed).
    pub discharge_time: Scts,
    /// TP-ST status octet; 0x00 is "received by the SME".
    pub status: u8,
    /// TP-PID, when the TP-PI extension carries it.
    pub protocol_id: Option<u8>,
    /// TP-DCS, when the TP-PI extension carries it.
    pub dcs: Option<Dcs>,
    /// TP-UDH, when present inside the optional user data.
    pub udh: Option<UserDataHeader>,
    /// Optional TP-UD.
    pub user_data: Option<UserData>,
}

impl StatusReport {
    const MTI: u8 = 0b10;

    fn first_octet(&self) -> u8 {
        let mut octet = Self::MTI;
        if !self.more_messages {
            octet |= 0x04;
        }
        if self.loop_prevention {
            octet |= 0x08;
        }
        if self.command_report {
            octet |= 0x20;
        }
        if self.udh.is_some() {
            octet |= 0x40;
        }
        octet
    }

    /// Alphabet used for the optional user data when no TP-DCS was carried.
    fn effective_dcs(&self) -> Dcs {
        self.dcs.unwrap_or_default()
    }

    /// Parse the fields following an already-consumed STATUS-REPORT first
    /// octet.
    pub(crate) fn parse_after_first_octet(
        first_octet: u8,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Self, PduError> {
        let message_reference = decode_u8(buf, "message reference")?;
        let recipient = Address::decode(buf)?;
        let timestamp = Scts::decode(buf)?;
        let discharge_time = Scts::decode(buf)?;
        let status = decode_u8(buf, "status")?;

        let mut report = StatusReport {
            more_messages: first_octet & 0x04 == 0,
            loop_prevention: first_octet & 0x08 != 0,
            command_report: first_octet & 0x20 != 0,
            message_reference,
            recipient,
            timestamp,
            discharge_time,
            status,
            protocol_id: None,
            dcs: None,
            udh: None,
            user_data: None,
        };

        if !buf.has_remaining() {
            return Ok(report);
        }

        let pi = decode_u8(buf, "parameter indicator")?;
        if pi & 0x80 != 0 {
            return Err(PduError::BadPdu("parameter indicator extension"));
        }
        if pi & 0x01 != 0 {
            report.protocol_id = Some(decode_u8(buf, "protocol identifier")?);
        }
        if pi & 0x02 != 0 {
            report.dcs = Some(Dcs::from_byte(decode_u8(buf, "data coding scheme")?));
        }
        if pi & 0x04 != 0 {
            let dcs = report.effective_dcs();
            let (udh, user_data) = user_data::decode(buf, &dcs, first_octet & 0x40 != 0)?;
            report.udh = udh;
            report.user_data = Some(user_data);
        }
        Ok(report)
    }
}

impl Encodable for StatusReport {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), PduError> {
        buf.put_u8(self.first_octet());
        buf.put_u8(self.message_reference);
        self.recipient.encode(buf)?;
        self.timestamp.encode(buf)?;
        self.discharge_time.encode(buf)?;
        buf.put_u8(self.status);

        let mut pi = 0u8;
        if self.protocol_id.is_some() {
            pi |= 0x01;
        }
        if self.dcs.is_some() {
            pi |= 0x02;
        }
        if self.user_data.is_some() {
            pi |= 0x04;
        }
        if pi == 0 {
            return Ok(());
        }

        buf.put_u8(pi);
        if let Some(pid) = self.protocol_id {
            buf.put_u8(pid);
        }
        if let Some(dcs) = self.dcs {
            buf.put_u8(dcs.to_byte());
        }
        if let Some(user_data) = &self.user_data {
            user_data::encode(buf, &self.effective_dcs(), self.udh.as_ref(), user_data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::tpdu::Tpdu;

    fn report() -> StatusReport {
        StatusReport {
            more_messages: false,
            loop_prevention: false,
            command_report: false,
            message_reference: 0x2A,
            recipient: Address::new("+8613800138000"),
            timestamp: Scts {
                year: 24,
                month: 5,
                day: 17,
                hour: 10,
                minute: 30,
                second: 5,
                tz_quarters: 32,
            },
            discharge_time: Scts {
                year: 24,
                month: 5,
                day: 17,
                hour: 10,
                minute: 30,
                second: 21,
                tz_quarters: 32,
            },
            status: 0x00,
            protocol_id: None,
            dcs: None,
            udh: None,
            user_data: None,
        }
    }

    #[test]
    fn mandatory_fields_round_trip() {
        let original = report();
        let bytes = original.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x06);

        let decoded = match Tpdu::parse(&bytes).unwrap() {
            Tpdu::StatusReport(decoded) => decoded,
            other => panic!("expected status report, got {other:?}"),
        };
        assert_eq!(decoded, original);
        assert_eq!(decoded.status, 0x00);
    }

    #[test]
    fn optional_fields_round_trip() {
        let mut original = report();
        original.protocol_id = Some(0x00);
        original.dcs = Some(Dcs::gsm7());
        original.user_data = Some(UserData::from_text("delivered", &Dcs::gsm7()).unwrap());

        let bytes = original.to_bytes().unwrap();
        let decoded = match Tpdu::parse(&bytes).unwrap() {
            Tpdu::StatusReport(decoded) => decoded,
            other => panic!("expected status report, got {other:?}"),
        };
        assert_eq!(decoded, original);
    }
}
