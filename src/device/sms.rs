// ABOUTME: SMS workflows over the dispatcher - PDU-mode send with prompt, list with reassembly

use crate::device::{parse_int, AtError, AtResult, Device};
use crate::line;
use crate::pdu::frame::{PduFrame, CTRL_Z};
use crate::pdu::tpdu::Tpdu;
use crate::pdu::Address;
use crate::sms::{self, Collector, EncodingHint};
use std::collections::HashMap;

/// Message format selected with `+CMGF`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SmsFormat {
    Pdu = 0,
    Text = 1,
}

/// A received message, possibly reassembled from several stored segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsMessage {
    /// The peer's number in host representation.
    pub number: String,
    /// Decoded message text.
    pub text: String,
    /// Service-centre timestamp of the first segment, empty when absent.
    pub time: String,
    /// Storage index of the first segment.
    pub index: i32,
    /// Storage indices of every segment, in arrival order.
    pub indices: Vec<i32>,
    /// The `<stat>` parameter as reported by the modem.
    pub status: String,
}

/// Preferred message storage report from `+CPMS?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsStorage {
    pub read_store: (String, i32, i32),
    pub write_store: (String, i32, i32),
    pub receive_store: (String, i32, i32),
}

impl Device {
    /// Select PDU or text mode with `+CMGF`.
    pub async fn set_sms_format(&self, format: SmsFormat) -> AtResult<()> {
        let command = format!("{}={}", self.commands.sms_format, format as i32);
        self.send_expect(&command, "OK").await
    }

    /// The current message format (0 PDU, 1 text).
    pub async fn sms_format(&self) -> AtResult<i32> {
        let command = format!("{}?", self.commands.sms_format);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(parse_int(&params[0]))
    }

    /// Select the preferred storages for reading, writing and receiving.
    pub async fn set_sms_storage(&self, read: &str, write: &str, receive: &str) -> AtResult<()> {
        let command = format!(
            "{}=\"{}\",\"{}\",\"{}\"",
            self.commands.sms_store, read, write, receive
        );
        self.send_expect(&command, "OK").await
    }

    /// The storage configuration and fill levels from `+CPMS?`.
    pub async fn sms_storage(&self) -> AtResult<SmsStorage> {
        let command = format!("{}?", self.commands.sms_store);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 9)?;
        Ok(SmsStorage {
            read_store: (params[0].clone(), parse_int(&params[1]), parse_int(&params[2])),
            write_store: (params[3].clone(), parse_int(&params[4]), parse_int(&params[5])),
            receive_store: (params[6].clone(), parse_int(&params[7]), parse_int(&params[8])),
        })
    }

    /// The service-centre address and its type from `+CSCA?`.
    pub async fn sms_centre(&self) -> AtResult<(String, i32)> {
        let command = format!("{}?", self.commands.sms_centre);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 2)?;
        Ok((params[0].clone(), parse_int(&params[1])))
    }

    /// Set the service-centre address.
    pub async fn set_sms_centre(&self, number: &str) -> AtResult<()> {
        let command = format!("{}=\"{}\"", self.commands.sms_centre, number);
        self.send_expect(&command, "OK").await
    }

    /// Send a text message in PDU mode, segmenting long payloads
    /// automatically. The device must be in PDU format.
    ///
    /// For each segment the dispatcher issues `+CMGS=<tpdu-len>`, waits
    /// for the `>` prompt as a final result, then writes the hex frame
    /// committed with Ctrl-Z. Network submission is slow, so both steps
    /// run under the SMS deadline.
    pub async fn send_sms(&self, number: &str, text: &str) -> AtResult<()> {
        self.send_sms_hint(number, text.as_bytes(), EncodingHint::Auto)
            .await
    }

    /// [`Device::send_sms`] with an explicit alphabet choice.
    pub async fn send_sms_hint(
        &self,
        number: &str,
        payload: &[u8],
        hint: EncodingHint,
    ) -> AtResult<()> {
        let destination = Address::new(number);
        let submits = self.segmenter.segment(payload, &destination, hint)?;
        let total = submits.len();

        for (i, submit) in submits.into_iter().enumerate() {
            let frame = PduFrame::new(&Tpdu::Submit(submit))?;
            let command = format!("{}={}", self.commands.send_sms, frame.tpdu_len());
            self.send_expect_with_timeout(&command, ">", self.sms_timeout)
                .await?;

            let payload = format!("{}{}", frame.to_hex()?, CTRL_Z);
            let lines = self.send_with_timeout(&payload, self.sms_timeout).await?;
            if !lines.iter().any(|l| self.is_success_line(l)) {
                tracing::warn!(segment = i + 1, total, "message submission rejected");
                return Err(AtError::UnexpectedResponse {
                    expected: "OK".to_string(),
                    lines,
                });
            }
        }
        Ok(())
    }

    /// List stored messages with `+CMGL=<stat>` (4 lists all), parsing the
    /// PDU of each entry and reassembling concatenated messages. Entries
    /// whose PDU cannot be decoded are logged and skipped; the returned
    /// order is the modem's.
    pub async fn list_sms(&self, stat: i32) -> AtResult<Vec<SmsMessage>> {
        let command = format!("{}={}", self.commands.list_sms, stat);
        let lines = self.send_with_timeout(&command, self.sms_timeout).await?;
        let label = line::command_label(&self.commands.list_sms).unwrap_or_default();

        let collector = Collector::new();
        let mut indices: HashMap<u32, Vec<i32>> = HashMap::new();
        let mut messages = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let (entry_label, params) = line::parse_params(&lines[i]);
            i += 1;
            if entry_label != label || params.len() < 2 {
                continue;
            }
            // The PDU hex is the line after the +CMGL header.
            let Some(pdu_hex) = lines.get(i) else { break };
            i += 1;

            let tpdu = match PduFrame::from_hex(pdu_hex).and_then(|f| f.parse_tpdu()) {
                Ok(tpdu) => tpdu,
                Err(error) => {
                    tracing::warn!(%error, line = %pdu_hex, "skipping undecodable stored message");
                    continue;
                }
            };

            let index = parse_int(&params[0]);
            let group = tpdu
                .concatenation()
                .map(|c| u32::from(c.reference))
                .unwrap_or(0x1_0000 + index as u32);
            indices.entry(group).or_default().push(index);

            let segments = match collector.collect(tpdu) {
                Ok(segments) => segments,
                Err(error) => {
                    tracing::warn!(%error, index, "skipping stored segment");
                    continue;
                }
            };
            if segments.is_empty() {
                continue;
            }

            let text = match sms::assemble_text(&segments) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(%error, index, "skipping undecodable message text");
                    continue;
                }
            };
            let group_indices = indices.remove(&group).unwrap_or_default();
            messages.push(SmsMessage {
                number: segments[0].peer().number.clone(),
                text,
                time: segments[0]
                    .timestamp()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                index: group_indices.first().copied().unwrap_or(index),
                indices: group_indices,
                status: params[1].clone(),
            });
        }
        Ok(messages)
    }

    /// Read one stored message with `+CMGR=<index>`. A segment of a longer
    /// message decodes to that segment's text only.
    pub async fn read_sms(&self, index: i32) -> AtResult<SmsMessage> {
        let command = format!("{}={}", self.commands.read_sms, index);
        let lines = self.send(&command).await?;
        let label = line::command_label(&self.commands.read_sms).unwrap_or_default();

        let mut i = 0;
        while i < lines.len() {
            let (entry_label, params) = line::parse_params(&lines[i]);
            i += 1;
            if entry_label != label || params.is_empty() {
                continue;
            }
            let Some(pdu_hex) = lines.get(i) else { break };

            let tpdu = PduFrame::from_hex(pdu_hex)?.parse_tpdu()?;
            return Ok(SmsMessage {
                number: tpdu.peer().number.clone(),
                text: tpdu.text()?,
                time: tpdu.timestamp().map(ToString::to_string).unwrap_or_default(),
                index,
                indices: vec![index],
                status: params[0].clone(),
            });
        }
        Err(AtError::UnexpectedResponse {
            expected: label,
            lines,
        })
    }

    /// Delete the stored messages at `indices`, one `+CMGD` each.
    pub async fn delete_sms(&self, indices: &[i32]) -> AtResult<()> {
        for index in indices {
            let command = format!("{}={}", self.commands.delete_sms, index);
            self.send(&command).await?;
        }
        Ok(())
    }

    /// Delete every stored message (`+CMGD=1,4`).
    pub async fn delete_all_sms(&self) -> AtResult<()> {
        let command = format!("{}=1,4", self.commands.delete_sms);
        self.send_expect(&command, "OK").await
    }

    fn is_success_line(&self, line: &str) -> bool {
        self.shared_responses().is_success(line)
    }
}
