// ABOUTME: Voice-call accessors - dial/answer/hangup and supplementary service queries

use crate::device::{parse_int, AtResult, Device};
use crate::line;

/// One entry of the `+CLCC` current-call list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallInfo {
    /// Call identifier.
    pub id: i32,
    /// 0 mobile originated, 1 mobile terminated.
    pub direction: i32,
    /// 0 active, 1 held, 2 dialling, 3 alerting, 4 incoming.
    pub status: i32,
    /// 0 voice, 1 data, 2 fax.
    pub mode: i32,
    /// Multiparty flag.
    pub multiparty: i32,
    /// Remote party number.
    pub number: String,
    /// Address type octet (129 national, 145 international).
    pub number_type: i32,
}

impl Device {
    /// Dial `number` as a voice call.
    pub async fn dial(&self, number: &str) -> AtResult<()> {
        let command = format!("{}{};", self.commands.dial, number);
        self.send_expect(&command, "OK").await
    }

    /// Answer an incoming call.
    pub async fn answer(&self) -> AtResult<()> {
        self.send_expect(&self.commands.answer, "OK").await
    }

    /// Hang up the active call.
    pub async fn hangup(&self) -> AtResult<()> {
        self.send_expect(&self.commands.hangup, "OK").await
    }

    /// Whether calling line identification is presented (`+CLIP?`).
    pub async fn caller_id(&self) -> AtResult<bool> {
        let command = format!("{}?", self.commands.caller_id);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(parse_int(&params[0]) == 1)
    }

    /// Enable or disable calling line identification.
    pub async fn set_caller_id(&self, enable: bool) -> AtResult<()> {
        let command = format!("{}={}", self.commands.caller_id, i32::from(enable));
        self.send_expect(&command, "OK").await
    }

    /// The current call list from `+CLCC`; empty when no call exists.
    pub async fn call_state(&self) -> AtResult<Vec<CallInfo>> {
        let lines = self.send(&self.commands.call_state).await?;
        let label = line::command_label(&self.commands.call_state).unwrap_or_default();

        let mut calls = Vec::new();
        for candidate in &lines {
            let (candidate_label, params) = line::parse_params(candidate);
            if candidate_label != label || params.len() < 7 {
                continue;
            }
            calls.push(CallInfo {
                id: parse_int(&params[0]),
                direction: parse_int(&params[1]),
                status: parse_int(&params[2]),
                mode: parse_int(&params[3]),
                multiparty: parse_int(&params[4]),
                number: params[5].clone(),
                number_type: parse_int(&params[6]),
            });
        }
        Ok(calls)
    }

    /// Whether call waiting is active for voice (`+CCWA?`).
    pub async fn call_waiting(&self) -> AtResult<bool> {
        let command = format!("{}?", self.commands.call_wait);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 2)?;
        Ok(parse_int(&params[1]) == 1)
    }

    /// Enable or disable call waiting.
    pub async fn set_call_waiting(&self, enable: bool) -> AtResult<()> {
        let command = format!("{}=0,,{}", self.commands.call_wait, i32::from(enable));
        self.send_expect(&command, "OK").await
    }

    /// Call forwarding state for `reason` (0 unconditional, 1 busy, 2 no
    /// reply, 3 not reachable); returns `(enabled, number)`.
    pub async fn call_forwarding(&self, reason: i32) -> AtResult<(bool, String)> {
        let command = format!("{}={},2", self.commands.call_forward, reason);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 2)?;
        let number = params.get(2).cloned().unwrap_or_default();
        Ok((parse_int(&params[0]) == 1, number))
    }

    /// Configure call forwarding for `reason` to `number`.
    pub async fn set_call_forwarding(&self, reason: i32, enable: bool, number: &str) -> AtResult<()> {
        let mode = if enable { 3 } else { 0 };
        let command = format!(
            "{}={},{},\"{}\"",
            self.commands.call_forward, reason, mode, number
        );
        self.send_expect(&command, "OK").await
    }
}
