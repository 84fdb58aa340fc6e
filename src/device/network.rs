// ABOUTME: Network status and packet-data accessors - thin typed wrappers over Device::send

use crate::device::{parse_int, AtResult, Device};

/// Operator selection state from `+COPS?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorInfo {
    /// 0 automatic, 1 manual, 2 deregistered, 4 manual/automatic.
    pub mode: i32,
    /// 0 long alphanumeric, 1 short alphanumeric, 2 numeric.
    pub format: i32,
    /// Operator name in the reported format.
    pub operator: String,
    /// Access technology: 0 GSM, 2 UTRAN, 7 E-UTRAN, ...
    pub act: i32,
}

/// Registration state from `+CREG?`/`+CGREG?`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationStatus {
    /// URC reporting mode: 0 disabled, 1 enabled, 2 enabled with location.
    pub notify_mode: i32,
    /// 1 registered (home), 5 registered (roaming), 2 searching, 3 denied.
    pub status: i32,
}

impl RegistrationStatus {
    /// Whether the module is registered, home or roaming.
    pub fn is_registered(&self) -> bool {
        self.status == 1 || self.status == 5
    }
}

/// Signal quality from `+CSQ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalQuality {
    /// 0-31 scaled RSSI, 99 unknown.
    pub rssi: i32,
    /// 0-7 bit error rate band, 99 unknown.
    pub ber: i32,
}

impl SignalQuality {
    /// RSSI in dBm, or `None` when unknown.
    pub fn dbm(&self) -> Option<i32> {
        (0..=31).contains(&self.rssi).then(|| -113 + 2 * self.rssi)
    }
}

/// One PDP context definition from `+CGDCONT?`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApnConfig {
    pub cid: i32,
    /// `IP`, `IPV6` or `IPV4V6`.
    pub pdp_type: String,
    pub apn: String,
}

impl Device {
    /// Current operator from `+COPS?`.
    pub async fn operator(&self) -> AtResult<OperatorInfo> {
        let command = format!("{}?", self.commands.operator);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 3)?;
        Ok(OperatorInfo {
            mode: parse_int(&params[0]),
            format: parse_int(&params[1]),
            operator: params[2].clone(),
            act: params.get(3).map(|v| parse_int(v)).unwrap_or(0),
        })
    }

    /// Preferred network mode from `+CNMP?`.
    pub async fn network_mode(&self) -> AtResult<i32> {
        let command = format!("{}?", self.commands.network_mode);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(parse_int(&params[0]))
    }

    /// Select the preferred network mode (2 automatic, 13 GSM only,
    /// 38 LTE only, ...).
    pub async fn set_network_mode(&self, mode: i32) -> AtResult<()> {
        let command = format!("{}={}", self.commands.network_mode, mode);
        self.send_expect(&command, "OK").await
    }

    /// Circuit-switched registration state from `+CREG?`.
    pub async fn network_registration(&self) -> AtResult<RegistrationStatus> {
        let command = format!("{}?", self.commands.network_reg);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 2)?;
        Ok(RegistrationStatus {
            notify_mode: parse_int(&params[0]),
            status: parse_int(&params[1]),
        })
    }

    /// Packet-switched registration state from `+CGREG?`.
    pub async fn gprs_registration(&self) -> AtResult<RegistrationStatus> {
        let command = format!("{}?", self.commands.gprs_reg);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 2)?;
        Ok(RegistrationStatus {
            notify_mode: parse_int(&params[0]),
            status: parse_int(&params[1]),
        })
    }

    /// Signal quality from `+CSQ`.
    pub async fn signal_quality(&self) -> AtResult<SignalQuality> {
        let lines = self.send(&self.commands.signal).await?;
        let params = self.parse_response(&self.commands.signal, &lines, 2)?;
        Ok(SignalQuality {
            rssi: parse_int(&params[0]),
            ber: parse_int(&params[1]),
        })
    }

    /// PDP context definition from `+CGDCONT?`. `cid` 0 returns the first
    /// context.
    pub async fn apn(&self, cid: i32) -> AtResult<ApnConfig> {
        let command = format!("{}?", self.commands.apn);
        let lines = self.send(&command).await?;
        let params = self.parse_response_filtered(&command, &lines, 3, |params| {
            cid == 0 || parse_int(&params[0]) == cid
        })?;
        Ok(ApnConfig {
            cid: parse_int(&params[0]),
            pdp_type: params[1].clone(),
            apn: params[2].clone(),
        })
    }

    /// Define a PDP context.
    pub async fn set_apn(&self, cid: i32, pdp_type: &str, apn: &str) -> AtResult<()> {
        let command = format!("{}={},\"{}\",\"{}\"", self.commands.apn, cid, pdp_type, apn);
        self.send_expect(&command, "OK").await
    }

    /// PDP context activation state from `+CGACT?`; returns `(cid, state)`.
    /// `cid` 0 returns the first context.
    pub async fn pdp_context(&self, cid: i32) -> AtResult<(i32, i32)> {
        let command = format!("{}?", self.commands.pdp_context);
        let lines = self.send(&command).await?;
        let params = self.parse_response_filtered(&command, &lines, 2, |params| {
            cid == 0 || parse_int(&params[0]) == cid
        })?;
        Ok((parse_int(&params[0]), parse_int(&params[1])))
    }

    /// Activate (1) or deactivate (0) a PDP context.
    pub async fn set_pdp_context(&self, cid: i32, state: i32) -> AtResult<()> {
        let command = format!("{}={},{}", self.commands.pdp_context, cid, state);
        self.send_expect(&command, "OK").await
    }

    /// The address assigned to a PDP context from `+CGPADDR`; returns
    /// `(cid, address)`. `cid` 0 returns the first context.
    pub async fn ip_address(&self, cid: i32) -> AtResult<(i32, String)> {
        let command = format!("{}?", self.commands.ip_address);
        let lines = self.send(&command).await?;
        let params = self.parse_response_filtered(&command, &lines, 2, |params| {
            cid == 0 || parse_int(&params[0]) == cid
        })?;
        Ok((parse_int(&params[0]), params[1].clone()))
    }

    /// Registration URC mode from `+CREG?`.
    pub async fn network_reg_notify(&self) -> AtResult<i32> {
        let command = format!("{}?", self.commands.network_reg_notify);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(parse_int(&params[0]))
    }

    /// Configure registration URCs (0 off, 1 on, 2 on with location).
    pub async fn set_network_reg_notify(&self, mode: i32) -> AtResult<()> {
        let command = format!("{}={}", self.commands.network_reg_notify, mode);
        self.send_expect(&command, "OK").await
    }

    /// Packet registration URC mode from `+CGREG?`.
    pub async fn gprs_reg_notify(&self) -> AtResult<i32> {
        let command = format!("{}?", self.commands.gprs_reg_notify);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(parse_int(&params[0]))
    }

    /// Configure packet registration URCs.
    pub async fn set_gprs_reg_notify(&self, mode: i32) -> AtResult<()> {
        let command = format!("{}={}", self.commands.gprs_reg_notify, mode);
        self.send_expect(&command, "OK").await
    }

    /// Configure periodic signal reporting (vendor `+CSQ=mode,interval`).
    pub async fn set_signal_report(&self, mode: i32, interval: i32) -> AtResult<()> {
        let command = format!("{}={},{}", self.commands.signal_report, mode, interval);
        self.send_expect(&command, "OK").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_quality_dbm_conversion() {
        assert_eq!(SignalQuality { rssi: 15, ber: 0 }.dbm(), Some(-83));
        assert_eq!(SignalQuality { rssi: 0, ber: 0 }.dbm(), Some(-113));
        assert_eq!(SignalQuality { rssi: 99, ber: 99 }.dbm(), None);
    }

    #[test]
    fn registration_states() {
        let home = RegistrationStatus { notify_mode: 0, status: 1 };
        let roaming = RegistrationStatus { notify_mode: 0, status: 5 };
        let searching = RegistrationStatus { notify_mode: 0, status: 2 };
        assert!(home.is_registered());
        assert!(roaming.is_registered());
        assert!(!searching.is_registered());
    }
}
