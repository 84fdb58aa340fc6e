// ABOUTME: Basic control and identity accessors - thin typed wrappers over Device::send

use crate::device::{parse_int, AtResult, Device};

/// Battery state from `+CBC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatteryStatus {
    /// 0 not charging, 1 charging, 2 charge finished.
    pub charge_status: i32,
    /// Remaining capacity in percent.
    pub level: i32,
}

impl Device {
    /// Probe the link with `AT`.
    pub async fn test(&self) -> AtResult<()> {
        self.send_expect(&self.commands.test, "OK").await
    }

    /// Disable command echo.
    pub async fn echo_off(&self) -> AtResult<()> {
        self.send_expect(&self.commands.echo_off, "OK").await
    }

    /// Enable command echo.
    pub async fn echo_on(&self) -> AtResult<()> {
        self.send_expect(&self.commands.echo_on, "OK").await
    }

    /// Soft-reset the module.
    pub async fn reset(&self) -> AtResult<()> {
        self.send_expect(&self.commands.reset, "OK").await
    }

    /// Restore factory settings.
    pub async fn factory_reset(&self) -> AtResult<()> {
        self.send_expect(&self.commands.factory_reset, "OK").await
    }

    /// Persist the active settings.
    pub async fn save_settings(&self) -> AtResult<()> {
        self.send_expect(&self.commands.save_settings, "OK").await
    }

    /// The module's IMEI.
    pub async fn imei(&self) -> AtResult<String> {
        self.simple_query(&self.commands.imei).await
    }

    /// Manufacturer identification.
    pub async fn manufacturer(&self) -> AtResult<String> {
        self.simple_query(&self.commands.manufacturer).await
    }

    /// Model identification.
    pub async fn model(&self) -> AtResult<String> {
        self.simple_query(&self.commands.model).await
    }

    /// Firmware revision.
    pub async fn revision(&self) -> AtResult<String> {
        self.simple_query(&self.commands.revision).await
    }

    /// The SIM's IMSI.
    pub async fn imsi(&self) -> AtResult<String> {
        self.simple_query(&self.commands.imsi).await
    }

    /// The SIM's ICCID.
    pub async fn iccid(&self) -> AtResult<String> {
        self.simple_query(&self.commands.iccid).await
    }

    /// The subscriber number from `+CNUM`, with its address type.
    pub async fn msisdn(&self) -> AtResult<(String, i32)> {
        let lines = self.send(&self.commands.number).await?;
        let params = self.parse_response(&self.commands.number, &lines, 2)?;
        let number = params.get(1).cloned().unwrap_or_default();
        let number_type = params.get(2).map(|v| parse_int(v)).unwrap_or(0);
        Ok((number, number_type))
    }

    /// Battery charge state from `+CBC`.
    pub async fn battery(&self) -> AtResult<BatteryStatus> {
        let lines = self.send(&self.commands.battery_level).await?;
        let params = self.parse_response(&self.commands.battery_level, &lines, 2)?;
        Ok(BatteryStatus {
            charge_status: parse_int(&params[0]),
            level: parse_int(&params[1]),
        })
    }

    /// SIM state from `+CPIN?`: `READY`, `SIM PIN`, `SIM PUK`, ...
    pub async fn sim_status(&self) -> AtResult<String> {
        let command = format!("{}?", self.commands.sim_status);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(params[0].clone())
    }

    /// Present the SIM PIN.
    pub async fn verify_pin(&self, pin: &str) -> AtResult<()> {
        let command = format!("{}=\"{}\"", self.commands.pin_verify, pin);
        self.send_expect(&command, "OK").await
    }

    /// Change the SIM PIN.
    pub async fn change_pin(&self, old_pin: &str, new_pin: &str) -> AtResult<()> {
        let command = format!(
            "{}=\"SC\",\"{}\",\"{}\"",
            self.commands.pin_change, old_pin, new_pin
        );
        self.send_expect(&command, "OK").await
    }

    /// Enable or disable the SIM PIN lock for `facility` (usually `SC`).
    pub async fn set_pin_lock(&self, facility: &str, enable: bool, password: &str) -> AtResult<()> {
        let command = format!(
            "{}=\"{}\",{},\"{}\"",
            self.commands.pin_lock,
            facility,
            i32::from(enable),
            password
        );
        self.send_expect(&command, "OK").await
    }

    /// The network clock from `+CCLK?`, as `"yy/MM/dd,hh:mm:ss+zz"`.
    pub async fn network_time(&self) -> AtResult<String> {
        let command = format!("{}?", self.commands.network_time);
        let lines = self.send(&command).await?;
        let params = self.parse_response(&command, &lines, 1)?;
        Ok(params[0].clone())
    }

    /// Set the module clock; `time` uses the `+CCLK` string format.
    pub async fn set_time(&self, time: &str) -> AtResult<()> {
        let command = format!("{}=\"{}\"", self.commands.set_time, time);
        self.send_expect(&command, "OK").await
    }
}
