// ABOUTME: URC prefix table and the classifier rules that keep URCs out of command responses
// ABOUTME: +CME/+CMS ERROR always terminate the in-flight command, echoed responses are never URCs

/// The unsolicited-result-code prefixes the reader recognises. Each device
/// owns its table; `custom` extends the standard set.
#[derive(Clone, Debug)]
pub struct UrcSet {
    // Call-related
    pub ring: String,
    pub call_ring: String,
    pub caller_id: String,
    pub call_list: String,
    pub call_waiting: String,
    pub connected_line: String,
    pub suppl_service: String,
    pub suppl_service_unsolicited: String,
    pub no_carrier: String,
    pub busy: String,
    pub no_answer: String,
    pub no_dialtone: String,

    // Short messages
    pub sms_arrived: String,
    pub sms_content: String,
    pub sms_status_report: String,
    pub cell_broadcast: String,
    pub sms_ack: String,

    // Network registration
    pub network_reg: String,
    pub gprs_reg: String,
    pub eps_reg: String,
    pub reg_5g: String,
    pub ims_reg: String,

    // Network state
    pub operator: String,
    pub signal_quality: String,
    pub network_time: String,
    pub timezone: String,

    // Packet domain and indicators
    pub packet_event: String,
    pub indicator_event: String,

    // SIM and USSD
    pub sim_status: String,
    pub ussd: String,

    // Vendor-specific
    pub device_ready: String,
    pub device_boot: String,
    pub ip_open: String,
    pub ip_close: String,
    pub ip_received: String,
    pub ip_send: String,

    // Error results that must stay attributed to the in-flight command
    pub cme_error: String,
    pub cms_error: String,

    pub custom: Vec<String>,
}

impl Default for UrcSet {
    fn default() -> Self {
        UrcSet {
            ring: "RING".into(),
            call_ring: "+CRING".into(),
            caller_id: "+CLIP".into(),
            call_list: "+CLCC".into(),
            call_waiting: "+CCWA".into(),
            connected_line: "+COLP".into(),
            suppl_service: "+CSSI".into(),
            suppl_service_unsolicited: "+CSSU".into(),
            no_carrier: "NO CARRIER".into(),
            busy: "BUSY".into(),
            no_answer: "NO ANSWER".into(),
            no_dialtone: "NO DIALTONE".into(),

            sms_arrived: "+CMTI".into(),
            sms_content: "+CMT".into(),
            sms_status_report: "+CDS".into(),
            cell_broadcast: "+CBM".into(),
            sms_ack: "+CNMA".into(),

            network_reg: "+CREG".into(),
            gprs_reg: "+CGREG".into(),
            eps_reg: "+CEREG".into(),
            reg_5g: "+C5GREG".into(),
            ims_reg: "+CIREG".into(),

            operator: "+COPS".into(),
            signal_quality: "+CSQ".into(),
            network_time: "+CTZV".into(),
            timezone: "+CTZU".into(),

            packet_event: "+CGEV".into(),
            indicator_event: "+CIEV".into(),

            sim_status: "+CPIN".into(),
            ussd: "+CUSD".into(),

            device_ready: "+RDY".into(),
            device_boot: "+BOOT".into(),
            ip_open: "+CIPOPEN".into(),
            ip_close: "+CIPCLOSE".into(),
            ip_received: "+CIPRXGOT".into(),
            ip_send: "+CIPSEND".into(),

            cme_error: "+CME ERROR".into(),
            cms_error: "+CMS ERROR".into(),

            custom: Vec::new(),
        }
    }
}

impl UrcSet {
    /// The explicit ordered list of URC prefixes.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes = vec![
            self.ring.as_str(),
            self.call_ring.as_str(),
            self.caller_id.as_str(),
            self.call_list.as_str(),
            self.call_waiting.as_str(),
            self.connected_line.as_str(),
            self.suppl_service.as_str(),
            self.suppl_service_unsolicited.as_str(),
            self.no_carrier.as_str(),
            self.busy.as_str(),
            self.no_answer.as_str(),
            self.no_dialtone.as_str(),
            self.sms_arrived.as_str(),
            self.sms_content.as_str(),
            self.sms_status_report.as_str(),
            self.cell_broadcast.as_str(),
            self.sms_ack.as_str(),
            self.network_reg.as_str(),
            self.gprs_reg.as_str(),
            self.eps_reg.as_str(),
            self.reg_5g.as_str(),
            self.ims_reg.as_str(),
            self.operator.as_str(),
            self.signal_quality.as_str(),
            self.network_time.as_str(),
            self.timezone.as_str(),
            self.packet_event.as_str(),
            self.indicator_event.as_str(),
            self.sim_status.as_str(),
            self.ussd.as_str(),
            self.device_ready.as_str(),
            self.device_boot.as_str(),
            self.ip_open.as_str(),
            self.ip_close.as_str(),
            self.ip_received.as_str(),
            self.ip_send.as_str(),
            self.cme_error.as_str(),
            self.cms_error.as_str(),
        ];
        prefixes.extend(self.custom.iter().map(String::as_str));
        prefixes
    }

    /// Classify `line` against the URC table given the in-flight command
    /// `command` (empty when the dispatcher is idle).
    ///
    /// A line is a URC when it starts with an enabled prefix, unless:
    /// - the prefix is `+CME ERROR`/`+CMS ERROR`, which always terminate
    ///   the in-flight command instead; or
    /// - the command begins with `AT` followed by the same prefix, in which
    ///   case the line is the echoed response to that command (e.g.
    ///   `+CREG:` answering `AT+CREG?`).
    pub fn is_urc(&self, line: &str, command: &str) -> bool {
        let Some(prefix) = self
            .prefixes()
            .into_iter()
            .find(|prefix| !prefix.is_empty() && line.starts_with(prefix))
        else {
            return false;
        };

        if prefix == self.cme_error || prefix == self.cms_error {
            return false;
        }
        if !command.is_empty() {
            let echo = format!("AT{prefix}");
            if command.starts_with(&echo) {
                return false;
            }
        }
        true
    }
}
