// ABOUTME: User-overrideable table of the AT command strings the typed accessors issue
// ABOUTME: Vendor firmwares rename commands; overriding a field here retargets every caller

/// The AT command strings used by the typed accessor methods. Each device
/// owns its table, so per-device vendor overrides never affect another
/// device.
#[derive(Clone, Debug)]
pub struct CommandSet {
    // Basic control
    pub test: String,
    pub echo_off: String,
    pub echo_on: String,
    pub reset: String,
    pub factory_reset: String,
    pub save_settings: String,

    // Device identity
    pub imei: String,
    pub manufacturer: String,
    pub model: String,
    pub revision: String,
    pub imsi: String,
    pub iccid: String,
    pub number: String,

    // Network state
    pub operator: String,
    pub network_mode: String,
    pub network_reg: String,
    pub gprs_reg: String,
    pub signal: String,

    // SIM management
    pub sim_status: String,
    pub pin_verify: String,
    pub pin_change: String,
    pub pin_lock: String,

    // Device state
    pub battery_level: String,
    pub network_time: String,
    pub set_time: String,

    // Packet data configuration
    pub apn: String,
    pub ip_address: String,
    pub pdp_context: String,

    // Short messages
    pub sms_format: String,
    pub sms_store: String,
    pub sms_centre: String,
    pub list_sms: String,
    pub read_sms: String,
    pub delete_sms: String,
    pub send_sms: String,

    // Voice calls
    pub dial: String,
    pub answer: String,
    pub hangup: String,
    pub caller_id: String,
    pub call_state: String,
    pub call_wait: String,
    pub call_forward: String,

    // Notification management
    pub network_reg_notify: String,
    pub gprs_reg_notify: String,
    pub signal_report: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        CommandSet {
            test: "AT".into(),
            echo_off: "ATE0".into(),
            echo_on: "ATE1".into(),
            reset: "ATZ".into(),
            factory_reset: "AT&F".into(),
            save_settings: "AT&W".into(),

            imei: "AT+CGSN".into(),
            manufacturer: "AT+CGMI".into(),
            model: "AT+CGMM".into(),
            revision: "AT+CGMR".into(),
            imsi: "AT+CIMI".into(),
            iccid: "AT+CCID".into(),
            number: "AT+CNUM".into(),

            operator: "AT+COPS".into(),
            network_mode: "AT+CNMP".into(),
            network_reg: "AT+CREG".into(),
            gprs_reg: "AT+CGREG".into(),
            signal: "AT+CSQ".into(),

            sim_status: "AT+CPIN".into(),
            pin_verify: "AT+CPIN".into(),
            pin_change: "AT+CPWD".into(),
            pin_lock: "AT+CLCK".into(),

            battery_level: "AT+CBC".into(),
            network_time: "AT+CCLK".into(),
            set_time: "AT+CCLK".into(),

            apn: "AT+CGDCONT".into(),
            ip_address: "AT+CGPADDR".into(),
            pdp_context: "AT+CGACT".into(),

            sms_format: "AT+CMGF".into(),
            sms_store: "AT+CPMS".into(),
            sms_centre: "AT+CSCA".into(),
            list_sms: "AT+CMGL".into(),
            read_sms: "AT+CMGR".into(),
            delete_sms: "AT+CMGD".into(),
            send_sms: "AT+CMGS".into(),

            dial: "ATD".into(),
            answer: "ATA".into(),
            hangup: "ATH".into(),
            caller_id: "AT+CLIP".into(),
            call_state: "AT+CLCC".into(),
            call_wait: "AT+CCWA".into(),
            call_forward: "AT+CCFC".into(),

            network_reg_notify: "AT+CREG".into(),
            gprs_reg_notify: "AT+CGREG".into(),
            signal_report: "AT+CSQ".into(),
        }
    }
}
