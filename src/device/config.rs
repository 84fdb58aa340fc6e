// ABOUTME: Per-device configuration - timeouts and the three overrideable tables

use crate::device::command_set::CommandSet;
use crate::device::response_set::ResponseSet;
use crate::device::urc_set::UrcSet;
use std::time::Duration;

/// Configuration for [`crate::device::Device::open`]. The defaults suit
/// standard 3GPP modems; vendor quirks are handled by overriding the
/// relevant table entries.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Deadline for each ordinary command.
    pub command_timeout: Duration,
    /// Deadline used around `+CMGS`, where the network round trip can take
    /// tens of seconds.
    pub sms_timeout: Duration,
    /// AT command strings used by the typed accessors.
    pub commands: CommandSet,
    /// Final-result tokens.
    pub responses: ResponseSet,
    /// URC prefixes.
    pub urcs: UrcSet,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            command_timeout: Duration::from_secs(1),
            sms_timeout: Duration::from_secs(60),
            commands: CommandSet::default(),
            responses: ResponseSet::default(),
            urcs: UrcSet::default(),
        }
    }
}
