use serde::{Deserialize, Serialize};

/// timestamp layout used on the wire and in the persistence file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// one recorded sensor ping from the bin
///
/// field names on the wire follow the device firmware and the dashboard
/// script: `hora`, `deposito`, `nivel`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Event {
    /// local time at ingest, "YYYY-MM-DD HH:MM:SS"
    #[serde(rename = "hora")]
    pub timestamp: String,

    /// how many times the lid was opened (opaque, never validated)
    #[serde(rename = "deposito")]
    pub count: String,

    /// fill percentage (opaque), only when the store tracks level
    #[serde(rename = "nivel", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl Event {
    /// build an event stamped with the local clock
    pub fn now(count: String, level: Option<String>) -> Self {
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            count,
            level,
        }
    }

    /// the "HH:MM:SS" part of the timestamp, used as chart label
    pub fn time_of_day(&self) -> &str {
        self.timestamp
            .split_once(' ')
            .map(|(_, time)| time)
            .unwrap_or(&self.timestamp)
    }
}
