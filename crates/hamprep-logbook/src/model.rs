//! Contact-log records and the JSON exchange envelope.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Current envelope version.
pub const FORMAT_VERSION: u32 = 1;

/// CSV column order. Matches the field order of [`ContactLog`].
pub const CSV_COLUMNS: [&str; 14] = [
    "contactTime",
    "mode",
    "frequency",
    "cqZone",
    "myCallsign",
    "theirCallsign",
    "rstSent",
    "rstReceived",
    "myPower",
    "theirPower",
    "theirQth",
    "equipment",
    "antenna",
    "notes",
];

/// One logged two-way contact.
///
/// Optional text fields hold `None` rather than a blank string: imports read
/// an empty or whitespace-only value as absent, so both exchange formats
/// agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLog {
    /// Contact time in Unix milliseconds.
    pub contact_time: i64,
    pub mode: String,
    pub frequency: String,
    #[serde(default)]
    pub cq_zone: Option<u32>,
    pub my_callsign: String,
    pub their_callsign: String,
    pub rst_sent: String,
    pub rst_received: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub my_power: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub their_power: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub their_qth: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub equipment: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub antenna: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

impl ContactLog {
    pub fn contact_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.contact_time)
    }
}

/// The JSON export document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEnvelope<'a> {
    pub version: u32,
    #[serde(serialize_with = "serialize_export_time")]
    pub export_time: DateTime<Utc>,
    pub logs: &'a [ContactLog],
}

impl<'a> LogEnvelope<'a> {
    pub fn new(logs: &'a [ContactLog]) -> Self {
        Self {
            version: FORMAT_VERSION,
            export_time: Utc::now(),
            logs,
        }
    }
}

fn serialize_export_time<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Result of an import: the parsed logs plus how many entries were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub logs: Vec<ContactLog>,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn imported(&self) -> usize {
        self.logs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn export_time_has_millis_and_z() {
        let logs: [ContactLog; 0] = [];
        let envelope = LogEnvelope {
            version: FORMAT_VERSION,
            export_time: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            logs: &logs,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["exportTime"], "2024-03-09T14:05:07.000Z");
        assert_eq!(json["version"], 1);
        assert!(json["logs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let json = r#"{
            "contactTime": 1700000000000,
            "mode": "SSB",
            "frequency": "14.270",
            "myCallsign": "BG1AAA",
            "theirCallsign": "BA4ZZZ",
            "rstSent": "59",
            "rstReceived": "57"
        }"#;
        let log: ContactLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.cq_zone, None);
        assert_eq!(log.notes, None);
        assert_eq!(
            log.contact_datetime().unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn blank_optional_text_reads_as_absent() {
        let json = r#"{
            "contactTime": 1, "mode": "CW", "frequency": "7.025",
            "myCallsign": "A", "theirCallsign": "B",
            "rstSent": "599", "rstReceived": "579",
            "notes": "", "antenna": "   ", "equipment": null, "theirQth": "Oslo"
        }"#;
        let log: ContactLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.notes, None);
        assert_eq!(log.antenna, None);
        assert_eq!(log.equipment, None);
        assert_eq!(log.their_qth.as_deref(), Some("Oslo"));
    }
}
