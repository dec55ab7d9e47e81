use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Placeholder shown and sent in place of an absent end date
pub const TBD: &str = "TBD";

/// Parse a calendar date from `YYYY-MM-DD` or a full timestamp.
///
/// Timestamps keep their own calendar date; no timezone shifting is applied.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
}

/// Whether the value stands for "no date"
pub fn is_absent(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == TBD || value == "null"
}

/// Render a stored or user-supplied date as `YYYY-MM-DD`, or `TBD`
pub fn format_date(value: Option<&str>) -> String {
    value
        .filter(|value| !is_absent(value))
        .and_then(parse_calendar_date)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| TBD.to_string())
}

/// Serde adapter for end dates: `None` travels as `"TBD"`, and `"TBD"`,
/// `"null"`, `""` or `null` all read back as `None`.
pub mod tbd {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(date),
            None => serializer.serialize_str(super::TBD),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|date| !super::is_absent(date)))
    }
}
