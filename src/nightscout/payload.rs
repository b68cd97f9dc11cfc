/// Decoding of the Nightscout `entries.json` response body
use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::error::FetchError;
use crate::models::Reading;

#[derive(Debug, Deserialize)]
struct Entry {
    sgv: Option<f64>,
    #[serde(rename = "dateString")]
    date_string: Option<String>,
    /// Milliseconds since the Unix epoch
    date: Option<f64>,
}

impl Entry {
    fn timestamp(&self) -> Option<OffsetDateTime> {
        self.date_string
            .as_deref()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
            .or_else(|| {
                let millis = self.date?;
                OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).ok()
            })
    }

    fn into_reading(self, index: usize) -> Result<Reading, FetchError> {
        let sgv = self.sgv.ok_or_else(|| {
            FetchError::MalformedPayload(format!("entry {} has no sgv value", index))
        })?;
        if !(0.0..=i32::MAX as f64).contains(&sgv) {
            return Err(FetchError::MalformedPayload(format!(
                "entry {} has out of range sgv {}",
                index, sgv
            )));
        }
        Ok(Reading::new(sgv.round() as i32, self.timestamp()))
    }
}

/// Decode a response body into the (current, previous) readings.
///
/// Nightscout returns entries newest first. Anything past the second entry
/// is ignored.
pub fn parse_entries(body: &[u8]) -> Result<[Reading; 2], FetchError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::MalformedPayload(e.to_string()))?;

    if let Some(message) = service_error(&value) {
        return Err(FetchError::Service(message));
    }

    if !value.is_array() {
        return Err(FetchError::MalformedPayload(
            "expected an array of entries".to_string(),
        ));
    }

    let entries: Vec<Entry> =
        serde_json::from_value(value).map_err(|e| FetchError::MalformedPayload(e.to_string()))?;

    let mut entries = entries.into_iter();
    match (entries.next(), entries.next()) {
        (Some(current), Some(previous)) => {
            Ok([current.into_reading(0)?, previous.into_reading(1)?])
        }
        _ => Err(FetchError::InsufficientData),
    }
}

fn service_error(value: &Value) -> Option<String> {
    let errors = value.get("errors")?.as_array()?;
    let first = errors.first()?;
    Some(
        first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
    )
}
