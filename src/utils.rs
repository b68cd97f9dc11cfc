/// Utility functions for formatting readings and log output
use time::macros::format_description;
use time::OffsetDateTime;

use crate::models::Reading;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

/// Whole minutes elapsed between a reading and `now`, floored
pub fn minutes_since(timestamp: &OffsetDateTime, now: OffsetDateTime) -> i64 {
    (now - *timestamp).whole_minutes()
}

/// Signed delta as shown in the panel: `+10`, `-4`, `0`
pub fn format_delta(delta: i32) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

/// Panel text for a reading: value, trend arrow, delta and age
///
/// e.g. `150 ↑ +10 3m`
pub fn panel_text(reading: &Reading, now: OffsetDateTime) -> String {
    let mut text = format!("{} {}", reading.glucose_value, reading.trend.arrow());
    if let Some(delta) = reading.delta {
        text.push(' ');
        text.push_str(&format_delta(delta));
    }
    if let Some(timestamp) = &reading.timestamp {
        text.push_str(&format!(" {}m", minutes_since(timestamp, now)));
    }
    text
}

/// Replace the value of any `token=` query parameter so URLs can be logged
pub fn redact_token(url: &str) -> String {
    let Some(start) = url.find("token=").map(|i| i + "token=".len()) else {
        return url.to_string();
    };
    let end = url[start..]
        .find('&')
        .map(|i| start + i)
        .unwrap_or(url.len());
    format!("{}***REDACTED***{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::Trend;
    use time::macros::datetime;

    #[test]
    fn formats_datetime() {
        let dt = datetime!(2024-03-01 08:05:09 UTC);
        assert_eq!(format_datetime(&dt), "01.03.2024 - 08:05:09");
    }

    #[test]
    fn redacts_token_values() {
        assert_eq!(
            redact_token("https://ns.example.com/api/v1/entries.json?count=2&token=secret"),
            "https://ns.example.com/api/v1/entries.json?count=2&token=***REDACTED***"
        );
        assert_eq!(
            redact_token("https://ns.example.com/x?token=secret&count=2"),
            "https://ns.example.com/x?token=***REDACTED***&count=2"
        );
        assert_eq!(
            redact_token("https://ns.example.com/api/v1/entries.json?count=2"),
            "https://ns.example.com/api/v1/entries.json?count=2"
        );
    }

    #[test]
    fn panel_text_includes_delta_and_age() {
        let taken = datetime!(2024-03-01 12:00 UTC);
        let reading = Reading::new(150, Some(taken)).with_change(10, Trend::SingleUp);
        assert_eq!(
            panel_text(&reading, datetime!(2024-03-01 12:03:59 UTC)),
            "150 ↑ +10 3m"
        );

        let bare = Reading::new(98, None).with_change(-2, Trend::Flat);
        assert_eq!(panel_text(&bare, taken), "98 → -2");
    }
}
