//! Normalisation of raw field values.
//!
//! Records arrive from the data source as loosely shaped values: numbers, plain strings,
//! rich-text segment lists or nested objects. The functions here reduce them to the
//! canonical scalars the rest of the crate works with. None of them fail: an empty string
//! or `None` is the only fallback.

use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::task::Timestamp;

/// Numbers below this are Unix seconds, anything else is already milliseconds.
pub const SECONDS_THRESHOLD: f64 = 10_000_000_000.0;

/// Segment tag carrying plain text in rich-text values.
const TEXT_SEGMENT: &str = "text";

/// Formats carrying an explicit UTC offset.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y/%m/%d %H:%M:%S%.f %z",
];

/// Wall-clock formats, read in the evaluation time zone.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

/// Date-only formats, read as local midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// An untyped value as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum RawFieldValue {
    /// No value in the cell.
    #[default]
    Empty,
    Number(f64),
    Text(String),
    /// Rich text: an ordered list of tagged segments.
    Segments(Vec<Segment>),
    /// A structured object, optionally with its own `text` or a `content` segment list.
    Rich {
        text: Option<String>,
        content: Option<Vec<Segment>>,
    },
    /// Any other shape (booleans, numbers outside `f64`).
    Unsupported,
}

/// One piece of a rich-text value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub kind: String,
    pub text: Option<String>,
}

impl Segment {
    /// A plain text segment.
    pub fn text(text: &str) -> Self {
        Segment {
            kind: TEXT_SEGMENT.to_string(),
            text: Some(text.to_string()),
        }
    }

    /// A segment of another kind (mention, link, ...) carrying display text.
    pub fn other(kind: &str, text: &str) -> Self {
        Segment {
            kind: kind.to_string(),
            text: Some(text.to_string()),
        }
    }

    fn from_value(value: &Value) -> Self {
        Segment {
            kind: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            text: value.get("text").and_then(Value::as_str).map(str::to_string),
        }
    }
}

impl From<Value> for RawFieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawFieldValue::Empty,
            Value::Number(n) => n.as_f64().map_or(RawFieldValue::Unsupported, RawFieldValue::Number),
            Value::String(s) => RawFieldValue::Text(s),
            Value::Array(items) => RawFieldValue::Segments(items.iter().map(Segment::from_value).collect()),
            Value::Object(map) => RawFieldValue::Rich {
                text: map.get("text").and_then(Value::as_str).map(str::to_string),
                content: map
                    .get("content")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(Segment::from_value).collect()),
            },
            Value::Bool(_) => RawFieldValue::Unsupported,
        }
    }
}

impl From<&str> for RawFieldValue {
    fn from(s: &str) -> Self {
        RawFieldValue::Text(s.to_string())
    }
}

impl From<f64> for RawFieldValue {
    fn from(n: f64) -> Self {
        RawFieldValue::Number(n)
    }
}

/// Extract display text from a raw value.
///
/// Strings pass through unchanged; segment lists concatenate the payload of their
/// `text`-tagged segments in order; objects prefer their own `text` and otherwise
/// fall back to their `content` segments. Everything else is the empty string.
pub fn extract_text(value: &RawFieldValue) -> String {
    match value {
        RawFieldValue::Text(s) => s.clone(),
        RawFieldValue::Segments(segments) => join_segments(segments),
        RawFieldValue::Rich { text: Some(text), .. } if !text.is_empty() => text.clone(),
        RawFieldValue::Rich {
            content: Some(content),
            ..
        } => join_segments(content),
        _ => String::new(),
    }
}

fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind == TEXT_SEGMENT)
        .filter_map(|s| s.text.as_deref())
        .collect()
}

/// Parse a date-like raw value into milliseconds since the epoch, reading wall-clock
/// strings in the local time zone.
pub fn parse_date_value(value: &RawFieldValue) -> Option<Timestamp> {
    parse_date_value_in(value, &Local)
}

/// Parse a date-like raw value, reading wall-clock strings in `tz`.
///
/// Numbers below [`SECONDS_THRESHOLD`] are Unix seconds, larger ones milliseconds.
/// Strings are tried as-is, then with `.` replaced by `-`, then as `YYYY年M月D日`.
pub fn parse_date_value_in<Tz: TimeZone>(value: &RawFieldValue, tz: &Tz) -> Option<Timestamp> {
    match value {
        RawFieldValue::Number(n) => timestamp_from_number(*n),
        RawFieldValue::Text(s) => parse_date_str(s, tz),
        _ => None,
    }
}

fn timestamp_from_number(n: f64) -> Option<Timestamp> {
    if !n.is_finite() {
        return None;
    }
    let ms = if n < SECONDS_THRESHOLD { n * 1000.0 } else { n };
    Some(ms.round() as Timestamp)
}

/// Parse a date string, reading wall-clock values in `tz`.
pub fn parse_date_str<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<Timestamp> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_general(trimmed, tz)
        .or_else(|| parse_general(&trimmed.replace('.', "-"), tz))
        .or_else(|| parse_chinese(trimmed, tz))
}

fn parse_general<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp_millis());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return wall_clock(ndt, tz);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return wall_clock(date.and_hms_opt(0, 0, 0)?, tz);
        }
    }
    parse_partial(s, tz)
}

fn partial_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})[-/]?(\d{1,2})?[-/]?(\d{0,2})$").expect("valid date pattern"))
}

/// `YYYYMMDD`, `YYYY-MM` and `YYYY`, with missing parts taken as the first.
fn parse_partial<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<Timestamp> {
    let caps = partial_date_pattern().captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    let day: u32 = match caps.get(3).map(|d| d.as_str()) {
        Some(d) if !d.is_empty() => d.parse().ok()?,
        _ => 1,
    };
    wall_clock(NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?, tz)
}

fn wall_clock<Tz: TimeZone>(ndt: NaiveDateTime, tz: &Tz) -> Option<Timestamp> {
    tz.from_local_datetime(&ndt)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

fn chinese_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").expect("valid date pattern")
    })
}

fn parse_chinese<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<Timestamp> {
    let caps = chinese_date_pattern().captures(s)?;
    let iso = format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]);
    parse_general(&iso, tz)
}

/// Return `value` trimmed when it is a non-blank string, `fallback` otherwise.
pub fn normalize_color(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use proptest::prelude::*;

    fn utc_ms(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp_millis()
    }

    fn parse_utc(s: &str) -> Option<Timestamp> {
        parse_date_value_in(&RawFieldValue::from(s), &Utc)
    }

    #[test]
    fn test_extract_text_plain_string() {
        assert_eq!(extract_text(&RawFieldValue::from("Design")), "Design");
        assert_eq!(extract_text(&RawFieldValue::from("")), "");
    }

    #[test]
    fn test_extract_text_skips_non_text_segments() {
        let v = RawFieldValue::Segments(vec![Segment::text("Design"), Segment::other("mention", "@bob")]);
        assert_eq!(extract_text(&v), "Design");

        let v = RawFieldValue::Segments(vec![
            Segment::text("Build "),
            Segment::other("url", "http://x"),
            Segment::text("API"),
        ]);
        assert_eq!(extract_text(&v), "Build API");
    }

    #[test]
    fn test_extract_text_objects() {
        let v: RawFieldValue = serde_json::from_str(r#"{"text":"Direct","content":[{"type":"text","text":"Nested"}]}"#).unwrap();
        assert_eq!(extract_text(&v), "Direct");

        let v: RawFieldValue = serde_json::from_str(r#"{"content":[{"type":"text","text":"Nested"},{"type":"mention","text":"x"}]}"#).unwrap();
        assert_eq!(extract_text(&v), "Nested");

        let v: RawFieldValue = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(extract_text(&v), "");
    }

    #[test]
    fn test_extract_text_fallbacks() {
        assert_eq!(extract_text(&RawFieldValue::Empty), "");
        assert_eq!(extract_text(&RawFieldValue::Number(3.0)), "");
        assert_eq!(extract_text(&RawFieldValue::Unsupported), "");
        let v: RawFieldValue = serde_json::from_str("[1, \"loose\", {\"type\":\"text\"}]").unwrap();
        assert_eq!(extract_text(&v), "");
    }

    #[test]
    fn test_raw_value_from_json_shapes() {
        let v: RawFieldValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, RawFieldValue::Empty);
        let v: RawFieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, RawFieldValue::Unsupported);
        let v: RawFieldValue = serde_json::from_str("1704067200").unwrap();
        assert_eq!(v, RawFieldValue::Number(1_704_067_200.0));
    }

    #[test]
    fn test_parse_numeric_seconds_and_millis() {
        assert_eq!(parse_date_value(&RawFieldValue::Number(1_704_067_200.0)), Some(1_704_067_200_000));
        assert_eq!(parse_date_value(&RawFieldValue::Number(1_704_067_200_000.0)), Some(1_704_067_200_000));
        assert_eq!(parse_date_value(&RawFieldValue::Number(0.0)), Some(0));
        assert_eq!(parse_date_value(&RawFieldValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_parse_iso_strings() {
        assert_eq!(parse_utc("2024-01-05"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("  2024-01-05  "), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024/1/5"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024-01-05 12:30"), Some(utc_ms(2024, 1, 5) + 45_000_000));
        assert_eq!(parse_utc("2024-01-05T00:00:00Z"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024-01-05T08:00:00+08:00"), Some(utc_ms(2024, 1, 5)));
    }

    #[test]
    fn test_parse_loose_date_forms() {
        let cases = [
            ("20240105", utc_ms(2024, 1, 5)),
            ("2024-01", utc_ms(2024, 1, 1)),
            ("2024/3", utc_ms(2024, 3, 1)),
            ("2024.01", utc_ms(2024, 1, 1)),
            ("2024", utc_ms(2024, 1, 1)),
            ("01/05/2024", utc_ms(2024, 1, 5)),
            ("Jan 5 2024", utc_ms(2024, 1, 5)),
            ("January 5, 2024", utc_ms(2024, 1, 5)),
            ("2024-01-05T08:30:00.000+0800", utc_ms(2024, 1, 5) + 30 * 60_000),
            ("2024-01-05 08:30:00+0800", utc_ms(2024, 1, 5) + 30 * 60_000),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_utc(input), Some(expected), "input {input:?}");
        }
        assert_eq!(parse_utc("20241305"), None);
        assert_eq!(parse_utc("202401051"), None);
    }

    #[test]
    fn test_parse_dotted_and_chinese_dates() {
        assert_eq!(parse_utc("2024.01.05"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024.1.5"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024年1月5日"), Some(utc_ms(2024, 1, 5)));
        assert_eq!(parse_utc("2024 年 12 月 31 日"), Some(utc_ms(2024, 12, 31)));
        assert_eq!(parse_utc("截止 2024年3月1日 前"), Some(utc_ms(2024, 3, 1)));
    }

    #[test]
    fn test_parse_reads_wall_clock_in_zone() {
        let east8 = FixedOffset::east_opt(8 * 3600).unwrap();
        let v = RawFieldValue::from("2024-01-05");
        assert_eq!(parse_date_value_in(&v, &east8), Some(utc_ms(2024, 1, 5) - 8 * 3_600_000));
    }

    #[test]
    fn test_parse_failures_are_none() {
        assert_eq!(parse_utc(""), None);
        assert_eq!(parse_utc("   "), None);
        assert_eq!(parse_utc("soon"), None);
        assert_eq!(parse_utc("2024-13-45"), None);
        assert_eq!(parse_utc("2024年13月1日"), None);
        assert_eq!(parse_date_value(&RawFieldValue::Empty), None);
        assert_eq!(parse_date_value(&RawFieldValue::Segments(vec![Segment::text("2024-01-05")])), None);
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color(Some("  #ff0000 "), "#000000"), "#ff0000");
        assert_eq!(normalize_color(Some("   "), "#000000"), "#000000");
        assert_eq!(normalize_color(Some(""), "#000000"), "#000000");
        assert_eq!(normalize_color(None, "#000000"), "#000000");
    }

    proptest! {
        #[test]
        fn prop_numeric_dates_scale_by_magnitude(v in -1_000_000_000_000i64..100_000_000_000_000i64) {
            let parsed = parse_date_value(&RawFieldValue::Number(v as f64));
            let expected = if (v as f64) < SECONDS_THRESHOLD { v * 1000 } else { v };
            prop_assert_eq!(parsed, Some(expected));
        }

        #[test]
        fn prop_extract_text_never_panics(s in ".*", kind in "[a-z]{0,8}") {
            let v = RawFieldValue::Segments(vec![Segment::other(&kind, &s)]);
            let out = extract_text(&v);
            prop_assert!(out.is_empty() || kind == TEXT_SEGMENT);
        }
    }
}
