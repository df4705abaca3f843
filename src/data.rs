use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime> {
    const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%H:%M:%S%.f", "%I:%M %p", "%I:%M:%S %p"];
    for fmt in TIME_FORMATS {
        if let Ok(parsed) = NaiveTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as time"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%d/%m/%Y %H:%M",
        "%m/%d/%Y %H:%M",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_local());
    }
    if let Ok(date) = parse_naive_date(value) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Permissive timestamp parsing for trip-log columns; anything unparsable is
/// absent rather than an error.
pub fn parse_timestamp_lenient(value: Option<&str>) -> Option<NaiveDateTime> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_naive_datetime(trimmed).ok()
}

/// Combines a survey interval's date and time-of-day cells.
pub fn parse_interval_start(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = date.trim();
    let time = time.trim();
    if let (Ok(d), Ok(t)) = (parse_naive_date(date), parse_naive_time(time)) {
        return Ok(d.and_time(t));
    }
    parse_naive_datetime(&format!("{date} {time}"))
        .map_err(|_| anyhow!("Failed to parse interval start from '{date}' and '{time}'"))
}

/// Vehicle count cell as a non-negative integer. Blank, negative or
/// unparsable cells count as zero; fractional counts are truncated.
pub fn parse_count(value: Option<&str>) -> usize {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };
    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed.trunc() as usize,
        _ => 0,
    }
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => c,
            _ => '_',
        })
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn ascii_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}
