//! Parsing and formatting for the scalar values shown on activity pages.
//!
//! Activity pages render numbers for humans: `10.02 km`, `1,234 m`, `55:03`,
//! `1h 2m 3s`, `1小時2分`. Everything here is a pure function so the
//! scrapers stay simple selector lookups.

use lazy_static::lazy_static;
use regex::Regex;

const METRES_PER_MILE: f64 = 1609.344;
const METRES_PER_FOOT: f64 = 0.3048;

lazy_static! {
    static ref CLOCK_DURATION: Regex =
        Regex::new(r"(\d+):(\d{1,2})(?::(\d{1,2}))?(?:\.\d+)?").expect("clock duration regex");
    static ref UNIT_DURATION: Regex = Regex::new(
        r"(?i)(\d+(?:\.\d+)?)\s*(小時|時|分鐘|分|秒|hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)"
    )
    .expect("unit duration regex");
    static ref DISTANCE: Regex = Regex::new(
        r"(?i)(\d[\d.,]*)\s*(kilometers?|kilometres?|km|公里|miles?|mi|英里|meters?|metres?|m|公尺|米)?"
    )
    .expect("distance regex");
    static ref ELEVATION: Regex =
        Regex::new(r"(?i)(\d[\d.,]*)\s*(feet|ft|meters?|metres?|m|公尺|米)?")
            .expect("elevation regex");
    static ref THOUSANDS: Regex = Regex::new(r"^\d{1,3}(,\d{3})+$").expect("thousands regex");
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("iso date regex");
}

/// Collapses runs of whitespace (including newlines from nested markup).
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a number written with either `,` or `.` as the decimal mark.
///
/// `1,234` and `1,234.5` use `,` as a thousands separator; a lone `,`
/// otherwise is a decimal comma (`10,02`).
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim().trim_end_matches(['.', ',']);
    if text.is_empty() {
        return None;
    }

    let normalized = if text.contains(',') && text.contains('.') {
        text.replace(',', "")
    } else if text.contains(',') {
        if THOUSANDS.is_match(text) {
            text.replace(',', "")
        } else {
            text.replace(',', ".")
        }
    } else {
        text.to_string()
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a duration into whole seconds.
///
/// Accepts clock notation (`1:02:03`, `55:03`) and unit notation
/// (`1h 2m 3s`, `55m 3s`, `1 hour 5 minutes`, `1小時2分`). Two clock fields
/// are minutes and seconds.
pub fn parse_duration(text: &str) -> Option<u64> {
    if let Some(caps) = CLOCK_DURATION.captures(text) {
        let first: u64 = caps[1].parse().ok()?;
        let second: u64 = caps[2].parse().ok()?;
        return match caps.get(3) {
            Some(third) => {
                let third: u64 = third.as_str().parse().ok()?;
                first
                    .checked_mul(3600)?
                    .checked_add(second.checked_mul(60)?)?
                    .checked_add(third)
            }
            None => first.checked_mul(60)?.checked_add(second),
        };
    }

    let mut total = 0.0;
    let mut matched = false;
    for caps in UNIT_DURATION.captures_iter(text) {
        let value: f64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let multiplier = match unit.as_str() {
            "小時" | "時" | "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
            "分鐘" | "分" | "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
            _ => 1.0,
        };
        total += value * multiplier;
        matched = true;
    }

    // Totals past u64 range are garbage, not a duration.
    let total = total.round();
    (matched && total.is_finite() && total < u64::MAX as f64).then(|| total as u64)
}

/// Formats seconds as `H:MM:SS`.
pub fn format_duration(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Parses a distance into kilometres. A bare number is kilometres.
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let caps = DISTANCE.captures(text)?;
    let value = parse_number(&caps[1])?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();

    let km = match unit.as_str() {
        "mi" | "mile" | "miles" | "英里" => value * METRES_PER_MILE / 1000.0,
        "m" | "meter" | "meters" | "metre" | "metres" | "公尺" | "米" => value / 1000.0,
        _ => value,
    };
    Some(km)
}

/// Parses an elevation into metres. A bare number is metres.
pub fn parse_elevation_m(text: &str) -> Option<f64> {
    let caps = ELEVATION.captures(text)?;
    let value = parse_number(&caps[1])?;
    let feet = caps
        .get(2)
        .map(|m| matches!(m.as_str().to_lowercase().as_str(), "ft" | "feet"))
        .unwrap_or(false);

    Some(if feet { value * METRES_PER_FOOT } else { value })
}

pub fn pace_seconds_per_km(distance_km: f64, elapsed_seconds: u64) -> Option<u64> {
    if distance_km <= 0.0 || elapsed_seconds == 0 {
        return None;
    }
    Some((elapsed_seconds as f64 / distance_km).round() as u64)
}

/// Formats a pace as `M:SS /km`.
pub fn format_pace(seconds_per_km: u64) -> String {
    format!("{}:{:02} /km", seconds_per_km / 60, seconds_per_km % 60)
}

/// Keeps the date of an ISO timestamp (`2025-06-01T06:30:00` -> `2025-06-01`).
/// Anything else is returned trimmed.
pub fn date_part(text: &str) -> String {
    let text = text.trim();
    if ISO_DATE.is_match(text) {
        text[..10].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("10.02"), Some(10.02));
        assert_eq!(parse_number("10,02"), Some(10.02));
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_parse_duration_clock() {
        assert_eq!(parse_duration("1:02:03"), Some(3723));
        assert_eq!(parse_duration("55:03"), Some(3303));
        assert_eq!(parse_duration(" 4:05:06 "), Some(14706));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("55m 3s"), Some(3303));
        assert_eq!(parse_duration("1h 2m 3s"), Some(3723));
        assert_eq!(parse_duration("1 hour 5 minutes"), Some(3900));
        assert_eq!(parse_duration("1小時2分"), Some(3720));
        assert_eq!(parse_duration("45秒"), Some(45));
        assert_eq!(parse_duration("no time"), None);
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        assert_eq!(parse_duration("99999999999999999:00:00"), None);
        assert_eq!(parse_duration("999999999999999999:00"), None);
        assert_eq!(parse_duration("99999999999999999999h"), None);
        assert_eq!(parse_duration("5124095576030431:00:00"), Some(18446744073709551600));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3303), "0:55:03");
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(0), "0:00:00");
    }

    #[test]
    fn test_parse_distance() {
        assert_eq!(parse_distance_km("10.02 km"), Some(10.02));
        assert_eq!(parse_distance_km("10.02km"), Some(10.02));
        assert_eq!(parse_distance_km("21,1 公里"), Some(21.1));
        assert_eq!(parse_distance_km("5000 m"), Some(5.0));
        assert_eq!(parse_distance_km("42.195"), Some(42.195));

        let miles = parse_distance_km("6.2 mi").unwrap();
        assert!((miles - 9.978).abs() < 0.001);

        assert_eq!(parse_distance_km("--"), None);
    }

    #[test]
    fn test_parse_elevation() {
        assert_eq!(parse_elevation_m("1,234 m"), Some(1234.0));
        assert_eq!(parse_elevation_m("88公尺"), Some(88.0));

        let feet = parse_elevation_m("404 ft").unwrap();
        assert!((feet - 123.14).abs() < 0.01);
    }

    #[test]
    fn test_pace() {
        assert_eq!(pace_seconds_per_km(10.0, 3000), Some(300));
        assert_eq!(pace_seconds_per_km(0.0, 3000), None);
        assert_eq!(pace_seconds_per_km(10.0, 0), None);
        assert_eq!(format_pace(300), "5:00 /km");
        assert_eq!(format_pace(335), "5:35 /km");
    }

    #[test]
    fn test_date_part() {
        assert_eq!(date_part("2025-06-01T06:30:00.0"), "2025-06-01");
        assert_eq!(date_part(" June 1, 2025 "), "June 1, 2025");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  10.02\n  km "), "10.02 km");
    }
}
