//! Stats carried in JSON blobs: React props embedded in page markup,
//! `application/json` / `ld+json` script tags, or any API payload whose
//! exact shape we do not want to pin down.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::models::ActivityStats;
use crate::scraping::normalize::{
    collapse_whitespace, date_part, parse_distance_km, parse_duration, parse_elevation_m,
};

const ACTIVITY_KEYS: &[&str] = &["activity", "activityDetails"];
const TITLE_KEYS: &[&str] = &["activityName", "name", "title"];
const DISTANCE_KEYS: &[&str] = &["distance", "totalDistance"];
const TIME_KEYS: &[&str] = &[
    "elapsedTime",
    "elapsed_time",
    "duration",
    "movingTime",
    "moving_time",
    "movingDuration",
];
const ELEVATION_KEYS: &[&str] = &[
    "elevationGain",
    "elevation_gain",
    "total_elevation_gain",
    "totalElevationGain",
];
const DATE_KEYS: &[&str] = &[
    "startDateLocal",
    "start_date_local",
    "startTimeLocal",
    "startDate",
    "start_date",
];

lazy_static! {
    static ref REACT_PROPS: Selector =
        Selector::parse("[data-react-props]").expect("react props selector");
    static ref JSON_SCRIPTS: Selector = Selector::parse(
        r#"script[type="application/json"], script[type="application/ld+json"]"#
    )
    .expect("json script selector");
}

/// Collects every JSON blob embedded in the page that parses.
pub fn json_blobs(document: &Html) -> Vec<Value> {
    let props = document
        .select(&REACT_PROPS)
        .filter_map(|element| element.value().attr("data-react-props"))
        .map(str::to_string);
    let scripts = document
        .select(&JSON_SCRIPTS)
        .map(|element| element.text().collect::<String>());

    props
        .chain(scripts)
        .filter_map(|raw| serde_json::from_str::<Value>(&raw).ok())
        .collect()
}

/// Extracts stats from an arbitrary JSON document.
///
/// Numeric distances are metres, numeric durations seconds and numeric
/// elevations metres, which is what both Strava and Garmin emit.
///
/// When the blob nests an activity object, its fields win over same-named
/// fields elsewhere (an athlete's `name`, a club's `distance`).
pub fn stats_from_json(value: &Value) -> ActivityStats {
    match find_object(value, ACTIVITY_KEYS) {
        Some(activity) => {
            let mut stats = stats_in(activity);
            stats.fill_missing(stats_in(value));
            stats
        }
        None => stats_in(value),
    }
}

fn stats_in(value: &Value) -> ActivityStats {
    let mut stats = ActivityStats::default();

    if let Some(title) = find_key(value, TITLE_KEYS).and_then(Value::as_str) {
        let title = collapse_whitespace(title);
        if !title.is_empty() {
            stats.title = Some(title);
        }
    }

    match find_key(value, DISTANCE_KEYS) {
        Some(Value::Number(n)) => stats.distance_km = n.as_f64().map(|m| m / 1000.0),
        Some(Value::String(s)) => {
            stats.distance_km = parse_distance_km(s);
            stats.distance_text = Some(collapse_whitespace(s));
        }
        _ => {}
    }

    match find_key(value, TIME_KEYS) {
        Some(Value::Number(n)) => stats.elapsed_seconds = n.as_f64().map(|s| s.round() as u64),
        Some(Value::String(s)) => {
            stats.elapsed_seconds = parse_duration(s);
            stats.elapsed_text = Some(collapse_whitespace(s));
        }
        _ => {}
    }

    match find_key(value, ELEVATION_KEYS) {
        Some(Value::Number(n)) => stats.elevation_m = n.as_f64(),
        Some(Value::String(s)) => stats.elevation_m = parse_elevation_m(s),
        _ => {}
    }

    if let Some(date) = find_key(value, DATE_KEYS).and_then(Value::as_str) {
        stats.date = Some(date_part(date));
    }

    stats
}

/// Depth-first search for the first non-null value stored under any of `keys`.
/// Keys are tried in priority order at each object before descending.
fn find_key<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            for key in keys {
                match map.get(*key) {
                    Some(Value::Null) | None => continue,
                    Some(found) if is_scalar(found) => return Some(found),
                    Some(_) => continue,
                }
            }
            map.values().find_map(|child| find_key(child, keys))
        }
        Value::Array(items) => items.iter().find_map(|child| find_key(child, keys)),
        _ => None,
    }
}

/// Depth-first search for the first object stored under any of `keys`.
fn find_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    match value {
        Value::Object(map) => keys
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|found| found.is_object())
            .or_else(|| map.values().find_map(|child| find_object(child, keys))),
        Value::Array(items) => items.iter().find_map(|child| find_object(child, keys)),
        _ => None,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}
