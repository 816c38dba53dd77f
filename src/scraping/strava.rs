use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::models::ActivityStats;
use crate::scraping::embedded::{json_blobs, stats_from_json};
use crate::scraping::normalize::{
    collapse_whitespace, date_part, parse_distance_km, parse_duration, parse_elevation_m,
};

// Stat list items are keyed by a localized `title` attribute.
const DISTANCE_TITLES: &[&str] = &["距離", "Distance"];
const TIME_TITLES: &[&str] = &["經過時間", "移動時間", "Elapsed Time", "Moving Time", "Time"];
const ELEVATION_TITLES: &[&str] = &["海拔", "海拔爬升", "Elevation"];

lazy_static! {
    static ref TITLE: Selector = Selector::parse("h1.title").expect("title selector");
    static ref OG_TITLE: Selector =
        Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector");
    static ref DESCRIPTION: Selector = Selector::parse(
        r#"meta[property="og:description"], meta[name="description"]"#
    )
    .expect("description selector");
    static ref TIMESTAMP: Selector = Selector::parse("time.timestamp").expect("time selector");
    static ref DISTANCE: Vec<Selector> = stat_selectors(DISTANCE_TITLES);
    static ref TIME: Vec<Selector> = stat_selectors(TIME_TITLES);
    static ref ELEVATION: Vec<Selector> = stat_selectors(ELEVATION_TITLES);
}

fn stat_selectors(titles: &[&str]) -> Vec<Selector> {
    titles
        .iter()
        .filter_map(|title| Selector::parse(&format!(r#"li[title="{title}"] strong"#)).ok())
        .collect()
}

/// Subset of the `GET /activities/{id}` response from the Strava API.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaApiActivity {
    pub name: Option<String>,
    /// Metres.
    pub distance: Option<f64>,
    pub moving_time: Option<u64>,
    pub elapsed_time: Option<u64>,
    pub total_elevation_gain: Option<f64>,
    pub start_date_local: Option<String>,
}

impl From<StravaApiActivity> for ActivityStats {
    fn from(activity: StravaApiActivity) -> Self {
        ActivityStats {
            title: activity.name,
            distance_km: activity.distance.map(|m| m / 1000.0),
            distance_text: None,
            elapsed_seconds: activity.elapsed_time.or(activity.moving_time),
            elapsed_text: None,
            elevation_m: activity.total_elevation_gain,
            date: activity.start_date_local.as_deref().map(date_part),
        }
    }
}

/// Scrapes a public Strava activity page.
///
/// The stat list is tried first, then the share description, then any
/// embedded JSON blob.
pub fn parse_activity_html(html: &str) -> ActivityStats {
    let document = Html::parse_document(html);

    let mut stats = ActivityStats {
        title: first_text(&document, &[&*TITLE]).or_else(|| meta_content(&document, &OG_TITLE)),
        ..Default::default()
    };

    if let Some(text) = first_text(&document, &DISTANCE.iter().collect::<Vec<_>>()) {
        stats.distance_km = parse_distance_km(&text);
        stats.distance_text = Some(text);
    }

    if let Some(text) = first_text(&document, &TIME.iter().collect::<Vec<_>>()) {
        stats.elapsed_seconds = parse_duration(&text);
        stats.elapsed_text = Some(text);
    }

    if let Some(text) = first_text(&document, &ELEVATION.iter().collect::<Vec<_>>()) {
        stats.elevation_m = parse_elevation_m(&text);
    }

    stats.date = first_text(&document, &[&*TIMESTAMP]).map(|text| timestamp_date(&text));

    if !stats.is_complete() {
        if let Some(description) = meta_content(&document, &DESCRIPTION) {
            stats.fill_missing(stats_from_description(&description));
        }
    }

    if !stats.is_complete() {
        for blob in json_blobs(&document) {
            stats.fill_missing(stats_from_json(&blob));
        }
    }

    stats
}

/// Extracts what a share description carries, e.g.
/// `"Lin ran 10.02 km in 55m 3s on Strava."`.
pub fn stats_from_description(description: &str) -> ActivityStats {
    let mut stats = ActivityStats::default();

    let distance_part = description
        .split_once(" in ")
        .map(|(before, _)| before)
        .unwrap_or(description);
    stats.distance_km = parse_distance_km(
        distance_part
            .split_whitespace()
            .skip_while(|word| !word.starts_with(|c: char| c.is_ascii_digit()))
            .collect::<Vec<_>>()
            .join(" ")
            .as_str(),
    );

    if let Some((_, after)) = description.split_once(" in ") {
        let time_part = after.split(" on ").next().unwrap_or(after);
        stats.elapsed_seconds = parse_duration(time_part);
    }

    stats
}

/// The page shows `"<time of day> on <weekday>, <date>"`; keep what follows
/// the first comma.
fn timestamp_date(text: &str) -> String {
    match text.split_once(',') {
        Some((_, date)) => date.trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn first_text(document: &Html, selectors: &[&Selector]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
