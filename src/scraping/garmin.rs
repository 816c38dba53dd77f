use scraper::Html;
use serde::Deserialize;

use crate::models::ActivityStats;
use crate::scraping::embedded::{json_blobs, stats_from_json};
use crate::scraping::normalize::date_part;

/// Subset of `GET /activity-service/activity/{id}` from Garmin Connect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivity {
    pub activity_name: Option<String>,
    #[serde(rename = "summaryDTO")]
    pub summary: Option<GarminSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminSummary {
    /// Metres.
    pub distance: Option<f64>,
    /// Elapsed seconds.
    pub duration: Option<f64>,
    pub moving_duration: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub start_time_local: Option<String>,
}

impl From<GarminActivity> for ActivityStats {
    fn from(activity: GarminActivity) -> Self {
        let summary = activity.summary.unwrap_or_default();
        ActivityStats {
            title: activity.activity_name.filter(|name| !name.trim().is_empty()),
            distance_km: summary.distance.map(|m| m / 1000.0),
            distance_text: None,
            elapsed_seconds: summary
                .duration
                .or(summary.moving_duration)
                .map(|s| s.round() as u64),
            elapsed_text: None,
            elevation_m: summary.elevation_gain,
            date: summary.start_time_local.as_deref().map(date_part),
        }
    }
}

/// Scrapes whatever a public Garmin Connect page embeds.
///
/// The page is a single-page app, so only share metadata and embedded JSON
/// state are available without the activity service.
pub fn parse_activity_html(html: &str) -> ActivityStats {
    let document = Html::parse_document(html);
    let mut stats = ActivityStats::default();
    for blob in json_blobs(&document) {
        stats.fill_missing(stats_from_json(&blob));
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_conversion() {
        let activity: GarminActivity = serde_json::from_str(
            r#"{
                "activityId": 42,
                "activityName": "Taipei Marathon",
                "summaryDTO": {
                    "startTimeLocal": "2025-12-21T07:00:00.0",
                    "distance": 42195.0,
                    "duration": 14706.4,
                    "movingDuration": 14600.0,
                    "elevationGain": 95.0,
                    "averageSpeed": 2.87
                }
            }"#,
        )
        .unwrap();

        let stats = ActivityStats::from(activity);
        assert_eq!(stats.title.as_deref(), Some("Taipei Marathon"));
        assert_eq!(stats.distance_km, Some(42.195));
        assert_eq!(stats.elapsed_seconds, Some(14706));
        assert_eq!(stats.elevation_m, Some(95.0));
        assert_eq!(stats.date.as_deref(), Some("2025-12-21"));
    }

    #[test]
    fn test_missing_summary() {
        let activity: GarminActivity =
            serde_json::from_str(r#"{"activityName": "  "}"#).unwrap();

        let stats = ActivityStats::from(activity);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_embedded_state() {
        let html = r#"
            <script type="application/json">
              {"activity": {"activityName": "Easy", "summaryDTO": {"distance": 3000, "duration": 1200}}}
            </script>
        "#;

        let stats = parse_activity_html(html);
        assert_eq!(stats.title.as_deref(), Some("Easy"));
        assert_eq!(stats.distance_km, Some(3.0));
        assert_eq!(stats.elapsed_seconds, Some(1200));
    }
}
