use serde::Serialize;
use std::fmt;

use crate::scraping::normalize::{format_duration, format_pace, pace_seconds_per_km};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ActivitySource {
    Strava,
    Garmin,
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self {
            ActivitySource::Strava => "strava",
            ActivitySource::Garmin => "garmin",
        };
        write!(f, "{source}")
    }
}

/// Statistics scraped from one activity.
///
/// Every field is optional: pages change markup between releases and a
/// partial scrape still produces a certificate.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ActivityStats {
    pub title: Option<String>,
    pub distance_km: Option<f64>,
    /// Distance text as shown on the page, kept when it could not be parsed.
    pub distance_text: Option<String>,
    pub elapsed_seconds: Option<u64>,
    pub elapsed_text: Option<String>,
    pub elevation_m: Option<f64>,
    pub date: Option<String>,
}

impl ActivityStats {
    /// Copies fields from `other` that are still missing here.
    pub fn fill_missing(&mut self, other: ActivityStats) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.distance_km.is_none() {
            self.distance_km = other.distance_km;
            if self.distance_text.is_none() {
                self.distance_text = other.distance_text;
            }
        }
        if self.elapsed_seconds.is_none() {
            self.elapsed_seconds = other.elapsed_seconds;
            if self.elapsed_text.is_none() {
                self.elapsed_text = other.elapsed_text;
            }
        }
        if self.elevation_m.is_none() {
            self.elevation_m = other.elevation_m;
        }
        if self.date.is_none() {
            self.date = other.date;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.title.is_some()
            && self.distance_km.is_some()
            && self.elapsed_seconds.is_some()
            && self.date.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == ActivityStats::default()
    }

    pub fn distance_display(&self) -> Option<String> {
        match self.distance_km {
            Some(km) => Some(format!("{km:.2} km")),
            None => self.distance_text.clone(),
        }
    }

    pub fn elapsed_display(&self) -> Option<String> {
        match self.elapsed_seconds {
            Some(seconds) => Some(format_duration(seconds)),
            None => self.elapsed_text.clone(),
        }
    }

    pub fn pace_display(&self) -> Option<String> {
        let seconds = self.elapsed_seconds?;
        let km = self.distance_km?;
        pace_seconds_per_km(km, seconds).map(format_pace)
    }

    pub fn elevation_display(&self) -> Option<String> {
        self.elevation_m.map(|m| format!("{m:.0} m"))
    }
}
