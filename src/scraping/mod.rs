pub mod embedded;
pub mod garmin;
pub mod normalize;
pub mod strava;

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::models::ActivitySource;

lazy_static! {
    static ref STRAVA_PATH: Regex = Regex::new(r"^/activities/(\d+)/?$").expect("strava path regex");
    static ref GARMIN_PATH: Regex =
        Regex::new(r"^/(?:modern|app)/activity/(\d+)/?$").expect("garmin path regex");
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported activity URL: {0}")]
    UnsupportedUrl(String),
    #[error("Activity host is not allowed: {0}")]
    HostNotAllowed(String),
    #[error("Request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// A validated link to one activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRef {
    pub source: ActivitySource,
    pub activity_id: String,
    pub url: Url,
}

impl ActivityRef {
    /// Parses `raw` and identifies the service from the URL path.
    ///
    /// The host must appear in `allowed_hosts`; the path decides between
    /// Strava (`/activities/<id>`) and Garmin (`/modern/activity/<id>`,
    /// `/app/activity/<id>`).
    pub fn parse(raw: &str, allowed_hosts: &[String]) -> Result<Self, ScrapeError> {
        let url = Url::parse(raw.trim())?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::UnsupportedUrl(raw.to_string()));
        }

        let host = url
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| ScrapeError::UnsupportedUrl(raw.to_string()))?;
        if !allowed_hosts.iter().any(|allowed| *allowed == host) {
            return Err(ScrapeError::HostNotAllowed(host));
        }

        let path = url.path();
        let (source, activity_id) = if let Some(caps) = STRAVA_PATH.captures(path) {
            (ActivitySource::Strava, caps[1].to_string())
        } else if let Some(caps) = GARMIN_PATH.captures(path) {
            (ActivitySource::Garmin, caps[1].to_string())
        } else {
            return Err(ScrapeError::UnsupportedUrl(raw.to_string()));
        };

        Ok(Self {
            source,
            activity_id,
            url,
        })
    }
}
