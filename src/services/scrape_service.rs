use reqwest::{header, redirect, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::models::{ActivitySource, ActivityStats};
use crate::scraping::garmin::GarminActivity;
use crate::scraping::strava::StravaApiActivity;
use crate::scraping::{garmin, strava, ActivityRef, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; finisher-cert/0.1)";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub allowed_hosts: Vec<String>,
    pub strava_access_token: Option<String>,
    pub strava_api_base: String,
    pub garmin_api_base: String,
}

/// Fetches activity stats from Strava or Garmin Connect.
///
/// Structured APIs are preferred when available; the public page is the
/// fallback, so a change on one side degrades instead of failing.
pub struct ScrapeService {
    client: Client,
    settings: ScrapeSettings,
}

impl ScrapeService {
    pub fn new(settings: ScrapeSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .redirect(redirect_policy(settings.allowed_hosts.clone()))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, settings }
    }

    pub fn resolve(&self, raw_url: &str) -> Result<ActivityRef, ScrapeError> {
        ActivityRef::parse(raw_url, &self.settings.allowed_hosts)
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<ActivityStats, ScrapeError> {
        let activity = self.resolve(raw_url)?;
        tracing::info!(
            "Scraping {} activity {}",
            activity.source,
            activity.activity_id
        );

        let stats = match activity.source {
            ActivitySource::Strava => self.scrape_strava(&activity).await?,
            ActivitySource::Garmin => self.scrape_garmin(&activity).await?,
        };

        if !stats.is_complete() {
            tracing::warn!(
                "Incomplete stats for {} activity {}: {:?}",
                activity.source,
                activity.activity_id,
                stats
            );
        }

        Ok(stats)
    }

    async fn scrape_strava(&self, activity: &ActivityRef) -> Result<ActivityStats, ScrapeError> {
        if let Some(token) = &self.settings.strava_access_token {
            let url = format!(
                "{}/activities/{}",
                self.settings.strava_api_base.trim_end_matches('/'),
                activity.activity_id
            );
            match self.fetch_json::<StravaApiActivity>(&url, Some(token)).await {
                Ok(api_activity) => return Ok(api_activity.into()),
                Err(e) => tracing::warn!("Strava API lookup failed, scraping page: {}", e),
            }
        }

        let html = self.fetch_html(activity).await?;
        Ok(strava::parse_activity_html(&html))
    }

    async fn scrape_garmin(&self, activity: &ActivityRef) -> Result<ActivityStats, ScrapeError> {
        let url = format!(
            "{}/activity-service/activity/{}",
            self.settings.garmin_api_base.trim_end_matches('/'),
            activity.activity_id
        );
        let api_error = match self.fetch_json::<GarminActivity>(&url, None).await {
            Ok(api_activity) => return Ok(api_activity.into()),
            Err(e) => e,
        };
        tracing::warn!("Garmin activity service lookup failed, scraping page: {}", api_error);

        let html = self.fetch_html(activity).await?;
        let stats = garmin::parse_activity_html(&html);
        if stats.is_empty() {
            // Nothing embedded either; the service error is the useful one.
            return Err(api_error);
        }
        Ok(stats)
    }

    async fn fetch_html(&self, activity: &ActivityRef) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(activity.url.clone())
            .header(header::ACCEPT, "text/html")
            .send()
            .await?;
        let response = check_status(response)?;
        Ok(response.text().await?)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&String>,
    ) -> Result<T, ScrapeError> {
        let mut request = self.client.get(url).header(header::ACCEPT, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = check_status(request.send().await?)?;
        Ok(response.json::<T>().await?)
    }
}

fn check_status(response: Response) -> Result<Response, ScrapeError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ScrapeError::Status {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Follows redirects only while they stay on an allowed host. A hop
/// elsewhere stops, so the 3xx surfaces as a status error.
fn redirect_policy(allowed_hosts: Vec<String>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        let host = attempt.url().host_str().map(str::to_ascii_lowercase);
        let permitted = host
            .as_deref()
            .is_some_and(|host| allowed_hosts.iter().any(|allowed| allowed == host));

        if !permitted {
            tracing::warn!(
                "Refusing redirect to {} (host not allowed)",
                attempt.url()
            );
            attempt.stop()
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    })
}
