use crate::error::{Result, SweepError};
use crate::gradle::version::VersionComparator;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const GRADLE_RELEASES_URL: &str =
    "https://raw.githubusercontent.com/gradle/gradle/master/released-versions.json";

/// Source of the latest released Gradle version.
pub trait VersionProvider: Send + Sync {
    fn latest(&self) -> Result<String>;
}

/// Reads the release index published in the Gradle repository.
pub struct GradleReleasesClient {
    client: Client,
    index_url: Url,
}

impl GradleReleasesClient {
    pub fn new(index_url: &str) -> Result<Self> {
        let index_url = Self::validate_index_url(index_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("gradle-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SweepError::VersionLookupFailed(format!("HTTP client setup: {e}")))?;

        Ok(Self { client, index_url })
    }

    fn validate_index_url(raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|e| {
            SweepError::ProjectValidation(format!("Invalid release index URL '{raw}': {e}"))
        })?;

        match url.scheme() {
            "https" | "http" => Ok(url),
            other => Err(SweepError::ProjectValidation(format!(
                "Unsupported scheme '{other}' for release index URL '{raw}'"
            ))),
        }
    }

    fn fetch_index(&self) -> Result<String> {
        debug!(url = %self.index_url, "fetching Gradle release index");

        let response = self
            .client
            .get(self.index_url.clone())
            .send()
            .map_err(|e| SweepError::VersionLookupFailed(format!("{}: {e}", self.index_url)))?;

        if !response.status().is_success() {
            return Err(SweepError::VersionLookupFailed(format!(
                "HTTP {} from {}",
                response.status(),
                self.index_url
            )));
        }

        response
            .text()
            .map_err(|e| SweepError::VersionLookupFailed(format!("reading response body: {e}")))
    }
}

impl VersionProvider for GradleReleasesClient {
    fn latest(&self) -> Result<String> {
        let body = self.fetch_index()?;
        latest_final_release(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ReleaseIndex {
    #[serde(rename = "finalReleases", default)]
    final_releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    version: String,
}

static FINAL_RELEASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.]+$").unwrap());

/// Pick the newest plain numeric release out of a `released-versions.json` document.
pub fn latest_final_release(json: &str) -> Result<String> {
    let index: ReleaseIndex = serde_json::from_str(json)
        .map_err(|e| SweepError::VersionLookupFailed(format!("unparseable release index: {e}")))?;

    let candidates = index
        .final_releases
        .into_iter()
        .map(|r| r.version)
        .filter(|v| FINAL_RELEASE.is_match(v));

    VersionComparator::latest(candidates).ok_or_else(|| {
        SweepError::VersionLookupFailed("release index lists no final release".to_string())
    })
}

/// Remembers the first successful lookup for the rest of the run.
pub struct CachedVersionProvider {
    inner: Arc<dyn VersionProvider>,
    cached: Mutex<Option<String>>,
}

impl CachedVersionProvider {
    pub fn new(inner: Arc<dyn VersionProvider>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

impl VersionProvider for CachedVersionProvider {
    fn latest(&self) -> Result<String> {
        // Holding the lock across the lookup keeps concurrent first callers
        // from fetching twice.
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(version) = cached.as_ref() {
            return Ok(version.clone());
        }

        let version = self.inner.latest()?;
        debug!(%version, "latest Gradle version resolved");
        *cached = Some(version.clone());
        Ok(version)
    }
}
