//! HTTP `FacilitySource` backed by an Overpass API endpoint.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use thiserror::Error;
use trailside_core::{Bounds, Facility, FacilityFetchError, FacilitySource, FacilityType};

use super::{parse_facilities, query::build_query};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "trailside-overpass/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Error type for [`OverpassFacilitySource`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`OverpassFacilitySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassConfig {
    /// Interpreter URL receiving the POSTed query.
    pub endpoint: String,
    /// Transport timeout, also sent to Overpass as the server-side limit.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Amenities to request; empty means every supported type.
    pub facility_types: Vec<FacilityType>,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            facility_types: FacilityType::ALL.to_vec(),
        }
    }
}

impl OverpassConfig {
    /// Create a configuration targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Restrict the amenities requested.
    #[must_use]
    pub fn with_facility_types(mut self, types: impl IntoIterator<Item = FacilityType>) -> Self {
        self.facility_types = types.into_iter().collect();
        self
    }
}

/// Facility source that queries an Overpass interpreter over HTTP.
///
/// The query is sent as the `data` form field of a POST request. Transport
/// failures, timeouts and non-success statuses map onto the matching
/// [`FacilityFetchError`] variants; no retries are attempted.
#[derive(Debug, Clone)]
pub struct OverpassFacilitySource {
    client: Client,
    config: OverpassConfig,
}

impl OverpassFacilitySource {
    /// Create a source for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OverpassConfig::new(endpoint))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: OverpassConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    /// Overpass QL sent for `bounds`.
    #[must_use]
    pub fn query_for(&self, bounds: &Bounds) -> String {
        build_query(bounds, &self.config.facility_types, self.config.timeout)
    }

    /// POST `query` and return the non-empty response body.
    async fn fetch_body(&self, query: &str) -> Result<String, FacilityFetchError> {
        let url = self.config.endpoint.as_str();
        let response = self
            .client
            .post(url)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        if body.trim().is_empty() {
            return Err(FacilityFetchError::EmptyResponse {
                url: url.to_owned(),
            });
        }
        Ok(body)
    }

    /// Convert a reqwest error to a `FacilityFetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FacilityFetchError {
        if error.is_timeout() {
            return FacilityFetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FacilityFetchError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        FacilityFetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl FacilitySource for OverpassFacilitySource {
    async fn fetch_facilities(
        &self,
        bounds: &Bounds,
    ) -> Result<Vec<Facility>, FacilityFetchError> {
        let query = self.query_for(bounds);
        debug!("requesting facilities for {bounds} from {}", self.config.endpoint);
        let body = self.fetch_body(&query).await?;
        let facilities = parse_facilities(&body).map_err(|err| FacilityFetchError::Parse {
            message: err.to_string(),
        })?;
        info!("Overpass returned {} facilities for {bounds}", facilities.len());
        Ok(facilities)
    }
}
