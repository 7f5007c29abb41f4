//! HTTP adapter for the Overpass geographic query service.
//!
//! [`OverpassClient`] implements the synchronous
//! [`BusinessSource`] trait by blocking on async HTTP calls internally,
//! keeping the sync orchestrator free of runtime concerns. The query asks
//! for every shop, amenity, tourism, office, and craft element around the
//! configured centre; the client keeps only elements that are tagged with a
//! name.
//!
//! # Example
//!
//! ```no_run
//! use annuaire_core::BusinessSource;
//! use annuaire_data::{OverpassClient, OverpassConfig};
//!
//! let config = OverpassConfig::default().with_radius_meters(5_000);
//! let client = OverpassClient::with_config(config)?;
//! let elements = client.fetch_businesses()?;
//! println!("fetched {} named elements", elements.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use geo::Coord;
use log::debug;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use annuaire_core::{BusinessSource, FetchError, SourceElement};

mod response;

pub use response::{OverpassCenter, OverpassElement, OverpassResponse};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default query centre (Haguenau, Alsace).
pub const DEFAULT_CENTER: Coord<f64> = Coord { x: 7.79, y: 48.82 };

/// Default query radius in metres.
pub const DEFAULT_RADIUS_METERS: u32 = 30_000;

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "annuaire-sync/0.1";

/// Default request timeout in seconds. Overpass evaluates the query server
/// side, so this is far longer than a typical API timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Errors raised when constructing an [`OverpassClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the internal Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoint URL.
    pub base_url: String,
    /// Query centre, `x = longitude`, `y = latitude`.
    pub center: Coord<f64>,
    /// Query radius in metres.
    pub radius_meters: u32,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OVERPASS_URL.to_owned(),
            center: DEFAULT_CENTER,
            radius_meters: DEFAULT_RADIUS_METERS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OverpassConfig {
    /// Create a configuration pointing at the given interpreter endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the query centre.
    #[must_use]
    pub fn with_center(mut self, center: Coord<f64>) -> Self {
        self.center = center;
        self
    }

    /// Set the query radius in metres.
    #[must_use]
    pub fn with_radius_meters(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
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
}

/// HTTP client for the Overpass interpreter.
///
/// Owns a reusable Tokio runtime so the synchronous [`BusinessSource`]
/// implementation does not rebuild one per fetch. When called from inside a
/// multi-threaded Tokio runtime the client reuses that runtime's handle via
/// [`tokio::task::block_in_place`]; from a `current_thread` runtime it falls
/// back to its own stored runtime.
pub struct OverpassClient {
    client: Client,
    config: OverpassConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for OverpassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OverpassClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::with_config(OverpassConfig::default())
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OverpassConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(30))
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// The Overpass QL query selecting every candidate element family
    /// (nodes and ways for shop, amenity, tourism, office, craft) around the
    /// configured centre.
    #[must_use]
    pub fn build_query(&self) -> String {
        let radius = self.config.radius_meters;
        let lat = self.config.center.y;
        let lng = self.config.center.x;
        let selectors: String = ["shop", "amenity", "tourism", "office", "craft"]
            .iter()
            .map(|family| {
                format!(
                    "  node[\"{family}\"](around:{radius},{lat},{lng});\n  way[\"{family}\"](around:{radius},{lat},{lng});\n"
                )
            })
            .collect();

        format!("[out:json][timeout:300];\n(\n{selectors});\nout center body;\n")
    }

    /// Fetch and filter elements asynchronously.
    async fn fetch_async(&self) -> Result<Vec<SourceElement>, FetchError> {
        let url = &self.config.base_url;

        let response = self
            .client
            .post(url.as_str())
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(self.build_query())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let decoded: OverpassResponse =
            response.json().await.map_err(|err| FetchError::Decode {
                message: err.to_string(),
            })?;

        let total = decoded.elements.len();
        let named: Vec<SourceElement> = decoded
            .elements
            .into_iter()
            .filter(OverpassElement::is_named)
            .map(OverpassElement::into_source_element)
            .collect();
        debug!("overpass answered {total} elements, {} named", named.len());

        Ok(named)
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            };
        }

        FetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl BusinessSource for OverpassClient {
    /// Fetch all named candidate elements for one sync run.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime must
    /// be multi-threaded; from a `current_thread` runtime the client blocks
    /// on its own internal runtime instead, which may deadlock if the
    /// caller's runtime is driving IO this request depends on.
    fn fetch_businesses(&self) -> Result<Vec<SourceElement>, FetchError> {
        let future = self.fetch_async();
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own.
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn query_covers_every_tag_family_for_nodes_and_ways() {
        let client = OverpassClient::new().expect("client should build");
        let query = client.build_query();

        for family in ["shop", "amenity", "tourism", "office", "craft"] {
            assert!(query.contains(&format!("node[\"{family}\"](around:30000,48.82,7.79);")));
            assert!(query.contains(&format!("way[\"{family}\"](around:30000,48.82,7.79);")));
        }
        assert!(query.starts_with("[out:json]"));
        assert!(query.contains("out center body;"));
    }

    #[rstest]
    fn query_reflects_configured_centre_and_radius() {
        let config = OverpassConfig::new("http://overpass.local")
            .with_center(Coord { x: 7.75, y: 48.58 })
            .with_radius_meters(1_000);
        let client = OverpassClient::with_config(config).expect("client should build");

        assert!(client.build_query().contains("(around:1000,48.58,7.75)"));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = OverpassConfig::new("http://overpass.local")
            .with_timeout(Duration::from_secs(10))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://overpass.local");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[rstest]
    fn unreachable_endpoint_reports_network_error() {
        // Port 9 (discard) on localhost is not listening.
        let config = OverpassConfig::new("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = OverpassClient::with_config(config).expect("client should build");

        let err = client.fetch_businesses().expect_err("fetch should fail");
        assert!(matches!(
            err,
            FetchError::Network { .. } | FetchError::Timeout { .. }
        ));
    }
}
