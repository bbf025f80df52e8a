//! Endpoint configuration and pipeline constants.
//!
//! Endpoints resolve in three layers: an optional JSON `<script id="flow-config">`
//! element in the host page, then build-time environment variables, then the
//! built-in production URLs.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Production routing document endpoint.
pub const DEFAULT_API_URL: &str = "https://api.chefgroep.nl/api/routing";
/// Production server-push subscription endpoint.
pub const DEFAULT_SSE_URL: &str = "https://api.chefgroep.nl/api/routing/subscribe";

/// Total fetch attempts before giving up.
pub const FETCH_ATTEMPTS: u32 = 3;
/// Linear backoff unit: attempt `n` waits `n * FETCH_BACKOFF_UNIT` before retrying.
pub const FETCH_BACKOFF_UNIT: Duration = Duration::from_millis(1000);
/// Characters of a non-2xx response body kept for diagnostics.
pub const ERROR_BODY_LIMIT: usize = 200;

/// Fixed delay before a live-update reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(5000);
/// Consecutive reconnect attempts allowed per credential session.
pub const MAX_RECONNECTS: u32 = 5;
/// Server-push event that signals a changed routing document.
pub const ROUTING_UPDATED_EVENT: &str = "routing_updated";

/// Local storage slot holding the raw credential.
pub const CREDENTIAL_SLOT: &str = "mc_api_key";
/// Shortest credential the login form accepts.
pub const MIN_CREDENTIAL_LEN: usize = 20;

/// Columns in the default grid placement.
pub const GRID_COLUMNS: usize = 4;
/// Horizontal spacing between grid cells, in canvas units.
pub const GRID_CELL_WIDTH: f64 = 350.0;
/// Vertical spacing between grid cells, in canvas units.
pub const GRID_CELL_HEIGHT: f64 = 250.0;

/// Resolved endpoint pair used by the fetcher and the live-update channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// Routing document endpoint.
	pub api_url: String,
	/// Server-push subscription endpoint, without the token.
	pub sse_url: String,
}

/// Partial override as found in the host page. Missing fields fall through.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EndpointOverrides {
	/// Replacement routing document endpoint.
	pub api_url: Option<String>,
	/// Replacement subscription endpoint.
	pub sse_url: Option<String>,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self::from_build_env()
	}
}

impl Endpoints {
	/// Endpoints baked in at build time, falling back to production.
	pub fn from_build_env() -> Self {
		Self {
			api_url: option_env!("FLOW_SUITE_API_URL")
				.unwrap_or(DEFAULT_API_URL)
				.to_string(),
			sse_url: option_env!("FLOW_SUITE_SSE_URL")
				.unwrap_or(DEFAULT_SSE_URL)
				.to_string(),
		}
	}

	/// Apply page-level overrides on top of these endpoints. Blank values are ignored.
	pub fn with_overrides(self, overrides: EndpointOverrides) -> Self {
		let pick = |value: Option<String>, fallback: String| {
			value
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
				.unwrap_or(fallback)
		};
		Self {
			api_url: pick(overrides.api_url, self.api_url),
			sse_url: pick(overrides.sse_url, self.sse_url),
		}
	}

	/// Subscription URL carrying the credential as a url-encoded `token` parameter.
	pub fn subscribe_url(&self, credential: &str) -> Result<String, url::ParseError> {
		Url::parse_with_params(&self.sse_url, &[("token", credential)]).map(String::from)
	}
}
