//! Authenticated routing document retrieval with linear retry backoff.

use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use super::RoutingDocument;
use crate::config::{ERROR_BODY_LIMIT, FETCH_ATTEMPTS, FETCH_BACKOFF_UNIT};

/// Why a routing document could not be obtained.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
	/// Transport failure before a response arrived.
	#[error("network error: {0}")]
	Network(String),
	/// The server answered with a non-2xx status.
	#[error("HTTP {status}: {body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Head of the response body.
		body: String,
	},
	/// The body was not a routing document.
	#[error("invalid routing document: {0}")]
	Decode(String),
	/// No attempt produced an error to report.
	#[error("all retry attempts exhausted")]
	Exhausted,
}

impl FetchError {
	/// Non-2xx error keeping only the head of the body.
	pub fn status(status: u16, body: &str) -> Self {
		FetchError::Status {
			status,
			body: body.chars().take(ERROR_BODY_LIMIT).collect(),
		}
	}
}

/// Status and body text of a completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body text.
	pub body: String,
}

impl RawResponse {
	/// Whether the status is 2xx.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// One uncached `GET` carrying the credential as a bearer token.
#[allow(async_fn_in_trait)]
pub trait RoutingTransport {
	/// Fetch `url` with `credential` as bearer token.
	async fn get(&self, url: &str, credential: &str) -> Result<RawResponse, FetchError>;
}

/// Suspends the current task. Faked in tests.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
	/// Resume after `duration`.
	async fn sleep(&self, duration: Duration);
}

/// Stateless fetcher for one routing endpoint.
#[derive(Clone, Debug)]
pub struct Fetcher<T, S> {
	transport: T,
	sleeper: S,
	url: String,
}

impl<T: RoutingTransport, S: Sleeper> Fetcher<T, S> {
	/// Fetcher for the routing document at `url`.
	pub fn new(transport: T, sleeper: S, url: impl Into<String>) -> Self {
		Self {
			transport,
			sleeper,
			url: url.into(),
		}
	}

	/// Endpoint this fetcher reads.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Fetch and decode the routing document.
	///
	/// Makes up to [`FETCH_ATTEMPTS`] attempts, waiting `attempt * 1s` after
	/// each failed one. Returns the last attempt's error once the budget is spent.
	pub async fn fetch(&self, credential: &str) -> Result<RoutingDocument, FetchError> {
		let mut last_error = None;

		for attempt in 1..=FETCH_ATTEMPTS {
			match self.attempt(credential).await {
				Ok(doc) => return Ok(doc),
				Err(err) => {
					warn!("flow-suite: fetch attempt {attempt}/{FETCH_ATTEMPTS} failed: {err}");
					last_error = Some(err);
				}
			}

			if attempt < FETCH_ATTEMPTS {
				let delay = FETCH_BACKOFF_UNIT * attempt;
				debug!("flow-suite: retrying fetch in {}ms", delay.as_millis());
				self.sleeper.sleep(delay).await;
			}
		}

		Err(last_error.unwrap_or(FetchError::Exhausted))
	}

	async fn attempt(&self, credential: &str) -> Result<RoutingDocument, FetchError> {
		let response = self.transport.get(&self.url, credential).await?;
		if !response.is_success() {
			return Err(FetchError::status(response.status, &response.body));
		}
		serde_json::from_str(&response.body).map_err(|e| FetchError::Decode(e.to_string()))
	}
}
