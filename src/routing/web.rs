//! Browser implementations of the fetch seams: `window.fetch` and `setTimeout`.

use std::time::Duration;

use js_sys::{Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCache, RequestCredentials, RequestInit, RequestMode, Response};

use super::{FetchError, RawResponse, RoutingTransport, Sleeper};

/// `fetch`-backed transport with caching disabled end to end.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

fn js_error(context: &str, value: JsValue) -> FetchError {
	FetchError::Network(format!("{context}: {value:?}"))
}

impl BrowserTransport {
	fn request(url: &str, credential: &str) -> Result<Request, JsValue> {
		let headers = Headers::new()?;
		headers.set("Authorization", &format!("Bearer {credential}"))?;
		headers.set("Content-Type", "application/json")?;
		headers.set("Cache-Control", "no-cache, no-store, must-revalidate")?;
		headers.set("Pragma", "no-cache")?;

		let init = RequestInit::new();
		init.set_method("GET");
		init.set_mode(RequestMode::Cors);
		init.set_credentials(RequestCredentials::Include);
		init.set_cache(RequestCache::NoStore);
		init.set_headers(headers.as_ref());

		Request::new_with_str_and_init(url, &init)
	}
}

impl RoutingTransport for BrowserTransport {
	async fn get(&self, url: &str, credential: &str) -> Result<RawResponse, FetchError> {
		let request = Self::request(url, credential).map_err(|e| js_error("request", e))?;
		let window = web_sys::window().ok_or_else(|| FetchError::Network("no window".into()))?;

		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| js_error("fetch", e))?
			.dyn_into()
			.map_err(|e| js_error("response", e))?;

		let text = response.text().map_err(|e| js_error("body", e))?;
		let body = JsFuture::from(text)
			.await
			.map_err(|e| js_error("body", e))?
			.as_string()
			.unwrap_or_default();

		Ok(RawResponse {
			status: response.status(),
			body,
		})
	}
}

/// Sleeps on a `setTimeout`-resolved promise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutSleeper;

impl Sleeper for TimeoutSleeper {
	async fn sleep(&self, duration: Duration) {
		let millis = duration.as_millis().min(i32::MAX as u128) as i32;
		let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
			let scheduled = web_sys::window().and_then(|window| {
				window
					.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
					.ok()
			});
			if scheduled.is_none() {
				let _ = resolve.call0(&JsValue::NULL);
			}
		});
		let _ = JsFuture::from(promise).await;
	}
}
