pub mod chat;
pub mod employees;
pub mod error;
pub mod search;
pub mod summary;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client, RequestBuilder, StatusCode,
	header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use serde_json::{Map, Value};

use orgscope_config::{Api, Retry};

pub fn auth_headers(token: Option<&str>, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

	if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
		headers.insert(AUTHORIZATION, format!("Bearer {}", token.trim()).parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Whether a request may be sent again after a transport error or a 5xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
	/// Reads and searches. Repeating them has no side effects.
	Safe,
	/// Requests the server may already have acted on, such as a chat turn.
	Never,
}

/// Shared HTTP client for the search, employee, summary and chat endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
	http: Client,
	base_url: String,
	chat_base_url: String,
	default_headers: Map<String, Value>,
	retry: Retry,
}
impl ApiClient {
	pub fn new(api: &Api) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(api.timeout_ms)).build()?;

		Ok(Self {
			http,
			base_url: api.base_url.trim_end_matches('/').to_string(),
			chat_base_url: api.chat_base().trim_end_matches('/').to_string(),
			default_headers: api.default_headers.clone(),
			retry: api.retry.clone(),
		})
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base_url)
	}

	pub fn chat_url(&self, path: &str) -> String {
		format!("{}{path}", self.chat_base_url)
	}

	pub(crate) async fn get_json(
		&self,
		url: &str,
		query: &[(&str, String)],
		token: Option<&str>,
	) -> Result<Value> {
		let headers = auth_headers(token, &self.default_headers)?;

		self.execute(url, Replay::Safe, || self.http.get(url).headers(headers.clone()).query(query))
			.await
	}

	pub(crate) async fn post_json<B>(
		&self,
		url: &str,
		body: &B,
		token: Option<&str>,
		replay: Replay,
	) -> Result<Value>
	where
		B: Serialize + ?Sized,
	{
		let headers = auth_headers(token, &self.default_headers)?;

		self.execute(url, replay, || self.http.post(url).headers(headers.clone()).json(body)).await
	}

	async fn execute<F>(&self, url: &str, replay: Replay, build: F) -> Result<Value>
	where
		F: Fn() -> RequestBuilder,
	{
		let max_retries = match replay {
			Replay::Safe => self.retry.max_retries,
			Replay::Never => 0,
		};
		let mut attempt = 0;

		loop {
			match send_once(url, build()).await {
				Ok(json) => return Ok(json),
				Err(err) if err.is_retryable() && attempt < max_retries => {
					attempt += 1;

					let delay = self.retry.base_delay_ms.saturating_mul(u64::from(attempt));

					tracing::warn!(url, attempt, delay_ms = delay, error = %err, "Retrying request.");
					tokio::time::sleep(Duration::from_millis(delay)).await;
				},
				Err(err) => return Err(err),
			}
		}
	}
}

async fn send_once(url: &str, request: RequestBuilder) -> Result<Value> {
	let res = request.send().await?;
	let status = res.status();

	if status == StatusCode::UNAUTHORIZED {
		return Err(Error::Unauthorized { url: url.to_string() });
	}
	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { url: url.to_string(), status: status.as_u16(), body });
	}

	let bytes = res.bytes().await?;

	Ok(serde_json::from_slice(&bytes)?)
}

/// First non-blank string among `keys`.
pub(crate) fn text_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
	keys.iter()
		.filter_map(|key| value.get(*key).and_then(Value::as_str))
		.map(str::trim)
		.find(|text| !text.is_empty())
}

/// Ids arrive as strings or numbers depending on the index.
pub(crate) fn id_field(value: &Value, keys: &[&str]) -> Option<String> {
	keys.iter().filter_map(|key| value.get(*key)).find_map(|id| match id {
		Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	})
}

pub(crate) fn int_field(value: &Value, keys: &[&str]) -> Option<i64> {
	keys.iter().filter_map(|key| value.get(*key)).find_map(|raw| match raw {
		Value::Number(number) => number.as_i64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	})
}

pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
	value
		.get(key)
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_ids_from_strings_and_numbers() {
		let json = serde_json::json!({ "id": 42, "_id": "x" });

		assert_eq!(id_field(&json, &["id", "_id"]).as_deref(), Some("42"));
		assert_eq!(id_field(&json, &["missing", "_id"]).as_deref(), Some("x"));
		assert_eq!(int_field(&serde_json::json!({ "level": "3" }), &["level"]), Some(3));
	}
}
