//! Request/response log events with masking hooks.
//!
//! With the `tracing` feature enabled, the registry emits one `info` event ("Rest request sent") before
//! handing a request to the transport and one ("Rest response received") once the transport answered.
//! Each event carries a serialized [`RequestLogEntry`] / [`ResponseLogEntry`] after the configured mask
//! ran over it. A log entry that cannot be serialized degrades to a `warn` event; logging never fails a
//! call.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	contract::HttpMethod,
	http::{TransportRequest, TransportResponse},
};

/// Hook that can redact a [`RequestLogEntry`] before it is emitted.
pub type RequestLogMask = Arc<dyn Fn(&mut RequestLogEntry) + Send + Sync>;
/// Hook that can redact a [`ResponseLogEntry`] before it is emitted.
pub type ResponseLogMask = Arc<dyn Fn(&mut ResponseLogEntry) + Send + Sync>;

/// Body placeholder used for non-JSON responses.
pub const NON_JSON_BODY: &str = "Response not in json format";

/// Summary of an outgoing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestLogEntry {
	/// Contract key.
	pub contract: String,
	/// HTTP verb.
	pub method: HttpMethod,
	/// Target URL including the query string.
	pub url: String,
	/// Serialized body; absent for query-parameter verbs.
	pub body: Option<String>,
}
impl RequestLogEntry {
	/// Summarizes `request`.
	pub fn from_request(contract: &str, request: &TransportRequest) -> Self {
		Self {
			contract: contract.to_owned(),
			method: request.method,
			url: request.url.to_string(),
			body: request.body.as_deref().map(|body| String::from_utf8_lossy(body).into_owned()),
		}
	}
}

/// Summary of a received response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResponseLogEntry {
	/// Contract key.
	pub contract: String,
	/// HTTP verb of the request.
	pub method: HttpMethod,
	/// Final response URL.
	pub url: String,
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` of the response.
	pub media_type: Option<String>,
	/// Round-trip time in milliseconds.
	pub latency_ms: u64,
	/// Body length in bytes.
	pub content_length: usize,
	/// Body text as received for JSON responses, or [`NON_JSON_BODY`].
	pub raw_body: String,
	/// Pretty-printed JSON body, or [`NON_JSON_BODY`].
	pub body: String,
}
impl ResponseLogEntry {
	/// Summarizes `response`.
	pub fn from_response(
		contract: &str,
		method: HttpMethod,
		response: &TransportResponse,
		latency: StdDuration,
	) -> Self {
		let (raw_body, body) = if response.is_json() {
			let raw = String::from_utf8_lossy(&response.body).into_owned();
			let pretty = serde_json::from_slice::<serde_json::Value>(&response.body)
				.ok()
				.and_then(|value| serde_json::to_string_pretty(&value).ok())
				.unwrap_or_else(|| raw.clone());

			(raw, pretty)
		} else {
			(NON_JSON_BODY.to_owned(), NON_JSON_BODY.to_owned())
		};

		Self {
			contract: contract.to_owned(),
			method,
			url: response.url.to_string(),
			status: response.status,
			media_type: response.content_type.clone(),
			latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
			content_length: response.body.len(),
			raw_body,
			body,
		}
	}
}

/// Emits the "Rest request sent" event.
pub fn log_request(contract: &str, request: &TransportRequest, mask: Option<&RequestLogMask>) {
	#[cfg(feature = "tracing")]
	{
		let mut entry = RequestLogEntry::from_request(contract, request);

		if let Some(mask) = mask {
			mask(&mut entry);
		}

		match serde_json::to_string(&entry) {
			Ok(payload) => tracing::info!(contract, request = %payload, "Rest request sent"),
			Err(e) => tracing::warn!(contract, error = %e, "Rest request could not be logged"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (contract, request, mask);
	}
}

/// Emits the "Rest response received" event.
pub fn log_response(
	contract: &str,
	method: HttpMethod,
	response: &TransportResponse,
	latency: StdDuration,
	mask: Option<&ResponseLogMask>,
) {
	#[cfg(feature = "tracing")]
	{
		let mut entry = ResponseLogEntry::from_response(contract, method, response, latency);

		if let Some(mask) = mask {
			mask(&mut entry);
		}

		match serde_json::to_string(&entry) {
			Ok(payload) => tracing::info!(
				contract,
				status = entry.status,
				latency_ms = entry.latency_ms,
				response = %payload,
				"Rest response received"
			),
			Err(e) => tracing::warn!(contract, error = %e, "Rest response could not be logged"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (contract, method, response, latency, mask);
	}
}

/// Emits the event for a transport failure (nothing answered).
pub fn log_no_response(contract: &str, error: Option<&dyn StdError>) {
	#[cfg(feature = "tracing")]
	{
		match error {
			Some(e) => tracing::warn!(contract, error = %e, "No response from server"),
			None => tracing::warn!(contract, "No response from server"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (contract, error);
	}
}

/// Emits the event for a successful token refresh.
pub fn log_token_refreshed(issuer: &Url, expires_in: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(
			issuer = issuer.as_str(),
			expires_in_secs = expires_in.whole_seconds(),
			"OAuth2 token refreshed"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (issuer, expires_in);
	}
}

/// Emits the event for a grace-window refresh failure that keeps the cached token.
pub fn log_token_refresh_degraded(issuer: &Url, remaining: Duration, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			issuer = issuer.as_str(),
			remaining_secs = remaining.whole_seconds(),
			error = %error,
			"OAuth2 token refresh failed, reusing the cached token"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (issuer, remaining, error);
	}
}

/// Emits the event for a refresh failure that reaches the caller.
pub fn log_token_refresh_failed(issuer: &Url, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(issuer = issuer.as_str(), error = %error, "OAuth2 token refresh failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (issuer, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url() -> Url {
		Url::parse("https://api.example.com/v1/accounts?id=7").expect("Test URL should parse.")
	}

	#[test]
	fn request_entry_carries_body_text() {
		let mut request = TransportRequest::new(HttpMethod::Post, url());

		request.body = Some(br#"{"name":"ops"}"#.to_vec());

		let mut entry = RequestLogEntry::from_request("accounts", &request);
		let mask: RequestLogMask = Arc::new(|entry| entry.body = Some("***".into()));

		assert_eq!(entry.body.as_deref(), Some(r#"{"name":"ops"}"#));

		mask(&mut entry);

		assert_eq!(entry.body.as_deref(), Some("***"));
		assert_eq!(entry.url, "https://api.example.com/v1/accounts?id=7");
	}

	#[test]
	fn response_entry_pretty_prints_json_only() {
		let json = TransportResponse {
			status: 200,
			content_type: Some("application/json".into()),
			body: br#"{"data":{"id":7}}"#.to_vec(),
			url: url(),
		};
		let entry = ResponseLogEntry::from_response(
			"accounts",
			HttpMethod::Get,
			&json,
			StdDuration::from_millis(12),
		);

		assert_eq!(entry.raw_body, r#"{"data":{"id":7}}"#);
		assert_eq!(entry.body, "{\n  \"data\": {\n    \"id\": 7\n  }\n}");
		assert_eq!(entry.latency_ms, 12);
		assert_eq!(entry.content_length, 17);

		let html = TransportResponse {
			content_type: Some("text/html".into()),
			body: b"<html></html>".to_vec(),
			..json
		};
		let entry =
			ResponseLogEntry::from_response("accounts", HttpMethod::Get, &html, StdDuration::ZERO);

		assert_eq!(entry.raw_body, "Response not in json format");
		assert_eq!(entry.body, NON_JSON_BODY);
	}

	#[test]
	fn invalid_json_keeps_raw_text_in_both_bodies() {
		let broken = TransportResponse {
			status: 502,
			content_type: Some("application/json; charset=utf-8".into()),
			body: b"{\"data\":".to_vec(),
			url: url(),
		};
		let entry =
			ResponseLogEntry::from_response("accounts", HttpMethod::Get, &broken, StdDuration::ZERO);

		assert_eq!(entry.raw_body, "{\"data\":");
		assert_eq!(entry.body, entry.raw_body);
	}

	#[test]
	fn logging_never_panics() {
		let request = TransportRequest::new(HttpMethod::Get, url());
		let mask: RequestLogMask = Arc::new(|entry| entry.url.clear());

		log_request("accounts", &request, Some(&mask));
		log_no_response("accounts", None);
	}
}
