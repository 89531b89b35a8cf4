//! Transport primitives shared by contract dispatch and token issuance.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. Contract calls hand it a fully built
//! [`TransportRequest`] and receive a [`TransportResponse`]; token exchanges reach the same transport
//! through [`IssuerHttpClient`], an [`AsyncHttpClient`] adapter that publishes the issuer's status into a
//! [`ResponseMetadataSlot`] so `oauth` can classify failures.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
#[cfg(feature = "reqwest")] use reqwest::{Method, header::CONTENT_TYPE};
// self
use crate::{_prelude::*, contract::HttpMethod, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Executes fully built requests against the network.
///
/// Implementations report connection-level failures as [`TransportError`]. A response whose status is
/// `0` is treated by the dispatcher the same way: nothing answered.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs one HTTP exchange.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Transport-level request: verb, absolute URL, headers, and an optional body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Header pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Request body, if any.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout applied by the transport.
	pub timeout: Option<StdDuration>,
}
impl TransportRequest {
	/// Creates a request without headers, body, or timeout.
	pub fn new(method: HttpMethod, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None, timeout: None }
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}

	/// Returns the query pairs in order.
	pub fn query_pairs(&self) -> Vec<(String, String)> {
		self.url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
	}
}

/// Transport-level response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code; `0` when nothing answered.
	pub status: u16,
	/// `Content-Type` header value, if present.
	pub content_type: Option<String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
	/// Final response URL.
	pub url: Url,
}
impl TransportResponse {
	/// Returns `true` for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the media type is JSON (`application/json`, `application/problem+json`, ...).
	pub fn is_json(&self) -> bool {
		self.content_type
			.as_deref()
			.and_then(|value| value.split(';').next())
			.map(|mime| {
				let mime = mime.trim().to_ascii_lowercase();

				mime == "application/json" || mime.ends_with("+json")
			})
			.unwrap_or(false)
	}
}

/// Captures metadata from the most recent issuer response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the issuer, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// [`HttpTransport`] backed by a shared [`ReqwestClient`].
///
/// Configure a custom client to disable redirect following when token issuers sit behind it; token
/// endpoints are expected to answer directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let TransportRequest { method, url, headers, body, timeout } = request;
			let mut builder = self.0.request(reqwest_method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let url = response.url().clone();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, content_type, body, url })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: HttpMethod) -> Method {
	match method {
		HttpMethod::Get => Method::GET,
		HttpMethod::Post => Method::POST,
		HttpMethod::Put => Method::PUT,
		HttpMethod::Patch => Method::PATCH,
		HttpMethod::Delete => Method::DELETE,
		HttpMethod::Head => Method::HEAD,
		HttpMethod::Options => Method::OPTIONS,
	}
}

/// [`AsyncHttpClient`] adapter routing `oauth2` token exchanges through an [`HttpTransport`].
#[derive(Clone)]
pub struct IssuerHttpClient {
	transport: Arc<dyn HttpTransport>,
	slot: ResponseMetadataSlot,
}
impl IssuerHttpClient {
	/// Builds a handle that records issuer outcomes in `slot`.
	pub fn new(transport: Arc<dyn HttpTransport>, slot: ResponseMetadataSlot) -> Self {
		Self { transport, slot }
	}
}
impl Debug for IssuerHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuerHttpClient").field("slot", &self.slot).finish_non_exhaustive()
	}
}
impl<'c> AsyncHttpClient<'c> for IssuerHttpClient {
	type Error = HttpClientError<TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let (parts, body) = request.into_parts();
			let method = parts
				.method
				.as_str()
				.parse::<HttpMethod>()
				.map_err(|e| HttpClientError::Other(e.to_string()))?;
			let url = Url::parse(&parts.uri.to_string())
				.map_err(|e| HttpClientError::Other(format!("Invalid issuer URL: {e}.")))?;
			let headers = parts
				.headers
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let request = TransportRequest {
				method,
				url,
				headers,
				body: (!body.is_empty()).then_some(body),
				timeout: None,
			};
			let response = self.transport.execute(request).await.map_err(Box::new)?;

			if response.status == 0 {
				return Err(HttpClientError::Other("No response from issuer.".into()));
			}

			self.slot.store(ResponseMetadata { status: Some(response.status) });

			let status = StatusCode::from_u16(response.status)
				.map_err(|e| HttpClientError::Other(e.to_string()))?;
			let mut builder = oauth2::http::Response::builder().status(status);

			if let Some(content_type) = &response.content_type {
				builder = builder.header(oauth2::http::header::CONTENT_TYPE, content_type.as_str());
			}

			Ok(builder.body(response.body)?)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(content_type: Option<&str>) -> TransportResponse {
		TransportResponse {
			status: 200,
			content_type: content_type.map(str::to_owned),
			body: Vec::new(),
			url: Url::parse("https://api.example.com/").expect("Test URL should parse."),
		}
	}

	#[test]
	fn json_media_types_are_detected() {
		assert!(response(Some("application/json; charset=utf-8")).is_json());
		assert!(response(Some("application/problem+json")).is_json());
		assert!(!response(Some("text/html")).is_json());
		assert!(!response(None).is_json());
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none());
	}

	#[test]
	fn request_header_lookup_ignores_case() {
		let mut request = TransportRequest::new(
			HttpMethod::Get,
			Url::parse("https://api.example.com/items?a=1&a=2").expect("Test URL should parse."),
		);

		request.headers.push(("Authorization".into(), "Bearer t".into()));

		assert_eq!(request.header("authorization"), Some("Bearer t"));
		assert_eq!(request.query_pairs(), vec![("a".into(), "1".into()), ("a".into(), "2".into())]);
	}
}
