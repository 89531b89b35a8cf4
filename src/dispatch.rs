//! Request handler: builds transport requests from contracts and interprets the responses.
//!
//! Every call walks `Built -> Dispatched -> {Succeeded | Failed(NoResponse) | Failed(ErrorStatus) |
//! Failed(ParseError)}`. Nothing is retried here; retries belong to a
//! [`ResilienceHandler`](crate::ext::ResilienceHandler) wrapping the whole call.

pub mod query;
pub mod response;

pub use query::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	contract::{EnvelopeParser, HttpMethod, Request},
	error::ConfigError,
	http::TransportResponse,
	obs::{self, CallOutcome, CallSpan},
	registry::ContractRegistry,
};

/// Transport-independent request produced by the build phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// URI suffix appended to the contract's base URL.
	pub resource: String,
	/// Query pairs (only for `GET` / `DELETE`).
	pub query: Vec<(String, String)>,
	/// Header pairs.
	pub headers: Vec<(String, String)>,
	/// JSON body (only for verbs other than `GET` / `DELETE`).
	pub body: Option<Vec<u8>>,
}
impl PreparedRequest {
	/// Runs the build phase for `request`.
	///
	/// `GET` and `DELETE` requests are flattened into query parameters; every other verb serializes the
	/// whole request as the JSON body.
	pub fn from_request<R>(request: &R) -> Result<Self>
	where
		R: Request,
	{
		let method = request.method();
		let serialize_error = |source| Error::RequestSerialize {
			contract: request.configuration_key().to_owned(),
			source,
		};
		let mut headers = request
			.meta()
			.headers
			.iter()
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect::<Vec<_>>();
		let (query, body) = if method.uses_query_parameters() {
			let value = serde_json::to_value(request).map_err(serialize_error)?;

			(encode_query(&value), None)
		} else {
			let body = serde_json::to_vec(request).map_err(serialize_error)?;

			if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type")) {
				headers.push(("Content-Type".into(), "application/json".into()));
			}

			(Vec::new(), Some(body))
		};

		Ok(Self { method, resource: request.resource().into_owned(), query, headers, body })
	}
}

/// Dispatches contracts through a [`ContractRegistry`].
#[derive(Clone, Debug)]
pub struct RequestHandler {
	registry: Arc<ContractRegistry>,
}
impl RequestHandler {
	/// Creates a handler over `registry`.
	pub fn new(registry: Arc<ContractRegistry>) -> Self {
		Self { registry }
	}

	/// Registry used for dispatch.
	pub fn registry(&self) -> &Arc<ContractRegistry> {
		&self.registry
	}

	/// Dispatches `request` and decodes the success payload.
	pub async fn call<R>(&self, request: &R) -> Result<R::Response>
	where
		R: Request,
	{
		self.observe(request, async {
			let response = self.dispatch(request).await?;
			let success = request.success_parser().unwrap_or(&EnvelopeParser);
			let error = request.error_parser().unwrap_or(&EnvelopeParser);

			interpret(&response, success, error)
		})
		.await
	}

	/// Dispatches `request` without decoding a success payload.
	pub async fn send<R>(&self, request: &R) -> Result<()>
	where
		R: Request,
	{
		self.observe(request, async {
			let response = self.dispatch(request).await?;
			let error = request.error_parser().unwrap_or(&EnvelopeParser);

			ensure_success(&response, error)
		})
		.await
	}

	async fn dispatch<R>(&self, request: &R) -> Result<TransportResponse>
	where
		R: Request,
	{
		let key = request.configuration_key();

		if key.trim().is_empty() {
			return Err(ConfigError::MissingConfigurationKey.into());
		}

		let prepared = PreparedRequest::from_request(request)?;

		self.registry.dispatch(prepared, key).await
	}

	/// Decorated contract key used to label spans and metrics.
	pub fn contract_label<R>(&self, request: &R) -> String
	where
		R: Request,
	{
		self.registry.decorate(request.configuration_key())
	}

	async fn observe<R, T, F>(&self, request: &R, fut: F) -> Result<T>
	where
		R: Request,
		F: Future<Output = Result<T>>,
	{
		let key = self.contract_label(request);
		let span = CallSpan::new(&key, request.method());

		obs::record_call_outcome(&key, CallOutcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_call_outcome(&key, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(&key, CallOutcome::Failure),
		}

		result
	}
}
