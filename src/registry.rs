//! Contract registry: maps contract keys to lazily materialized endpoint clients.
//!
//! Registrations are fixed at build time. The first dispatch for a key materializes an
//! [`EndpointClient`] (base URL, authorization factory, timeout) and caches it for the registry's
//! lifetime; later dispatches share it. A key that was never registered fails with
//! [`ConfigError::UnknownContract`] before authorization or the transport run.

// std
use std::time::{Duration as StdDuration, Instant};
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationConfiguration, AuthorizationHeaderFactory, AuthorizeRequestData},
	dispatch::PreparedRequest,
	error::{CallError, ConfigError},
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::log::{self, RequestLogMask, ResponseLogMask},
};

/// Function applied to every request's configuration key before lookup.
pub type ConfigurationKeyDecorator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One configured contract as supplied to the builder.
#[derive(Clone, Debug)]
pub struct ContractRegistration {
	/// Base URL every resource is appended to.
	pub base_url: Url,
	/// Authorization configuration, if the contract is authenticated.
	pub authorization: Option<Arc<dyn AuthorizationConfiguration>>,
	/// Per-request timeout.
	pub timeout: Option<StdDuration>,
}
impl ContractRegistration {
	/// Creates an unauthenticated registration without timeout.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, authorization: None, timeout: None }
	}
}

/// Registration after its authorization factory has been created.
#[derive(Clone)]
pub(crate) struct ResolvedRegistration {
	pub(crate) base_url: Url,
	pub(crate) authorization: Option<Arc<dyn AuthorizationHeaderFactory>>,
	pub(crate) timeout: Option<StdDuration>,
}

/// Per-contract client bound to a base URL, an optional authorization factory, and a timeout.
pub struct EndpointClient {
	contract: String,
	base_url: Url,
	authorization: Option<Arc<dyn AuthorizationHeaderFactory>>,
	timeout: Option<StdDuration>,
}
impl EndpointClient {
	/// Contract key.
	pub fn contract(&self) -> &str {
		&self.contract
	}

	/// Base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Timeout applied to every request.
	pub fn timeout(&self) -> Option<StdDuration> {
		self.timeout
	}

	/// Returns `true` when requests are signed.
	pub fn is_authenticated(&self) -> bool {
		self.authorization.is_some()
	}

	/// Joins `resource` onto the base URL and appends `query`.
	pub fn url_for(&self, resource: &str, query: &[(String, String)]) -> Url {
		let mut url = self.base_url.clone();
		let (path, resource_query) = resource.split_once('?').unwrap_or((resource, ""));
		let path = path.trim_start_matches('/');

		if !path.is_empty() {
			let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);

			url.set_path(&joined);
		}
		if !resource_query.is_empty() {
			url.set_query(Some(resource_query));
		}
		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		url
	}

	/// Builds the transport request, attaching the `Authorization` header when the contract is
	/// authenticated.
	pub async fn to_transport_request(&self, prepared: PreparedRequest) -> Result<TransportRequest> {
		let PreparedRequest { method, resource, query, mut headers, body } = prepared;
		let url = self.url_for(&resource, &query);

		if let Some(factory) = &self.authorization {
			let data = AuthorizeRequestData {
				body: body.as_deref().map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
				url: url.clone(),
				method,
			};
			let value = factory.authorization_value(&data).await?;

			headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
			headers.push(("Authorization".into(), value));
		}

		Ok(TransportRequest { method, url, headers, body, timeout: self.timeout })
	}
}
impl Debug for EndpointClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EndpointClient")
			.field("contract", &self.contract)
			.field("base_url", &self.base_url.as_str())
			.field("authenticated", &self.is_authenticated())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Registry of contracts sharing one transport.
pub struct ContractRegistry {
	registrations: HashMap<String, ResolvedRegistration>,
	endpoints: RwLock<HashMap<String, Arc<EndpointClient>>>,
	transport: Arc<dyn HttpTransport>,
	key_decorator: Option<ConfigurationKeyDecorator>,
	request_log_mask: Option<RequestLogMask>,
	response_log_mask: Option<ResponseLogMask>,
}
impl ContractRegistry {
	pub(crate) fn new(
		registrations: HashMap<String, ResolvedRegistration>,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		Self {
			registrations,
			endpoints: RwLock::new(HashMap::new()),
			transport,
			key_decorator: None,
			request_log_mask: None,
			response_log_mask: None,
		}
	}

	pub(crate) fn with_key_decorator(mut self, decorator: Option<ConfigurationKeyDecorator>) -> Self {
		self.key_decorator = decorator;

		self
	}

	pub(crate) fn with_log_masks(
		mut self,
		request: Option<RequestLogMask>,
		response: Option<ResponseLogMask>,
	) -> Self {
		self.request_log_mask = request;
		self.response_log_mask = response;

		self
	}

	/// Applies the configuration-key decorator, if any.
	pub fn decorate(&self, key: &str) -> String {
		match &self.key_decorator {
			Some(decorator) => decorator(key),
			None => key.to_owned(),
		}
	}

	/// Returns `true` when `key` (after decoration) is registered.
	pub fn contains(&self, key: &str) -> bool {
		self.registrations.contains_key(&self.decorate(key))
	}

	/// Returns `true` once the endpoint client for `key` (after decoration) has been materialized.
	pub fn is_materialized(&self, key: &str) -> bool {
		self.endpoints.read().contains_key(&self.decorate(key))
	}

	/// Returns the endpoint client for `key`, materializing it on first use.
	pub fn resolve(&self, key: &str) -> Result<Arc<EndpointClient>, ConfigError> {
		let key = self.decorate(key);

		if let Some(endpoint) = self.endpoints.read().get(&key) {
			return Ok(endpoint.clone());
		}

		let registration = self
			.registrations
			.get(&key)
			.ok_or_else(|| ConfigError::UnknownContract { contract: key.clone() })?;
		let endpoint = Arc::new(EndpointClient {
			contract: key.clone(),
			base_url: registration.base_url.clone(),
			authorization: registration.authorization.clone(),
			timeout: registration.timeout,
		});

		Ok(self.endpoints.write().entry(key).or_insert(endpoint).clone())
	}

	/// Sends `request` to the contract `key` and returns the raw response.
	///
	/// A transport failure is reported as [`CallError::NoResponse`].
	pub async fn dispatch(&self, request: PreparedRequest, key: &str) -> Result<TransportResponse> {
		let endpoint = self.resolve(key)?;
		let method = request.method;
		let request = endpoint.to_transport_request(request).await?;

		log::log_request(endpoint.contract(), &request, self.request_log_mask.as_ref());

		let started = Instant::now();

		match self.transport.execute(request).await {
			Ok(response) => {
				log::log_response(
					endpoint.contract(),
					method,
					&response,
					started.elapsed(),
					self.response_log_mask.as_ref(),
				);

				Ok(response)
			},
			Err(e) => {
				log::log_no_response(endpoint.contract(), Some(&e));

				Err(CallError::NoResponse { source: Some(e) }.into())
			},
		}
	}
}
impl Debug for ContractRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut contracts = self.registrations.keys().collect::<Vec<_>>();

		contracts.sort();

		f.debug_struct("ContractRegistry")
			.field("contracts", &contracts)
			.field("materialized", &self.endpoints.read().len())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::RecordingTransport, contract::HttpMethod};

	fn registry(transport: Arc<RecordingTransport>) -> ContractRegistry {
		let registrations = HashMap::from([(
			"inventory".to_owned(),
			ResolvedRegistration {
				base_url: Url::parse("https://api.example.com/v1/")
					.expect("Base URL should parse."),
				authorization: None,
				timeout: Some(StdDuration::from_secs(5)),
			},
		)]);

		ContractRegistry::new(registrations, transport)
	}

	fn prepared(resource: &str) -> PreparedRequest {
		PreparedRequest {
			method: HttpMethod::Get,
			resource: resource.to_owned(),
			query: vec![("Name".into(), "a b".into()), ("Ids".into(), "1".into())],
			headers: Vec::new(),
			body: None,
		}
	}

	#[test]
	fn endpoints_materialize_lazily_and_are_shared() {
		let registry = registry(Arc::new(RecordingTransport::default()));

		assert!(!registry.is_materialized("inventory"));

		let first = registry.resolve("inventory").expect("Registered contract should resolve.");
		let second = registry.resolve("inventory").expect("Registered contract should resolve.");

		assert!(registry.is_materialized("inventory"));
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(first.timeout(), Some(StdDuration::from_secs(5)));
	}

	#[test]
	fn unknown_contracts_fail_fast() {
		let registry = registry(Arc::new(RecordingTransport::default()));
		let err = registry.resolve("billing").expect_err("Unknown contracts must be rejected.");

		assert!(matches!(err, ConfigError::UnknownContract { ref contract } if contract == "billing"));
	}

	#[test]
	fn decorator_rewrites_lookup_keys() {
		let registry = registry(Arc::new(RecordingTransport::default()))
			.with_key_decorator(Some(Arc::new(|key: &str| key.trim_end_matches("-eu").to_owned())));

		assert!(registry.contains("inventory-eu"));
		assert_eq!(
			registry.resolve("inventory-eu").expect("Decorated key should resolve.").contract(),
			"inventory"
		);
	}

	#[test]
	fn urls_join_resource_and_query() {
		let registry = registry(Arc::new(RecordingTransport::default()));
		let endpoint = registry.resolve("inventory").expect("Registered contract should resolve.");

		assert_eq!(
			endpoint.url_for("/items/7", &prepared("").query).as_str(),
			"https://api.example.com/v1/items/7?Name=a+b&Ids=1"
		);
		assert_eq!(
			endpoint.url_for("items?expand=true", &[]).as_str(),
			"https://api.example.com/v1/items?expand=true"
		);
		assert_eq!(endpoint.url_for("", &[]).as_str(), "https://api.example.com/v1/");
	}

	#[tokio::test]
	async fn transport_failures_become_no_response_errors() {
		let transport = Arc::new(RecordingTransport::default());

		transport.push_failure();

		let registry = registry(transport.clone());
		let err = registry
			.dispatch(prepared("items"), "inventory")
			.await
			.expect_err("Transport failures must surface.");

		assert!(matches!(err, Error::Call(CallError::NoResponse { source: Some(_) })), "{err:?}");
		assert_eq!(transport.requests()[0].timeout, Some(StdDuration::from_secs(5)));
	}
}
