//! Fluent construction of [`RestApiClient`] instances.

// std
use std::time::Duration as StdDuration;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{AuthenticationBuilder, AuthenticationMethods, AuthorizationConfiguration},
	client::{ContextFunction, HeadersFunction, RestApiClient},
	config::{ConfigSource, ContractConfig},
	dispatch::RequestHandler,
	error::ConfigError,
	ext::ResilienceHandler,
	http::HttpTransport,
	obs::log::{RequestLogEntry, RequestLogMask, ResponseLogEntry, ResponseLogMask},
	registry::{
		ConfigurationKeyDecorator, ContractRegistration, ContractRegistry, ResolvedRegistration,
	},
};

/// Builder collecting contracts, hooks, and the transport of a [`RestApiClient`].
///
/// Registration errors surface from the call that caused them; [`Self::build`] only checks that at least
/// one contract exists and creates the authorization factories (one per contract, shared by every call).
#[derive(Default)]
pub struct ApiClientBuilder {
	contracts: BTreeMap<String, ContractRegistration>,
	timeouts: HashMap<String, StdDuration>,
	methods: AuthenticationMethods,
	transport: Option<Arc<dyn HttpTransport>>,
	context_function: Option<ContextFunction>,
	headers_function: Option<HeadersFunction>,
	key_decorator: Option<ConfigurationKeyDecorator>,
	resilience: Option<Arc<dyn ResilienceHandler>>,
	request_log_mask: Option<RequestLogMask>,
	response_log_mask: Option<ResponseLogMask>,
}
impl ApiClientBuilder {
	/// Creates an empty builder with the built-in `oauth2` authentication method.
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses `transport` for contract calls and token requests.
	///
	/// Without it, [`Self::build`] creates a [`ReqwestTransport`](crate::http::ReqwestTransport) when the
	/// `reqwest` feature is enabled.
	pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Registers a contract under `key`.
	pub fn configure_contract(
		self,
		key: impl Into<String>,
		base_url: &str,
		authorization: Option<Arc<dyn AuthorizationConfiguration>>,
	) -> Result<Self, ConfigError> {
		let base_url = Url::parse(base_url)
			.map_err(|source| ConfigError::InvalidUrl { value: base_url.to_owned(), source })?;
		let registration = ContractRegistration { authorization, ..ContractRegistration::new(base_url) };

		self.configure_registration(key, registration)
	}

	/// Registers a fully described contract under `key`.
	pub fn configure_registration(
		mut self,
		key: impl Into<String>,
		registration: ContractRegistration,
	) -> Result<Self, ConfigError> {
		let key = key.into();

		if key.trim().is_empty() {
			return Err(ConfigError::MissingConfigurationKey);
		}
		if self.contracts.contains_key(&key) {
			return Err(ConfigError::DuplicateContract { contract: key });
		}

		self.contracts.insert(key, registration);

		Ok(self)
	}

	/// Sets the timeout of `key`; overrides the registration's own timeout.
	///
	/// Timeouts for keys that are never registered are ignored.
	pub fn configure_contract_timeout(mut self, key: impl Into<String>, timeout: StdDuration) -> Self {
		self.timeouts.insert(key.into(), timeout);

		self
	}

	/// Makes `name` usable as the `Authentication` value of configured contracts.
	pub fn register_authenticator(
		mut self,
		name: impl AsRef<str>,
		builder: AuthenticationBuilder,
	) -> Self {
		self.methods.register(name, builder);

		self
	}

	/// Registers every contract listed by `source`.
	///
	/// Each contract needs a `BaseUrl`; `Authentication` and `Timeout` are optional. Authentication methods
	/// must be registered before this call.
	pub fn configure_from(mut self, source: &dyn ConfigSource) -> Result<Self, ConfigError> {
		for key in source.contract_keys() {
			let config = ContractConfig::new(source, &key);
			let base_url = config.require_contract(ContractConfig::BASE_URL)?;
			let authorization = config
				.contract_string(ContractConfig::AUTHENTICATION)
				.map(|method| self.methods.build(&method, &config))
				.transpose()?;
			let timeout = config.timeout(ContractConfig::TIMEOUT)?;

			self = self.configure_contract(key.as_str(), &base_url, authorization)?;

			if let Some(timeout) = timeout {
				self.timeouts.entry(key).or_insert(timeout);
			}
		}

		Ok(self)
	}

	/// Supplies a context for requests that carry none.
	pub fn with_context_function<F>(mut self, function: F) -> Self
	where
		F: 'static + Fn() -> Option<String> + Send + Sync,
	{
		self.context_function = Some(Arc::new(function));

		self
	}

	/// Supplies headers merged into every request.
	pub fn with_headers_function<F>(mut self, function: F) -> Self
	where
		F: 'static + Fn() -> BTreeMap<String, String> + Send + Sync,
	{
		self.headers_function = Some(Arc::new(function));

		self
	}

	/// Rewrites every request's configuration key before the registry lookup.
	pub fn with_configuration_key_decorator<F>(mut self, decorator: F) -> Self
	where
		F: 'static + Fn(&str) -> String + Send + Sync,
	{
		self.key_decorator = Some(Arc::new(decorator));

		self
	}

	/// Routes every dispatch through `handler`.
	pub fn with_resilience_handler(mut self, handler: Arc<dyn ResilienceHandler>) -> Self {
		self.resilience = Some(handler);

		self
	}

	/// Runs `mask` over every request log entry before it is emitted.
	pub fn with_request_log_mask<F>(mut self, mask: F) -> Self
	where
		F: 'static + Fn(&mut RequestLogEntry) + Send + Sync,
	{
		self.request_log_mask = Some(Arc::new(mask));

		self
	}

	/// Runs `mask` over every response log entry before it is emitted.
	pub fn with_response_log_mask<F>(mut self, mask: F) -> Self
	where
		F: 'static + Fn(&mut ResponseLogEntry) + Send + Sync,
	{
		self.response_log_mask = Some(Arc::new(mask));

		self
	}

	/// Finalizes the client.
	pub fn build(self) -> Result<RestApiClient> {
		if self.contracts.is_empty() {
			return Err(ConfigError::NoContracts.into());
		}

		let transport = match self.transport {
			Some(transport) => transport,
			None => default_transport()?,
		};
		let mut registrations = HashMap::with_capacity(self.contracts.len());

		for (key, registration) in self.contracts {
			let authorization = registration
				.authorization
				.map(|configuration| configuration.create_factory(transport.clone()))
				.transpose()?;
			let timeout = self.timeouts.get(&key).copied().or(registration.timeout);

			registrations.insert(
				key,
				ResolvedRegistration { base_url: registration.base_url, authorization, timeout },
			);
		}

		let registry = ContractRegistry::new(registrations, transport)
			.with_key_decorator(self.key_decorator)
			.with_log_masks(self.request_log_mask, self.response_log_mask);

		Ok(RestApiClient::new(
			RequestHandler::new(Arc::new(registry)),
			self.context_function,
			self.headers_function,
			self.resilience,
		))
	}
}
impl Debug for ApiClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClientBuilder")
			.field("contracts", &self.contracts.keys().collect::<Vec<_>>())
			.field("methods", &self.methods)
			.field("transport", &self.transport.is_some())
			.finish_non_exhaustive()
	}
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn HttpTransport>, ConfigError> {
	Ok(Arc::new(ReqwestTransport::with_client(ReqwestClient::builder().build()?)))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn HttpTransport>, ConfigError> {
	Err(ConfigError::MissingTransport)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::RecordingTransport, auth::Oauth2Configuration, config::SectionConfig};

	fn transport() -> Arc<RecordingTransport> {
		Arc::new(RecordingTransport::default())
	}

	#[test]
	fn duplicate_contracts_are_rejected() {
		let err = ApiClientBuilder::new()
			.configure_contract("billing", "https://billing.example.com", None)
			.expect("First registration should succeed.")
			.configure_contract("billing", "https://other.example.com", None)
			.expect_err("Second registration must be rejected.");

		assert!(matches!(err, ConfigError::DuplicateContract { ref contract } if contract == "billing"));
	}

	#[test]
	fn empty_keys_and_bad_urls_are_rejected() {
		assert!(matches!(
			ApiClientBuilder::new().configure_contract(" ", "https://billing.example.com", None),
			Err(ConfigError::MissingConfigurationKey)
		));
		assert!(matches!(
			ApiClientBuilder::new().configure_contract("billing", "billing.example.com", None),
			Err(ConfigError::InvalidUrl { ref value, .. }) if value == "billing.example.com"
		));
	}

	#[test]
	fn building_without_contracts_fails() {
		let err = ApiClientBuilder::new()
			.with_transport(transport())
			.build()
			.expect_err("An empty builder must not produce a client.");

		assert!(matches!(err, Error::Config(ConfigError::NoContracts)));
	}

	#[test]
	fn explicit_timeouts_override_registrations() {
		let registration = ContractRegistration {
			timeout: Some(StdDuration::from_secs(10)),
			..ContractRegistration::new(
				Url::parse("https://billing.example.com").expect("Base URL should parse."),
			)
		};
		let client = ApiClientBuilder::new()
			.with_transport(transport())
			.configure_registration("billing", registration)
			.expect("Registration should succeed.")
			.configure_contract_timeout("billing", StdDuration::from_secs(3))
			.configure_contract_timeout("unknown", StdDuration::from_secs(1))
			.build()
			.expect("Client should build.");
		let endpoint = client.registry().resolve("billing").expect("Contract should resolve.");

		assert_eq!(endpoint.timeout(), Some(StdDuration::from_secs(3)));
		assert!(!client.registry().contains("unknown"));
	}

	#[test]
	fn configuration_sources_register_contracts() {
		let source = SectionConfig::default()
			.with_api_value("billing", "BaseUrl", "https://billing.example.com/api")
			.with_api_value("billing", "Authentication", "OAuth2")
			.with_api_value("billing", "Audience", "billing")
			.with_api_value("billing", "Timeout", "00:00:15")
			.with_api_value("catalog", "BaseUrl", "https://catalog.example.com")
			.with_shared_value(Oauth2Configuration::ISSUER, "https://issuer.example.com/oauth/token")
			.with_shared_value(Oauth2Configuration::CLIENT_ID, "svc")
			.with_shared_value(Oauth2Configuration::CLIENT_SECRET, "secret");
		let client = ApiClientBuilder::new()
			.with_transport(transport())
			.configure_from(&source)
			.expect("Configuration should load.")
			.build()
			.expect("Client should build.");
		let billing = client.registry().resolve("billing").expect("Billing should resolve.");
		let catalog = client.registry().resolve("catalog").expect("Catalog should resolve.");

		assert!(billing.is_authenticated());
		assert_eq!(billing.timeout(), Some(StdDuration::from_secs(15)));
		assert!(!catalog.is_authenticated());
		assert_eq!(catalog.timeout(), None);
	}

	#[test]
	fn missing_base_url_names_the_contract() {
		let source = SectionConfig::default().with_api_value("billing", "Timeout", "5");
		let err = ApiClientBuilder::new()
			.configure_from(&source)
			.expect_err("Contracts without a base URL must be rejected.");

		assert_eq!(err.to_string(), "Could not find `BaseUrl` for `billing` in configuration.");
	}

	#[test]
	fn unknown_authentication_methods_fail_at_configuration() {
		let source = SectionConfig::default()
			.with_api_value("billing", "BaseUrl", "https://billing.example.com")
			.with_api_value("billing", "Authentication", "kerberos");
		let err = ApiClientBuilder::new()
			.configure_from(&source)
			.expect_err("Unknown methods must be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedAuthentication { ref method } if method == "kerberos"));
	}
}
