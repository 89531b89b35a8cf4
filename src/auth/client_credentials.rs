//! OAuth 2.0 client-credentials authorization with a soft/hard-expiry token cache.
//!
//! [`Oauth2AuthorizationHeaderFactory`] keeps one [`CachedToken`] per contract:
//!
//! - before the soft expiry the cached token is returned untouched;
//! - between the soft and hard expiry a refresh is attempted, and a failed refresh is logged and the still
//!   valid token reused;
//! - after the hard expiry a refresh must succeed, otherwise the [`AuthError`] reaches the caller.
//!
//! Refreshes are single-flight: concurrent callers queue on an async mutex and re-check the cache once
//! they hold it, so a burst of calls at expiry triggers one issuer request.

// self
use crate::{
	_prelude::*,
	auth::{
		AuthFuture, AuthorizationConfiguration, AuthorizationHeaderFactory, AuthorizeRequestData,
		CachedToken, TokenSecret, TokenState,
	},
	config::ContractConfig,
	error::{AuthError, ConfigError},
	http::HttpTransport,
	oauth::{ClientCredentialsExchange, TokenResponseDefect},
	obs::{self, RefreshOutcome},
};

/// Settings of the `oauth2` authentication method.
#[derive(Clone, Debug)]
pub struct Oauth2Configuration {
	client_id: String,
	client_secret: TokenSecret,
	audience: String,
	issuer: Url,
	scopes: Vec<String>,
	grace_ratio: f64,
}
impl Oauth2Configuration {
	/// Method name under which the configuration is registered.
	pub const METHOD: &'static str = "oauth2";
	/// Fraction of the token lifetime after which a refresh is attempted.
	pub const DEFAULT_GRACE_RATIO: f64 = 0.8;
	/// Configuration key of the audience (contract-only).
	pub const AUDIENCE: &'static str = "Audience";
	/// Configuration key of the token endpoint.
	pub const ISSUER: &'static str = "Issuer";
	/// Configuration key of the client identifier.
	pub const CLIENT_ID: &'static str = "ClientId";
	/// Configuration key of the client secret.
	pub const CLIENT_SECRET: &'static str = "ClientSecret";
	/// Configuration key of the optional scope list.
	pub const SCOPES: &'static str = "Scopes";

	/// Creates a configuration; every value must be non-blank.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		audience: impl Into<String>,
		issuer: Url,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = TokenSecret::new(client_secret);
		let audience = audience.into();

		if client_id.trim().is_empty() {
			return Err(invalid("client id must not be empty"));
		}
		if client_secret.is_blank() {
			return Err(invalid("client secret must not be empty"));
		}
		if audience.trim().is_empty() {
			return Err(invalid("audience must not be empty"));
		}

		Ok(Self {
			client_id,
			client_secret,
			audience,
			issuer,
			scopes: Vec::new(),
			grace_ratio: Self::DEFAULT_GRACE_RATIO,
		})
	}

	/// Reads `Audience` from the contract section and `Issuer`, `ClientId`, `ClientSecret`, `Scopes` from
	/// the contract section or the shared section.
	pub fn from_config(config: &ContractConfig<'_>) -> Result<Self, ConfigError> {
		let audience = config.require_contract(Self::AUDIENCE)?;
		let issuer = config.require(Self::ISSUER)?;
		let issuer =
			Url::parse(&issuer).map_err(|source| ConfigError::InvalidUrl { value: issuer, source })?;
		let client_id = config.require(Self::CLIENT_ID)?;
		let client_secret = config.require(Self::CLIENT_SECRET)?;
		let scopes = config.list(Self::SCOPES);

		Ok(Self::new(client_id, client_secret, audience, issuer)?.with_scopes(scopes))
	}

	/// Sets the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the fraction of the token lifetime after which refreshes start; must lie in `(0, 1]`.
	pub fn with_grace_ratio(mut self, ratio: f64) -> Result<Self, ConfigError> {
		if !(ratio > 0. && ratio <= 1.) {
			return Err(invalid("grace ratio must lie in (0, 1]"));
		}

		self.grace_ratio = ratio;

		Ok(self)
	}

	/// Client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Audience sent with every token request.
	pub fn audience(&self) -> &str {
		&self.audience
	}

	/// Token endpoint.
	pub fn issuer(&self) -> &Url {
		&self.issuer
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &[String] {
		&self.scopes
	}

	/// Grace ratio.
	pub fn grace_ratio(&self) -> f64 {
		self.grace_ratio
	}
}
impl AuthorizationConfiguration for Oauth2Configuration {
	fn create_factory(
		&self,
		transport: Arc<dyn HttpTransport>,
	) -> Result<Arc<dyn AuthorizationHeaderFactory>> {
		Ok(Arc::new(Oauth2AuthorizationHeaderFactory::new(self.clone(), transport)))
	}
}

/// Client-credentials [`AuthorizationHeaderFactory`] with a cached token.
pub struct Oauth2AuthorizationHeaderFactory {
	config: Oauth2Configuration,
	exchange: ClientCredentialsExchange,
	transport: Arc<dyn HttpTransport>,
	token: RwLock<Option<CachedToken>>,
	refresh: AsyncMutex<()>,
}
impl Oauth2AuthorizationHeaderFactory {
	/// Creates a factory with an empty cache.
	pub fn new(config: Oauth2Configuration, transport: Arc<dyn HttpTransport>) -> Self {
		let exchange = ClientCredentialsExchange::new(
			&config.client_id,
			config.client_secret.expose(),
			&config.issuer,
			&config.audience,
			&config.scopes,
		);

		Self { config, exchange, transport, token: RwLock::new(None), refresh: AsyncMutex::new(()) }
	}

	/// Returns a copy of the cached token, if any.
	pub fn snapshot(&self) -> Option<CachedToken> {
		self.token.read().clone()
	}

	/// Returns the header value as seen at `now`, refreshing the cache as needed.
	pub async fn authorization_value_at(&self, now: OffsetDateTime) -> Result<String> {
		if let Some(token) = self.snapshot().filter(|t| t.state_at(now) == TokenState::Fresh) {
			return Ok(token.authorization_value());
		}

		let _singleflight = self.refresh.lock().await;
		let current = self.snapshot();

		match current.as_ref().map(|token| (token, token.state_at(now))) {
			Some((token, TokenState::Fresh)) => Ok(token.authorization_value()),
			Some((token, TokenState::Stale)) => match self.fetch(now).await {
				Ok(fresh) => Ok(fresh.authorization_value()),
				Err(e) => {
					obs::log::log_token_refresh_degraded(
						&self.config.issuer,
						token.remaining_at(now),
						&e,
					);
					obs::record_token_refresh(RefreshOutcome::Degraded);

					Ok(token.authorization_value())
				},
			},
			_ => match self.fetch(now).await {
				Ok(fresh) => Ok(fresh.authorization_value()),
				Err(e) => {
					obs::log::log_token_refresh_failed(&self.config.issuer, &e);
					obs::record_token_refresh(RefreshOutcome::Failure);

					Err(e.into())
				},
			},
		}
	}

	async fn fetch(&self, now: OffsetDateTime) -> Result<CachedToken, AuthError> {
		let issued = self.exchange.request(self.transport.clone()).await?;
		let token = CachedToken::issue(
			issued.access_token,
			issued.token_type,
			now,
			issued.expires_in,
			self.config.grace_ratio,
		)
		.ok_or_else(|| AuthError::MalformedResponse {
			issuer: self.config.issuer.to_string(),
			source: Box::new(TokenResponseDefect::ExpiresInOutOfRange),
		})?;

		*self.token.write() = Some(token.clone());

		obs::log::log_token_refreshed(&self.config.issuer, issued.expires_in);
		obs::record_token_refresh(RefreshOutcome::Success);

		Ok(token)
	}
}
impl AuthorizationHeaderFactory for Oauth2AuthorizationHeaderFactory {
	fn authorization_value<'a>(&'a self, request: &'a AuthorizeRequestData) -> AuthFuture<'a> {
		let _ = request;

		Box::pin(self.authorization_value_at(OffsetDateTime::now_utc()))
	}
}
impl Debug for Oauth2AuthorizationHeaderFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Oauth2AuthorizationHeaderFactory")
			.field("config", &self.config)
			.field("token", &self.snapshot())
			.finish_non_exhaustive()
	}
}

fn invalid(reason: &str) -> ConfigError {
	ConfigError::InvalidAuthorization { reason: reason.to_owned() }
}
