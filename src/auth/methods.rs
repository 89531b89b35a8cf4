//! Name-keyed registry of authentication method builders.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationConfiguration, Oauth2Configuration},
	config::ContractConfig,
	error::ConfigError,
};

/// Builds an [`AuthorizationConfiguration`] from one contract's configuration.
pub type AuthenticationBuilder = Arc<
	dyn Fn(&ContractConfig<'_>) -> Result<Arc<dyn AuthorizationConfiguration>, ConfigError>
		+ Send
		+ Sync,
>;

/// Registry mapping lower-case method names to builders.
///
/// Ships with `oauth2`; callers add their own methods through [`Self::register`].
#[derive(Clone)]
pub struct AuthenticationMethods(HashMap<String, AuthenticationBuilder>);
impl AuthenticationMethods {
	/// Registers (or replaces) the builder for `name`. Names are case-insensitive.
	pub fn register(&mut self, name: impl AsRef<str>, builder: AuthenticationBuilder) {
		self.0.insert(name.as_ref().trim().to_ascii_lowercase(), builder);
	}

	/// Returns `true` if `name` has a builder.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(&name.trim().to_ascii_lowercase())
	}

	/// Builds the authorization configuration for `method`.
	pub fn build(
		&self,
		method: &str,
		config: &ContractConfig<'_>,
	) -> Result<Arc<dyn AuthorizationConfiguration>, ConfigError> {
		let builder = self
			.0
			.get(&method.trim().to_ascii_lowercase())
			.ok_or_else(|| ConfigError::UnsupportedAuthentication { method: method.to_owned() })?;

		builder(config)
	}
}
impl Default for AuthenticationMethods {
	fn default() -> Self {
		let mut methods = Self(HashMap::new());

		methods.register(
			Oauth2Configuration::METHOD,
			Arc::new(|config: &ContractConfig<'_>| {
				Oauth2Configuration::from_config(config)
					.map(|oauth2| Arc::new(oauth2) as Arc<dyn AuthorizationConfiguration>)
			}),
		);

		methods
	}
}
impl Debug for AuthenticationMethods {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut names = self.0.keys().collect::<Vec<_>>();

		names.sort();

		f.debug_tuple("AuthenticationMethods").field(&names).finish()
	}
}
