//! Authorization header contracts attached to contract endpoints.

// self
use crate::{_prelude::*, contract::HttpMethod, http::HttpTransport};

/// Boxed future returned by [`AuthorizationHeaderFactory::authorization_value`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Request context handed to an [`AuthorizationHeaderFactory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizeRequestData {
	/// Request body as text, when the request carries one.
	pub body: Option<String>,
	/// Fully resolved request URL.
	pub url: Url,
	/// HTTP verb.
	pub method: HttpMethod,
}

/// Produces the `Authorization` header value for outgoing contract requests.
///
/// Factories are created once per contract at build time and shared by every call to that contract.
pub trait AuthorizationHeaderFactory
where
	Self: 'static + Send + Sync,
{
	/// Returns the header value (for example `"Bearer eyJ..."`) for `request`.
	fn authorization_value<'a>(&'a self, request: &'a AuthorizeRequestData) -> AuthFuture<'a>;
}

/// Configuration able to build an [`AuthorizationHeaderFactory`].
pub trait AuthorizationConfiguration
where
	Self: 'static + Debug + Send + Sync,
{
	/// Builds the factory; `transport` is the client's shared HTTP transport.
	fn create_factory(
		&self,
		transport: Arc<dyn HttpTransport>,
	) -> Result<Arc<dyn AuthorizationHeaderFactory>>;
}
