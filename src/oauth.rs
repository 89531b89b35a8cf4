//! Client-credentials exchange facade over the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenType},
};
// self
use crate::{
	_prelude::*,
	error::{AuthError, BoxError, TransportError},
	http::{HttpTransport, IssuerHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type IssuerClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type IssuerTokenResponse = oauth2::basic::BasicTokenResponse;

/// Defects found in a 200 token response that `oauth2` accepted.
#[derive(Debug, ThisError)]
pub enum TokenResponseDefect {
	/// `expires_in` is absent.
	#[error("Token response is missing `expires_in`.")]
	MissingExpiresIn,
	/// `expires_in` is zero.
	#[error("Token response `expires_in` must be positive.")]
	NonPositiveExpiresIn,
	/// `expires_in` does not fit the supported range.
	#[error("Token response `expires_in` exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Token issued by a successful exchange.
#[derive(Clone, Debug)]
pub(crate) struct IssuedToken {
	pub(crate) access_token: String,
	pub(crate) token_type: String,
	pub(crate) expires_in: Duration,
}

/// Prepared `client_credentials` grant bound to one issuer.
pub(crate) struct ClientCredentialsExchange {
	client: IssuerClient,
	issuer: Url,
	audience: String,
	scopes: Vec<String>,
}
impl ClientCredentialsExchange {
	pub(crate) fn new(
		client_id: &str,
		client_secret: &str,
		issuer: &Url,
		audience: &str,
		scopes: &[String],
	) -> Self {
		let client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(TokenUrl::from_url(issuer.clone()))
			.set_auth_type(AuthType::RequestBody);

		Self {
			client,
			issuer: issuer.clone(),
			audience: audience.to_owned(),
			scopes: scopes.to_vec(),
		}
	}

	/// POSTs the form-encoded grant and validates the issued token.
	pub(crate) async fn request(
		&self,
		transport: Arc<dyn HttpTransport>,
	) -> Result<IssuedToken, AuthError> {
		let meta = ResponseMetadataSlot::default();
		let http_client = IssuerHttpClient::new(transport, meta.clone());
		let mut request = self
			.client
			.exchange_client_credentials()
			.add_extra_param("audience", self.audience.as_str());

		for scope in &self.scopes {
			request = request.add_scope(Scope::new(scope.clone()));
		}

		let response = request
			.request_async(&http_client)
			.await
			.map_err(|err| map_request_error(&self.issuer, meta.take(), err))?;

		map_token_response(&self.issuer, response)
	}
}
impl Debug for ClientCredentialsExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsExchange")
			.field("issuer", &self.issuer.as_str())
			.field("audience", &self.audience)
			.field("scopes", &self.scopes)
			.finish_non_exhaustive()
	}
}

fn map_token_response(issuer: &Url, response: IssuerTokenResponse) -> Result<IssuedToken, AuthError> {
	let malformed = |defect: TokenResponseDefect| AuthError::MalformedResponse {
		issuer: issuer.to_string(),
		source: Box::new(defect),
	};
	let expires_in =
		response.expires_in().ok_or_else(|| malformed(TokenResponseDefect::MissingExpiresIn))?;
	let expires_in = i64::try_from(expires_in.as_secs())
		.map_err(|_| malformed(TokenResponseDefect::ExpiresInOutOfRange))?;

	if expires_in <= 0 {
		return Err(malformed(TokenResponseDefect::NonPositiveExpiresIn));
	}

	let token_type = match response.token_type() {
		BasicTokenType::Bearer => "Bearer".to_owned(),
		BasicTokenType::Mac => "MAC".to_owned(),
		BasicTokenType::Extension(other) => other.clone(),
	};

	Ok(IssuedToken {
		access_token: response.access_token().secret().to_owned(),
		token_type,
		expires_in: Duration::seconds(expires_in),
	})
}

fn map_request_error(
	issuer: &Url,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<TransportError>>,
) -> AuthError {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) =>
			status_error(issuer, status.unwrap_or_default(), Some(describe(&response))),
		RequestTokenError::Request(error) =>
			AuthError::Unreachable { issuer: issuer.to_string(), source: Box::new(error) },
		RequestTokenError::Parse(error, _body) => match status {
			Some(code) if code != 200 => status_error(issuer, code, None),
			_ => AuthError::MalformedResponse { issuer: issuer.to_string(), source: Box::new(error) },
		},
		RequestTokenError::Other(message) => match status {
			Some(code) if code != 200 => status_error(issuer, code, Some(message)),
			_ => AuthError::MalformedResponse {
				issuer: issuer.to_string(),
				source: BoxError::from(message),
			},
		},
	}
}

fn status_error(issuer: &Url, status: u16, description: Option<String>) -> AuthError {
	if status == 401 {
		AuthError::Unauthorized { issuer: issuer.to_string(), description }
	} else {
		AuthError::IssuerStatus { issuer: issuer.to_string(), status, description }
	}
}

fn describe(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	}
}
