//! Client-level error taxonomy shared by the builder, registry, dispatcher, and facade.

// self
use crate::{
	_prelude::*,
	contract::{ErrorBody, ErrorInfo},
};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used wherever a source is transport- or parser-specific.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Each variant is a distinct failure class so callers can branch without inspecting messages.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, always raised before any network attempt.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request failed its own validation predicate.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Token issuance failed while building the `Authorization` header.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The API answered with a non-2xx status or did not answer at all.
	#[error(transparent)]
	Call(#[from] CallError),
	/// The response body could not be decoded into the expected shape.
	#[error("An error occurred while reading the response (HTTP {status}).")]
	ResponseParse {
		/// HTTP status code of the response being decoded.
		status: u16,
		/// Underlying decode failure.
		#[source]
		source: BoxError,
	},
	/// The request object could not be serialized into a body or query parameters.
	#[error("Request for `{contract}` could not be serialized.")]
	RequestSerialize {
		/// Configuration key of the request.
		contract: String,
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// A resilience handler completed without a successful attempt to read the result from.
	#[error("Resilience handler for `{contract}` finished without a successful attempt.")]
	Resilience {
		/// Configuration key of the abandoned call.
		contract: String,
	},
}
impl Error {
	/// Returns the HTTP status attached to the error, if any.
	///
	/// Validation failures report `400` the same way a server-side rejection would.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Validation(_) => Some(400),
			Self::Auth(AuthError::Unauthorized { .. }) => Some(401),
			Self::Auth(AuthError::IssuerStatus { status, .. }) => Some(*status),
			Self::Call(err) => Some(err.status()),
			Self::ResponseParse { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration failures raised while building or routing.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The same contract key was registered twice.
	#[error("Contract `{contract}` has already been configured.")]
	DuplicateContract {
		/// Offending contract key.
		contract: String,
	},
	/// Builder finished without any registered contract.
	#[error("Please configure at least one contract base URL.")]
	NoContracts,
	/// A request targeted a contract key that was never registered.
	#[error("No mapping found for contract key `{contract}`.")]
	UnknownContract {
		/// Contract key after decoration.
		contract: String,
	},
	/// A request or registration carried an empty configuration key.
	#[error("Configuration key must not be empty.")]
	MissingConfigurationKey,
	/// A required configuration value is absent.
	#[error("Could not find `{key}` for `{contract}` in configuration.")]
	MissingValue {
		/// Contract whose configuration was consulted.
		contract: String,
		/// Missing key.
		key: String,
	},
	/// A base URL (or issuer URL) cannot be parsed.
	#[error("`{value}` is not a valid URL.")]
	InvalidUrl {
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parse failure.
		#[source]
		source: url::ParseError,
	},
	/// A timeout value cannot be parsed.
	#[error("`{value}` configured for `{contract}` must be parseable to a timeout.")]
	InvalidTimeout {
		/// Contract whose configuration was consulted.
		contract: String,
		/// Raw value that failed to parse.
		value: String,
	},
	/// The configured authentication method has no registered builder.
	#[error("Authentication method `{method}` is not supported.")]
	UnsupportedAuthentication {
		/// Method name as configured.
		method: String,
	},
	/// Authorization configuration failed validation.
	#[error("Authorization configuration is invalid: {reason}.")]
	InvalidAuthorization {
		/// Human-readable reason.
		reason: String,
	},
	/// No HTTP transport was supplied and no bundled transport is compiled in.
	#[error("No HTTP transport configured; supply one with `with_transport`.")]
	MissingTransport,
	/// Settings document could not be deserialized.
	#[error("Client settings could not be parsed.")]
	SettingsParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Bundled HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Request-level validation failure carrying every reported descriptor.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request validation failed with {} error(s).", .errors.len())]
pub struct ValidationError {
	/// Failure descriptors returned by [`crate::contract::Request::validate`].
	pub errors: Vec<ErrorInfo>,
}

/// Token issuance failures raised by authorization header factories.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Issuer rejected the client credentials with HTTP 401.
	#[error("Access denied by issuer `{issuer}`, please verify oauth2 configuration.")]
	Unauthorized {
		/// Issuer URL.
		issuer: String,
		/// Issuer-supplied description, when available.
		description: Option<String>,
	},
	/// Issuer answered with a non-200 status other than 401.
	#[error("Issuer `{issuer}` returned HTTP {status}.")]
	IssuerStatus {
		/// Issuer URL.
		issuer: String,
		/// HTTP status code.
		status: u16,
		/// Issuer-supplied description, when available.
		description: Option<String>,
	},
	/// Issuer could not be reached.
	#[error("Issuer `{issuer}` could not be reached.")]
	Unreachable {
		/// Issuer URL.
		issuer: String,
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Issuer answered 200 with a body that is not a usable token response.
	#[error("Cannot parse the oauth2 response from issuer `{issuer}`.")]
	MalformedResponse {
		/// Issuer URL.
		issuer: String,
		/// Underlying parse failure.
		#[source]
		source: BoxError,
	},
}

/// Failures describing an unsuccessful API call (transport call error).
#[derive(Debug, ThisError)]
pub enum CallError {
	/// No response was received; reported with the sentinel status `0`.
	#[error("No response from server.")]
	NoResponse {
		/// Transport failure, if the transport reported one.
		#[source]
		source: Option<TransportError>,
	},
	/// The API answered with a non-2xx status.
	#[error("{message}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Structured error message, or a generic one when the body carried none.
		message: String,
		/// Structured error payload, when the body carried one.
		error: Option<ErrorBody>,
	},
}
impl CallError {
	/// Sentinel status reported when no response was received.
	pub const NO_RESPONSE_STATUS: u16 = 0;

	/// Builds the error for a non-2xx response without a structured payload.
	pub fn unsuccessful(status: u16) -> Self {
		Self::Status {
			status,
			message: format!("Rest request not successful, {status}."),
			error: None,
		}
	}

	/// Builds the error for a non-2xx response carrying a structured payload.
	pub fn structured(status: u16, error: ErrorBody) -> Self {
		let message = error.message.clone().unwrap_or_default();

		Self::Status { status, message, error: Some(error) }
	}

	/// HTTP status, or [`Self::NO_RESPONSE_STATUS`] when nothing answered.
	pub fn status(&self) -> u16 {
		match self {
			Self::NoResponse { .. } => Self::NO_RESPONSE_STATUS,
			Self::Status { status, .. } => *status,
		}
	}

	/// Structured error payload, if the response carried one.
	pub fn error_body(&self) -> Option<&ErrorBody> {
		match self {
			Self::NoResponse { .. } => None,
			Self::Status { error, .. } => error.as_ref(),
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
