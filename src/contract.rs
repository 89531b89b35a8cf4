//! Request contracts: the typed request model, response envelopes, and parser capabilities.
//!
//! A contract is a plain serde-serializable struct implementing [`Request`]. The dispatcher reads the
//! verb, resource, and configuration key from the trait, serializes the struct either as a JSON body or
//! as query parameters, and decodes the response with the default envelope parsers unless the request
//! exposes its own [`SuccessParser`] / [`ErrorParser`] capability.

pub mod envelope;

pub use envelope::*;

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::BoxError};

/// HTTP verbs a contract can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl HttpMethod {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
		}
	}

	/// `GET` and `DELETE` carry the request as query parameters; every other verb sends a JSON body.
	pub const fn uses_query_parameters(self) -> bool {
		matches!(self, Self::Get | Self::Delete)
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for HttpMethod {
	type Err = UnknownHttpMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"PATCH" => Ok(Self::Patch),
			"DELETE" => Ok(Self::Delete),
			"HEAD" => Ok(Self::Head),
			"OPTIONS" => Ok(Self::Options),
			_ => Err(UnknownHttpMethod(s.to_owned())),
		}
	}
}

/// Error returned when a verb string does not name a supported [`HttpMethod`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("HTTP method `{0}` is not supported.")]
pub struct UnknownHttpMethod(pub String);

/// Cross-cutting values the client injects before dispatch.
///
/// Embed it in a contract with `#[serde(flatten)]`: the context travels with the payload while the
/// header map is only ever sent as HTTP headers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
	/// Free-form correlation context (trace id, caller name, ...).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<String>,
	/// Additional HTTP headers attached to the outgoing request.
	#[serde(skip)]
	pub headers: BTreeMap<String, String>,
}
impl RequestMeta {
	/// Sets the context value.
	pub fn with_context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());

		self
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}
}

/// One reason/message pair, used both for validation failures and for server error details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
	/// Machine-readable reason (often the offending field).
	#[serde(default, alias = "Reason")]
	pub reason: String,
	/// Human-readable message.
	#[serde(default, alias = "Message")]
	pub message: String,
}
impl ErrorInfo {
	/// Creates a new descriptor.
	pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
		Self { reason: reason.into(), message: message.into() }
	}
}

/// Structured error payload carried by the `error` member of a response envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Application error code.
	#[serde(default, alias = "Code")]
	pub code: Option<String>,
	/// Application error message.
	#[serde(default, alias = "Message")]
	pub message: Option<String>,
	/// Detail entries.
	#[serde(default, alias = "Errors")]
	pub errors: Vec<ErrorInfo>,
}

/// Raw response bytes, returned verbatim instead of being decoded from a JSON envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBody(pub Vec<u8>);
impl RawBody {
	/// Returns the bytes.
	pub fn into_inner(self) -> Vec<u8> {
		self.0
	}
}
impl AsRef<[u8]> for RawBody {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

/// Capability for contracts that decode successful responses themselves.
pub trait SuccessParser<T>
where
	Self: Send + Sync,
{
	/// Decodes a 2xx body.
	fn parse_success(&self, body: &[u8]) -> Result<T, BoxError>;
}

/// Capability for contracts that decode error responses themselves.
pub trait ErrorParser
where
	Self: Send + Sync,
{
	/// Decodes a non-2xx body. `Ok(None)` means the body carried no structured error.
	fn parse_error(&self, body: &[u8]) -> Result<Option<ErrorBody>, BoxError>;
}

/// One logical API call.
///
/// Implementors are serialized with serde: as the JSON body for `POST`/`PUT`/`PATCH`/..., or field by
/// field as query parameters for `GET`/`DELETE`. Keep the resource identifier out of the serialized
/// form (`#[serde(skip)]`); it is read through [`Request::resource`].
pub trait Request
where
	Self: Serialize + Send + Sync,
{
	/// Decoded success payload (the envelope's `data` member).
	type Response: 'static + DeserializeOwned + Send;

	/// URI suffix appended to the contract's base URL.
	fn resource(&self) -> Cow<'_, str>;

	/// HTTP verb.
	fn method(&self) -> HttpMethod;

	/// Key of the contract (configured API) this request targets.
	fn configuration_key(&self) -> &str;

	/// Injected context and headers.
	fn meta(&self) -> &RequestMeta;

	/// Mutable access used by the client to inject context and headers.
	fn meta_mut(&mut self) -> &mut RequestMeta;

	/// Returns every validation failure; an empty list lets the request through.
	fn validate(&self) -> Vec<ErrorInfo> {
		Vec::new()
	}

	/// Custom success decoding, if the contract provides one.
	fn success_parser(&self) -> Option<&dyn SuccessParser<Self::Response>> {
		None
	}

	/// Custom error decoding, if the contract provides one.
	fn error_parser(&self) -> Option<&dyn ErrorParser> {
		None
	}
}
