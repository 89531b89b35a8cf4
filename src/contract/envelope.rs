//! Default `{ "data": .. }` / `{ "error": .. }` envelope decoding.

// std
use std::any::{Any, TypeId};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	contract::{ErrorBody, ErrorParser, RawBody, SuccessParser},
	error::BoxError,
};

/// Success envelope: the payload lives under `data`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DataEnvelope<T> {
	/// Decoded payload.
	#[serde(alias = "Data")]
	pub data: T,
}

/// Error envelope: the structured error lives under `error`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
	/// Structured error, absent when the server sent none.
	#[serde(default, alias = "Error")]
	pub error: Option<ErrorBody>,
}

/// Parser used when a contract does not provide its own.
///
/// Success bodies are unwrapped from [`DataEnvelope`], except for [`RawBody`] responses which receive the
/// bytes untouched. Error bodies are read as [`ErrorEnvelope`]; an empty body carries no structured error.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeParser;
impl<T> SuccessParser<T> for EnvelopeParser
where
	T: 'static + DeserializeOwned,
{
	fn parse_success(&self, body: &[u8]) -> Result<T, BoxError> {
		if TypeId::of::<T>() == TypeId::of::<RawBody>() {
			let raw: Box<dyn Any> = Box::new(RawBody(body.to_vec()));

			return raw
				.downcast::<T>()
				.map(|value| *value)
				.map_err(|_| BoxError::from("Raw body type mismatch."));
		}

		let de = &mut serde_json::Deserializer::from_slice(body);
		let envelope: DataEnvelope<T> = serde_path_to_error::deserialize(de)?;

		Ok(envelope.data)
	}
}
impl ErrorParser for EnvelopeParser {
	fn parse_error(&self, body: &[u8]) -> Result<Option<ErrorBody>, BoxError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		let de = &mut serde_json::Deserializer::from_slice(body);
		let envelope: ErrorEnvelope = serde_path_to_error::deserialize(de)?;

		Ok(envelope.error)
	}
}
