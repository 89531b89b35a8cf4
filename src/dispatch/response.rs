//! Response phase: turns a transport response into a typed result or a structured error.

// self
use crate::{
	_prelude::*,
	contract::{ErrorParser, SuccessParser},
	error::CallError,
	http::TransportResponse,
};

/// Decodes a response whose success body is expected.
pub fn interpret<T>(
	response: &TransportResponse,
	success: &dyn SuccessParser<T>,
	error: &dyn ErrorParser,
) -> Result<T> {
	ensure_success(response, error)?;

	success
		.parse_success(&response.body)
		.map_err(|source| Error::ResponseParse { status: response.status, source })
}

/// Checks the status only; success bodies are not decoded.
pub fn ensure_success(response: &TransportResponse, error: &dyn ErrorParser) -> Result<()> {
	if response.status == CallError::NO_RESPONSE_STATUS {
		return Err(CallError::NoResponse { source: None }.into());
	}
	if response.is_success() {
		return Ok(());
	}

	match error.parse_error(&response.body) {
		Ok(Some(body)) if body.message.is_some() =>
			Err(CallError::structured(response.status, body).into()),
		Ok(_) => Err(CallError::unsuccessful(response.status).into()),
		Err(source) => Err(Error::ResponseParse { status: response.status, source }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::contract::{EnvelopeParser, ErrorInfo, RawBody};

	fn response(status: u16, body: &str) -> TransportResponse {
		TransportResponse {
			status,
			content_type: Some("application/json".into()),
			body: body.as_bytes().to_vec(),
			url: Url::parse("https://api.example.com/v1/items").expect("Test URL should parse."),
		}
	}

	#[test]
	fn structured_error_envelope_is_surfaced() {
		let body = r#"{"error":{"code":"ERR1","message":"bad","errors":[{"reason":"X","message":"Y"}]}}"#;
		let err = interpret::<serde_json::Value>(&response(400, body), &EnvelopeParser, &EnvelopeParser)
			.expect_err("A 400 response must fail.");
		let call = match err {
			Error::Call(call) => call,
			other => panic!("Unexpected error variant: {other:?}."),
		};
		let payload = call.error_body().expect("Structured payload should be present.");

		assert_eq!(call.status(), 400);
		assert_eq!(call.to_string(), "bad");
		assert_eq!(payload.code.as_deref(), Some("ERR1"));
		assert_eq!(payload.message.as_deref(), Some("bad"));
		assert_eq!(payload.errors, vec![ErrorInfo::new("X", "Y")]);
	}

	#[test]
	fn sentinel_status_means_no_response() {
		let err = interpret::<serde_json::Value>(&response(0, ""), &EnvelopeParser, &EnvelopeParser)
			.expect_err("Status 0 must fail.");

		match err {
			Error::Call(call) => {
				assert_eq!(call.status(), 0);
				assert_eq!(call.to_string(), "No response from server.");
				assert!(call.error_body().is_none());
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn error_without_message_uses_generic_text() {
		for body in ["", r#"{"error":null}"#, r#"{"error":{"code":"E"}}"#] {
			let err = ensure_success(&response(503, body), &EnvelopeParser)
				.expect_err("A 503 response must fail.");

			assert_eq!(err.to_string(), "Rest request not successful, 503.");
			assert_eq!(err.status(), Some(503));
		}
	}

	#[test]
	fn unreadable_bodies_keep_their_status() {
		let err = ensure_success(&response(502, "<html>bad gateway</html>"), &EnvelopeParser)
			.expect_err("A 502 response must fail.");

		assert!(matches!(err, Error::ResponseParse { status: 502, .. }), "{err:?}");

		let mistyped = response(200, r#"{"data":"nope"}"#);
		let err = interpret::<Vec<u32>>(&mistyped, &EnvelopeParser, &EnvelopeParser)
			.expect_err("A mistyped payload must fail.");

		assert!(matches!(err, Error::ResponseParse { status: 200, .. }), "{err:?}");
	}

	#[test]
	fn raw_bodies_bypass_the_envelope() {
		let raw =
			interpret::<RawBody>(&response(200, "plain text"), &EnvelopeParser, &EnvelopeParser)
				.expect("Raw bodies should be returned verbatim.");

		assert_eq!(raw.into_inner(), b"plain text".to_vec());
	}
}
