//! Typed contract client: route request objects to configured APIs with OAuth 2.0 client-credentials
//! tokens, envelope parsing, and structured errors.
//!
//! A contract is a request type implementing [`contract::Request`]. It names its configuration key,
//! resource, and verb, and declares the response type. The [`builder::ApiClientBuilder`] maps keys to
//! base URLs and authorization methods, and the resulting [`client::RestApiClient`] validates, authorizes,
//! dispatches, and decodes every call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod builder;
pub mod client;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod ext;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod registry;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		io::{Error as IoError, ErrorKind},
	};
	// self
	#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
	use crate::{
		error::TransportError,
		http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	};

	/// Scripted outcome replayed by [`RecordingTransport`].
	#[derive(Clone, Debug)]
	enum Scripted {
		Respond { status: u16, content_type: Option<String>, body: Vec<u8> },
		Fail,
	}

	/// In-memory [`HttpTransport`] that records every request and replays scripted responses in order.
	///
	/// Once the script runs out, every request is answered with `200 {"data":null}`.
	#[derive(Debug, Default)]
	pub struct RecordingTransport {
		requests: Mutex<Vec<TransportRequest>>,
		script: Mutex<VecDeque<Scripted>>,
	}
	impl RecordingTransport {
		/// Queues a JSON response.
		pub fn push_json(&self, status: u16, body: impl Into<String>) {
			self.push_response(status, Some("application/json"), body.into().into_bytes());
		}

		/// Queues a response with an arbitrary media type.
		pub fn push_response(&self, status: u16, content_type: Option<&str>, body: Vec<u8>) {
			self.script.lock().push_back(Scripted::Respond {
				status,
				content_type: content_type.map(str::to_owned),
				body,
			});
		}

		/// Queues a connection failure.
		pub fn push_failure(&self) {
			self.script.lock().push_back(Scripted::Fail);
		}

		/// Requests seen so far, in order.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}
	}
	impl HttpTransport for RecordingTransport {
		fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
			let url = request.url.clone();
			let scripted = self.script.lock().pop_front().unwrap_or(Scripted::Respond {
				status: 200,
				content_type: Some("application/json".into()),
				body: br#"{"data":null}"#.to_vec(),
			});

			self.requests.lock().push(request);

			Box::pin(async move {
				match scripted {
					Scripted::Respond { status, content_type, body } =>
						Ok(TransportResponse { status, content_type, body, url }),
					Scripted::Fail => Err(TransportError::Io(IoError::new(
						ErrorKind::ConnectionRefused,
						"connection refused",
					))),
				}
			})
		}
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by `httpmock`.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use builder::ApiClientBuilder;
pub use client::RestApiClient;
pub use contract::{HttpMethod, Request, RequestMeta};
pub use error::{Error, Result};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
