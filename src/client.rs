//! Public entry point: validation gate, context/header injection, and resilience routing.

// self
use crate::{
	_prelude::*,
	contract::Request,
	dispatch::RequestHandler,
	error::{ConfigError, ValidationError},
	ext::{Attempt, AttemptFuture, DispatchContext, ResilienceHandler},
	registry::ContractRegistry,
};

/// Supplies a context value for requests that carry none.
pub type ContextFunction = Arc<dyn Fn() -> Option<String> + Send + Sync>;
/// Supplies headers merged into every request.
pub type HeadersFunction = Arc<dyn Fn() -> BTreeMap<String, String> + Send + Sync>;

/// Typed contract client built by [`ApiClientBuilder`](crate::builder::ApiClientBuilder).
///
/// Before anything touches the network, each call:
///
/// 1. injects the configured context, unless the request already carries one;
/// 2. runs [`Request::validate`] and fails with [`ValidationError`] if it reports anything;
/// 3. merges the configured headers (headers already on the request win);
/// 4. dispatches, through the [`ResilienceHandler`] when one is configured.
#[derive(Clone)]
pub struct RestApiClient {
	handler: RequestHandler,
	context_function: Option<ContextFunction>,
	headers_function: Option<HeadersFunction>,
	resilience: Option<Arc<dyn ResilienceHandler>>,
}
impl RestApiClient {
	pub(crate) fn new(
		handler: RequestHandler,
		context_function: Option<ContextFunction>,
		headers_function: Option<HeadersFunction>,
		resilience: Option<Arc<dyn ResilienceHandler>>,
	) -> Self {
		Self { handler, context_function, headers_function, resilience }
	}

	/// Contract registry backing the client.
	pub fn registry(&self) -> &Arc<ContractRegistry> {
		self.handler.registry()
	}

	/// Dispatches `request` and returns the decoded success payload.
	pub async fn call<R>(&self, request: &mut R) -> Result<R::Response>
	where
		R: Request,
	{
		self.prepare(request)?;

		let request = &*request;
		let Some(resilience) = &self.resilience else {
			return self.handler.call(request).await;
		};
		let slot = Mutex::new(None);

		{
			let handler = &self.handler;
			let slot = &slot;
			let attempt: Attempt<'_> = Box::new(move || {
				Box::pin(async move {
					let response = handler.call(request).await?;

					*slot.lock() = Some(response);

					Ok(())
				}) as AttemptFuture<'_>
			});

			resilience.execute(dispatch_context(request), attempt).await?;
		}

		slot.into_inner().ok_or_else(|| Error::Resilience {
			contract: request.configuration_key().to_owned(),
		})
	}

	/// Dispatches `request` without decoding a success payload.
	pub async fn send<R>(&self, request: &mut R) -> Result<()>
	where
		R: Request,
	{
		self.prepare(request)?;

		let request = &*request;
		let Some(resilience) = &self.resilience else {
			return self.handler.send(request).await;
		};
		let handler = &self.handler;
		let attempt: Attempt<'_> =
			Box::new(move || Box::pin(handler.send(request)) as AttemptFuture<'_>);

		resilience.execute(dispatch_context(request), attempt).await
	}

	fn prepare<R>(&self, request: &mut R) -> Result<()>
	where
		R: Request,
	{
		if request.configuration_key().trim().is_empty() {
			return Err(ConfigError::MissingConfigurationKey.into());
		}

		let supplied = match (&request.meta().context, &self.context_function) {
			(None, Some(supply)) => supply(),
			_ => None,
		};

		if let Some(context) = supplied {
			request.meta_mut().context = Some(context);
		}

		let errors = request.validate();

		if !errors.is_empty() {
			return Err(ValidationError { errors }.into());
		}
		if let Some(supply) = &self.headers_function {
			let meta = request.meta_mut();

			for (name, value) in supply() {
				meta.headers.entry(name).or_insert(value);
			}
		}

		Ok(())
	}
}
impl Debug for RestApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestApiClient")
			.field("registry", self.registry())
			.field("context_function", &self.context_function.is_some())
			.field("headers_function", &self.headers_function.is_some())
			.field("resilience", &self.resilience.is_some())
			.finish()
	}
}

fn dispatch_context<R>(request: &R) -> DispatchContext<'_>
where
	R: Request,
{
	DispatchContext {
		configuration_key: request.configuration_key(),
		method: request.method(),
		resource: request.resource().into_owned(),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		borrow::Cow,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use super::*;
	use crate::{
		_preludet::RecordingTransport,
		builder::ApiClientBuilder,
		contract::{ErrorInfo, HttpMethod, RequestMeta},
		error::CallError,
		ext::ResilienceFuture,
	};

	#[derive(Debug, Serialize)]
	struct CreateAccount {
		name: String,
		#[serde(flatten)]
		meta: RequestMeta,
	}
	impl CreateAccount {
		fn named(name: &str) -> Self {
			Self { name: name.to_owned(), meta: RequestMeta::default() }
		}
	}
	impl Request for CreateAccount {
		type Response = u32;

		fn resource(&self) -> Cow<'_, str> {
			Cow::Borrowed("accounts")
		}

		fn method(&self) -> HttpMethod {
			HttpMethod::Post
		}

		fn configuration_key(&self) -> &str {
			"accounts"
		}

		fn meta(&self) -> &RequestMeta {
			&self.meta
		}

		fn meta_mut(&mut self) -> &mut RequestMeta {
			&mut self.meta
		}

		fn validate(&self) -> Vec<ErrorInfo> {
			if self.name.is_empty() {
				vec![ErrorInfo::new("name", "Name is required.")]
			} else {
				Vec::new()
			}
		}
	}

	/// Retries failed attempts up to `limit` times.
	struct Retry {
		limit: usize,
		attempts: AtomicUsize,
	}
	impl ResilienceHandler for Retry {
		fn execute<'a>(
			&'a self,
			_context: DispatchContext<'a>,
			mut attempt: Attempt<'a>,
		) -> ResilienceFuture<'a> {
			Box::pin(async move {
				let mut last = Ok(());

				for _ in 0..self.limit {
					self.attempts.fetch_add(1, Ordering::SeqCst);

					last = attempt().await;

					if last.is_ok() {
						break;
					}
				}

				last
			})
		}
	}

	/// Reports success without running the attempt.
	struct Skip;
	impl ResilienceHandler for Skip {
		fn execute<'a>(
			&'a self,
			_context: DispatchContext<'a>,
			_attempt: Attempt<'a>,
		) -> ResilienceFuture<'a> {
			Box::pin(async { Ok(()) })
		}
	}

	fn builder(transport: &Arc<RecordingTransport>) -> ApiClientBuilder {
		ApiClientBuilder::new()
			.with_transport(transport.clone())
			.configure_contract("accounts", "https://api.example.com/v1", None)
			.expect("Contract registration should succeed.")
	}

	#[tokio::test]
	async fn invalid_requests_never_reach_the_transport() {
		let transport = Arc::new(RecordingTransport::default());
		let client = builder(&transport).build().expect("Client should build.");
		let err = client
			.call(&mut CreateAccount::named(""))
			.await
			.expect_err("Invalid requests must be rejected.");

		match err {
			Error::Validation(ValidationError { errors }) =>
				assert_eq!(errors, vec![ErrorInfo::new("name", "Name is required.")]),
			other => panic!("Unexpected error variant: {other:?}."),
		}
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn existing_context_is_never_overwritten() {
		let transport = Arc::new(RecordingTransport::default());

		transport.push_json(200, r#"{"data":1}"#);
		transport.push_json(200, r#"{"data":2}"#);

		let client = builder(&transport)
			.with_context_function(|| Some("supplied".to_owned()))
			.build()
			.expect("Client should build.");
		let mut preset = CreateAccount::named("ops");

		preset.meta.context = Some("caller".into());

		assert_eq!(client.call(&mut preset).await.expect("Call should succeed."), 1);
		assert_eq!(preset.meta.context.as_deref(), Some("caller"));

		let mut empty = CreateAccount::named("dev");

		assert_eq!(client.call(&mut empty).await.expect("Call should succeed."), 2);
		assert_eq!(empty.meta.context.as_deref(), Some("supplied"));
	}

	#[tokio::test]
	async fn supplied_headers_do_not_override_request_headers() {
		let transport = Arc::new(RecordingTransport::default());

		transport.push_json(204, "");

		let client = builder(&transport)
			.with_headers_function(|| {
				BTreeMap::from([
					("X-Tenant".to_owned(), "supplied".to_owned()),
					("X-Trace".to_owned(), "t-1".to_owned()),
				])
			})
			.build()
			.expect("Client should build.");
		let mut request = CreateAccount::named("ops");

		request.meta.headers.insert("X-Tenant".into(), "caller".into());

		client.send(&mut request).await.expect("Send should succeed.");

		let requests = transport.requests();
		let sent = &requests[0];

		assert_eq!(sent.header("X-Tenant"), Some("caller"));
		assert_eq!(sent.header("X-Trace"), Some("t-1"));
	}

	#[tokio::test]
	async fn resilience_handler_retries_the_whole_call() {
		let transport = Arc::new(RecordingTransport::default());

		transport.push_json(503, "");
		transport.push_json(200, r#"{"data":42}"#);

		let retry = Arc::new(Retry { limit: 3, attempts: AtomicUsize::new(0) });
		let client = builder(&transport)
			.with_resilience_handler(retry.clone())
			.build()
			.expect("Client should build.");
		let value = client
			.call(&mut CreateAccount::named("ops"))
			.await
			.expect("Second attempt should succeed.");

		assert_eq!(value, 42);
		assert_eq!(retry.attempts.load(Ordering::SeqCst), 2);
		assert_eq!(transport.requests().len(), 2);
	}

	#[tokio::test]
	async fn resilience_handler_surfaces_the_last_error() {
		let transport = Arc::new(RecordingTransport::default());

		transport.push_json(503, "");

		let client = builder(&transport)
			.with_resilience_handler(Arc::new(Retry { limit: 1, attempts: AtomicUsize::new(0) }))
			.build()
			.expect("Client should build.");
		let err = client
			.call(&mut CreateAccount::named("ops"))
			.await
			.expect_err("A single failed attempt must surface.");

		assert!(matches!(err, Error::Call(CallError::Status { status: 503, .. })), "{err:?}");
	}

	#[tokio::test]
	async fn skipped_attempts_are_reported() {
		let transport = Arc::new(RecordingTransport::default());
		let client = builder(&transport)
			.with_resilience_handler(Arc::new(Skip))
			.build()
			.expect("Client should build.");
		let err = client
			.call(&mut CreateAccount::named("ops"))
			.await
			.expect_err("A handler that never runs the attempt cannot produce a value.");

		assert!(matches!(err, Error::Resilience { ref contract } if contract == "accounts"));
		assert!(transport.requests().is_empty());
	}
}
