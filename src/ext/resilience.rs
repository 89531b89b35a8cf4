//! Resilience contracts that let callers wrap whole calls with retry, backoff, or circuit breaking.

// self
use crate::{_prelude::*, contract::HttpMethod};

/// Boxed future produced by one [`Attempt`] invocation.
pub type AttemptFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Continuation performing the real dispatch; call it once per attempt.
///
/// The typed response of a successful attempt is kept by the client, so the handler only sees
/// `Result<()>`.
pub type Attempt<'a> = Box<dyn FnMut() -> AttemptFuture<'a> + 'a + Send>;

/// Boxed future returned by [`ResilienceHandler::execute`].
pub type ResilienceFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Contract for policies wrapping the dispatch of a call.
///
/// The client behaves identically with or without a handler: validation and context injection run
/// before the handler is invoked, and the handler's final `Ok`/`Err` decides the call's outcome.
pub trait ResilienceHandler: Send + Sync {
	/// Runs `attempt` one or more times.
	fn execute<'a>(
		&'a self,
		context: DispatchContext<'a>,
		attempt: Attempt<'a>,
	) -> ResilienceFuture<'a>;
}

/// Metadata describing the call being wrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchContext<'a> {
	/// Contract key of the request.
	pub configuration_key: &'a str,
	/// HTTP verb.
	pub method: HttpMethod,
	/// URI suffix of the request.
	pub resource: String,
}
