//! Cached bearer token with soft (grace) and hard expiry instants.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle state of a [`CachedToken`] at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
	/// Before the soft expiry; served as is.
	Fresh,
	/// Past the soft expiry but still valid; a refresh is attempted and failures are tolerated.
	Stale,
	/// Past the hard expiry; a refresh must succeed.
	Expired,
}

/// Token held by an authorization header factory.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Token type used as the `Authorization` scheme (`Bearer`, ...).
	pub token_type: String,
	/// Instant the token was obtained.
	pub issued_at: OffsetDateTime,
	/// Soft expiry: refreshes are attempted after this instant.
	pub refresh_after: OffsetDateTime,
	/// Hard expiry.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a token issued at `issued_at`, soft-expiring after `grace_ratio` of `expires_in`.
	///
	/// The soft expiry never exceeds the hard expiry. Returns `None` when either instant falls
	/// outside the representable date range.
	pub fn issue(
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
		grace_ratio: f64,
	) -> Option<Self> {
		let expires_at = issued_at.checked_add(expires_in)?;
		let grace =
			Duration::checked_seconds_f64(expires_in.as_seconds_f64() * grace_ratio.clamp(0., 1.))?;
		let refresh_after = issued_at.checked_add(grace)?.min(expires_at);

		Some(Self {
			access_token: TokenSecret::new(access_token),
			token_type: token_type.into(),
			issued_at,
			refresh_after,
			expires_at,
		})
	}

	/// Computes the state at `now`.
	pub fn state_at(&self, now: OffsetDateTime) -> TokenState {
		if now > self.expires_at {
			TokenState::Expired
		} else if now > self.refresh_after {
			TokenState::Stale
		} else {
			TokenState::Fresh
		}
	}

	/// Validity left at `now` (negative once expired).
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}

	/// `Authorization` header value (`"{token_type} {token}"`).
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("refresh_after", &self.refresh_after)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
