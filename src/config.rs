//! Configuration sources and per-contract readers.
//!
//! The client never reads ambient settings. Callers hand a [`ConfigSource`] to
//! [`ApiClientBuilder::configure_from`](crate::builder::ApiClientBuilder::configure_from), which walks
//! every contract key and reads its values through a [`ContractConfig`]. Contract-scoped values win over
//! shared ones unless a key is marked contract-only.

// std
use std::time::Duration as StdDuration;
// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, error::ConfigError};

/// Key/value lookup backing [`ApiClientBuilder::configure_from`](crate::builder::ApiClientBuilder::configure_from).
pub trait ConfigSource
where
	Self: Send + Sync,
{
	/// Lists every configured contract key.
	fn contract_keys(&self) -> Vec<String>;

	/// Returns a value scoped to `contract`.
	fn contract_value(&self, contract: &str, key: &str) -> Option<String>;

	/// Returns a value shared by every contract.
	fn shared_value(&self, key: &str) -> Option<String>;
}

/// Reader over one contract's configuration.
#[derive(Clone, Copy)]
pub struct ContractConfig<'a> {
	source: &'a dyn ConfigSource,
	contract: &'a str,
}
impl<'a> ContractConfig<'a> {
	/// Base URL of the contract (required, contract-only).
	pub const BASE_URL: &'static str = "BaseUrl";
	/// Authentication method name (optional).
	pub const AUTHENTICATION: &'static str = "Authentication";
	/// Timeout (optional).
	pub const TIMEOUT: &'static str = "Timeout";

	/// Creates a reader for `contract`.
	pub fn new(source: &'a dyn ConfigSource, contract: &'a str) -> Self {
		Self { source, contract }
	}

	/// Contract key this reader is scoped to.
	pub fn contract(&self) -> &'a str {
		self.contract
	}

	/// Contract value, falling back to the shared value. Blank values count as absent.
	pub fn string(&self, key: &str) -> Option<String> {
		self.contract_string(key).or_else(|| non_blank(self.source.shared_value(key)))
	}

	/// Contract value only.
	pub fn contract_string(&self, key: &str) -> Option<String> {
		non_blank(self.source.contract_value(self.contract, key))
	}

	/// Like [`Self::string`] but fails with [`ConfigError::MissingValue`] when absent.
	pub fn require(&self, key: &str) -> Result<String, ConfigError> {
		self.string(key).ok_or_else(|| self.missing(key))
	}

	/// Like [`Self::contract_string`] but fails with [`ConfigError::MissingValue`] when absent.
	pub fn require_contract(&self, key: &str) -> Result<String, ConfigError> {
		self.contract_string(key).ok_or_else(|| self.missing(key))
	}

	/// Whitespace- or comma-separated list, empty when absent.
	pub fn list(&self, key: &str) -> Vec<String> {
		self.string(key)
			.map(|raw| {
				raw.split(|c: char| c.is_whitespace() || c == ',')
					.filter(|item| !item.is_empty())
					.map(str::to_owned)
					.collect()
			})
			.unwrap_or_default()
	}

	/// Optional timeout in `hh:mm:ss[.fraction]` notation or as a number of seconds.
	pub fn timeout(&self, key: &str) -> Result<Option<StdDuration>, ConfigError> {
		let Some(raw) = self.string(key) else {
			return Ok(None);
		};

		parse_timeout(&raw).map(Some).ok_or_else(|| ConfigError::InvalidTimeout {
			contract: self.contract.to_owned(),
			value: raw,
		})
	}

	fn missing(&self, key: &str) -> ConfigError {
		ConfigError::MissingValue { contract: self.contract.to_owned(), key: key.to_owned() }
	}
}
impl Debug for ContractConfig<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContractConfig").field("contract", &self.contract).finish_non_exhaustive()
	}
}

/// Parses `hh:mm:ss[.fraction]` or a bare (possibly fractional) number of seconds.
///
/// Values that are not positive or do not fit a [`StdDuration`] are rejected.
pub fn parse_timeout(raw: &str) -> Option<StdDuration> {
	let raw = raw.trim();

	if !raw.contains(':') {
		let seconds = raw.parse::<f64>().ok()?;

		return StdDuration::try_from_secs_f64(seconds).ok().filter(|duration| !duration.is_zero());
	}

	let mut parts = raw.split(':');
	let (Some(hours), Some(minutes), Some(seconds), None) =
		(parts.next(), parts.next(), parts.next(), parts.next())
	else {
		return None;
	};
	let hours = hours.parse::<u64>().ok()?;
	let minutes = minutes.parse::<u64>().ok().filter(|m| *m < 60)?;
	let seconds = seconds.parse::<f64>().ok().filter(|s| (0. ..60.).contains(s))?;
	let total = StdDuration::from_secs(hours.checked_mul(3_600)?.checked_add(minutes * 60)?)
		.checked_add(StdDuration::try_from_secs_f64(seconds).ok()?)?;

	(!total.is_zero()).then_some(total)
}

/// In-memory configuration section, optionally loaded from JSON.
///
/// ```json
/// {
///   "Apis": {
///     "billing": { "BaseUrl": "https://billing.example.com/api", "Authentication": "oauth2", "Audience": "billing" }
///   },
///   "Issuer": "https://issuer.example.com/oauth/token",
///   "ClientId": "svc",
///   "ClientSecret": "secret"
/// }
/// ```
///
/// Keys are matched case-insensitively. Non-string scalars are read as their JSON text and arrays are
/// joined with spaces.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SectionConfig {
	#[serde(default, rename = "Apis", alias = "apis")]
	apis: BTreeMap<String, BTreeMap<String, Value>>,
	#[serde(flatten)]
	shared: BTreeMap<String, Value>,
}
impl SectionConfig {
	/// Parses a JSON settings document.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de).map_err(|source| ConfigError::SettingsParse { source })
	}

	/// Sets a contract-scoped value.
	pub fn with_api_value(
		mut self,
		contract: impl Into<String>,
		key: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.apis.entry(contract.into()).or_default().insert(key.into(), Value::String(value.into()));

		self
	}

	/// Sets a shared value.
	pub fn with_shared_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.shared.insert(key.into(), Value::String(value.into()));

		self
	}
}
impl ConfigSource for SectionConfig {
	fn contract_keys(&self) -> Vec<String> {
		self.apis.keys().cloned().collect()
	}

	fn contract_value(&self, contract: &str, key: &str) -> Option<String> {
		lookup(&self.apis, contract).and_then(|values| lookup(values, key)).and_then(value_text)
	}

	fn shared_value(&self, key: &str) -> Option<String> {
		lookup(&self.shared, key).and_then(value_text)
	}
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
	map.get(key).or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

fn value_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Array(items) => Some(items.iter().filter_map(value_text).collect::<Vec<_>>().join(" ")),
		Value::Null | Value::Object(_) => None,
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
