//! Client configuration: base URI, OAuth 2.0 credentials, and the optional static bearer token.
//!
//! Every type deserializes with serde so settings can come from any format the caller already
//! loads. Secrets keep redacted `Debug` output.

// crates.io
use oauth2::{ClientId, ClientSecret};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Validated API base URI.
///
/// Empty means "no base": request paths are then used verbatim. A non-empty base must not end
/// with `/`, so joining it with a root-relative path never doubles the separator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseUri(String);
impl BaseUri {
	/// Validates and wraps a base URI.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if value.ends_with('/') {
			return Err(ConfigError::BaseUriTrailingSlash { base_uri: value });
		}

		Ok(Self(value))
	}

	/// Returns the base URI as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no base URI is configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Resolves `path` against the base.
	///
	/// Root-relative paths are appended to a non-empty base; anything else (absolute URIs,
	/// relative paths, or any path when the base is empty) is returned unchanged.
	pub fn join(&self, path: &str) -> String {
		if !self.is_empty() && path.starts_with('/') {
			format!("{}{path}", self.0)
		} else {
			path.to_owned()
		}
	}
}
impl TryFrom<String> for BaseUri {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<BaseUri> for String {
	fn from(value: BaseUri) -> Self {
		value.0
	}
}
impl FromStr for BaseUri {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Display for BaseUri {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Authorization server settings for the client-credentials grant.
#[derive(Clone, Debug, Deserialize)]
pub struct OAuth2Config {
	/// Token endpoint receiving the client-credentials exchange.
	pub auth_url: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// OAuth 2.0 client secret.
	pub client_secret: ClientSecret,
	/// Serializes refreshes behind a single async guard.
	#[serde(default)]
	pub single_flight: bool,
}
impl OAuth2Config {
	/// Creates settings for the given token endpoint and client credentials.
	pub fn new(
		auth_url: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			auth_url,
			client_id: ClientId::new(client_id.into()),
			client_secret: ClientSecret::new(client_secret.into()),
			single_flight: false,
		}
	}

	/// Enables or disables single-flight refreshes.
	pub fn with_single_flight(mut self, enabled: bool) -> Self {
		self.single_flight = enabled;

		self
	}
}

/// Complete client configuration consumed by
/// [`ApiClientFactory`](crate::client::ApiClientFactory).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiClientConfig {
	/// Base URI joined with root-relative request paths.
	#[serde(default)]
	pub base_uri: BaseUri,
	/// OAuth 2.0 settings; requests tagged for OAuth 2.0 go out unauthenticated without them.
	#[serde(default)]
	pub oauth2: Option<OAuth2Config>,
	/// Static bearer token sent as `Authorization: Bearer <token>` on token header requests.
	#[serde(default)]
	pub bearer_token: Option<TokenSecret>,
}
