//! Static header credentials for APIs that do not speak OAuth 2.0.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Stateless credential source producing a fixed header name/value pair.
///
/// Requests tagged with [`AuthScheme::TokenHeader`](crate::request::AuthScheme::TokenHeader)
/// receive this header when the client has a provider configured.
pub trait TokenHeaderProvider
where
	Self: Send + Sync,
{
	/// Header the secret is sent in.
	fn header_name(&self) -> &str;

	/// Pre-formatted header value, including any scheme prefix.
	fn secret(&self) -> &str;
}

/// Sends `Authorization: Bearer <token>` with a fixed token.
#[derive(Clone)]
pub struct BearerTokenHeaderProvider {
	value: TokenSecret,
}
impl BearerTokenHeaderProvider {
	/// Wraps a bearer token; the `Bearer ` prefix is added here.
	pub fn new(token: impl AsRef<str>) -> Self {
		Self { value: TokenSecret::new(format!("Bearer {}", token.as_ref())) }
	}
}
impl TokenHeaderProvider for BearerTokenHeaderProvider {
	fn header_name(&self) -> &str {
		"Authorization"
	}

	fn secret(&self) -> &str {
		self.value.expose()
	}
}
impl Debug for BearerTokenHeaderProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerTokenHeaderProvider").field("value", &self.value).finish()
	}
}

/// Sends an arbitrary header with a fixed, already formatted value.
#[derive(Clone)]
pub struct StaticTokenHeaderProvider {
	name: String,
	value: TokenSecret,
}
impl StaticTokenHeaderProvider {
	/// Creates a provider for the given header name and value.
	pub fn new(name: impl Into<String>, value: impl Into<TokenSecret>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}
impl TokenHeaderProvider for StaticTokenHeaderProvider {
	fn header_name(&self) -> &str {
		&self.name
	}

	fn secret(&self) -> &str {
		self.value.expose()
	}
}
impl Debug for StaticTokenHeaderProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticTokenHeaderProvider")
			.field("name", &self.name)
			.field("value", &self.value)
			.finish()
	}
}
