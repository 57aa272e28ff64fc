//! API client facade: request dispatch, credential attachment, and the forbidden retry.

pub mod factory;

mod dispatch;

pub use dispatch::MAX_ATTEMPTS;
pub use factory::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenProvider, TokenHeaderProvider},
	config::BaseUri,
	http::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// API client specialized for the crate's default reqwest transport stack.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Dispatches [`ApiRequest`](crate::request::ApiRequest) values against one API.
///
/// Credential providers are optional. A request tagged with a scheme whose provider is not
/// configured is sent without credentials.
pub struct ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound API request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Base URI joined with root-relative request paths.
	pub base_uri: BaseUri,
	oauth2: Option<Arc<dyn AccessTokenProvider>>,
	token_header: Option<Arc<dyn TokenHeaderProvider>>,
}
impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		base_uri: BaseUri,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			base_uri,
			oauth2: None,
			token_header: None,
		}
	}

	/// Sets or replaces the OAuth 2.0 token provider.
	pub fn with_oauth2(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
		self.oauth2 = Some(provider);

		self
	}

	/// Sets or replaces the static token header provider.
	pub fn with_token_header(mut self, provider: Arc<dyn TokenHeaderProvider>) -> Self {
		self.token_header = Some(provider);

		self
	}

	/// Returns the configured OAuth 2.0 token provider.
	pub fn oauth2(&self) -> Option<&Arc<dyn AccessTokenProvider>> {
		self.oauth2.as_ref()
	}

	/// Returns the configured static token header provider.
	pub fn token_header(&self) -> Option<&Arc<dyn TokenHeaderProvider>> {
		self.token_header.as_ref()
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client that provisions its own reqwest-backed transport.
	pub fn new(base_uri: BaseUri) -> Self {
		Self::with_http_client(
			base_uri,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			base_uri: self.base_uri.clone(),
			oauth2: self.oauth2.clone(),
			token_header: self.token_header.clone(),
		}
	}
}
impl<C, M> Debug for ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_uri", &self.base_uri)
			.field("oauth2_set", &self.oauth2.is_some())
			.field("token_header_set", &self.token_header.is_some())
			.finish()
	}
}
