//! Builds fully wired [`ApiClient`] values from [`ApiClientConfig`].

// self
use crate::{
	_prelude::*,
	auth::{BearerTokenHeaderProvider, OAuth2Client},
	client::ApiClient,
	config::ApiClientConfig,
	http::{ApiHttpClient, TransportErrorMapper},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Shares one transport and one token store across every client it builds.
pub struct ApiClientFactory<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client shared by API calls and token exchanges.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token cache handed to every OAuth 2.0 provider.
	pub store: Arc<dyn TokenStore>,
}
impl<C, M> ApiClientFactory<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a factory that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { http_client: http_client.into(), transport_mapper: mapper.into(), store }
	}

	/// Builds a client for `config`.
	///
	/// OAuth 2.0 settings wire in an [`OAuth2Client`] backed by the shared store; a bearer token
	/// wires in a [`BearerTokenHeaderProvider`].
	pub fn build(&self, config: ApiClientConfig) -> ApiClient<C, M> {
		let ApiClientConfig { base_uri, oauth2, bearer_token } = config;
		let mut client = ApiClient::with_http_client(
			base_uri,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		);

		if let Some(oauth2) = oauth2 {
			let provider = OAuth2Client::<C, M>::with_http_client(
				oauth2,
				self.store.clone(),
				self.http_client.clone(),
				self.transport_mapper.clone(),
			);

			client = client.with_oauth2(Arc::new(provider));
		}
		if let Some(token) = bearer_token {
			client = client.with_token_header(Arc::new(BearerTokenHeaderProvider::new(token)));
		}

		client
	}
}
#[cfg(feature = "reqwest")]
impl ApiClientFactory<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a factory that provisions its own reqwest-backed transport.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self::with_http_client(store, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for ApiClientFactory<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClientFactory").finish_non_exhaustive()
	}
}
