//! OAuth 2.0 client-credentials token provider with a TTL token cache.
//!
//! [`OAuth2Client`] answers [`AccessTokenProvider::access_token`] from its [`TokenStore`] and
//! only contacts the authorization server when the cached entry is missing, expired, or
//! unreadable. Store failures never fail a lookup: reads fall back to a refresh and writes are
//! logged while the freshly issued token is still returned. Authorization server failures are
//! never retried here and reach the caller as [`AuthorizationError`].
//!
//! Concurrent callers may refresh redundantly. [`OAuth2Client::with_single_flight`] serializes
//! refreshes behind one async guard, and callers waiting on a cache miss re-read the store once
//! the guard is theirs.

mod metrics;

pub use metrics::*;

// crates.io
use oauth2::{ClientId, ClientSecret};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::OAuth2Config,
	error::{AuthorizationError, TransportError},
	http::{
		self, ApiHttpClient, HttpRequest, TransportErrorMapper,
		http::{Method as HttpMethod, Request, StatusCode, header},
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{ACCESS_TOKEN_STORE_KEY, StoreError, TokenStore},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Boxed future returned by [`AccessTokenProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Source of OAuth 2.0 bearer tokens used by the dispatcher.
pub trait AccessTokenProvider
where
	Self: Send + Sync,
{
	/// Returns the cached access token, refreshing it when the cache has none.
	fn access_token(&self) -> ProviderFuture<'_, TokenSecret>;

	/// Exchanges the client credentials for a new token and caches it, bypassing the cache.
	fn refresh_access_token(&self) -> ProviderFuture<'_, TokenSecret>;
}

#[cfg(feature = "reqwest")]
/// Token provider specialized for the crate's default reqwest transport stack.
pub type ReqwestOAuth2Client = OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Client-credentials token provider backed by a [`TokenStore`].
pub struct OAuth2Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for token exchanges.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token cache.
	pub store: Arc<dyn TokenStore>,
	/// Authorization server token endpoint.
	pub auth_url: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: ClientId,
	/// OAuth 2.0 client secret.
	pub client_secret: ClientSecret,
	/// Shared counters for cache lookups and refreshes.
	pub metrics: Arc<TokenMetrics>,
	refresh_guard: Option<Arc<AsyncMutex<()>>>,
}
impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: OAuth2Config,
		store: Arc<dyn TokenStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let OAuth2Config { auth_url, client_id, client_secret, single_flight } = config;
		let client = Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			auth_url,
			client_id,
			client_secret,
			metrics: Default::default(),
			refresh_guard: None,
		};

		if single_flight { client.with_single_flight() } else { client }
	}

	/// Serializes refreshes so at most one exchange is in flight per provider.
	pub fn with_single_flight(mut self) -> Self {
		self.refresh_guard.get_or_insert_with(|| Arc::new(AsyncMutex::new(())));

		self
	}

	/// Returns `true` when refreshes are serialized.
	pub fn is_single_flight(&self) -> bool {
		self.refresh_guard.is_some()
	}

	async fn cached_token(&self) -> Option<TokenSecret> {
		match self.store.fetch(ACCESS_TOKEN_STORE_KEY).await {
			Ok(Some(token)) => {
				self.metrics.record_cache_hit();

				Some(token)
			},
			Ok(None) => {
				self.metrics.record_cache_miss();
				obs::debug("Access token cache miss.");

				None
			},
			Err(e) => {
				self.metrics.record_store_read_failure();
				obs::critical("Failed to read the access token from the token store.", &e);

				None
			},
		}
	}

	async fn load_access_token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.cached_token().await {
			return Ok(token);
		}

		let Some(guard) = &self.refresh_guard else {
			return self.exchange().await;
		};
		let _singleflight = guard.lock().await;

		match self.cached_token().await {
			Some(token) => Ok(token),
			None => self.exchange().await,
		}
	}

	async fn force_refresh(&self) -> Result<TokenSecret> {
		let _singleflight = match &self.refresh_guard {
			Some(guard) => Some(guard.lock().await),
			None => None,
		};

		self.exchange().await
	}

	async fn exchange(&self) -> Result<TokenSecret> {
		self.metrics.record_refresh();

		let issued = match self.request_token().await {
			Ok(issued) => issued,
			Err(e) => {
				self.metrics.record_refresh_failure();
				obs::critical(
					"Failed to obtain an access token from the authorization server.",
					&e,
				);

				return Err(e.into());
			},
		};

		let saved = match u64::try_from(issued.expires_in) {
			Ok(ttl_secs) =>
				self.store.save(ACCESS_TOKEN_STORE_KEY, issued.access_token.clone(), ttl_secs).await,
			Err(_) => Err(StoreError::backend("access token lifetime is negative")),
		};

		match saved {
			Ok(true) => {},
			Ok(false) => {
				self.metrics.record_store_write_failure();
				obs::critical(
					"Failed to save the access token to the token store.",
					&StoreError::backend("write declined"),
				);
			},
			Err(e) => {
				self.metrics.record_store_write_failure();
				obs::critical("Failed to save the access token to the token store.", &e);
			},
		}

		Ok(issued.access_token)
	}

	async fn request_token(&self) -> Result<IssuedToken, AuthorizationError> {
		let request = self.token_request()?;
		let response =
			http::send(self.http_client.as_ref(), self.transport_mapper.as_ref(), request).await?;

		if response.status() != StatusCode::OK {
			return Err(AuthorizationError::Status {
				status: response.status().as_u16(),
				body: body_preview(response.body()),
			});
		}

		parse_token_response(response.body())
	}

	fn token_request(&self) -> Result<HttpRequest, TransportError> {
		let form = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "client_credentials")
			.append_pair("client_id", self.client_id.as_str())
			.append_pair("client_secret", self.client_secret.secret())
			.finish();

		Request::builder()
			.method(HttpMethod::POST)
			.uri(self.auth_url.as_str())
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(header::ACCEPT, "application/json")
			.body(form.into_bytes())
			.map_err(TransportError::malformed_request)
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider that provisions its own reqwest-backed transport.
	pub fn new(config: OAuth2Config, store: Arc<dyn TokenStore>) -> Self {
		Self::with_http_client(
			config,
			store,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> AccessTokenProvider for OAuth2Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn access_token(&self) -> ProviderFuture<'_, TokenSecret> {
		const KIND: FlowKind = FlowKind::AccessToken;

		Box::pin(async move {
			let span = FlowSpan::new(KIND, "access_token");

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			let result = span.instrument(self.load_access_token()).await;

			obs::record_result(KIND, &result);

			result
		})
	}

	fn refresh_access_token(&self) -> ProviderFuture<'_, TokenSecret> {
		const KIND: FlowKind = FlowKind::RefreshAccessToken;

		Box::pin(async move {
			let span = FlowSpan::new(KIND, "refresh_access_token");

			obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

			let result = span.instrument(self.force_refresh()).await;

			obs::record_result(KIND, &result);

			result
		})
	}
}
impl<C, M> Debug for OAuth2Client<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("auth_url", &self.auth_url.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("single_flight", &self.is_single_flight())
			.finish()
	}
}

#[derive(Debug)]
struct IssuedToken {
	access_token: TokenSecret,
	expires_in: i64,
}

fn parse_token_response(body: &[u8]) -> Result<IssuedToken, AuthorizationError> {
	let payload = serde_json::from_slice::<Value>(body)
		.map_err(|_| AuthorizationError::InvalidResponse { reason: "body is not JSON" })?;
	let access_token = payload
		.get("access_token")
		.and_then(Value::as_str)
		.filter(|token| !token.is_empty())
		.ok_or(AuthorizationError::InvalidResponse {
			reason: "`access_token` must be a non-empty string",
		})?;
	let expires_in = payload
		.get("expires_in")
		.and_then(Value::as_i64)
		.filter(|secs| *secs != 0)
		.ok_or(AuthorizationError::InvalidResponse {
			reason: "`expires_in` must be a non-zero integer",
		})?;

	Ok(IssuedToken { access_token: TokenSecret::new(access_token), expires_in })
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	match text.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.into_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, http::DefaultTransportErrorMapper};

	type TestClient = OAuth2Client<ScriptedHttpClient, DefaultTransportErrorMapper>;

	fn config() -> OAuth2Config {
		OAuth2Config::new(
			Url::parse("https://auth.example.com/oauth/token").expect("Auth URL should parse."),
			"client-1",
			"secret-1",
		)
	}

	fn provider(transport: &ScriptedHttpClient, store: Arc<ScriptedStore>) -> TestClient {
		OAuth2Client::with_http_client(
			config(),
			store,
			transport.clone(),
			DefaultTransportErrorMapper,
		)
	}

	#[tokio::test]
	async fn cached_token_is_returned_without_refresh() {
		let transport = ScriptedHttpClient::default();
		let store = Arc::new(ScriptedStore::with_cached("cached"));
		let client = provider(&transport, store.clone());
		let token = client.access_token().await.expect("Cached token should be returned.");

		assert_eq!(token.expose(), "cached");
		assert!(transport.requests().is_empty());
		assert_eq!(client.metrics.cache_hits(), 1);
		assert_eq!(client.metrics.refreshes(), 0);
	}

	#[tokio::test]
	async fn cache_miss_refreshes_once_and_saves() {
		let transport = ScriptedHttpClient::default();

		transport.respond(200, r#"{"access_token":"tok123","expires_in":3600}"#);

		let store = Arc::new(ScriptedStore::default());
		let client = provider(&transport, store.clone());
		let token = client.access_token().await.expect("Refresh should succeed.");

		assert_eq!(token.expose(), "tok123");
		assert_eq!(store.saves(), vec![("accessToken".to_owned(), "tok123".to_owned(), 3600)]);
		assert_eq!(client.metrics.cache_misses(), 1);
		assert_eq!(client.metrics.refreshes(), 1);

		let requests = transport.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].method(), &HttpMethod::POST);
		assert_eq!(requests[0].uri().to_string(), "https://auth.example.com/oauth/token");
		assert_eq!(
			requests[0].headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
			Some(&b"application/x-www-form-urlencoded"[..])
		);
		assert_eq!(
			requests[0].body().as_slice(),
			b"grant_type=client_credentials&client_id=client-1&client_secret=secret-1"
		);
	}

	#[tokio::test]
	async fn store_read_failure_falls_back_to_refresh() {
		let transport = ScriptedHttpClient::default();

		transport.respond(200, r#"{"access_token":"fresh","expires_in":60}"#);

		let store = Arc::new(ScriptedStore::with_cached("stale").failing_reads());
		let client = provider(&transport, store);
		let token = client.access_token().await.expect("Read failures should not fail lookups.");

		assert_eq!(token.expose(), "fresh");
		assert_eq!(client.metrics.store_read_failures(), 1);
		assert_eq!(transport.requests().len(), 1);
	}

	#[tokio::test]
	async fn store_write_failures_still_return_the_token() {
		for store in
			[ScriptedStore::default().failing_writes(), ScriptedStore::default().declining_writes()]
		{
			let transport = ScriptedHttpClient::default();

			transport.respond(200, r#"{"access_token":"tok123","expires_in":3600}"#);

			let client = provider(&transport, Arc::new(store));
			let token = client
				.refresh_access_token()
				.await
				.expect("Write failures should not fail refreshes.");

			assert_eq!(token.expose(), "tok123");
			assert_eq!(client.metrics.store_write_failures(), 1);
		}
	}

	#[tokio::test]
	async fn non_ok_status_is_an_authorization_failure() {
		let transport = ScriptedHttpClient::default();

		transport.respond(500, "upstream exploded");

		let client = provider(&transport, Arc::new(ScriptedStore::default()));
		let err = client.access_token().await.expect_err("Status 500 should fail the lookup.");

		match err {
			Error::Authorization(AuthorizationError::Status { status, body }) => {
				assert_eq!(status, 500);
				assert_eq!(body, "upstream exploded");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
		assert_eq!(client.metrics.refresh_failures(), 1);
	}

	#[tokio::test]
	async fn transport_failure_is_an_authorization_failure() {
		let transport = ScriptedHttpClient::default();

		transport.fail_network();

		let client = provider(&transport, Arc::new(ScriptedStore::default()));
		let err =
			client.refresh_access_token().await.expect_err("Network failures should surface.");

		assert!(matches!(
			err,
			Error::Authorization(AuthorizationError::Transport(TransportError::Network { .. }))
		));
	}

	#[test]
	fn token_response_requires_token_and_non_zero_lifetime() {
		for body in [
			"not json",
			r#"{"expires_in":3600}"#,
			r#"{"access_token":"","expires_in":3600}"#,
			r#"{"access_token":42,"expires_in":3600}"#,
			r#"{"access_token":"tok"}"#,
			r#"{"access_token":"tok","expires_in":0}"#,
			r#"{"access_token":"tok","expires_in":1.5}"#,
			r#"{"access_token":"tok","expires_in":"3600"}"#,
		] {
			assert!(
				matches!(
					parse_token_response(body.as_bytes()),
					Err(AuthorizationError::InvalidResponse { .. })
				),
				"Body {body} should be rejected."
			);
		}

		let issued = parse_token_response(
			br#"{"access_token":"tok","expires_in":3600,"token_type":"bearer"}"#,
		)
		.expect("A well-formed response should parse.");

		assert_eq!(issued.access_token.expose(), "tok");
		assert_eq!(issued.expires_in, 3600);
		assert_eq!(
			parse_token_response(br#"{"access_token":"tok","expires_in":-5}"#)
				.expect("A negative lifetime should still parse.")
				.expires_in,
			-5
		);
	}

	#[tokio::test]
	async fn negative_lifetime_skips_the_cache_but_returns_the_token() {
		let transport = ScriptedHttpClient::default();

		transport.respond(200, r#"{"access_token":"tok","expires_in":-5}"#);

		let store = Arc::new(ScriptedStore::default());
		let client = provider(&transport, store.clone());
		let token = client
			.refresh_access_token()
			.await
			.expect("A negative lifetime should not fail the refresh.");

		assert_eq!(token.expose(), "tok");
		assert!(store.saves().is_empty());
		assert_eq!(client.metrics.store_write_failures(), 1);
	}

	#[test]
	fn body_preview_truncates_long_bodies() {
		let long = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(long.as_bytes());

		assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(preview.ends_with("..."));
		assert_eq!(body_preview(b"short"), "short");
	}

	#[tokio::test]
	async fn single_flight_waiters_reuse_the_refreshed_token() {
		let transport = ScriptedHttpClient::default();

		transport.respond(200, r#"{"access_token":"tok123","expires_in":3600}"#);

		let store = Arc::new(ScriptedStore::default());
		let client = Arc::new(provider(&transport, store).with_single_flight());
		let (first, second) = tokio::join!(client.access_token(), client.access_token());

		assert_eq!(first.expect("First lookup should succeed.").expose(), "tok123");
		assert_eq!(second.expect("Second lookup should succeed.").expose(), "tok123");
		assert_eq!(transport.requests().len(), 1);
		assert_eq!(client.metrics.refreshes(), 1);
	}

	#[test]
	fn debug_output_redacts_the_client_secret() {
		let client = provider(&ScriptedHttpClient::default(), Arc::new(ScriptedStore::default()));
		let rendered = format!("{client:?}");

		assert!(rendered.contains("client-1"));
		assert!(!rendered.contains("secret-1"));
	}
}
