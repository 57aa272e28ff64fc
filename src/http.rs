//! Transport primitives shared by the dispatcher and the token provider.
//!
//! The crate never talks to a socket directly. [`ApiHttpClient`] hands out
//! [`AsyncHttpClient`] handles that execute `http::Request<Vec<u8>>` values, and a
//! [`TransportErrorMapper`] classifies their failures into the caller-facing
//! [`TransportError`] kinds (malformed request, network, generic client failure).

pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Abstraction over HTTP transports used for both API calls and token exchanges.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by an
/// [`ApiClient`](crate::client::ApiClient) and its token provider. The handles they return
/// own whatever state their request futures need, and those futures must be `Send` so
/// callers can box them.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next request.
	fn handle(&self) -> Self::Handle;
}

/// Maps HTTP transport failures into caller-facing [`TransportError`] kinds.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(&self, error: HttpClientError<E>) -> TransportError;
}

/// Mapper for transports whose native error carries no network/builder distinction.
///
/// Native errors are reported as generic client failures; `http` builder errors are
/// malformed requests and I/O errors are network failures.
#[derive(Clone, Debug, Default)]
pub struct DefaultTransportErrorMapper;
impl<E> TransportErrorMapper<E> for DefaultTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, error: HttpClientError<E>) -> TransportError {
		map_common_transport_error(error)
	}
}

/// Mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: HttpClientError<ReqwestError>) -> TransportError {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::from(*inner),
			other => map_common_transport_error(other),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`AsyncHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Copies a request so it can be sent while the original stays available for retries and
/// response builders.
pub(crate) fn copy_request(request: &HttpRequest) -> HttpRequest {
	let mut copy = HttpRequest::new(request.body().clone());

	*copy.method_mut() = request.method().clone();
	*copy.uri_mut() = request.uri().clone();
	*copy.version_mut() = request.version();
	*copy.headers_mut() = request.headers().clone();

	copy
}

/// Sends `request` through a fresh transport handle, classifying failures with `mapper`.
pub(crate) async fn send<C, M>(
	http_client: &C,
	mapper: &M,
	request: HttpRequest,
) -> Result<HttpResponse, TransportError>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let handle = http_client.handle();

	handle.call(request).await.map_err(|err| mapper.map_transport_error(err))
}

fn map_common_transport_error<E>(error: HttpClientError<E>) -> TransportError
where
	E: 'static + Send + Sync + StdError,
{
	match error {
		HttpClientError::Http(inner) => TransportError::malformed_request(inner),
		HttpClientError::Io(inner) => TransportError::network(inner),
		HttpClientError::Other(message) => TransportError::client(message),
		HttpClientError::Reqwest(inner) => TransportError::Client { source: inner },
		_ => TransportError::client("unrecognized HTTP client failure"),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("Fake transport failure.")]
	struct FakeTransportError;

	#[test]
	fn copy_request_preserves_method_uri_headers_and_body() {
		let request = http::Request::builder()
			.method(http::Method::PUT)
			.uri("https://api.example.com/v1/items/7")
			.header("content-type", "application/json")
			.body(b"{\"a\":1}".to_vec())
			.expect("Request fixture should build.");
		let copy = copy_request(&request);

		assert_eq!(copy.method(), &http::Method::PUT);
		assert_eq!(copy.uri(), request.uri());
		assert_eq!(copy.headers(), request.headers());
		assert_eq!(copy.body(), request.body());
	}

	#[test]
	fn default_mapper_classifies_failures() {
		let mapper = DefaultTransportErrorMapper;
		let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");

		assert!(matches!(
			mapper.map_transport_error(HttpClientError::<FakeTransportError>::Io(io)),
			TransportError::Network { .. }
		));
		assert!(matches!(
			mapper.map_transport_error(HttpClientError::Reqwest(Box::new(FakeTransportError))),
			TransportError::Client { .. }
		));
		assert!(matches!(
			mapper.map_transport_error(HttpClientError::<FakeTransportError>::Other(
				"boom".into()
			)),
			TransportError::Client { .. }
		));

		let http_err = http::Request::builder()
			.uri("not a uri")
			.body(Vec::<u8>::new())
			.expect_err("An invalid URI should fail to build.");

		assert!(matches!(
			mapper.map_transport_error(HttpClientError::<FakeTransportError>::Http(http_err)),
			TransportError::MalformedRequest { .. }
		));
	}
}
