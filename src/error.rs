//! Client-level error types shared across the dispatcher, token provider, and request builders.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used to carry foreign failures as a chained `source`.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request descriptor failed construction-time validation.
	#[error(transparent)]
	Descriptor(#[from] crate::request::RequestDescriptorError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request could not be sent or no response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authorization server exchange failed while obtaining an access token.
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// Token store failure surfaced by the store API itself.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),

	/// A response was received but the request's response builder could not use it.
	#[error("Response could not be parsed: {source}")]
	ResponseParse {
		/// Failure reported by the response builder.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps a response builder failure.
	pub fn response_parse(src: impl Into<BoxError>) -> Self {
		Self::ResponseParse { source: src.into() }
	}
}

/// Configuration and logic failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URI was configured with a trailing path separator.
	#[error("Base URI `{base_uri}` must be defined without a trailing slash.")]
	BaseUriTrailingSlash {
		/// Rejected base URI.
		base_uri: String,
	},
	/// Request declared a body content type without a matching encoder.
	#[error("No body encoder is available for content type `{content_type}`.")]
	UnsupportedContentType {
		/// Declared content type.
		content_type: String,
	},
}

/// Caller-facing transport failures, each carrying the original failure as its source.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The HTTP layer rejected a malformed request or a required piece was missing.
	#[error("Request is malformed and cannot be sent.")]
	MalformedRequest {
		/// Underlying builder or validation failure.
		#[source]
		source: BoxError,
	},
	/// Network failure of any kind, including timeouts and refused connections.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Any other HTTP client failure.
	#[error("HTTP client error occurred while sending the request.")]
	Client {
		/// Transport-specific error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a request construction failure.
	pub fn malformed_request(src: impl Into<BoxError>) -> Self {
		Self::MalformedRequest { source: src.into() }
	}

	/// Wraps a network failure.
	pub fn network(src: impl Into<BoxError>) -> Self {
		Self::Network { source: src.into() }
	}

	/// Wraps a generic HTTP client failure.
	pub fn client(src: impl Into<BoxError>) -> Self {
		Self::Client { source: src.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			Self::malformed_request(e)
		} else if e.is_timeout() || e.is_connect() {
			Self::network(e)
		} else {
			Self::client(e)
		}
	}
}

/// Authorization server failures raised while exchanging client credentials for a token.
///
/// These are never retried internally and propagate through [`Error::Authorization`]
/// unchanged, including when they happen during the forbidden-retry path.
#[derive(Debug, ThisError)]
pub enum AuthorizationError {
	/// Authorization server answered with a status other than `200 OK`.
	#[error("Authorization server responded with status {status}.")]
	Status {
		/// HTTP status code returned by the authorization server.
		status: u16,
		/// Truncated response body kept for diagnostics.
		body: String,
	},
	/// The token request could not be sent or no response was received.
	#[error("Authorization server could not be reached.")]
	Transport(
		#[from]
		#[source]
		TransportError,
	),
	/// Authorization server response lacks a usable `access_token` or `expires_in`.
	#[error("Invalid authorization server response: {reason}.")]
	InvalidResponse {
		/// Which requirement the response violated.
		reason: &'static str,
	},
}
