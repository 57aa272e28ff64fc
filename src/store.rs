//! Key/value token cache contract and the built-in in-memory implementation.
//!
//! The token provider only ever touches one entry, [`ACCESS_TOKEN_STORE_KEY`]. TTL
//! enforcement and write atomicity belong to the backend; an expired entry must read back
//! as `Ok(None)`.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Well-known key under which the current access token is cached.
pub const ACCESS_TOKEN_STORE_KEY: &str = "accessToken";

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by token caches.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	///
	/// A missing or expired entry is `Ok(None)`; `Err` is reserved for backend failures.
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<TokenSecret>>;

	/// Stores `value` under `key` for `ttl_secs` seconds.
	///
	/// Returns `Ok(false)` when the backend declined the write without failing.
	fn save<'a>(&'a self, key: &'a str, value: TokenSecret, ttl_secs: u64)
	-> StoreFuture<'a, bool>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	/// Convenience constructor for backend failures.
	pub fn backend(message: impl Into<String>) -> Self {
		Self::Backend { message: message.into() }
	}
}
