//! Thread-safe in-memory [`TokenStore`] with TTL expiry for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<String, StoreEntry>>>;

#[derive(Clone, Debug)]
struct StoreEntry {
	value: TokenSecret,
	expires_at: OffsetDateTime,
}

/// Storage backend that keeps entries in-process and evicts them lazily once expired.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the number of entries that have not expired yet.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|entry| entry.expires_at > now).count()
	}

	/// Returns `true` when no live entry is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn fetch_now(map: &StoreMap, key: &str, now: OffsetDateTime) -> Option<TokenSecret> {
		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		if guard.get(key).is_some_and(|entry| entry.expires_at <= now) {
			guard.remove(key);
		}

		None
	}

	fn save_now(
		map: &StoreMap,
		key: &str,
		value: TokenSecret,
		ttl_secs: u64,
		now: OffsetDateTime,
	) -> Result<bool, StoreError> {
		if ttl_secs == 0 {
			return Ok(false);
		}

		let ttl = i64::try_from(ttl_secs)
			.map_err(|_| StoreError::backend(format!("TTL of {ttl_secs}s is out of range")))?;
		let expires_at = now
			.checked_add(Duration::seconds(ttl))
			.ok_or_else(|| StoreError::backend(format!("TTL of {ttl_secs}s is out of range")))?;

		map.write().insert(key.to_owned(), StoreEntry { value, expires_at });

		Ok(true)
	}
}
impl TokenStore for MemoryStore {
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::fetch_now(&map, key, OffsetDateTime::now_utc())) })
	}

	fn save<'a>(
		&'a self,
		key: &'a str,
		value: TokenSecret,
		ttl_secs: u64,
	) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(&map, key, value, ttl_secs, OffsetDateTime::now_utc()) })
	}
}
