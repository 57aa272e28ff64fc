// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token cache lookups and refreshes.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	store_read_failures: AtomicU64,
	refreshes: AtomicU64,
	refresh_failures: AtomicU64,
	store_write_failures: AtomicU64,
}
impl TokenMetrics {
	/// Returns the number of lookups answered from the store.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups that found no live entry.
	pub fn cache_misses(&self) -> u64 {
		self.cache_misses.load(Ordering::Relaxed)
	}

	/// Returns the number of store reads that failed and fell back to a refresh.
	pub fn store_read_failures(&self) -> u64 {
		self.store_read_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges attempted against the authorization server.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of issued tokens the store failed or declined to keep.
	pub fn store_write_failures(&self) -> u64 {
		self.store_write_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_miss(&self) {
		self.cache_misses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store_read_failure(&self) {
		self.store_read_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_store_write_failure(&self) {
		self.store_write_failures.fetch_add(1, Ordering::Relaxed);
	}
}
