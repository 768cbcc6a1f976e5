//! Cache layer that orchestrates caching logic with network fetching.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheResult, CachedResponse};

/// Cache layer implementing the two serving strategies.
///
/// This layer sits between the router and the network, and knows nothing
/// about URLs beyond the cache key it is handed.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Cache-first strategy.
  ///
  /// 1. Check the bucket - if present, return it without touching the network
  /// 2. On a miss, fetch from network
  /// 3. Store 2xx responses, return whatever the network said
  ///
  /// A network error on a miss is returned to the caller as-is.
  pub async fn cache_first<F, Fut>(
    &self,
    bucket: &str,
    key: &str,
    fetcher: F,
  ) -> Result<CacheResult<CachedResponse>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedResponse>>,
  {
    if let Some(cached) = self.storage.get(bucket, key)? {
      debug!(bucket, key, "Serving from cache");
      return Ok(CacheResult::from_cache(cached.response, cached.cached_at));
    }

    debug!(bucket, key, "Cache miss, fetching");
    let response = fetcher().await?;
    self.store_if_success(bucket, key, &response);
    Ok(CacheResult::from_network(response))
  }

  /// Network-first strategy.
  ///
  /// 1. Always fetch from network
  /// 2. Store 2xx responses
  /// 3. On network failure, return whatever the bucket holds (offline mode)
  ///
  /// `None` means the network failed and nothing was cached.
  pub async fn network_first<F, Fut>(
    &self,
    bucket: &str,
    key: &str,
    fetcher: F,
  ) -> Result<Option<CacheResult<CachedResponse>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedResponse>>,
  {
    match fetcher().await {
      Ok(response) => {
        self.store_if_success(bucket, key, &response);
        Ok(Some(CacheResult::from_network(response)))
      }
      Err(e) => {
        debug!(bucket, key, error = %e, "Network failed, falling back to cache");
        Ok(
          self
            .storage
            .get(bucket, key)?
            .map(|cached| CacheResult::offline(cached.response, cached.cached_at)),
        )
      }
    }
  }

  /// A failed cache write never fails the request that produced the response.
  fn store_if_success(&self, bucket: &str, key: &str, response: &CachedResponse) {
    if !response.is_success() {
      debug!(bucket, key, status = response.status, "Not caching non-2xx response");
      return;
    }
    if let Err(e) = self.storage.put(bucket, key, response) {
      warn!(bucket, key, error = %e, "Failed to write cache entry");
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::SqliteStorage;
  use crate::cache::traits::CacheSource;
  use crate::db::Database;
  use color_eyre::eyre::eyre;

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(SqliteStorage::new(Arc::new(Database::open_in_memory().unwrap())))
  }

  fn ok(body: &str) -> CachedResponse {
    CachedResponse::new(200, None, body.as_bytes().to_vec())
  }

  #[tokio::test]
  async fn test_cache_first_miss_then_hit() {
    let layer = layer();

    let first = layer
      .cache_first("cdn-v1", "k", || async { Ok(ok("css")) })
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = layer
      .cache_first("cdn-v1", "k", || async { Err(eyre!("offline")) })
      .await
      .unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, ok("css"));
  }

  #[tokio::test]
  async fn test_cache_first_network_error_on_miss_propagates() {
    let layer = layer();
    let result = layer
      .cache_first("cdn-v1", "k", || async { Err(eyre!("offline")) })
      .await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_non_success_is_returned_but_not_stored() {
    let layer = layer();
    let response = layer
      .cache_first("app-shell-v1", "k", || async {
        Ok(CachedResponse::new(404, None, b"missing".to_vec()))
      })
      .await
      .unwrap();
    assert_eq!(response.data.status, 404);
    assert_eq!(layer.storage().entry_count("app-shell-v1").unwrap(), 0);
  }

  #[tokio::test]
  async fn test_network_first_prefers_network() {
    let layer = layer();
    layer
      .network_first("data-v1", "k", || async { Ok(ok("old")) })
      .await
      .unwrap();

    let fresh = layer
      .network_first("data-v1", "k", || async { Ok(ok("new")) })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(fresh.source, CacheSource::Network);
    assert_eq!(fresh.data.text(), "new");
  }

  #[tokio::test]
  async fn test_network_first_falls_back_offline() {
    let layer = layer();
    layer
      .network_first("data-v1", "k", || async { Ok(ok("stored")) })
      .await
      .unwrap();

    let offline = layer
      .network_first("data-v1", "k", || async { Err(eyre!("offline")) })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(offline.source, CacheSource::Offline);
    assert_eq!(offline.data.text(), "stored");
  }

  #[tokio::test]
  async fn test_network_first_empty_cache_is_none() {
    let layer = layer();
    let result = layer
      .network_first("data-v1", "k", || async { Err(eyre!("offline")) })
      .await
      .unwrap();
    assert!(result.is_none());
  }
}
