//! Core traits and types for the offline cache.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::future::Future;
use url::Url;

/// How a cross-origin request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  SameOrigin,
  Cors,
}

/// An outbound request as seen by the router.
#[derive(Debug, Clone)]
pub struct FetchRequest {
  pub url: Url,
  pub mode: RequestMode,
}

impl FetchRequest {
  /// Plain same-origin GET.
  pub fn get(url: Url) -> Self {
    Self {
      url,
      mode: RequestMode::SameOrigin,
    }
  }

  /// Cross-origin GET sent with an `Origin` header and no credentials.
  pub fn cors(url: Url) -> Self {
    Self {
      url,
      mode: RequestMode::Cors,
    }
  }

  /// Key under which the response is cached: the URL without its fragment.
  pub fn cache_key(&self) -> String {
    cache_key(&self.url)
  }
}

/// Normalize a URL into a cache key.
pub fn cache_key(url: &Url) -> String {
  let mut url = url.clone();
  url.set_fragment(None);
  url.to_string()
}

/// A response body plus the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl CachedResponse {
  pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
    Self {
      status,
      content_type,
      body,
    }
  }

  /// 2xx responses are the only ones worth storing.
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

/// Network side of the router.
///
/// `Err` means the request never produced a response (DNS, connect, TLS,
/// timeout). Any HTTP status, including 4xx/5xx, is an `Ok` response.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<CachedResponse>> + Send;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Cache hit, network not consulted
  Cache,
  /// Network unavailable, serving cached data
  Offline,
}
