//! Request classification: which bucket and strategy a URL gets.
//!
//! Pure function of the URL and the app's own origin. Rules are evaluated
//! in order and the first match wins.

use tracing::debug;
use url::{Origin, Url};

use super::buckets::Bucket;

/// CSS framework CDN
pub const CSS_CDN_HOST: &str = "cdn.tailwindcss.com";
/// Web font stylesheets
pub const FONT_CSS_HOST: &str = "fonts.googleapis.com";
/// Web font binaries
pub const FONT_FILE_HOST: &str = "fonts.gstatic.com";
/// External script modules
pub const SCRIPT_CDN_HOST: &str = "aistudiocdn.com";
/// Quran text and metadata API
pub const QURAN_API_HOST: &str = "quranapi.pages.dev";

const MEDIA_HOSTS: &[&str] = &["wikimedia.org", "wikipedia.org"];
const AUDIO_HOSTS: &[&str] = &["the-quran-project.github.io", "mp3quran.net", "archive.org"];

const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".ogg", ".wav", ".opus"];
const STATIC_EXTENSIONS: &[&str] = &[
  ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".woff", ".woff2", ".ttf", ".eot", ".ico",
];
const BUNDLE_EXTENSIONS: &[&str] = &[".js", ".css", ".tsx"];

/// How a cacheable request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Serve from the bucket if present, otherwise fetch and store
  CacheFirst,
  /// Fetch and store, fall back to the bucket when the network fails
  NetworkFirst,
}

/// Why a request bypasses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
  /// Audio streams are never cached
  Audio,
  /// Not our origin and not a known third-party host
  ForeignOrigin,
}

/// Classification outcome for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Cache {
    bucket: Bucket,
    strategy: Strategy,
    /// Cross-origin fetch with credentials stripped
    cors: bool,
  },
  Passthrough(PassReason),
}

impl Route {
  fn cache_first(bucket: Bucket) -> Self {
    Route::Cache {
      bucket,
      strategy: Strategy::CacheFirst,
      cors: false,
    }
  }

  fn cache_first_cors(bucket: Bucket) -> Self {
    Route::Cache {
      bucket,
      strategy: Strategy::CacheFirst,
      cors: true,
    }
  }

  fn network_first(bucket: Bucket) -> Self {
    Route::Cache {
      bucket,
      strategy: Strategy::NetworkFirst,
      cors: false,
    }
  }

  pub fn bucket(&self) -> Option<Bucket> {
    match self {
      Route::Cache { bucket, .. } => Some(*bucket),
      Route::Passthrough(_) => None,
    }
  }
}

/// Classify a request URL.
pub fn classify(url: &Url, app_origin: &Origin) -> Route {
  let host = url.host_str().unwrap_or_default().to_lowercase();

  // Known third-party hosts
  match host.as_str() {
    CSS_CDN_HOST => return Route::cache_first_cors(Bucket::Cdn),
    FONT_CSS_HOST | FONT_FILE_HOST => return Route::cache_first_cors(Bucket::Fonts),
    SCRIPT_CDN_HOST => return Route::cache_first_cors(Bucket::Cdn),
    _ => {}
  }
  if MEDIA_HOSTS.iter().any(|h| host.contains(*h)) {
    return Route::cache_first_cors(Bucket::StaticAssets);
  }
  if host == QURAN_API_HOST {
    return Route::network_first(Bucket::QuranApi);
  }
  if AUDIO_HOSTS.iter().any(|h| host.contains(*h)) {
    return Route::Passthrough(PassReason::Audio);
  }

  if &url.origin() != app_origin {
    return Route::Passthrough(PassReason::ForeignOrigin);
  }

  // Same-origin resources
  let path = url.path().to_lowercase();

  if path.ends_with(".pdf") || path.contains("/pdfs/") {
    Route::cache_first(Bucket::Pdfs)
  } else if ends_with_any(&path, AUDIO_EXTENSIONS) {
    Route::Passthrough(PassReason::Audio)
  } else if path.ends_with(".json") && path.contains("/services/") {
    Route::network_first(Bucket::Data)
  } else if ends_with_any(&path, STATIC_EXTENSIONS) {
    Route::cache_first(Bucket::StaticAssets)
  } else if is_bundle_path(&path) {
    Route::cache_first(Bucket::AppShell)
  } else {
    debug!(path = %path, "No specific rule, defaulting to app shell");
    Route::cache_first(Bucket::AppShell)
  }
}

/// True for script, style and bundler paths.
fn is_bundle_path(path: &str) -> bool {
  ends_with_any(path, BUNDLE_EXTENSIONS) || path.contains("/assets/") || path.contains("/@")
}

fn ends_with_any(path: &str, extensions: &[&str]) -> bool {
  extensions.iter().any(|ext| path.ends_with(*ext))
}
