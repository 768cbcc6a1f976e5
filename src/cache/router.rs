//! Request interceptor: classify, pick a strategy, respond.
//!
//! `CacheRouter` is the single owner of the bucket set. It is built once at
//! startup and every outbound resource request goes through `handle`.

use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use tracing::{debug, info, warn};
use url::{Origin, Url};

use super::buckets::{Bucket, BucketSet};
use super::classify::{classify, PassReason, Route, Strategy};
use super::layer::CacheLayer;
use super::storage::CacheStorage;
use super::traits::{CacheResult, CacheSource, CachedResponse, FetchRequest, Fetcher};

/// App shell files seeded at install time, relative to the app origin.
pub const APP_SHELL_SEED: &[&str] = &["/", "/index.html", "/offline.html", "/manifest.json"];
/// CSS framework root document.
pub const CSS_FRAMEWORK_URL: &str = "https://cdn.tailwindcss.com/";
/// Font stylesheet; every font file it references is seeded too.
pub const FONTS_CSS_URL: &str = "https://fonts.googleapis.com/css2?family=Amiri:ital,wght@0,400;0,700;1,400&family=Plus+Jakarta+Sans:wght@300;400;500;600;700&family=Scheherazade+New:wght@400;500;600;700&display=swap";
/// Quran chapter list.
pub const QURAN_SURAH_LIST_URL: &str = "https://quranapi.pages.dev/api/surah.json";

const FONT_FILE_PREFIX: &str = "https://fonts.gstatic.com";

/// Outcome of routing one request.
#[derive(Debug, Clone)]
pub enum RouterResponse {
  /// Served through a bucket, from cache or network
  Served {
    bucket: Bucket,
    result: CacheResult<CachedResponse>,
  },
  /// Network-first request failed and the bucket had nothing for it
  Unavailable { bucket: Bucket },
  /// Sent straight to the network, never stored
  Passthrough {
    reason: PassReason,
    response: CachedResponse,
  },
}

impl RouterResponse {
  pub fn response(&self) -> Option<&CachedResponse> {
    match self {
      RouterResponse::Served { result, .. } => Some(&result.data),
      RouterResponse::Unavailable { .. } => None,
      RouterResponse::Passthrough { response, .. } => Some(response),
    }
  }
}

/// What install-time seeding managed to store.
#[derive(Debug, Default)]
pub struct InstallReport {
  pub seeded: Vec<String>,
  pub failed: Vec<(String, String)>,
}

impl InstallReport {
  fn record(&mut self, url: &Url, outcome: Result<bool>) {
    match outcome {
      Ok(true) => self.seeded.push(url.to_string()),
      Ok(false) => self
        .failed
        .push((url.to_string(), "not available".to_string())),
      Err(e) => {
        warn!(url = %url, error = %e, "Seed fetch failed");
        self.failed.push((url.to_string(), e.to_string()));
      }
    }
  }
}

/// Entry count for one declared bucket.
#[derive(Debug, Clone)]
pub struct BucketStats {
  pub bucket: Bucket,
  pub name: String,
  pub entries: usize,
}

/// Offline resource cache router.
pub struct CacheRouter<S: CacheStorage, F: Fetcher> {
  layer: CacheLayer<S>,
  fetcher: F,
  buckets: BucketSet,
  app_url: Url,
  app_origin: Origin,
}

impl<S: CacheStorage, F: Fetcher> CacheRouter<S, F> {
  pub fn new(storage: S, fetcher: F, buckets: BucketSet, app_url: Url) -> Self {
    let app_origin = app_url.origin();
    Self {
      layer: CacheLayer::new(storage),
      fetcher,
      buckets,
      app_url,
      app_origin,
    }
  }

  pub fn buckets(&self) -> &BucketSet {
    &self.buckets
  }

  /// Classify without fetching.
  pub fn route(&self, url: &Url) -> Route {
    classify(url, &self.app_origin)
  }

  /// Resolve a request relative to the app (absolute URLs pass unchanged).
  pub fn resolve(&self, target: &str) -> Result<Url> {
    self
      .app_url
      .join(target)
      .map_err(|e| eyre!("Invalid URL {}: {}", target, e))
  }

  /// Handle one outbound request.
  pub async fn handle(&self, url: &Url) -> Result<RouterResponse> {
    match self.route(url) {
      Route::Passthrough(reason) => {
        debug!(url = %url, ?reason, "Passing through uncached");
        let response = self.fetcher.fetch(&FetchRequest::get(url.clone())).await?;
        Ok(RouterResponse::Passthrough { reason, response })
      }
      Route::Cache {
        bucket,
        strategy,
        cors,
      } => {
        let request = if cors {
          FetchRequest::cors(url.clone())
        } else {
          FetchRequest::get(url.clone())
        };
        match self.serve(bucket, strategy, &request).await? {
          Some(result) => Ok(RouterResponse::Served { bucket, result }),
          None => Ok(RouterResponse::Unavailable { bucket }),
        }
      }
    }
  }

  async fn serve(
    &self,
    bucket: Bucket,
    strategy: Strategy,
    request: &FetchRequest,
  ) -> Result<Option<CacheResult<CachedResponse>>> {
    let name = self.buckets.name(bucket);
    let key = request.cache_key();
    let fetch = || self.fetcher.fetch(request);

    match strategy {
      Strategy::CacheFirst => self.layer.cache_first(&name, &key, fetch).await.map(Some),
      Strategy::NetworkFirst => self.layer.network_first(&name, &key, fetch).await,
    }
  }

  /// Seed the buckets with the resources needed to start offline.
  ///
  /// Individual failures are recorded and logged; seeding never fails as a whole.
  pub async fn install(&self) -> Result<InstallReport> {
    info!(version = self.buckets.version(), "Installing offline cache");
    for name in self.buckets.names() {
      self.layer.storage().open_bucket(&name)?;
    }

    let mut report = InstallReport::default();

    let shell: Vec<Url> = APP_SHELL_SEED
      .iter()
      .map(|path| self.resolve(path))
      .collect::<Result<_>>()?;
    let shell_results = join_all(
      shell
        .iter()
        .map(|url| self.seed(Bucket::AppShell, Strategy::CacheFirst, FetchRequest::get(url.clone()))),
    )
    .await;
    for (url, outcome) in shell.iter().zip(shell_results) {
      report.record(url, outcome.map(|r| r.is_some()));
    }

    let css_framework = parse_seed(CSS_FRAMEWORK_URL)?;
    let quran_list = parse_seed(QURAN_SURAH_LIST_URL)?;
    let (framework, quran, fonts) = tokio::join!(
      self.seed(
        Bucket::Cdn,
        Strategy::CacheFirst,
        FetchRequest::cors(css_framework.clone())
      ),
      self.seed(
        Bucket::QuranApi,
        Strategy::NetworkFirst,
        FetchRequest::get(quran_list.clone())
      ),
      self.seed_fonts(),
    );
    report.record(&css_framework, framework.map(|r| r.is_some()));
    report.record(&quran_list, quran.map(|r| r.is_some()));
    for (url, outcome) in fonts? {
      report.record(&url, outcome);
    }

    info!(
      seeded = report.seeded.len(),
      failed = report.failed.len(),
      "Installation complete"
    );
    Ok(report)
  }

  async fn seed(
    &self,
    bucket: Bucket,
    strategy: Strategy,
    request: FetchRequest,
  ) -> Result<Option<CachedResponse>> {
    match self.serve(bucket, strategy, &request).await? {
      Some(result) if result.source == CacheSource::Offline => Err(eyre!(
        "Failed to fetch {}: network unavailable, keeping the cached copy",
        request.url
      )),
      result => Ok(result.map(|r| r.data).filter(CachedResponse::is_success)),
    }
  }

  /// Fetch the font stylesheet, then every font file it references.
  async fn seed_fonts(&self) -> Result<Vec<(Url, Result<bool>)>> {
    let css_url = parse_seed(FONTS_CSS_URL)?;
    let css = self
      .seed(Bucket::Fonts, Strategy::CacheFirst, FetchRequest::cors(css_url.clone()))
      .await;

    let css = match css {
      Ok(Some(response)) => response,
      other => return Ok(vec![(css_url, other.map(|r| r.is_some()))]),
    };

    let files = font_file_urls(&css.text());
    debug!(count = files.len(), "Seeding font files");
    let results = join_all(
      files
        .iter()
        .map(|url| self.seed(Bucket::Fonts, Strategy::CacheFirst, FetchRequest::cors(url.clone()))),
    )
    .await;

    let mut outcomes = vec![(css_url, Ok(true))];
    outcomes.extend(
      files
        .into_iter()
        .zip(results)
        .map(|(url, r)| (url, r.map(|r| r.is_some()))),
    );
    Ok(outcomes)
  }

  /// Delete every stored bucket that the current version does not declare.
  ///
  /// Returns the deleted bucket names.
  pub fn activate(&self) -> Result<Vec<String>> {
    let storage = self.layer.storage();
    let mut deleted = Vec::new();

    for name in storage.bucket_names()? {
      if !self.buckets.is_declared(&name) {
        storage.delete_bucket(&name)?;
        info!(bucket = %name, "Deleted outdated cache bucket");
        deleted.push(name);
      }
    }
    for name in self.buckets.names() {
      storage.open_bucket(&name)?;
    }

    Ok(deleted)
  }

  /// Delete every bucket, declared or not. Returns how many buckets went.
  pub fn clear_all(&self) -> Result<usize> {
    let storage = self.layer.storage();
    let names = storage.bucket_names()?;
    for name in &names {
      storage.delete_bucket(name)?;
    }
    info!(count = names.len(), "Cleared offline cache");
    Ok(names.len())
  }

  /// Entry counts for the declared buckets.
  pub fn stats(&self) -> Result<Vec<BucketStats>> {
    Bucket::ALL
      .iter()
      .map(|bucket| {
        let name = self.buckets.name(*bucket);
        let entries = self.layer.storage().entry_count(&name)?;
        Ok(BucketStats {
          bucket: *bucket,
          name,
          entries,
        })
      })
      .collect()
  }
}

fn parse_seed(url: &str) -> Result<Url> {
  Url::parse(url).map_err(|e| eyre!("Invalid seed URL {}: {}", url, e))
}

/// Font file URLs referenced by `url(...)` in a font stylesheet.
pub fn font_file_urls(css: &str) -> Vec<Url> {
  let mut urls = Vec::new();
  let mut rest = css;

  while let Some(start) = rest.find("url(") {
    rest = &rest[start + 4..];
    let Some(end) = rest.find(')') else {
      break;
    };
    let candidate = rest[..end].trim().trim_matches(|c: char| c == '\'' || c == '"');
    if candidate.starts_with(FONT_FILE_PREFIX) {
      if let Ok(url) = Url::parse(candidate) {
        if !urls.contains(&url) {
          urls.push(url);
        }
      }
    }
    rest = &rest[end..];
  }

  urls
}
