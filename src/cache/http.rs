//! reqwest-backed `Fetcher`.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{CONTENT_TYPE, ORIGIN};
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::traits::{CachedResponse, FetchRequest, Fetcher, RequestMode};

/// Network fetcher for the cache router. No cookies are stored or sent.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  /// Serialized app origin, sent as `Origin` on CORS requests
  origin: String,
}

impl HttpFetcher {
  pub fn new(app_origin: &Url, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("nuswally/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      origin: app_origin.origin().ascii_serialization(),
    })
  }

  fn request(&self, request: &FetchRequest) -> reqwest::RequestBuilder {
    let builder = self.client.get(request.url.clone());
    match request.mode {
      RequestMode::Cors => builder.header(ORIGIN, self.origin.as_str()),
      RequestMode::SameOrigin => builder,
    }
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<CachedResponse>> + Send {
    let builder = self.request(request);
    let url = request.url.clone();
    async move {
      let response = builder
        .send()
        .await
        .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?;

      let status = response.status().as_u16();
      let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
      let body = response
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read body of {}: {}", url, e))?;

      Ok(CachedResponse::new(status, content_type, body.to_vec()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::header::COOKIE;

  fn fetcher() -> HttpFetcher {
    let app = Url::parse("https://nuswally.app/").unwrap();
    HttpFetcher::new(&app, Duration::from_secs(5)).unwrap()
  }

  #[test]
  fn test_cors_request_carries_origin_only() {
    let url = Url::parse("https://fonts.googleapis.com/css2?family=Amiri").unwrap();
    let request = fetcher().request(&FetchRequest::cors(url)).build().unwrap();
    assert_eq!(request.headers()[ORIGIN], "https://nuswally.app");
    assert!(request.headers().get(COOKIE).is_none());
  }

  #[test]
  fn test_passthrough_request_sends_no_cookie() {
    let url = Url::parse("https://server8.mp3quran.net/afs/001.mp3").unwrap();
    let request = fetcher().request(&FetchRequest::get(url)).build().unwrap();
    assert!(request.headers().get(COOKIE).is_none());
    assert!(request.headers().get(ORIGIN).is_none());
  }
}
