//! Prayer timings service client.

use chrono::{DateTime, NaiveDate, TimeZone};
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use super::times::{DayTimes, HijriDate};
use crate::config::{Coordinates, PrayerTimesConfig};

/// Envelope returned by the timings endpoint. `data` is a message string
/// when `code` is not 200.
#[derive(Debug, Deserialize)]
struct ApiTimingsResponse {
  code: u16,
  #[serde(default)]
  status: String,
  #[serde(default)]
  data: Value,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
  timings: BTreeMap<String, String>,
  date: ApiDate,
}

#[derive(Debug, Deserialize)]
struct ApiDate {
  readable: String,
  hijri: ApiHijri,
}

#[derive(Debug, Deserialize)]
struct ApiHijri {
  day: String,
  month: ApiHijriMonth,
  year: String,
}

#[derive(Debug, Deserialize)]
struct ApiHijriMonth {
  en: String,
}

impl ApiDay {
  fn into_day_times(self) -> DayTimes {
    DayTimes::from_timings(
      &self.timings,
      self.date.readable,
      HijriDate {
        day: self.date.hijri.day,
        month: self.date.hijri.month.en,
        year: self.date.hijri.year,
      },
    )
  }
}

/// Parse a timings response body.
pub fn parse_day(body: &str) -> Result<DayTimes> {
  let response: ApiTimingsResponse =
    serde_json::from_str(body).map_err(|e| eyre!("Failed to parse timings response: {}", e))?;

  if response.code != 200 {
    return Err(eyre!(
      "Timings service returned {} {}: {}",
      response.code,
      response.status,
      response.data
    ));
  }

  let day: ApiDay = serde_json::from_value(response.data)
    .map_err(|e| eyre!("Failed to parse timings data: {}", e))?;
  Ok(day.into_day_times())
}

/// Prayer times API client
#[derive(Clone)]
pub struct PrayerTimesClient {
  client: reqwest::Client,
  base_url: String,
  method: u8,
  timeout: Duration,
}

impl PrayerTimesClient {
  pub fn new(config: &PrayerTimesConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("nuswally/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      method: config.method,
      timeout: Duration::from_secs(config.timeout_secs),
    })
  }

  /// Fetch the timetable for the day containing `at`.
  pub async fn fetch_day<Tz: TimeZone>(&self, coords: Coordinates, at: &DateTime<Tz>) -> Result<DayTimes> {
    let url = format!("{}/timings/{}", self.base_url, at.timestamp());

    let body = self
      .client
      .get(&url)
      .query(&[
        ("latitude", coords.latitude.to_string()),
        ("longitude", coords.longitude.to_string()),
        ("method", self.method.to_string()),
      ])
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch prayer times: {}", e))?
      .text()
      .await
      .map_err(|e| eyre!("Failed to read prayer times response: {}", e))?;

    parse_day(&body)
  }

  /// Fetch the day's timetable, or fall back to the built-in table when the
  /// service fails or does not answer within the configured timeout.
  pub async fn load_day_times<Tz: TimeZone>(&self, coords: Coordinates, at: &DateTime<Tz>) -> DayTimes {
    let today: NaiveDate = at.naive_local().date();

    match tokio::time::timeout(self.timeout, self.fetch_day(coords, at)).await {
      Ok(Ok(day)) => {
        info!(date = %day.readable_date, "Loaded prayer times");
        day
      }
      Ok(Err(e)) => {
        warn!(error = %e, "Using fallback prayer times");
        DayTimes::fallback(today)
      }
      Err(_) => {
        warn!(timeout = ?self.timeout, "Prayer times request timed out, using fallback");
        DayTimes::fallback(today)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  const SAMPLE: &str = r#"{
    "code": 200,
    "status": "OK",
    "data": {
      "timings": {
        "Fajr": "05:24", "Sunrise": "06:58", "Dhuhr": "12:25", "Asr": "15:31",
        "Sunset": "17:52", "Maghrib": "17:52", "Isha": "19:11",
        "Imsak": "05:14", "Midnight": "00:25"
      },
      "date": {
        "readable": "24 Jan 2024",
        "timestamp": "1706083200",
        "hijri": {
          "date": "12-07-1445",
          "day": "12",
          "month": { "number": 7, "en": "Rajab", "ar": "رَجَب" },
          "year": "1445"
        }
      }
    }
  }"#;

  #[test]
  fn test_parse_day() {
    let day = parse_day(SAMPLE).unwrap();
    assert_eq!(day.readable_date, "24 Jan 2024");
    assert_eq!(day.hijri.month, "Rajab");
    assert_eq!(day.events.len(), 6);
    assert_eq!(day.time_of("Isha"), Some("19:11"));
    assert!(!day.using_fallback);
  }

  #[test]
  fn test_parse_error_code() {
    let body = r#"{"code": 400, "status": "BAD_REQUEST", "data": "Please specify a valid latitude"}"#;
    let err = parse_day(body).unwrap_err();
    assert!(err.to_string().contains("400"));
  }

  #[test]
  fn test_parse_garbage() {
    assert!(parse_day("<html>").is_err());
  }

  #[tokio::test]
  async fn test_unreachable_service_falls_back() {
    let config = PrayerTimesConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      method: 2,
      timeout_secs: 2,
    };
    let client = PrayerTimesClient::new(&config).unwrap();
    let day = client.load_day_times(Coordinates::default(), &Utc::now()).await;
    assert!(day.using_fallback);
    assert_eq!(day.time_of("Fajr"), Some("05:15"));
  }
}
