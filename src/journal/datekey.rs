//! Journal date keys: the local calendar date as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, TimeZone};

const FORMAT: &str = "%Y-%m-%d";

/// Key for the calendar date `instant` falls on in its own time zone.
///
/// Late evening in a zone behind UTC stays on the local date.
pub fn date_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
  key_for(instant.date_naive())
}

pub fn key_for(date: NaiveDate) -> String {
  date.format(FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(key, FORMAT).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{FixedOffset, Utc};

  #[test]
  fn test_key_uses_local_date() {
    let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
    let evening = new_york.with_ymd_and_hms(2024, 1, 31, 22, 30, 0).unwrap();
    assert_eq!(date_key(&evening), "2024-01-31");
    assert_eq!(date_key(&evening.with_timezone(&Utc)), "2024-02-01");
  }

  #[test]
  fn test_parse_round_trip() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(key_for(date), "2024-03-09");
    assert_eq!(parse_date_key("2024-03-09"), Some(date));
    assert_eq!(parse_date_key("03/09/2024"), None);
  }
}
