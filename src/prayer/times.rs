//! One day's timetable.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::next_event::TimedEvent;

/// Names in the order they occur during the day, as displayed.
pub const DAILY_EVENTS: [&str; 6] = ["Fajr", "Sunrise", "Dhuhr", "Asr", "Maghrib", "Isha"];

/// Used when the timings service cannot be reached.
pub const FALLBACK_TIMES: [(&str, &str); 6] = [
  ("Fajr", "05:15"),
  ("Sunrise", "06:30"),
  ("Dhuhr", "12:30"),
  ("Asr", "16:15"),
  ("Maghrib", "18:45"),
  ("Isha", "20:15"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HijriDate {
  pub day: String,
  pub month: String,
  pub year: String,
}

impl HijriDate {
  fn fallback() -> Self {
    Self {
      day: "12".to_string(),
      month: "Rajab".to_string(),
      year: "1445".to_string(),
    }
  }
}

impl std::fmt::Display for HijriDate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {} {}", self.day, self.month, self.year)
  }
}

/// Prayer times for a single day plus the calendar labels shown with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTimes {
  pub events: Vec<TimedEvent>,
  pub readable_date: String,
  pub hijri: HijriDate,
  /// True when the built-in table was used instead of fetched times
  pub using_fallback: bool,
}

impl DayTimes {
  /// Build from a name -> "HH:MM" map, keeping only the daily events in
  /// order. Missing names keep an empty time and are never "next".
  pub fn from_timings(timings: &BTreeMap<String, String>, readable_date: String, hijri: HijriDate) -> Self {
    let events = DAILY_EVENTS
      .iter()
      .map(|name| TimedEvent::new(*name, timings.get(*name).cloned().unwrap_or_default()))
      .collect();

    Self {
      events,
      readable_date,
      hijri,
      using_fallback: false,
    }
  }

  pub fn fallback(today: NaiveDate) -> Self {
    Self {
      events: FALLBACK_TIMES
        .iter()
        .map(|(name, time)| TimedEvent::new(*name, *time))
        .collect(),
      readable_date: today.format("%A, %B %-d, %Y").to_string(),
      hijri: HijriDate::fallback(),
      using_fallback: true,
    }
  }

  pub fn time_of(&self, name: &str) -> Option<&str> {
    self
      .events
      .iter()
      .find(|e| e.name.eq_ignore_ascii_case(name))
      .map(|e| e.time.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fallback_table() {
    let day = DayTimes::fallback(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap());
    assert!(day.using_fallback);
    assert_eq!(day.events.len(), 6);
    assert_eq!(day.time_of("maghrib"), Some("18:45"));
    assert_eq!(day.readable_date, "Wednesday, January 24, 2024");
    assert_eq!(day.hijri.to_string(), "12 Rajab 1445");
  }

  #[test]
  fn test_from_timings_orders_and_filters() {
    let mut timings = BTreeMap::new();
    for (name, time) in [
      ("Isha", "19:40"),
      ("Fajr", "05:01"),
      ("Midnight", "00:10"),
      ("Dhuhr", "12:10"),
    ] {
      timings.insert(name.to_string(), time.to_string());
    }
    let day = DayTimes::from_timings(&timings, "x".into(), HijriDate::fallback());
    let names: Vec<_> = day.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, DAILY_EVENTS.to_vec());
    assert_eq!(day.time_of("Sunrise"), Some(""));
    assert_eq!(day.time_of("Isha"), Some("19:40"));
    assert!(!day.using_fallback);
  }
}
