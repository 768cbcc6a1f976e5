//! Which named daily event comes next, and how long until it does.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use std::fmt;

/// A named event recurring daily at a wall-clock time ("HH:MM").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
  pub name: String,
  pub time: String,
}

impl TimedEvent {
  pub fn new(name: impl Into<String>, time: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      time: time.into(),
    }
  }

  /// Today's instant for this event, relative to `now`'s date.
  ///
  /// Unparseable times resolve to `now` itself, so they are never upcoming.
  pub fn instant_on(&self, now: NaiveDateTime) -> NaiveDateTime {
    match parse_time_of_day(&self.time) {
      Some(time) => now.date().and_time(time),
      None => now,
    }
  }
}

/// Time left until the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
  /// Counting down, later today
  In(TimeDelta),
  /// Everything today has passed; the event is tomorrow. Not a duration.
  Tomorrow,
}

impl fmt::Display for Remaining {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Remaining::In(delta) => f.write_str(&format_countdown(*delta)),
      Remaining::Tomorrow => f.write_str("tomorrow"),
    }
  }
}

/// The upcoming event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextEvent {
  pub name: String,
  pub time: String,
  pub remaining: Remaining,
}

/// Find the next event after `now`.
///
/// The event with the smallest strictly positive offset from `now` wins,
/// earlier list entries winning ties. When nothing is left today the first
/// event of the list is returned with `Remaining::Tomorrow`. `None` only for
/// an empty list.
pub fn next_event(events: &[TimedEvent], now: NaiveDateTime) -> Option<NextEvent> {
  let mut best: Option<(&TimedEvent, TimeDelta)> = None;

  for event in events {
    let diff = event.instant_on(now) - now;
    if diff <= TimeDelta::zero() {
      continue;
    }
    if best.map_or(true, |(_, min)| diff < min) {
      best = Some((event, diff));
    }
  }

  match best {
    Some((event, diff)) => Some(NextEvent {
      name: event.name.clone(),
      time: event.time.clone(),
      remaining: Remaining::In(diff),
    }),
    None => events.first().map(|event| NextEvent {
      name: event.name.clone(),
      time: event.time.clone(),
      remaining: Remaining::Tomorrow,
    }),
  }
}

/// Parse "HH:MM", tolerating a trailing zone label such as "05:15 (IST)".
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
  let token = s.split_whitespace().next()?;
  let (hours, minutes) = token.split_once(':')?;
  let hours: u32 = hours.trim().parse().ok()?;
  let minutes: u32 = minutes.trim().parse().ok()?;
  NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Format as `H:MM:SS`, hours unpadded, fractions of a second dropped.
pub fn format_countdown(delta: TimeDelta) -> String {
  let total = delta.num_seconds().max(0);
  let hours = total / 3600;
  let minutes = (total % 3600) / 60;
  let seconds = total % 60;
  format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn five_prayers() -> Vec<TimedEvent> {
    vec![
      TimedEvent::new("Fajr", "05:15"),
      TimedEvent::new("Dhuhr", "12:30"),
      TimedEvent::new("Asr", "16:15"),
      TimedEvent::new("Maghrib", "18:45"),
      TimedEvent::new("Isha", "20:15"),
    ]
  }

  fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
      .unwrap()
      .and_hms_opt(h, m, s)
      .unwrap()
  }

  #[test]
  fn test_next_at_noon_is_dhuhr() {
    let next = next_event(&five_prayers(), at(12, 0, 0)).unwrap();
    assert_eq!(next.name, "Dhuhr");
    assert_eq!(next.remaining.to_string(), "0:30:00");
  }

  #[test]
  fn test_after_isha_wraps_to_tomorrow() {
    let next = next_event(&five_prayers(), at(21, 0, 0)).unwrap();
    assert_eq!(next.name, "Fajr");
    assert_eq!(next.remaining, Remaining::Tomorrow);
    assert_eq!(next.remaining.to_string(), "tomorrow");
  }

  #[test]
  fn test_before_fajr() {
    let next = next_event(&five_prayers(), at(0, 0, 1)).unwrap();
    assert_eq!(next.name, "Fajr");
    assert_eq!(next.remaining.to_string(), "5:14:59");
  }

  #[test]
  fn test_event_at_exactly_now_has_passed() {
    let next = next_event(&five_prayers(), at(12, 30, 0)).unwrap();
    assert_eq!(next.name, "Asr");
    assert_eq!(next.remaining.to_string(), "3:45:00");
  }

  #[test]
  fn test_ties_go_to_earlier_entry() {
    let events = vec![
      TimedEvent::new("First", "10:00"),
      TimedEvent::new("Second", "10:00"),
    ];
    let next = next_event(&events, at(9, 0, 0)).unwrap();
    assert_eq!(next.name, "First");
  }

  #[test]
  fn test_malformed_times_are_skipped() {
    let events = vec![
      TimedEvent::new("Fajr", "05:15"),
      TimedEvent::new("Broken", "noon"),
      TimedEvent::new("Empty", ""),
      TimedEvent::new("Isha", "20:15"),
    ];
    let next = next_event(&events, at(12, 0, 0)).unwrap();
    assert_eq!(next.name, "Isha");
  }

  #[test]
  fn test_all_malformed_wraps_to_first() {
    let events = vec![TimedEvent::new("A", "x"), TimedEvent::new("B", "25:99")];
    let next = next_event(&events, at(12, 0, 0)).unwrap();
    assert_eq!(next.name, "A");
    assert_eq!(next.remaining, Remaining::Tomorrow);
  }

  #[test]
  fn test_empty_list() {
    assert!(next_event(&[], at(12, 0, 0)).is_none());
  }

  #[test]
  fn test_parse_time_of_day() {
    assert_eq!(parse_time_of_day("05:15"), NaiveTime::from_hms_opt(5, 15, 0));
    assert_eq!(parse_time_of_day("05:15 (IST)"), NaiveTime::from_hms_opt(5, 15, 0));
    assert_eq!(parse_time_of_day("24:00"), None);
    assert_eq!(parse_time_of_day("5"), None);
  }

  #[test]
  fn test_format_countdown_truncates_fraction() {
    let delta = TimeDelta::milliseconds(3_723_999);
    assert_eq!(format_countdown(delta), "1:02:03");
  }
}
