//! Per-prayer reminders shortly before each prayer.

use chrono::{NaiveDateTime, TimeDelta};
use color_eyre::Result;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use super::next_event::TimedEvent;
use crate::store::{read_json, write_json, KeyValueStore, PRAYER_ALARMS};

/// A reminder fires when the prayer is within this window, exclusive of the
/// lower bound.
const WINDOW_START: i64 = 9 * 60;
const WINDOW_END: i64 = 10 * 60;

/// Which prayers have a reminder armed, by name.
pub type AlarmSettings = BTreeMap<String, bool>;

pub fn load_settings(store: &dyn KeyValueStore) -> AlarmSettings {
  read_json(store, PRAYER_ALARMS).unwrap_or_default()
}

/// Flip the reminder for `prayer` and persist. Returns the new state.
pub fn toggle(store: &dyn KeyValueStore, settings: &mut AlarmSettings, prayer: &str) -> Result<bool> {
  let armed = !settings.get(prayer).copied().unwrap_or(false);
  settings.insert(prayer.to_string(), armed);
  write_json(store, PRAYER_ALARMS, settings)?;
  Ok(armed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
  pub prayer: String,
  pub time: String,
}

impl Reminder {
  pub fn message(&self) -> String {
    format!("{} is in 10 minutes ({})", self.prayer, self.time)
  }
}

/// Emits each armed prayer's reminder at most once per day.
#[derive(Debug, Default)]
pub struct AlarmWatcher {
  fired: HashSet<String>,
}

impl AlarmWatcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn check(&mut self, now: NaiveDateTime, events: &[TimedEvent], settings: &AlarmSettings) -> Vec<Reminder> {
    let today = format!("{}-", now.date());
    self.fired.retain(|id| id.starts_with(&today));
    let mut due = Vec::new();

    for event in events {
      if !settings.get(&event.name).copied().unwrap_or(false) {
        continue;
      }
      let diff: TimeDelta = event.instant_on(now) - now;
      let secs = diff.num_seconds();
      if secs <= WINDOW_START || secs > WINDOW_END {
        continue;
      }

      let id = format!("{}-{}", now.date(), event.name);
      if self.fired.insert(id) {
        info!(prayer = %event.name, "Prayer reminder due");
        due.push(Reminder {
          prayer: event.name.clone(),
          time: event.time.clone(),
        });
      }
    }

    due
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::memory_store;
  use chrono::NaiveDate;

  fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
      .unwrap()
      .and_hms_opt(h, m, s)
      .unwrap()
  }

  fn armed(names: &[&str]) -> AlarmSettings {
    names.iter().map(|n| (n.to_string(), true)).collect()
  }

  #[test]
  fn test_fires_once_inside_window() {
    let events = vec![TimedEvent::new("Dhuhr", "12:30")];
    let settings = armed(&["Dhuhr"]);
    let mut watcher = AlarmWatcher::new();

    assert!(watcher.check(at(12, 19, 0), &events, &settings).is_empty());
    let due = watcher.check(at(12, 20, 0), &events, &settings);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].prayer, "Dhuhr");
    assert!(watcher.check(at(12, 20, 30), &events, &settings).is_empty());
    assert!(watcher.check(at(12, 21, 0), &events, &settings).is_empty());
  }

  #[test]
  fn test_unarmed_prayer_never_fires() {
    let events = vec![TimedEvent::new("Asr", "16:15")];
    let mut watcher = AlarmWatcher::new();
    assert!(watcher
      .check(at(16, 5, 30), &events, &AlarmSettings::new())
      .is_empty());
  }

  #[test]
  fn test_fires_again_next_day() {
    let events = vec![TimedEvent::new("Fajr", "05:15")];
    let settings = armed(&["Fajr"]);
    let mut watcher = AlarmWatcher::new();
    assert_eq!(watcher.check(at(5, 5, 30), &events, &settings).len(), 1);

    let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 2)
      .unwrap()
      .and_hms_opt(5, 5, 30)
      .unwrap();
    assert_eq!(watcher.check(tomorrow, &events, &settings).len(), 1);
  }

  #[test]
  fn test_only_todays_reminders_are_remembered() {
    let events = vec![TimedEvent::new("Fajr", "05:15"), TimedEvent::new("Isha", "19:30")];
    let settings = armed(&["Fajr", "Isha"]);
    let mut watcher = AlarmWatcher::new();
    watcher.check(at(5, 5, 30), &events, &settings);
    watcher.check(at(19, 20, 30), &events, &settings);
    assert_eq!(watcher.fired.len(), 2);

    for day in 2..=20 {
      let morning = NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(5, 5, 30)
        .unwrap();
      assert_eq!(watcher.check(morning, &events, &settings).len(), 1);
    }
    assert_eq!(watcher.fired.len(), 1);
    assert!(watcher.fired.contains("2024-03-20-Fajr"));
  }

  #[test]
  fn test_toggle_persists() {
    let store = memory_store();
    let mut settings = load_settings(&store);
    assert!(toggle(&store, &mut settings, "Isha").unwrap());
    assert_eq!(load_settings(&store).get("Isha"), Some(&true));
    assert!(!toggle(&store, &mut settings, "Isha").unwrap());
    assert_eq!(load_settings(&store).get("Isha"), Some(&false));
  }
}
