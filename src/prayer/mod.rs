//! Prayer timetable, countdown to the next prayer, and reminders.

mod alarms;
mod next_event;
mod provider;
mod times;

pub use alarms::{load_settings, toggle as toggle_alarm, AlarmSettings, AlarmWatcher, Reminder};
pub use next_event::{next_event, NextEvent, Remaining, TimedEvent};
pub use provider::PrayerTimesClient;
pub use times::{DayTimes, DAILY_EVENTS};

use chrono::NaiveDateTime;

/// Keeps the day's timetable and recomputes the next prayer on every tick.
#[derive(Debug, Clone)]
pub struct PrayerClock {
  day: DayTimes,
  next: Option<NextEvent>,
}

impl PrayerClock {
  pub fn new(day: DayTimes) -> Self {
    Self { day, next: None }
  }

  pub fn day(&self) -> &DayTimes {
    &self.day
  }

  /// Swap in a freshly loaded timetable; the countdown updates next tick.
  pub fn set_day(&mut self, day: DayTimes) {
    self.day = day;
    self.next = None;
  }

  pub fn tick(&mut self, now: NaiveDateTime) -> Option<&NextEvent> {
    self.next = next_event(&self.day.events, now);
    self.next.as_ref()
  }

  pub fn next(&self) -> Option<&NextEvent> {
    self.next.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  #[test]
  fn test_clock_follows_ticks() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let mut clock = PrayerClock::new(DayTimes::fallback(today));
    assert!(clock.next().is_none());

    let next = clock.tick(today.and_hms_opt(6, 0, 0).unwrap()).unwrap();
    assert_eq!(next.name, "Sunrise");

    let next = clock.tick(today.and_hms_opt(22, 0, 0).unwrap()).unwrap();
    assert_eq!(next.name, "Fajr");
    assert_eq!(next.remaining, Remaining::Tomorrow);
  }
}
