//! Scores and streaks derived from the journal.

use chrono::{Days, NaiveDate};

use super::datekey::key_for;
use super::model::{DailyLog, Logs, TRACKED_PRAYERS};

/// How far back the streak walk looks.
const STREAK_HORIZON: u32 = 365;

/// Completion percentage for a day, 0..=100. Absent days score 0.
pub fn day_score(log: Option<&DailyLog>) -> f64 {
  let Some(log) = log else {
    return 0.0;
  };
  let total: u32 = TRACKED_PRAYERS.iter().map(|p| log.status(p).points()).sum();
  f64::from(total) * 100.0 / 500.0
}

/// Every tracked prayer marked as attended in some form.
pub fn is_complete(log: Option<&DailyLog>) -> bool {
  log.is_some_and(|log| TRACKED_PRAYERS.iter().all(|p| log.status(p).is_attended()))
}

/// One bar of the weekly chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DayScore {
  pub date: String,
  /// Short weekday name ("Mon")
  pub weekday: String,
  pub score: f64,
  /// The last day of the series, the one being viewed
  pub is_end: bool,
}

/// Seven consecutive days ending on `end`, oldest first.
pub fn week_series(logs: &Logs, end: NaiveDate) -> Vec<DayScore> {
  (0..7u64)
    .rev()
    .filter_map(|back| end.checked_sub_days(Days::new(back)))
    .map(|date| {
      let key = key_for(date);
      DayScore {
        score: day_score(logs.get(&key)),
        weekday: date.format("%a").to_string(),
        is_end: date == end,
        date: key,
      }
    })
    .collect()
}

/// Consecutive complete days walking back from `today`.
///
/// An incomplete today neither counts nor breaks the run. A day with no log
/// breaks it the same way a logged day with missed prayers does.
pub fn streak(logs: &Logs, today: NaiveDate) -> u32 {
  let mut count = 0;
  let mut day = today;

  for _ in 0..STREAK_HORIZON {
    if is_complete(logs.get(&key_for(day))) {
      count += 1;
    } else if day != today {
      break;
    }
    match day.pred_opt() {
      Some(prev) => day = prev,
      None => break,
    }
  }

  count
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::journal::model::PrayerStatus;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn log_with(date: NaiveDate, statuses: [PrayerStatus; 5]) -> DailyLog {
    let mut log = DailyLog::empty(&key_for(date));
    for (prayer, status) in TRACKED_PRAYERS.iter().zip(statuses) {
      log.prayers.insert(prayer.to_string(), status);
    }
    log
  }

  fn full(date: NaiveDate) -> DailyLog {
    log_with(date, [PrayerStatus::Late; 5])
  }

  fn insert(logs: &mut Logs, log: DailyLog) {
    logs.insert(log.date.clone(), log);
  }

  #[test]
  fn test_mixed_day_scores_62() {
    use PrayerStatus::*;
    let log = log_with(date(2024, 1, 1), [Jamaah, OnTime, Late, None, OnTime]);
    assert_eq!(day_score(Some(&log)), 62.0);
  }

  #[test]
  fn test_absent_and_perfect_days() {
    assert_eq!(day_score(Option::None), 0.0);
    let log = log_with(date(2024, 1, 1), [PrayerStatus::Jamaah; 5]);
    assert_eq!(day_score(Some(&log)), 100.0);
  }

  #[test]
  fn test_week_series_ends_on_viewed_day() {
    let mut logs = Logs::new();
    insert(&mut logs, full(date(2024, 3, 1)));

    let week = week_series(&logs, date(2024, 3, 3));
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, "2024-02-26");
    assert_eq!(week[6].date, "2024-03-03");
    assert_eq!(week[6].weekday, "Sun");
    assert!(week[6].is_end);
    assert!(!week[5].is_end);
    assert_eq!(week[4].score, 50.0);
    assert_eq!(week[5].score, 0.0);
  }

  #[test]
  fn test_streak_skips_incomplete_today() {
    let today = date(2024, 3, 10);
    let mut logs = Logs::new();
    for back in 1..=3 {
      insert(&mut logs, full(today - Days::new(back)));
    }
    let mut partial = DailyLog::empty(&key_for(today));
    partial.prayers.insert("Fajr".into(), PrayerStatus::OnTime);
    insert(&mut logs, partial);

    assert_eq!(streak(&logs, today), 3);
  }

  #[test]
  fn test_complete_today_counts() {
    let today = date(2024, 3, 10);
    let mut logs = Logs::new();
    insert(&mut logs, full(today));
    insert(&mut logs, full(today - Days::new(1)));
    assert_eq!(streak(&logs, today), 2);
  }

  #[test]
  fn test_gap_stops_the_walk() {
    let today = date(2024, 3, 10);
    let mut logs = Logs::new();
    insert(&mut logs, full(today - Days::new(1)));
    insert(&mut logs, DailyLog::empty(&key_for(today - Days::new(2))));
    insert(&mut logs, full(today - Days::new(3)));
    assert_eq!(streak(&logs, today), 1);
  }

  #[test]
  fn test_missing_day_breaks_like_missed_day() {
    let today = date(2024, 3, 10);
    let mut logs = Logs::new();
    insert(&mut logs, full(today - Days::new(2)));
    assert_eq!(streak(&logs, today), 0);
  }

  #[test]
  fn test_streak_is_capped() {
    let today = date(2024, 12, 31);
    let mut logs = Logs::new();
    for back in 0..400 {
      insert(&mut logs, full(today - Days::new(back)));
    }
    assert_eq!(streak(&logs, today), 365);
  }
}
