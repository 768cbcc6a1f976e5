//! Ibadah journal: daily logs, completion scores and the streak.

mod datekey;
mod model;
mod stats;
mod tracker;

pub use datekey::{date_key, key_for, parse_date_key};
pub use model::{
  tracked_prayer, DailyLog, FastingType, Mood, PrayerStatus, DEFAULT_HABITS, TRACKED_PRAYERS,
};
pub use stats::DayScore;
pub use tracker::Journal;
