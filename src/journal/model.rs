use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The five prayers scored and counted towards the streak.
pub const TRACKED_PRAYERS: [&str; 5] = ["Fajr", "Dhuhr", "Asr", "Maghrib", "Isha"];

pub const DEFAULT_HABITS: [&str; 5] = [
  "Morning Adhkar",
  "Evening Adhkar",
  "Charity",
  "Istighfar",
  "Salawat",
];

/// Journal contents: date key -> log.
pub type Logs = BTreeMap<String, DailyLog>;

/// Canonical spelling of a tracked prayer name, matched case-insensitively.
pub fn tracked_prayer(name: &str) -> Option<&'static str> {
  TRACKED_PRAYERS
    .iter()
    .find(|p| p.eq_ignore_ascii_case(name.trim()))
    .copied()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PrayerStatus {
  #[default]
  None,
  Late,
  OnTime,
  Jamaah,
}

impl PrayerStatus {
  pub const ALL: [PrayerStatus; 4] = [
    PrayerStatus::None,
    PrayerStatus::Late,
    PrayerStatus::OnTime,
    PrayerStatus::Jamaah,
  ];

  /// Points out of 100 towards the day's score.
  pub fn points(self) -> u32 {
    match self {
      PrayerStatus::Jamaah => 100,
      PrayerStatus::OnTime => 80,
      PrayerStatus::Late => 50,
      PrayerStatus::None => 0,
    }
  }

  pub fn is_attended(self) -> bool {
    self != PrayerStatus::None
  }

  /// Next status in display order, wrapping around.
  pub fn cycle(self) -> Self {
    match self {
      PrayerStatus::None => PrayerStatus::Late,
      PrayerStatus::Late => PrayerStatus::OnTime,
      PrayerStatus::OnTime => PrayerStatus::Jamaah,
      PrayerStatus::Jamaah => PrayerStatus::None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      PrayerStatus::None => "Missed",
      PrayerStatus::Late => "Late",
      PrayerStatus::OnTime => "On Time",
      PrayerStatus::Jamaah => "Jama'ah",
    }
  }
}

/// Stored values outside the known set read as not prayed.
impl From<String> for PrayerStatus {
  fn from(s: String) -> Self {
    s.parse().unwrap_or_default()
  }
}

impl FromStr for PrayerStatus {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "none" | "missed" => Ok(PrayerStatus::None),
      "late" => Ok(PrayerStatus::Late),
      "ontime" | "on-time" => Ok(PrayerStatus::OnTime),
      "jamaah" | "congregation" => Ok(PrayerStatus::Jamaah),
      other => Err(eyre!(
        "Unknown prayer status '{}' (expected none, late, ontime or jamaah)",
        other
      )),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FastingType {
  #[default]
  None,
  Sunnah,
  Fard,
  Makeup,
}

impl FromStr for FastingType {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "none" => Ok(FastingType::None),
      "sunnah" => Ok(FastingType::Sunnah),
      "fard" => Ok(FastingType::Fard),
      "makeup" => Ok(FastingType::Makeup),
      other => Err(eyre!(
        "Unknown fasting type '{}' (expected none, sunnah, fard or makeup)",
        other
      )),
    }
  }
}

impl fmt::Display for FastingType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FastingType::None => "Not fasting",
      FastingType::Sunnah => "Sunnah",
      FastingType::Fard => "Fard",
      FastingType::Makeup => "Make-up",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
  Grateful,
  Happy,
  Neutral,
  Sad,
}

impl FromStr for Mood {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "grateful" => Ok(Mood::Grateful),
      "happy" => Ok(Mood::Happy),
      "neutral" => Ok(Mood::Neutral),
      "sad" => Ok(Mood::Sad),
      other => Err(eyre!(
        "Unknown mood '{}' (expected grateful, happy, neutral or sad)",
        other
      )),
    }
  }
}

impl fmt::Display for Mood {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Mood::Grateful => "Grateful",
      Mood::Happy => "Happy",
      Mood::Neutral => "Neutral",
      Mood::Sad => "Sad",
    };
    f.write_str(s)
  }
}

/// One calendar day of worship tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
  pub date: String,
  #[serde(default)]
  pub prayers: BTreeMap<String, PrayerStatus>,
  #[serde(default)]
  pub quran_pages: u32,
  #[serde(default)]
  pub fasting: FastingType,
  #[serde(default)]
  pub habits: BTreeMap<String, bool>,
  #[serde(default)]
  pub mood: Option<Mood>,
  #[serde(default)]
  pub notes: String,
}

impl DailyLog {
  /// The implicit log of a day nothing was recorded for.
  pub fn empty(date: &str) -> Self {
    Self {
      date: date.to_string(),
      prayers: TRACKED_PRAYERS
        .iter()
        .map(|p| (p.to_string(), PrayerStatus::None))
        .collect(),
      quran_pages: 0,
      fasting: FastingType::None,
      habits: BTreeMap::new(),
      mood: None,
      notes: String::new(),
    }
  }

  pub fn status(&self, prayer: &str) -> PrayerStatus {
    self.prayers.get(prayer).copied().unwrap_or_default()
  }

  pub fn habit_done(&self, habit: &str) -> bool {
    self.habits.get(habit).copied().unwrap_or(false)
  }
}

/// User-defined tracker settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
  #[serde(default)]
  pub custom_habits: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_log_json_shape() {
    let mut log = DailyLog::empty("2024-01-01");
    log.quran_pages = 4;
    log.prayers.insert("Fajr".into(), PrayerStatus::OnTime);
    log.mood = Some(Mood::Grateful);

    let json: serde_json::Value = serde_json::to_value(&log).unwrap();
    assert_eq!(json["quranPages"], 4);
    assert_eq!(json["prayers"]["Fajr"], "ontime");
    assert_eq!(json["fasting"], "none");
    assert_eq!(json["mood"], "grateful");
  }

  #[test]
  fn test_unknown_status_reads_as_none() {
    let log: DailyLog =
      serde_json::from_str(r#"{"date":"2024-01-01","prayers":{"Fajr":"excused","Isha":"jamaah"}}"#)
        .unwrap();
    assert_eq!(log.status("Fajr"), PrayerStatus::None);
    assert_eq!(log.status("Isha"), PrayerStatus::Jamaah);
    assert_eq!(log.status("Asr"), PrayerStatus::None);
    assert_eq!(log.notes, "");
  }

  #[test]
  fn test_status_parsing_and_cycle() {
    assert_eq!("On-Time".parse::<PrayerStatus>().unwrap(), PrayerStatus::OnTime);
    assert_eq!("congregation".parse::<PrayerStatus>().unwrap(), PrayerStatus::Jamaah);
    assert!("sometimes".parse::<PrayerStatus>().is_err());
    assert_eq!(PrayerStatus::Jamaah.cycle(), PrayerStatus::None);
  }

  #[test]
  fn test_tracked_prayer_is_case_insensitive() {
    assert_eq!(tracked_prayer("maghrib"), Some("Maghrib"));
    assert_eq!(tracked_prayer("Sunrise"), None);
  }

  #[test]
  fn test_config_uses_camel_case() {
    let config: TrackerConfig = serde_json::from_str(r#"{"customHabits":["Tahajjud"]}"#).unwrap();
    assert_eq!(config.custom_habits, vec!["Tahajjud".to_string()]);
  }
}
