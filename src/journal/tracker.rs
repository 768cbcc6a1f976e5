//! The journal controller: owns the logs, persists on every change.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use super::datekey::key_for;
use super::model::{
  tracked_prayer, DailyLog, FastingType, Logs, Mood, PrayerStatus, TrackerConfig, DEFAULT_HABITS,
  TRACKED_PRAYERS,
};
use super::stats::{self, DayScore};
use crate::store::{
  read_json, write_json, KeyValueStore, IBADAH_CONFIG, IBADAH_LOGS, IBADAH_LOGS_LEGACY,
};

/// A day as stored by the first, checkbox-only version.
#[derive(Debug, Deserialize)]
struct LegacyDay {
  #[serde(default)]
  prayers: BTreeMap<String, bool>,
  #[serde(default)]
  habits: BTreeMap<String, bool>,
}

impl LegacyDay {
  fn migrate(self, date: &str) -> DailyLog {
    let mut log = DailyLog::empty(date);
    for prayer in TRACKED_PRAYERS {
      if self.prayers.get(prayer).copied().unwrap_or(false) {
        log.prayers.insert(prayer.to_string(), PrayerStatus::OnTime);
      }
    }
    log.habits = self.habits;
    log
  }
}

pub struct Journal {
  store: Arc<dyn KeyValueStore>,
  logs: Logs,
  config: TrackerConfig,
}

impl Journal {
  /// Load the journal, migrating legacy logs when no current ones exist.
  pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
    let logs = Self::load_logs(store.as_ref());
    let config = read_json(store.as_ref(), IBADAH_CONFIG).unwrap_or_default();
    Self {
      store,
      logs,
      config,
    }
  }

  fn load_logs(store: &dyn KeyValueStore) -> Logs {
    let current = match store.get(IBADAH_LOGS) {
      Ok(raw) => raw,
      Err(e) => {
        error!(error = %e, "Failed to read journal");
        return Logs::new();
      }
    };
    if current.is_some() {
      return read_json(store, IBADAH_LOGS).unwrap_or_default();
    }

    let legacy = match store.get(IBADAH_LOGS_LEGACY) {
      Ok(Some(raw)) => raw,
      _ => return Logs::new(),
    };

    match Self::migrate_legacy(&legacy) {
      Ok(logs) => {
        info!(days = logs.len(), "Migrated legacy journal");
        if let Err(e) = write_json(store, IBADAH_LOGS, &logs) {
          error!(error = %e, "Failed to save migrated journal");
        }
        logs
      }
      Err(e) => {
        error!(error = %e, "Legacy journal migration failed");
        let logs = Logs::new();
        if let Err(e) = write_json(store, IBADAH_LOGS, &logs) {
          error!(error = %e, "Failed to save empty journal");
        }
        logs
      }
    }
  }

  fn migrate_legacy(raw: &str) -> Result<Logs> {
    let old: BTreeMap<String, LegacyDay> =
      serde_json::from_str(raw).map_err(|e| eyre!("Failed to parse legacy journal: {}", e))?;
    Ok(
      old
        .into_iter()
        .map(|(date, day)| {
          let log = day.migrate(&date);
          (date, log)
        })
        .collect(),
    )
  }

  pub fn logs(&self) -> &Logs {
    &self.logs
  }

  /// The log for `date`, or the implicit empty one.
  pub fn log(&self, date: NaiveDate) -> DailyLog {
    let key = key_for(date);
    self
      .logs
      .get(&key)
      .cloned()
      .unwrap_or_else(|| DailyLog::empty(&key))
  }

  pub fn week(&self, end: NaiveDate) -> Vec<DayScore> {
    stats::week_series(&self.logs, end)
  }

  pub fn streak(&self, today: NaiveDate) -> u32 {
    stats::streak(&self.logs, today)
  }

  pub fn day_score(&self, date: NaiveDate) -> f64 {
    stats::day_score(self.logs.get(&key_for(date)))
  }

  /// Default habits followed by the user's own.
  pub fn active_habits(&self) -> Vec<String> {
    DEFAULT_HABITS
      .iter()
      .map(|h| h.to_string())
      .chain(self.config.custom_habits.iter().cloned())
      .collect()
  }

  pub fn custom_habits(&self) -> &[String] {
    &self.config.custom_habits
  }

  pub fn set_prayer(&mut self, date: NaiveDate, prayer: &str, status: PrayerStatus) -> Result<()> {
    let prayer = tracked_prayer(prayer).ok_or_else(|| {
      eyre!(
        "Unknown prayer '{}' (expected one of {})",
        prayer,
        TRACKED_PRAYERS.join(", ")
      )
    })?;
    self.update(date, |log| {
      log.prayers.insert(prayer.to_string(), status);
    })
  }

  /// Advance a prayer to its next status. Returns the new status.
  pub fn cycle_prayer(&mut self, date: NaiveDate, prayer: &str) -> Result<PrayerStatus> {
    let prayer = tracked_prayer(prayer).ok_or_else(|| eyre!("Unknown prayer '{}'", prayer))?;
    let next = self.log(date).status(prayer).cycle();
    self.set_prayer(date, prayer, next)?;
    Ok(next)
  }

  pub fn set_quran_pages(&mut self, date: NaiveDate, pages: u32) -> Result<()> {
    self.update(date, |log| log.quran_pages = pages)
  }

  pub fn set_fasting(&mut self, date: NaiveDate, fasting: FastingType) -> Result<()> {
    self.update(date, |log| log.fasting = fasting)
  }

  /// Flip a habit for the day. Returns whether it is now done.
  pub fn toggle_habit(&mut self, date: NaiveDate, habit: &str) -> Result<bool> {
    let habit = self
      .active_habits()
      .into_iter()
      .find(|h| h.eq_ignore_ascii_case(habit.trim()))
      .ok_or_else(|| eyre!("Unknown habit '{}'", habit))?;

    let done = !self.log(date).habit_done(&habit);
    self.update(date, |log| {
      log.habits.insert(habit, done);
    })?;
    Ok(done)
  }

  pub fn set_mood(&mut self, date: NaiveDate, mood: Option<Mood>) -> Result<()> {
    self.update(date, |log| log.mood = mood)
  }

  pub fn set_notes(&mut self, date: NaiveDate, notes: &str) -> Result<()> {
    self.update(date, |log| log.notes = notes.to_string())
  }

  /// Add a habit to the active list. Blank names and duplicates are ignored.
  pub fn add_custom_habit(&mut self, name: &str) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() || self.active_habits().iter().any(|h| h == name) {
      return Ok(false);
    }
    self.config.custom_habits.push(name.to_string());
    self.save_config()?;
    Ok(true)
  }

  /// Remove a user habit. Default habits cannot be removed.
  pub fn remove_custom_habit(&mut self, name: &str) -> Result<bool> {
    let before = self.config.custom_habits.len();
    self.config.custom_habits.retain(|h| h != name);
    if self.config.custom_habits.len() == before {
      return Ok(false);
    }
    self.save_config()?;
    Ok(true)
  }

  /// Drop every log and the tracker settings, legacy data included.
  pub fn reset(&mut self) -> Result<()> {
    self.store.remove(IBADAH_LOGS)?;
    self.store.remove(IBADAH_LOGS_LEGACY)?;
    self.store.remove(IBADAH_CONFIG)?;
    self.logs.clear();
    self.config = TrackerConfig::default();
    info!("Journal reset");
    Ok(())
  }

  /// Apply `f` to the day's log. Memory only changes once the write lands.
  fn update(&mut self, date: NaiveDate, f: impl FnOnce(&mut DailyLog)) -> Result<()> {
    let key = key_for(date);
    let mut logs = self.logs.clone();
    f(logs
      .entry(key.clone())
      .or_insert_with(|| DailyLog::empty(&key)));
    write_json(self.store.as_ref(), IBADAH_LOGS, &logs)?;
    self.logs = logs;
    Ok(())
  }

  fn save_config(&self) -> Result<()> {
    write_json(self.store.as_ref(), IBADAH_CONFIG, &self.config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{memory_store, SqliteKvStore};
  use std::sync::atomic::{AtomicBool, Ordering};

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn store() -> Arc<dyn KeyValueStore> {
    Arc::new(memory_store())
  }

  #[test]
  fn test_legacy_logs_are_migrated() {
    let store = store();
    store
      .set(
        IBADAH_LOGS_LEGACY,
        r#"{"2024-01-01": {"prayers": {"Fajr": true, "Dhuhr": false}, "habits": {"Charity": true}}}"#,
      )
      .unwrap();

    let journal = Journal::load(Arc::clone(&store));
    let log = journal.log(day(1));
    assert_eq!(log.status("Fajr"), PrayerStatus::OnTime);
    assert_eq!(log.status("Dhuhr"), PrayerStatus::None);
    assert_eq!(log.status("Isha"), PrayerStatus::None);
    assert_eq!(log.prayers.len(), 5);
    assert_eq!(log.quran_pages, 0);
    assert_eq!(log.fasting, FastingType::None);
    assert_eq!(log.mood, None);
    assert_eq!(log.notes, "");
    assert!(log.habit_done("Charity"));

    assert!(store.get(IBADAH_LOGS).unwrap().is_some());
  }

  #[test]
  fn test_current_logs_take_precedence_over_legacy() {
    let store = store();
    store
      .set(IBADAH_LOGS_LEGACY, r#"{"2024-01-01": {"prayers": {"Fajr": true}}}"#)
      .unwrap();
    store.set(IBADAH_LOGS, "{}").unwrap();

    let journal = Journal::load(store);
    assert!(journal.logs().is_empty());
  }

  #[test]
  fn test_broken_legacy_data_yields_empty_journal() {
    let store = store();
    store.set(IBADAH_LOGS_LEGACY, "not json").unwrap();
    let journal = Journal::load(store);
    assert!(journal.logs().is_empty());
  }

  #[test]
  fn test_broken_legacy_data_is_migrated_once() {
    let store = store();
    store.set(IBADAH_LOGS_LEGACY, "not json").unwrap();
    Journal::load(Arc::clone(&store));
    assert_eq!(store.get(IBADAH_LOGS).unwrap().as_deref(), Some("{}"));

    let mut journal = Journal::load(Arc::clone(&store));
    journal.set_quran_pages(day(1), 3).unwrap();
    let reloaded = Journal::load(store);
    assert_eq!(reloaded.log(day(1)).quran_pages, 3);
  }

  /// Store whose writes can be switched off.
  struct FlakyStore {
    inner: SqliteKvStore,
    fail_writes: AtomicBool,
  }

  impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
      self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
      if self.fail_writes.load(Ordering::SeqCst) {
        return Err(eyre!("Failed to write {}: disk full", key));
      }
      self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
      self.inner.remove(key)
    }
  }

  #[test]
  fn test_failed_write_leaves_journal_unchanged() {
    let store = Arc::new(FlakyStore {
      inner: memory_store(),
      fail_writes: AtomicBool::new(false),
    });
    let mut journal = Journal::load(Arc::clone(&store) as Arc<dyn KeyValueStore>);
    journal.set_prayer(day(1), "Fajr", PrayerStatus::Jamaah).unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    assert!(journal.set_prayer(day(1), "Dhuhr", PrayerStatus::Jamaah).is_err());
    assert!(journal.set_quran_pages(day(2), 5).is_err());

    assert_eq!(journal.log(day(1)).status("Dhuhr"), PrayerStatus::None);
    assert!(!journal.logs().contains_key(&key_for(day(2))));
    assert_eq!(journal.day_score(day(1)), 20.0);
  }

  #[test]
  fn test_corrupt_logs_yield_empty_journal() {
    let store = store();
    store.set(IBADAH_LOGS, "{\"2024-01-01\": 7").unwrap();
    store.set(IBADAH_CONFIG, "not json").unwrap();
    let journal = Journal::load(store);
    assert!(journal.logs().is_empty());
    assert_eq!(journal.active_habits().len(), DEFAULT_HABITS.len());
  }

  #[test]
  fn test_mutations_persist() {
    let store = store();
    let mut journal = Journal::load(Arc::clone(&store));
    journal.set_prayer(day(2), "fajr", PrayerStatus::Jamaah).unwrap();
    journal.set_quran_pages(day(2), 12).unwrap();
    journal.set_fasting(day(2), FastingType::Sunnah).unwrap();
    journal.set_mood(day(2), Some(Mood::Happy)).unwrap();
    journal.set_notes(day(2), "Long day").unwrap();
    assert!(journal.toggle_habit(day(2), "charity").unwrap());

    let reloaded = Journal::load(store);
    let log = reloaded.log(day(2));
    assert_eq!(log.status("Fajr"), PrayerStatus::Jamaah);
    assert_eq!(log.quran_pages, 12);
    assert_eq!(log.fasting, FastingType::Sunnah);
    assert_eq!(log.mood, Some(Mood::Happy));
    assert_eq!(log.notes, "Long day");
    assert!(log.habit_done("Charity"));
    assert_eq!(reloaded.day_score(day(2)), 20.0);
  }

  #[test]
  fn test_unknown_prayer_and_habit_are_rejected() {
    let mut journal = Journal::load(store());
    assert!(journal.set_prayer(day(1), "Sunrise", PrayerStatus::OnTime).is_err());
    assert!(journal.toggle_habit(day(1), "Juggling").is_err());
    assert!(journal.logs().is_empty());
  }

  #[test]
  fn test_cycle_prayer() {
    let mut journal = Journal::load(store());
    assert_eq!(journal.cycle_prayer(day(1), "Asr").unwrap(), PrayerStatus::Late);
    assert_eq!(journal.cycle_prayer(day(1), "asr").unwrap(), PrayerStatus::OnTime);
  }

  #[test]
  fn test_custom_habits() {
    let store = store();
    let mut journal = Journal::load(Arc::clone(&store));
    assert!(journal.add_custom_habit("  Tahajjud ").unwrap());
    assert!(!journal.add_custom_habit("Tahajjud").unwrap());
    assert!(!journal.add_custom_habit("Charity").unwrap());
    assert!(!journal.add_custom_habit("   ").unwrap());
    assert!(journal.toggle_habit(day(1), "tahajjud").unwrap());

    let mut reloaded = Journal::load(store);
    assert_eq!(reloaded.custom_habits(), ["Tahajjud".to_string()]);
    assert!(!reloaded.remove_custom_habit("Charity").unwrap());
    assert!(reloaded.remove_custom_habit("Tahajjud").unwrap());
    assert_eq!(reloaded.active_habits().len(), DEFAULT_HABITS.len());
  }

  #[test]
  fn test_reset_clears_everything() {
    let store = store();
    let mut journal = Journal::load(Arc::clone(&store));
    journal.set_prayer(day(1), "Isha", PrayerStatus::Late).unwrap();
    journal.add_custom_habit("Tahajjud").unwrap();
    journal.reset().unwrap();

    assert!(journal.logs().is_empty());
    let reloaded = Journal::load(store);
    assert!(reloaded.logs().is_empty());
    assert!(reloaded.custom_habits().is_empty());
  }
}
