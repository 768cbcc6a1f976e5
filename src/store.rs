//! Opaque key -> JSON blob store for user state.
//!
//! Values are written whole on every change. Reads never fail on bad data:
//! a value that does not parse is logged and treated as absent.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::db::Database;

/// Journal logs, current format (date key -> DailyLog)
pub const IBADAH_LOGS: &str = "ibadah_logs_v2";
/// Journal logs written by the boolean-only first version
pub const IBADAH_LOGS_LEGACY: &str = "ibadah_logs";
/// Tracker configuration (custom habits)
pub const IBADAH_CONFIG: &str = "ibadah_config";
/// Prayer name -> notification armed
pub const PRAYER_ALARMS: &str = "prayer_alarms";

/// Trait for key/value storage backends.
pub trait KeyValueStore: Send + Sync {
  /// Get the raw value for a key.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Replace the value for a key.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove a key. Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// Read and parse a JSON value. Absent, unreadable and corrupt values all yield `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
  let raw = match store.get(key) {
    Ok(Some(raw)) => raw,
    Ok(None) => return None,
    Err(e) => {
      warn!(key, error = %e, "Failed to read stored value");
      return None;
    }
  };

  match serde_json::from_str(&raw) {
    Ok(value) => Some(value),
    Err(e) => {
      warn!(key, error = %e, "Ignoring malformed stored value");
      None
    }
  }
}

/// Serialize and store a JSON value.
pub fn write_json<T: Serialize + ?Sized>(
  store: &dyn KeyValueStore,
  key: &str,
  value: &T,
) -> Result<()> {
  let raw =
    serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize {}: {}", key, e))?;
  store.set(key, &raw)
}

/// SQLite-backed store sharing the application database.
pub struct SqliteKvStore {
  db: Arc<Database>,
}

impl SqliteKvStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }
}

impl KeyValueStore for SqliteKvStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.db.conn()?;
    conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read {}: {}", key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write {}: {}", key, e))?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove {}: {}", key, e))?;
    Ok(())
  }
}

#[cfg(test)]
pub(crate) fn memory_store() -> SqliteKvStore {
  SqliteKvStore::new(Arc::new(
    Database::open_in_memory().expect("in-memory database"),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  #[test]
  fn test_set_get_remove() {
    let store = memory_store();
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "1").unwrap();
    store.set("k", "2").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));

    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
  }

  #[test]
  fn test_read_json_roundtrip() {
    let store = memory_store();
    let mut alarms = BTreeMap::new();
    alarms.insert("Fajr".to_string(), true);
    write_json(&store, PRAYER_ALARMS, &alarms).unwrap();

    let loaded: Option<BTreeMap<String, bool>> = read_json(&store, PRAYER_ALARMS);
    assert_eq!(loaded, Some(alarms));
  }

  #[test]
  fn test_read_json_corrupt_is_absent() {
    let store = memory_store();
    store.set(PRAYER_ALARMS, "{not json").unwrap();

    let loaded: Option<BTreeMap<String, bool>> = read_json(&store, PRAYER_ALARMS);
    assert_eq!(loaded, None);
  }
}
