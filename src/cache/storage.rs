//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

use super::traits::CachedResponse;
use crate::db::Database;

/// A single cached response.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The stored response
  pub response: CachedResponse,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Buckets are addressed by their full versioned name. Writes are
/// last-writer-wins; there is no per-entry expiry.
pub trait CacheStorage: Send + Sync {
  /// Create the bucket if it does not exist yet.
  fn open_bucket(&self, bucket: &str) -> Result<()>;

  /// Look up an entry. Missing buckets are simply misses.
  fn get(&self, bucket: &str, key: &str) -> Result<Option<CachedEntry>>;

  /// Insert or overwrite an entry, creating the bucket as needed.
  fn put(&self, bucket: &str, key: &str, response: &CachedResponse) -> Result<()>;

  /// Names of every bucket currently in storage.
  fn bucket_names(&self) -> Result<Vec<String>>;

  /// Drop a bucket and all of its entries.
  fn delete_bucket(&self, bucket: &str) -> Result<()>;

  /// Number of entries in a bucket.
  fn entry_count(&self, bucket: &str) -> Result<usize>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  db: Arc<Database>,
}

impl SqliteStorage {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }
}

impl CacheStorage for SqliteStorage {
  fn open_bucket(&self, bucket: &str) -> Result<()> {
    let conn = self.db.conn()?;
    conn
      .execute(
        "INSERT OR IGNORE INTO cache_buckets (name) VALUES (?)",
        params![bucket],
      )
      .map_err(|e| eyre!("Failed to open bucket {}: {}", bucket, e))?;
    Ok(())
  }

  fn get(&self, bucket: &str, key: &str) -> Result<Option<CachedEntry>> {
    let conn = self.db.conn()?;

    let mut stmt = conn
      .prepare(
        "SELECT status, content_type, body, body_sha256, cached_at FROM cache_entries
         WHERE bucket = ? AND request_key = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(u16, Option<String>, Vec<u8>, String, String)> = stmt
      .query_row(params![bucket, key], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
      })
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry: {}", e))?;

    let Some((status, content_type, body, digest, cached_at_str)) = row else {
      return Ok(None);
    };

    if body_digest(&body) != digest {
      warn!(bucket, key, "Cached body failed digest check, treating as miss");
      return Ok(None);
    }

    Ok(Some(CachedEntry {
      response: CachedResponse::new(status, content_type, body),
      cached_at: parse_datetime(&cached_at_str)?,
    }))
  }

  fn put(&self, bucket: &str, key: &str, response: &CachedResponse) -> Result<()> {
    let conn = self.db.conn()?;

    conn
      .execute(
        "INSERT OR IGNORE INTO cache_buckets (name) VALUES (?)",
        params![bucket],
      )
      .map_err(|e| eyre!("Failed to open bucket {}: {}", bucket, e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO cache_entries
           (bucket, request_key, status, content_type, body, body_sha256, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, datetime('now'))",
        params![
          bucket,
          key,
          response.status,
          response.content_type,
          response.body,
          body_digest(&response.body)
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }

  fn bucket_names(&self) -> Result<Vec<String>> {
    let conn = self.db.conn()?;

    let mut stmt = conn
      .prepare("SELECT name FROM cache_buckets ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list buckets: {}", e))?
      .collect::<std::result::Result<Vec<String>, _>>()
      .map_err(|e| eyre!("Failed to read bucket name: {}", e))?;

    Ok(names)
  }

  fn delete_bucket(&self, bucket: &str) -> Result<()> {
    let mut conn = self.db.conn()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    tx.execute("DELETE FROM cache_entries WHERE bucket = ?", params![bucket])
      .map_err(|e| eyre!("Failed to delete entries of {}: {}", bucket, e))?;
    tx.execute("DELETE FROM cache_buckets WHERE name = ?", params![bucket])
      .map_err(|e| eyre!("Failed to delete bucket {}: {}", bucket, e))?;
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn entry_count(&self, bucket: &str) -> Result<usize> {
    let conn = self.db.conn()?;
    let count: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM cache_entries WHERE bucket = ?",
        params![bucket],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to count entries: {}", e))?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

/// Hex SHA-256 of a response body.
pub fn body_digest(body: &[u8]) -> String {
  hex::encode(Sha256::digest(body))
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
