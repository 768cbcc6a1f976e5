use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The coordinates used when nothing else is configured (New Delhi).
pub const DEFAULT_LATITUDE: f64 = 28.6139;
pub const DEFAULT_LONGITUDE: f64 = 77.2090;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub location: Coordinates,
  #[serde(default)]
  pub prayer_times: PrayerTimesConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub assistant: AssistantConfig,
}

/// A point on the earth, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
  pub latitude: f64,
  pub longitude: f64,
}

impl Default for Coordinates {
  fn default() -> Self {
    Self {
      latitude: DEFAULT_LATITUDE,
      longitude: DEFAULT_LONGITUDE,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrayerTimesConfig {
  pub base_url: String,
  /// Calculation method id understood by the timings service
  pub method: u8,
  /// Requests slower than this fall back to the built-in table
  pub timeout_secs: u64,
}

impl Default for PrayerTimesConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.aladhan.com/v1".to_string(),
      method: 2,
      timeout_secs: 5,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Bumping this invalidates every bucket on the next activation
  pub version: String,
  /// Origin the app shell is served from
  pub app_origin: String,
  pub timeout_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      version: "v1.4".to_string(),
      app_origin: "http://localhost:3000".to_string(),
      timeout_secs: 15,
    }
  }
}

impl CacheConfig {
  pub fn app_url(&self) -> Result<Url> {
    Url::parse(&self.app_origin)
      .map_err(|e| eyre!("Invalid cache.app_origin {}: {}", self.app_origin, e))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
  pub base_url: String,
  pub model: String,
}

impl Default for AssistantConfig {
  fn default() -> Self {
    Self {
      base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
      model: "gemini-2.5-flash".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./nuswally.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/nuswally/config.yaml
  ///
  /// Without any file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("nuswally.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("nuswally").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Get the assistant API key from environment variables.
  ///
  /// Checks NUSWALLY_AI_KEY first, then GEMINI_API_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("NUSWALLY_AI_KEY")
      .or_else(|_| std::env::var("GEMINI_API_KEY"))
      .map_err(|_| {
        eyre!("Assistant API key not found. Set NUSWALLY_AI_KEY or GEMINI_API_KEY environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.location, Coordinates::default());
    assert_eq!(config.prayer_times.method, 2);
    assert_eq!(config.cache.version, "v1.4");
  }

  #[test]
  fn test_partial_sections_fill_in_defaults() {
    let yaml = r#"
location:
  latitude: 51.5074
  longitude: -0.1278
cache:
  version: v2.0
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.location.latitude, 51.5074);
    assert_eq!(config.cache.version, "v2.0");
    assert_eq!(config.cache.app_origin, "http://localhost:3000");
    assert_eq!(config.prayer_times.timeout_secs, 5);
    assert_eq!(config.assistant.model, "gemini-2.5-flash");
  }

  #[test]
  fn test_invalid_yaml_is_an_error() {
    assert!(Config::parse("location: [1, 2").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let result = Config::load(Some(Path::new("/nonexistent/nuswally.yaml")));
    assert!(result.is_err());
  }

  #[test]
  fn test_app_url() {
    let config = CacheConfig::default();
    assert_eq!(config.app_url().unwrap().as_str(), "http://localhost:3000/");
  }
}
