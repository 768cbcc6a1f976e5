//! One-shot subcommands over the same engines the dashboard uses.

use crate::app::Router;
use crate::assistant::Assistant;
use crate::cache::{BucketSet, HttpFetcher, RouterResponse, SqliteStorage};
use crate::config::{Config, Coordinates};
use crate::db::Database;
use crate::journal::{parse_date_key, FastingType, Journal, Mood, PrayerStatus, TRACKED_PRAYERS};
use crate::prayer::{load_settings, next_event, toggle_alarm, PrayerTimesClient, DAILY_EVENTS};
use crate::qibla::{compass_point, qibla_bearing};
use crate::store::{KeyValueStore, SqliteKvStore};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Show the next prayer and the time left until it
  Next,
  /// Show today's prayer times
  Times,
  /// Record a prayer (status: none, late, ontime, jamaah)
  Log {
    prayer: String,
    status: String,
    /// Day to record, YYYY-MM-DD (default today)
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Set pages of Quran read
  Pages {
    pages: u32,
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Set the day's fast (none, sunnah, fard, makeup)
  Fast {
    fasting: String,
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Toggle a habit, or manage the custom habit list
  Habit {
    name: String,
    /// Add as a custom habit instead of toggling
    #[arg(long, conflicts_with = "remove")]
    add: bool,
    /// Remove a custom habit
    #[arg(long)]
    remove: bool,
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Set the day's mood (grateful, happy, neutral, sad, or none)
  Mood {
    mood: String,
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Write the day's reflection
  Note {
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Score, streak and the last seven days
  Stats {
    #[arg(short, long)]
    date: Option<String>,
  },
  /// Toggle the reminder for a prayer
  Alarm { prayer: String },
  /// Delete every journal entry and custom habit
  Reset {
    #[arg(long)]
    yes: bool,
  },
  /// Direction of prayer from the configured location
  Qibla,
  /// Ask the assistant a question
  Ask {
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
  },
  /// Inspect and maintain the offline cache
  #[command(subcommand)]
  Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
  /// Show how a URL would be routed
  Classify { url: String },
  /// Route a request through the cache
  Fetch { url: String },
  /// Seed the buckets for offline use
  Install,
  /// Delete buckets from other cache versions
  Activate,
  /// Delete every cached response
  Clear,
  /// Entry counts per bucket
  Stats,
}

/// Everything a subcommand may need.
pub struct Env {
  pub config: Config,
  pub coords: Coordinates,
  pub db: Arc<Database>,
}

impl Env {
  fn store(&self) -> Arc<dyn KeyValueStore> {
    Arc::new(SqliteKvStore::new(Arc::clone(&self.db)))
  }

  fn journal(&self) -> Journal {
    Journal::load(self.store())
  }

  fn router(&self) -> Result<Router> {
    let app_url = self.config.cache.app_url()?;
    let fetcher = HttpFetcher::new(&app_url, Duration::from_secs(self.config.cache.timeout_secs))?;
    Ok(Router::new(
      SqliteStorage::new(Arc::clone(&self.db)),
      fetcher,
      BucketSet::new(&self.config.cache.version),
      app_url,
    ))
  }
}

/// Resolve `--date`, defaulting to today. Future days are rejected.
fn resolve_date(date: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
  let date = match date {
    Some(raw) => parse_date_key(raw).ok_or_else(|| eyre!("Invalid date '{}' (expected YYYY-MM-DD)", raw))?,
    None => today,
  };
  if date > today {
    return Err(eyre!("Cannot log future days ({})", date));
  }
  Ok(date)
}

pub async fn run(command: Command, env: Env) -> Result<()> {
  let today = Local::now().date_naive();

  match command {
    Command::Next => {
      let now = Local::now();
      let day = PrayerTimesClient::new(&env.config.prayer_times)?
        .load_day_times(env.coords, &now)
        .await;
      match next_event(&day.events, now.naive_local()) {
        Some(next) => println!("{} at {} ({})", next.name, next.time, next.remaining),
        None => println!("No prayer times available"),
      }
      if day.using_fallback {
        println!("(offline: approximate times)");
      }
    }
    Command::Times => {
      let now = Local::now();
      let day = PrayerTimesClient::new(&env.config.prayer_times)?
        .load_day_times(env.coords, &now)
        .await;
      let alarms = load_settings(env.store().as_ref());
      let next = next_event(&day.events, now.naive_local());

      println!("{}  |  {}", day.readable_date, day.hijri);
      for event in &day.events {
        let marker = if next.as_ref().is_some_and(|n| n.name == event.name) {
          ">"
        } else {
          " "
        };
        let bell = if alarms.get(&event.name).copied().unwrap_or(false) {
          " (alarm)"
        } else {
          ""
        };
        println!("{} {:<8} {}{}", marker, event.name, event.time, bell);
      }
      if day.using_fallback {
        println!("(offline: approximate times)");
      }
    }
    Command::Log {
      prayer,
      status,
      date,
    } => {
      let date = resolve_date(date.as_deref(), today)?;
      let status: PrayerStatus = status.parse()?;
      let mut journal = env.journal();
      journal.set_prayer(date, &prayer, status)?;
      println!(
        "{} {}: {} (score {:.0}%)",
        date,
        prayer,
        status.label(),
        journal.day_score(date)
      );
    }
    Command::Pages { pages, date } => {
      let date = resolve_date(date.as_deref(), today)?;
      env.journal().set_quran_pages(date, pages)?;
      println!("{}: {} pages", date, pages);
    }
    Command::Fast { fasting, date } => {
      let date = resolve_date(date.as_deref(), today)?;
      let fasting: FastingType = fasting.parse()?;
      env.journal().set_fasting(date, fasting)?;
      println!("{}: {}", date, fasting);
    }
    Command::Habit {
      name,
      add,
      remove,
      date,
    } => {
      let mut journal = env.journal();
      if add {
        let added = journal.add_custom_habit(&name)?;
        println!("{}", if added { "Added" } else { "Already tracked" });
      } else if remove {
        let removed = journal.remove_custom_habit(&name)?;
        println!("{}", if removed { "Removed" } else { "Not a custom habit" });
      } else {
        let date = resolve_date(date.as_deref(), today)?;
        let done = journal.toggle_habit(date, &name)?;
        println!("{} {}: {}", date, name, if done { "done" } else { "not done" });
      }
    }
    Command::Mood { mood, date } => {
      let date = resolve_date(date.as_deref(), today)?;
      let mood: Option<Mood> = match mood.trim().to_lowercase().as_str() {
        "none" | "clear" => None,
        other => Some(other.parse()?),
      };
      env.journal().set_mood(date, mood)?;
      match mood {
        Some(mood) => println!("{}: {}", date, mood),
        None => println!("{}: mood cleared", date),
      }
    }
    Command::Note { text, date } => {
      let date = resolve_date(date.as_deref(), today)?;
      env.journal().set_notes(date, &text.join(" "))?;
      println!("{}: reflection saved", date);
    }
    Command::Stats { date } => {
      let date = resolve_date(date.as_deref(), today)?;
      let journal = env.journal();
      let log = journal.log(date);

      println!(
        "{}  score {:.0}%  streak {}  ({} days logged)",
        date,
        journal.day_score(date),
        journal.streak(today),
        journal.logs().len()
      );
      for prayer in TRACKED_PRAYERS {
        println!("  {:<8} {}", prayer, log.status(prayer).label());
      }
      println!("  Quran    {} pages", log.quran_pages);
      println!("  Fasting  {}", log.fasting);
      if let Some(mood) = log.mood {
        println!("  Mood     {}", mood);
      }
      for habit in journal.active_habits() {
        let mark = if log.habit_done(&habit) { "x" } else { " " };
        println!("  [{}] {}", mark, habit);
      }
      if !log.notes.is_empty() {
        println!("  \"{}\"", log.notes);
      }

      println!();
      for day in journal.week(date) {
        let bar = "#".repeat((day.score / 10.0).round() as usize);
        println!("  {} {:<10} {:>3.0}%", day.weekday, bar, day.score);
      }
    }
    Command::Alarm { prayer } => {
      let prayer = DAILY_EVENTS
        .iter()
        .find(|e| e.eq_ignore_ascii_case(prayer.trim()))
        .ok_or_else(|| eyre!("Unknown prayer '{}' (expected one of {})", prayer, DAILY_EVENTS.join(", ")))?;
      let store = env.store();
      let mut settings = load_settings(store.as_ref());
      let armed = toggle_alarm(store.as_ref(), &mut settings, prayer)?;
      println!("Reminder for {} {}", prayer, if armed { "on" } else { "off" });
    }
    Command::Reset { yes } => {
      if !yes {
        return Err(eyre!("Refusing to delete the journal without --yes"));
      }
      env.journal().reset()?;
      println!("Journal cleared");
    }
    Command::Qibla => {
      let bearing = qibla_bearing(env.coords);
      println!("{:.1}° {}", bearing, compass_point(bearing));
    }
    Command::Ask { prompt } => {
      let assistant = Assistant::from_config(&env.config.assistant);
      let reply = assistant.reply(&prompt.join(" ")).await;
      if reply.is_error {
        eprintln!("{}", reply.content);
      } else {
        println!("{}", reply.content);
      }
    }
    Command::Cache(command) => run_cache(command, &env.router()?).await?,
  }

  Ok(())
}

async fn run_cache(command: CacheCommand, router: &Router) -> Result<()> {
  match command {
    CacheCommand::Classify { url } => {
      let url = router.resolve(&url)?;
      println!("{} -> {:?}", url, router.route(&url));
    }
    CacheCommand::Fetch { url } => {
      let url = router.resolve(&url)?;
      let outcome = router.handle(&url).await?;
      let label = match &outcome {
        RouterResponse::Served { bucket, result } => format!("[{}] {:?}", bucket, result.source),
        RouterResponse::Passthrough { reason, .. } => format!("passthrough ({:?})", reason),
        RouterResponse::Unavailable { bucket } => {
          return Err(eyre!("{} is offline and not cached in {}", url, bucket));
        }
      };
      if let Some(response) = outcome.response() {
        println!(
          "{} {}: {} ({} bytes)",
          url,
          label,
          response.status,
          response.body.len()
        );
      }
    }
    CacheCommand::Install => {
      let report = router.install().await?;
      println!("Seeded {} URLs", report.seeded.len());
      for (url, reason) in &report.failed {
        println!("  failed {}: {}", url, reason);
      }
    }
    CacheCommand::Activate => {
      let removed = router.activate()?;
      println!("Removed {} stale buckets", removed.len());
      for name in removed {
        println!("  {}", name);
      }
    }
    CacheCommand::Clear => {
      let count = router.clear_all()?;
      println!("Cleared {} cache buckets", count);
    }
    CacheCommand::Stats => {
      for stats in router.stats()? {
        println!("{:<24} {}", stats.name, stats.entries);
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(s: &str) -> NaiveDate {
    parse_date_key(s).unwrap()
  }

  #[test]
  fn test_resolve_date_defaults_to_today() {
    let today = day("2024-03-10");
    assert_eq!(resolve_date(None, today).unwrap(), today);
    assert_eq!(resolve_date(Some("2024-03-01"), today).unwrap(), day("2024-03-01"));
  }

  #[test]
  fn test_resolve_date_rejects_future_and_garbage() {
    let today = day("2024-03-10");
    assert!(resolve_date(Some("2024-03-11"), today).is_err());
    assert!(resolve_date(Some("10/03/2024"), today).is_err());
  }

  #[test]
  fn test_journal_commands_share_one_store() {
    let env = Env {
      config: Config::default(),
      coords: Coordinates::default(),
      db: Arc::new(Database::open_in_memory().unwrap()),
    };
    let today = day("2024-03-10");
    env
      .journal()
      .set_prayer(today, "Fajr", PrayerStatus::Jamaah)
      .unwrap();
    assert_eq!(env.journal().log(today).status("Fajr"), PrayerStatus::Jamaah);
  }
}
