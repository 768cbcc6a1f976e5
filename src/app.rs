use crate::assistant::Assistant;
use crate::cache::{BucketSet, CacheRouter, HttpFetcher, SqliteStorage};
use crate::commands;
use crate::config::{Config, Coordinates};
use crate::db::Database;
use crate::event::{Event, EventHandler};
use crate::journal::Journal;
use crate::prayer::{
  load_settings, AlarmSettings, AlarmWatcher, DayTimes, PrayerClock, PrayerTimesClient, Reminder,
};
use crate::query::Query;
use crate::store::{KeyValueStore, SqliteKvStore};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::View;
use crate::ui::{self, views};
use chrono::{Local, NaiveDate, NaiveDateTime};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub type Router = CacheRouter<SqliteStorage, HttpFetcher>;

/// Today's timetable, loaded in the background and refreshed when the date
/// changes, plus the reminder watcher that runs over it.
pub struct PrayerState {
  query: Query<DayTimes>,
  clock: Option<PrayerClock>,
  loaded_for: Option<NaiveDate>,
  watcher: AlarmWatcher,
  pub alarms: AlarmSettings,
}

impl PrayerState {
  pub fn new(client: PrayerTimesClient, coords: Coordinates, alarms: AlarmSettings) -> Self {
    let mut query = Query::new(move || {
      let client = client.clone();
      async move { Ok::<_, String>(client.load_day_times(coords, &Local::now()).await) }
    });
    query.fetch();

    Self {
      query,
      clock: None,
      loaded_for: None,
      watcher: AlarmWatcher::new(),
      alarms,
    }
  }

  pub fn clock(&self) -> Option<&PrayerClock> {
    self.clock.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  pub fn reload(&mut self) {
    self.query.refetch();
  }

  /// Advance to `now`: pick up a finished load, refresh at midnight,
  /// recompute the countdown. Returns reminders that just became due.
  fn tick(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
    if self.query.poll() {
      if let Some(day) = self.query.data() {
        debug!(fallback = day.using_fallback, "Prayer times ready");
        match &mut self.clock {
          Some(clock) => clock.set_day(day.clone()),
          None => self.clock = Some(PrayerClock::new(day.clone())),
        }
        self.loaded_for = Some(now.date());
      }
    }

    if self.loaded_for.is_some_and(|d| d != now.date()) && !self.query.is_loading() {
      info!("Date changed, reloading prayer times");
      self.query.refetch();
    }

    let Some(clock) = &mut self.clock else {
      return Vec::new();
    };
    clock.tick(now);
    self.watcher.check(now, &clock.day().events, &self.alarms)
  }
}

/// A line for the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
  pub text: String,
  pub is_error: bool,
}

/// State shared by all views.
pub struct Context {
  pub config: Config,
  pub coords: Coordinates,
  pub store: Arc<dyn KeyValueStore>,
  pub journal: Journal,
  pub prayers: PrayerState,
  pub cache: Arc<Router>,
  pub assistant: Arc<Assistant>,
  /// Local wall-clock time as of the last tick
  pub now: NaiveDateTime,
  status: Option<StatusMessage>,
}

impl Context {
  pub fn new(config: Config, coords: Coordinates, db: Arc<Database>) -> Result<Self> {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(Arc::clone(&db)));

    let prayer_client = PrayerTimesClient::new(&config.prayer_times)?;
    let prayers = PrayerState::new(prayer_client, coords, load_settings(store.as_ref()));

    let app_url = config.cache.app_url()?;
    let fetcher = HttpFetcher::new(&app_url, Duration::from_secs(config.cache.timeout_secs))?;
    let cache = Router::new(
      SqliteStorage::new(Arc::clone(&db)),
      fetcher,
      BucketSet::new(&config.cache.version),
      app_url,
    );
    match cache.activate() {
      Ok(deleted) if !deleted.is_empty() => info!(?deleted, "Removed outdated cache buckets"),
      Ok(_) => {}
      Err(e) => warn!(error = %e, "Failed to activate offline cache"),
    }

    Ok(Self {
      journal: Journal::load(Arc::clone(&store)),
      assistant: Arc::new(Assistant::from_config(&config.assistant)),
      cache: Arc::new(cache),
      config,
      coords,
      store,
      prayers,
      now: Local::now().naive_local(),
      status: None,
    })
  }

  pub fn today(&self) -> NaiveDate {
    self.now.date()
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  pub fn set_status(&mut self, text: impl Into<String>) {
    self.status = Some(StatusMessage {
      text: text.into(),
      is_error: false,
    });
  }

  pub fn set_error(&mut self, text: impl Into<String>) {
    self.status = Some(StatusMessage {
      text: text.into(),
      is_error: true,
    });
  }

  fn clear_status(&mut self) {
    self.status = None;
  }
}

pub struct App {
  view: Box<dyn View>,
  command: CommandInput,
  ctx: Context,
  should_quit: bool,
}

impl App {
  pub fn new(ctx: Context) -> Self {
    Self {
      view: Box::new(views::PrayersView::new()),
      command: CommandInput::new(),
      ctx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_secs(1));
    self.tick();

    let result = self.event_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  fn tick(&mut self) {
    self.ctx.now = Local::now().naive_local();
    for reminder in self.ctx.prayers.tick(self.ctx.now) {
      self.ctx.set_status(reminder.message());
    }
    self.view.tick(&mut self.ctx);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if !self.view.is_editing() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled if self.command.is_active() => return,
        KeyResult::NotHandled => {}
      }

      if key.code == KeyCode::Char('q') {
        self.should_quit = true;
        return;
      }
    }

    self.ctx.clear_status();
    self.view.handle_key(key, &mut self.ctx);
  }

  fn execute_command(&mut self, cmd: &str) {
    let view: Box<dyn View> = match cmd {
      "prayers" => Box::new(views::PrayersView::new()),
      "journal" => Box::new(views::JournalView::new(self.ctx.today())),
      "qibla" => Box::new(views::QiblaView::new(self.ctx.coords)),
      "cache" => Box::new(views::CacheView::new(Arc::clone(&self.ctx.cache))),
      "ask" => Box::new(views::AssistantView::new(Arc::clone(&self.ctx.assistant))),
      "quit" => {
        self.should_quit = true;
        return;
      }
      other => {
        let known: Vec<&str> = commands::COMMANDS.iter().map(|c| c.name).collect();
        self.ctx.set_error(format!(
          "Unknown command '{}' (try {})",
          other,
          known.join(", ")
        ));
        return;
      }
    };
    debug!(view = view.title(), "Switching view");
    self.view = view;
  }

  /// Split borrows for rendering.
  pub fn parts(&mut self) -> (&mut Box<dyn View>, &Context, &CommandInput) {
    (&mut self.view, &self.ctx, &self.command)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bucket_count(db: &Database, name: &str) -> i64 {
    db.conn()
      .unwrap()
      .query_row(
        "SELECT COUNT(*) FROM cache_buckets WHERE name = ?",
        [name],
        |row| row.get(0),
      )
      .unwrap()
  }

  #[tokio::test]
  async fn test_startup_drops_buckets_from_other_versions() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.conn()
      .unwrap()
      .execute("INSERT INTO cache_buckets (name) VALUES ('fonts-v1.3')", [])
      .unwrap();

    let ctx = Context::new(Config::default(), Coordinates::default(), Arc::clone(&db)).unwrap();

    assert_eq!(bucket_count(&db, "fonts-v1.3"), 0);
    assert_eq!(bucket_count(&db, "fonts-v1.4"), 1);
    assert_eq!(ctx.cache.buckets().version(), "v1.4");
  }
}
