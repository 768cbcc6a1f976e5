use crate::app::{Context, Router};
use crate::cache::{BucketStats, InstallReport};
use crate::query::{Query, QueryState};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Shortcut, View};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use std::sync::Arc;
use tracing::info;

/// Offline cache buckets and their maintenance actions.
pub struct CacheView {
  router: Arc<Router>,
  stats: Query<Vec<BucketStats>>,
  install: Query<InstallReport>,
}

impl CacheView {
  pub fn new(router: Arc<Router>) -> Self {
    let for_stats = Arc::clone(&router);
    let mut stats = Query::new(move || {
      let router = Arc::clone(&for_stats);
      async move { router.stats().map_err(|e| e.to_string()) }
    });
    stats.fetch();

    let for_install = Arc::clone(&router);
    let install = Query::new(move || {
      let router = Arc::clone(&for_install);
      async move { router.install().await.map_err(|e| e.to_string()) }
    });

    Self {
      router,
      stats,
      install,
    }
  }

  fn render_buckets(&self, frame: &mut Frame, area: Rect) {
    let title = if self.stats.is_loading() {
      " Buckets (loading...) ".to_string()
    } else if let Some(e) = self.stats.error() {
      format!(" Buckets (error: {}) ", truncate(e, 40))
    } else {
      format!(" Buckets [{}] ", self.router.buckets().version())
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let rows: Vec<Row> = self
      .stats
      .data()
      .map(|stats| stats.as_slice())
      .unwrap_or(&[])
      .iter()
      .map(|s| Row::new(vec![s.name.clone(), s.entries.to_string()]))
      .collect();

    let table = Table::new(rows, [Constraint::Min(20), Constraint::Length(8)])
      .header(Row::new(vec!["Bucket", "Entries"]).style(Style::default().fg(Color::DarkGray)))
      .block(block);
    frame.render_widget(table, area);
  }

  fn render_install(&self, frame: &mut Frame, area: Rect, origin: &str) {
    let block = Block::default()
      .title(format!(" Install from {} ", origin))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines: Vec<Line> = match self.install.state() {
      QueryState::Idle => vec![Line::styled(
        "Press 'i' to seed the app shell and static assets",
        Style::default().fg(Color::DarkGray),
      )],
      QueryState::Loading => vec![Line::from("Seeding...")],
      QueryState::Error(e) => vec![Line::styled(
        format!("Install failed: {}", e),
        Style::default().fg(Color::Red),
      )],
      QueryState::Success(report) => {
        let mut lines = vec![Line::styled(
          format!("Seeded {} URLs", report.seeded.len()),
          Style::default().fg(Color::Green),
        )];
        for (url, reason) in &report.failed {
          lines.push(Line::styled(
            format!("{}: {}", truncate(url, 60), reason),
            Style::default().fg(Color::Yellow),
          ));
        }
        lines
      }
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }
}

impl View for CacheView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) {
    match key.code {
      KeyCode::Char('r') => self.stats.refetch(),
      KeyCode::Char('i') => {
        self.install.fetch();
        ctx.set_status("Installing offline cache");
      }
      KeyCode::Char('a') => match self.router.activate() {
        Ok(removed) => {
          info!(removed = removed.len(), "Activated cache version");
          ctx.set_status(format!("Removed {} stale buckets", removed.len()));
          self.stats.refetch();
        }
        Err(e) => ctx.set_error(format!("Activate failed: {}", e)),
      },
      KeyCode::Char('c') => match self.router.clear_all() {
        Ok(count) => {
          ctx.set_status(format!("Cleared {} cache buckets", count));
          self.stats.refetch();
        }
        Err(e) => ctx.set_error(format!("Clear failed: {}", e)),
      },
      _ => {}
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(10), Constraint::Min(4)])
      .split(area);
    self.render_buckets(frame, chunks[0]);
    self.render_install(frame, chunks[1], &ctx.config.cache.app_origin);
  }

  fn title(&self) -> &'static str {
    "Cache"
  }

  fn tick(&mut self, _ctx: &mut Context) {
    self.stats.poll();
    if self.install.poll() {
      self.stats.refetch();
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("i", "install"),
      Shortcut::new("a", "activate"),
      Shortcut::new("c", "clear"),
      Shortcut::new("r", "refresh"),
    ]
  }
}
