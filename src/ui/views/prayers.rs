use crate::app::Context;
use crate::prayer::toggle_alarm;
use crate::ui::view::{step_selection, Shortcut, View};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use tracing::warn;

/// Today's timetable with the countdown to the next prayer.
pub struct PrayersView {
  table_state: TableState,
}

impl PrayersView {
  pub fn new() -> Self {
    Self {
      table_state: TableState::default().with_selected(Some(0)),
    }
  }

  fn selected_name(&self, ctx: &Context) -> Option<String> {
    let clock = ctx.prayers.clock()?;
    let idx = self.table_state.selected()?;
    clock.day().events.get(idx).map(|e| e.name.clone())
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let block = Block::default()
      .title(" Today ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(clock) = ctx.prayers.clock() else {
      let paragraph = Paragraph::new("Loading prayer times...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let day = clock.day();
    let mut lines = vec![
      Line::from(vec![
        Span::styled(day.readable_date.clone(), Style::default().fg(Color::White).bold()),
        Span::raw("  "),
        Span::styled(day.hijri.to_string(), Style::default().fg(Color::Cyan)),
      ]),
      Line::default(),
    ];

    match clock.next() {
      Some(next) => lines.push(Line::from(vec![
        Span::raw("Next: "),
        Span::styled(
          format!("{} at {}", next.name, next.time),
          Style::default().fg(Color::Yellow).bold(),
        ),
        Span::raw("  "),
        Span::styled(next.remaining.to_string(), Style::default().fg(Color::Yellow)),
      ])),
      None => lines.push(Line::from("No prayer times for today")),
    }

    if day.using_fallback {
      lines.push(Line::styled(
        "Offline: showing approximate times",
        Style::default().fg(Color::Red),
      ));
    } else if ctx.prayers.is_loading() {
      lines.push(Line::styled("Refreshing...", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let block = Block::default()
      .title(" Prayer Times ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(clock) = ctx.prayers.clock() else {
      frame.render_widget(block, area);
      return;
    };

    let next_name = clock.next().map(|n| n.name.as_str());
    let rows: Vec<Row> = clock
      .day()
      .events
      .iter()
      .map(|event| {
        let armed = ctx.prayers.alarms.get(&event.name).copied().unwrap_or(false);
        let style = if Some(event.name.as_str()) == next_name {
          Style::default().fg(Color::Yellow).bold()
        } else {
          Style::default()
        };
        Row::new(vec![
          event.name.clone(),
          event.time.clone(),
          if armed { "🔔".to_string() } else { String::new() },
        ])
        .style(style)
      })
      .collect();

    let table = Table::new(
      rows,
      [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(4),
      ],
    )
    .header(Row::new(vec!["Prayer", "Time", "Alarm"]).style(Style::default().fg(Color::DarkGray)))
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for PrayersView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) {
    let len = ctx
      .prayers
      .clock()
      .map(|c| c.day().events.len())
      .unwrap_or(0);
    let selected = self.table_state.selected().unwrap_or(0);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select(Some(step_selection(selected, len, 1)));
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select(Some(step_selection(selected, len, -1)));
      }
      KeyCode::Char('a') | KeyCode::Enter => {
        let Some(name) = self.selected_name(ctx) else {
          return;
        };
        match toggle_alarm(ctx.store.as_ref(), &mut ctx.prayers.alarms, &name) {
          Ok(true) => ctx.set_status(format!("Reminder set for {}", name)),
          Ok(false) => ctx.set_status(format!("Reminder off for {}", name)),
          Err(e) => {
            warn!(error = %e, "Failed to save alarm");
            ctx.set_error(format!("Failed to save alarm: {}", e));
          }
        }
      }
      KeyCode::Char('r') => {
        ctx.prayers.reload();
        ctx.set_status("Reloading prayer times");
      }
      _ => {}
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(6), Constraint::Min(5)])
      .split(area);

    self.render_summary(frame, chunks[0], ctx);
    self.render_table(frame, chunks[1], ctx);
  }

  fn title(&self) -> &'static str {
    "Prayers"
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("a", "alarm"),
      Shortcut::new("r", "reload"),
      Shortcut::new(":", "command"),
    ]
  }
}
