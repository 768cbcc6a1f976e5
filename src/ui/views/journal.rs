use crate::app::Context;
use crate::journal::{FastingType, Mood, TRACKED_PRAYERS};
use crate::ui::components::{draw_prompt, InputResult, TextInput};
use crate::ui::renderfns::{score_color, status_color, truncate};
use crate::ui::view::{step_selection, Shortcut, View};
use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditTarget {
  Notes,
  NewHabit,
}

impl EditTarget {
  fn title(self) -> &'static str {
    match self {
      EditTarget::Notes => "Reflection",
      EditTarget::NewHabit => "New habit",
    }
  }
}

/// A selectable row: a prayer or a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
  Prayer(&'static str),
  Habit(String),
}

/// Daily worship journal: prayers, habits, Quran, fasting and mood for one day.
pub struct JournalView {
  date: NaiveDate,
  list_state: ListState,
  editing: Option<(EditTarget, TextInput)>,
}

impl JournalView {
  pub fn new(date: NaiveDate) -> Self {
    Self {
      date,
      list_state: ListState::default().with_selected(Some(0)),
      editing: None,
    }
  }

  fn entries(ctx: &Context) -> Vec<Entry> {
    TRACKED_PRAYERS
      .iter()
      .map(|p| Entry::Prayer(*p))
      .chain(ctx.journal.active_habits().into_iter().map(Entry::Habit))
      .collect()
  }

  fn selected_entry(&self, ctx: &Context) -> Option<Entry> {
    let idx = self.list_state.selected()?;
    Self::entries(ctx).into_iter().nth(idx)
  }

  fn handle_edit_key(&mut self, key: KeyEvent, ctx: &mut Context) {
    let Some((target, input)) = &mut self.editing else {
      return;
    };
    let target = *target;
    match input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.editing = None;
        let result = match target {
          EditTarget::Notes => ctx
            .journal
            .set_notes(self.date, value.trim())
            .map(|_| "Reflection saved".to_string()),
          EditTarget::NewHabit => ctx.journal.add_custom_habit(&value).map(|added| {
            if added {
              format!("Added habit '{}'", value.trim())
            } else {
              "Habit not added".to_string()
            }
          }),
        };
        report(ctx, result);
      }
      InputResult::Cancelled => self.editing = None,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  fn activate(&mut self, ctx: &mut Context) {
    let result = match self.selected_entry(ctx) {
      Some(Entry::Prayer(prayer)) => ctx
        .journal
        .cycle_prayer(self.date, prayer)
        .map(|status| format!("{}: {}", prayer, status.label())),
      Some(Entry::Habit(habit)) => ctx
        .journal
        .toggle_habit(self.date, &habit)
        .map(|done| format!("{}: {}", habit, if done { "done" } else { "not done" })),
      None => return,
    };
    report(ctx, result);
  }

  fn delete_habit(&mut self, ctx: &mut Context) {
    let Some(Entry::Habit(habit)) = self.selected_entry(ctx) else {
      return;
    };
    if !ctx.journal.custom_habits().contains(&habit) {
      ctx.set_error(format!("'{}' is a default habit", habit));
      return;
    }
    let result = ctx
      .journal
      .remove_custom_habit(&habit)
      .map(|_| format!("Removed habit '{}'", habit));
    report(ctx, result);
  }

  fn change_day(&mut self, delta: i64, ctx: &mut Context) {
    let Some(date) = self.date.checked_add_signed(chrono::TimeDelta::days(delta)) else {
      return;
    };
    if date > ctx.today() {
      ctx.set_error("Cannot log future days");
      return;
    }
    self.date = date;
  }

  fn render_day(&mut self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let log = ctx.journal.log(self.date);
    let score = ctx.journal.day_score(self.date);
    let title = if self.date == ctx.today() {
      format!(" Today, {} ", self.date.format("%a %-d %b"))
    } else {
      format!(" {} ", self.date.format("%a %-d %b %Y"))
    };

    let block = Block::default()
      .title(title)
      .title_bottom(Line::styled(
        format!(" {:.0}% ", score),
        Style::default().fg(score_color(score)).bold(),
      ))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let items: Vec<ListItem> = Self::entries(ctx)
      .into_iter()
      .map(|entry| match entry {
        Entry::Prayer(prayer) => {
          let status = log.status(prayer);
          ListItem::new(Line::from(vec![
            Span::raw(format!("{:<10}", prayer)),
            Span::styled(status.label(), Style::default().fg(status_color(status))),
          ]))
        }
        Entry::Habit(habit) => {
          let done = log.habit_done(&habit);
          let mark = if done { "[x] " } else { "[ ] " };
          let color = if done { Color::Green } else { Color::DarkGray };
          ListItem::new(Line::from(vec![
            Span::styled(mark, Style::default().fg(color)),
            Span::raw(truncate(&habit, 30)),
          ]))
        }
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_details(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let log = ctx.journal.log(self.date);
    let mood = log.mood.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());
    let streak = ctx.journal.streak(ctx.today());

    let mut lines = vec![
      Line::from(vec![
        Span::raw("Streak   "),
        Span::styled(
          format!("{} day{}", streak, if streak == 1 { "" } else { "s" }),
          Style::default().fg(Color::Yellow).bold(),
        ),
      ]),
      Line::from(format!("Quran    {} pages", log.quran_pages)),
      Line::from(format!("Fasting  {}", log.fasting)),
      Line::from(format!("Mood     {}", mood)),
      Line::default(),
    ];
    if log.notes.is_empty() {
      lines.push(Line::styled("No reflection yet", Style::default().fg(Color::DarkGray)));
    } else {
      lines.push(Line::from(log.notes.clone()));
    }

    let block = Block::default()
      .title(" Details ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(
      Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
      area,
    );
  }

  fn render_week(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let bars: Vec<Bar> = ctx
      .journal
      .week(self.date)
      .into_iter()
      .map(|day| {
        let style = if day.is_end {
          Style::default().fg(Color::Yellow)
        } else {
          Style::default().fg(score_color(day.score))
        };
        Bar::default()
          .value(day.score.round() as u64)
          .label(Line::from(day.weekday))
          .style(style)
      })
      .collect();

    let chart = BarChart::default()
      .block(
        Block::default()
          .title(" Week ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      )
      .data(BarGroup::default().bars(&bars))
      .bar_width(4)
      .bar_gap(1)
      .max(100);
    frame.render_widget(chart, area);
  }
}

/// Show the outcome of a journal write in the status bar.
fn report(ctx: &mut Context, result: Result<String>) {
  match result {
    Ok(message) => ctx.set_status(message),
    Err(e) => {
      warn!(error = %e, "Journal update failed");
      ctx.set_error(e.to_string());
    }
  }
}

fn next_fasting(current: FastingType) -> FastingType {
  match current {
    FastingType::None => FastingType::Sunnah,
    FastingType::Sunnah => FastingType::Fard,
    FastingType::Fard => FastingType::Makeup,
    FastingType::Makeup => FastingType::None,
  }
}

fn next_mood(current: Option<Mood>) -> Option<Mood> {
  match current {
    None => Some(Mood::Grateful),
    Some(Mood::Grateful) => Some(Mood::Happy),
    Some(Mood::Happy) => Some(Mood::Neutral),
    Some(Mood::Neutral) => Some(Mood::Sad),
    Some(Mood::Sad) => None,
  }
}

impl View for JournalView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) {
    if self.editing.is_some() {
      self.handle_edit_key(key, ctx);
      return;
    }

    let len = Self::entries(ctx).len();
    let selected = self.list_state.selected().unwrap_or(0);
    let log = ctx.journal.log(self.date);

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select(Some(step_selection(selected, len, 1)));
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select(Some(step_selection(selected, len, -1)));
      }
      KeyCode::Char(' ') | KeyCode::Enter => self.activate(ctx),
      KeyCode::Char('h') | KeyCode::Left => self.change_day(-1, ctx),
      KeyCode::Char('l') | KeyCode::Right => self.change_day(1, ctx),
      KeyCode::Char('t') => self.date = ctx.today(),
      KeyCode::Char('+') | KeyCode::Char('=') => {
        let result = ctx
          .journal
          .set_quran_pages(self.date, log.quran_pages + 1)
          .map(|_| format!("Quran: {} pages", log.quran_pages + 1));
        report(ctx, result);
      }
      KeyCode::Char('-') => {
        let pages = log.quran_pages.saturating_sub(1);
        let result = ctx
          .journal
          .set_quran_pages(self.date, pages)
          .map(|_| format!("Quran: {} pages", pages));
        report(ctx, result);
      }
      KeyCode::Char('f') => {
        let fasting = next_fasting(log.fasting);
        let result = ctx
          .journal
          .set_fasting(self.date, fasting)
          .map(|_| format!("Fasting: {}", fasting));
        report(ctx, result);
      }
      KeyCode::Char('m') => {
        let mood = next_mood(log.mood);
        let label = mood.map(|m| m.to_string()).unwrap_or_else(|| "cleared".to_string());
        let result = ctx
          .journal
          .set_mood(self.date, mood)
          .map(|_| format!("Mood: {}", label));
        report(ctx, result);
      }
      KeyCode::Char('n') => {
        self.editing = Some((EditTarget::Notes, TextInput::with_value(&log.notes)));
      }
      KeyCode::Char('a') => {
        self.editing = Some((EditTarget::NewHabit, TextInput::new()));
      }
      KeyCode::Char('d') => self.delete_habit(ctx),
      _ => {}
    }

    let len = Self::entries(ctx).len();
    if selected >= len {
      self.list_state.select(Some(len.saturating_sub(1)));
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &Context) {
    let columns = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
      .split(area);
    let right = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(8), Constraint::Length(10)])
      .split(columns[1]);

    self.render_day(frame, columns[0], ctx);
    self.render_details(frame, right[0], ctx);
    self.render_week(frame, right[1], ctx);

    if let Some((target, input)) = &self.editing {
      draw_prompt(frame, area, target.title(), input);
    }
  }

  fn title(&self) -> &'static str {
    "Journal"
  }

  fn is_editing(&self) -> bool {
    self.editing.is_some()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.editing.is_some() {
      return vec![Shortcut::new("Enter", "save"), Shortcut::new("Esc", "cancel")];
    }
    vec![
      Shortcut::new("space", "mark"),
      Shortcut::new("h/l", "day"),
      Shortcut::new("+/-", "pages"),
      Shortcut::new("f", "fast"),
      Shortcut::new("m", "mood"),
      Shortcut::new("n", "note"),
      Shortcut::new("a/d", "habit"),
    ]
  }
}
