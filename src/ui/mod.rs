pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // View
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let (view, ctx, command) = app.parts();

  renderfns::draw_header(frame, chunks[0], ctx, &view.shortcuts());
  view.render(frame, chunks[1], ctx);
  command.render_overlay(frame, chunks[1]);

  let (content, style) = match ctx.status() {
    Some(status) if status.is_error => (
      format!(" {}", status.text),
      Style::default().fg(Color::Red),
    ),
    Some(status) => (
      format!(" {}", status.text),
      Style::default().fg(Color::Green),
    ),
    None => (
      format!(" {}  │  :command  q:quit  Ctrl-C:quit", view.title()),
      Style::default().fg(Color::DarkGray),
    ),
  };
  frame.render_widget(Paragraph::new(content).style(style), chunks[2]);
}
