use crate::app::Context;
use crate::ui::view::Shortcut;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Header bar: app name, dates, next prayer, and the view's shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, ctx: &Context, shortcuts: &[Shortcut]) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" nuswally ", Style::default().fg(Color::Cyan).bold()),
    separator(),
  ];

  match ctx.prayers.clock() {
    Some(clock) => {
      let day = clock.day();
      spans.push(Span::styled(
        format!(" {} ", day.hijri),
        Style::default().fg(Color::White),
      ));
      spans.push(separator());
      if let Some(next) = clock.next() {
        spans.push(Span::styled(
          format!(" {} {} ", next.name, next.remaining),
          Style::default().fg(Color::Yellow).bold(),
        ));
      }
      if day.using_fallback {
        spans.push(Span::styled("(offline) ", Style::default().fg(Color::Red)));
      }
    }
    None => spans.push(Span::styled(
      " loading prayer times... ",
      Style::default().fg(Color::DarkGray),
    )),
  }

  spans.push(Span::raw(" "));
  for shortcut in shortcuts {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}   ", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
