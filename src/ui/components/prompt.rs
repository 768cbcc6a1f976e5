use super::input::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// The input's text with the cursor drawn as a reversed cell.
pub fn input_line(prefix: &str, input: &TextInput) -> Line<'static> {
  let value = input.value();
  let split = value
    .char_indices()
    .nth(input.cursor_position())
    .map(|(i, _)| i)
    .unwrap_or(value.len());
  let (before, after) = value.split_at(split);
  let mut rest = after.chars();
  let under_cursor = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());

  Line::from(vec![
    Span::styled(prefix.to_string(), Style::default().fg(Color::Yellow)),
    Span::raw(before.to_string()),
    Span::styled(under_cursor, Style::default().add_modifier(Modifier::REVERSED)),
    Span::raw(rest.collect::<String>()),
  ])
}

/// One-line input box anchored at the bottom of `area`.
pub fn draw_prompt(frame: &mut Frame, area: Rect, title: &str, input: &TextInput) {
  if area.height < 3 {
    return;
  }
  let prompt_area = Rect::new(area.x, area.y + area.height - 3, area.width, 3);
  frame.render_widget(Clear, prompt_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(format!(" {} ", title));
  frame.render_widget(Paragraph::new(input_line("> ", input)).block(block), prompt_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cursor_splits_multibyte_text() {
    let input = TextInput::with_value("دعاء");
    let line = input_line("> ", &input);
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    assert_eq!(text, "> دعاء ");
  }
}
