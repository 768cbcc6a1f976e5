use crate::app::Context;
use crate::assistant::{Assistant, ChatMessage, Role};
use crate::query::Query;
use crate::ui::components::{input_line, InputResult, TextInput};
use crate::ui::view::{Shortcut, View};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::sync::Arc;

const GREETING: &str =
  "Assalamu Alaikum! I'm here to answer questions about Islam. What would you like to know?";

/// Chat with the assistant. One request in flight at a time.
pub struct AssistantView {
  assistant: Arc<Assistant>,
  messages: Vec<ChatMessage>,
  input: TextInput,
  editing: bool,
  pending: Option<Query<ChatMessage>>,
  scroll: u16,
}

impl AssistantView {
  pub fn new(assistant: Arc<Assistant>) -> Self {
    Self {
      assistant,
      messages: Vec::new(),
      input: TextInput::new(),
      editing: true,
      pending: None,
      scroll: 0,
    }
  }

  fn send(&mut self, prompt: String) {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() || self.pending.is_some() {
      return;
    }
    self.messages.push(ChatMessage::user(&prompt));

    let assistant = Arc::clone(&self.assistant);
    let mut query = Query::new(move || {
      let assistant = Arc::clone(&assistant);
      let prompt = prompt.clone();
      async move { Ok::<_, String>(assistant.reply(&prompt).await) }
    });
    query.fetch();
    self.pending = Some(query);
    self.scroll = 0;
  }

  fn transcript(&self) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if self.messages.is_empty() {
      lines.push(Line::styled(GREETING, Style::default().fg(Color::Cyan)));
    }
    for message in &self.messages {
      let (who, color) = match (message.role, message.is_error) {
        (Role::User, _) => ("You", Color::Green),
        (Role::Model, true) => ("Assistant", Color::Red),
        (Role::Model, false) => ("Assistant", Color::Cyan),
      };
      lines.push(Line::from(vec![
        Span::styled(who, Style::default().fg(color).bold()),
        Span::styled(
          format!("  {}", message.timestamp.format("%H:%M")),
          Style::default().fg(Color::DarkGray),
        ),
      ]));
      for text in message.content.lines() {
        lines.push(Line::from(text.to_string()));
      }
      lines.push(Line::default());
    }
    if self.pending.is_some() {
      lines.push(Line::styled("Thinking...", Style::default().fg(Color::DarkGray)));
    }
    lines
  }
}

/// Rows the lines take when wrapped at `width` columns (approximate for
/// wide glyphs).
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
  let width = usize::from(width.max(1));
  let rows: usize = lines
    .iter()
    .map(|line| line.width().div_ceil(width).max(1))
    .sum();
  u16::try_from(rows).unwrap_or(u16::MAX)
}

impl View for AssistantView {
  fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) {
    if self.editing {
      match self.input.handle_key(key) {
        InputResult::Submitted(value) => {
          self.send(value);
          self.input.clear();
        }
        InputResult::Cancelled => self.editing = false,
        InputResult::Consumed | InputResult::NotHandled => {}
      }
      return;
    }

    match key.code {
      KeyCode::Char('i') | KeyCode::Enter => self.editing = true,
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
      _ => {}
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, _ctx: &Context) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(3)])
      .split(area);

    let block = Block::default()
      .title(" Ask ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let lines = self.transcript();

    // Scroll is counted up from the bottom.
    let inner_height = chunks[0].height.saturating_sub(2);
    let total = wrapped_height(&lines, chunks[0].width.saturating_sub(2));
    let offset = total
      .saturating_sub(inner_height)
      .saturating_sub(self.scroll);
    let transcript = Paragraph::new(lines)
      .wrap(Wrap { trim: false })
      .block(block)
      .scroll((offset, 0));
    frame.render_widget(transcript, chunks[0]);

    let border = if self.editing { Color::Yellow } else { Color::DarkGray };
    let input_block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(" Question ");
    let line = if self.editing {
      input_line("> ", &self.input)
    } else {
      Line::styled("Press 'i' to type a question", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(line).block(input_block), chunks[1]);
  }

  fn title(&self) -> &'static str {
    "Ask"
  }

  fn tick(&mut self, _ctx: &mut Context) {
    let Some(query) = &mut self.pending else {
      return;
    };
    if query.poll() {
      if let Some(reply) = query.data() {
        self.messages.push(reply.clone());
      }
      self.pending = None;
    }
  }

  fn is_editing(&self) -> bool {
    self.editing
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.editing {
      vec![Shortcut::new("Enter", "send"), Shortcut::new("Esc", "stop typing")]
    } else {
      vec![Shortcut::new("i", "type"), Shortcut::new("j/k", "scroll")]
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wrapped_height_counts_empty_lines() {
    let lines = vec![Line::from("abcdef"), Line::default(), Line::from("ab")];
    assert_eq!(wrapped_height(&lines, 4), 4);
    assert_eq!(wrapped_height(&lines, 10), 3);
  }

  #[test]
  fn test_empty_prompt_is_not_sent() {
    let mut view = AssistantView::new(Arc::new(Assistant::new(None)));
    view.send("   ".to_string());
    assert!(view.messages.is_empty());
    assert!(view.pending.is_none());
  }

  #[tokio::test]
  async fn test_send_records_user_message() {
    let mut view = AssistantView::new(Arc::new(Assistant::new(None)));
    view.send(" What is Zakat? ".to_string());
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].content, "What is Zakat?");
    assert!(view.pending.is_some());

    view.send("second".to_string());
    assert_eq!(view.messages.len(), 1);
  }
}
