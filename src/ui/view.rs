use crate::app::Context;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// A full-screen dashboard view.
///
/// Views own their selection and input state. Shared state (journal, prayer
/// clock, cache, clock time) lives in the `Context` the app passes in.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context);

  fn render(&mut self, frame: &mut Frame, area: Rect, ctx: &Context);

  fn title(&self) -> &'static str;

  /// Called once per tick, after the shared state has advanced.
  fn tick(&mut self, _ctx: &mut Context) {}

  /// True while the view is capturing text, so global keys pass through to it.
  fn is_editing(&self) -> bool {
    false
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "command"), Shortcut::new("q", "quit")]
  }
}

/// Move a list selection by `delta`, wrapping at both ends.
pub fn step_selection(selected: usize, len: usize, delta: i32) -> usize {
  if len == 0 {
    return 0;
  }
  (selected as i64 + delta as i64).rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_step_selection_wraps() {
    assert_eq!(step_selection(0, 5, -1), 4);
    assert_eq!(step_selection(4, 5, 1), 0);
    assert_eq!(step_selection(2, 5, 1), 3);
    assert_eq!(step_selection(3, 0, 1), 0);
  }
}
