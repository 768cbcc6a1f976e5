use crate::journal::PrayerStatus;
use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, ending in "..." if shortened
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn status_color(status: PrayerStatus) -> Color {
  match status {
    PrayerStatus::Jamaah => Color::Magenta,
    PrayerStatus::OnTime => Color::Green,
    PrayerStatus::Late => Color::Yellow,
    PrayerStatus::None => Color::DarkGray,
  }
}

pub fn score_color(score: f64) -> Color {
  if score >= 80.0 {
    Color::Green
  } else if score >= 50.0 {
    Color::Yellow
  } else if score > 0.0 {
    Color::Red
  } else {
    Color::DarkGray
  }
}
