use crate::app::Context;
use crate::config::Coordinates;
use crate::qibla::{compass_point, qibla_bearing};
use crate::ui::view::View;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const ARROWS: [&str; 8] = ["↑", "↗", "→", "↘", "↓", "↙", "←", "↖"];

/// Direction of prayer from the configured location.
pub struct QiblaView {
  coords: Coordinates,
  bearing: f64,
}

impl QiblaView {
  pub fn new(coords: Coordinates) -> Self {
    Self {
      coords,
      bearing: qibla_bearing(coords),
    }
  }
}

fn arrow(bearing: f64) -> &'static str {
  ARROWS[((bearing.rem_euclid(360.0) / 45.0).round() as usize) % ARROWS.len()]
}

impl View for QiblaView {
  fn handle_key(&mut self, _key: KeyEvent, _ctx: &mut Context) {}

  fn render(&mut self, frame: &mut Frame, area: Rect, _ctx: &Context) {
    let block = Block::default()
      .title(" Qibla ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = vec![
      Line::default(),
      Line::styled(arrow(self.bearing), Style::default().fg(Color::Yellow).bold()),
      Line::default(),
      Line::styled(
        format!("{:.1}° {}", self.bearing, compass_point(self.bearing)),
        Style::default().fg(Color::White).bold(),
      ),
      Line::styled(
        "clockwise from true north",
        Style::default().fg(Color::DarkGray),
      ),
      Line::default(),
      Line::styled(
        format!(
          "from {:.4}, {:.4}",
          self.coords.latitude, self.coords.longitude
        ),
        Style::default().fg(Color::DarkGray),
      ),
    ];

    frame.render_widget(
      Paragraph::new(lines).alignment(Alignment::Center).block(block),
      area,
    );
  }

  fn title(&self) -> &'static str {
    "Qibla"
  }
}
