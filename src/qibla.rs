//! Direction of prayer.

use crate::config::Coordinates;

pub const KAABA: Coordinates = Coordinates {
  latitude: 21.4225,
  longitude: 39.8262,
};

const COMPASS_POINTS: [&str; 16] = [
  "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

/// Initial great-circle bearing from `from` to the Kaaba, in degrees
/// clockwise from true north, within `[0, 360)`.
pub fn qibla_bearing(from: Coordinates) -> f64 {
  let phi = from.latitude.to_radians();
  let phi_k = KAABA.latitude.to_radians();
  let delta_lambda = (KAABA.longitude - from.longitude).to_radians();

  let y = delta_lambda.sin();
  let x = phi.cos() * phi_k.tan() - phi.sin() * delta_lambda.cos();

  let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
  // rem_euclid can round up to exactly 360 for tiny negative inputs
  if bearing >= 360.0 {
    0.0
  } else {
    bearing
  }
}

/// Nearest of the 16 compass points.
pub fn compass_point(bearing: f64) -> &'static str {
  let index = ((bearing.rem_euclid(360.0) / 22.5).round() as usize) % COMPASS_POINTS.len();
  COMPASS_POINTS[index]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates {
      latitude,
      longitude,
    }
  }

  #[test]
  fn test_due_north_of_kaaba_faces_south() {
    let bearing = qibla_bearing(at(40.0, KAABA.longitude));
    assert!((bearing - 180.0).abs() < 1e-9, "{}", bearing);
  }

  #[test]
  fn test_due_south_of_kaaba_faces_north() {
    let bearing = qibla_bearing(at(0.0, KAABA.longitude));
    assert!(bearing.abs() < 1e-9, "{}", bearing);
  }

  #[test]
  fn test_known_cities() {
    let london = qibla_bearing(at(51.5074, -0.1278));
    assert!((london - 119.0).abs() < 1.0, "{}", london);

    let new_delhi = qibla_bearing(at(28.6139, 77.2090));
    assert!((new_delhi - 266.0).abs() < 1.5, "{}", new_delhi);
  }

  #[test]
  fn test_bearing_range() {
    for lat in [-60.0, -10.0, 0.0, 35.0, 70.0] {
      for lng in [-170.0, -45.0, 0.0, 39.8262, 100.0, 179.0] {
        let bearing = qibla_bearing(at(lat, lng));
        assert!((0.0..360.0).contains(&bearing), "{} at {},{}", bearing, lat, lng);
      }
    }
  }

  #[test]
  fn test_compass_point() {
    assert_eq!(compass_point(0.0), "N");
    assert_eq!(compass_point(119.0), "ESE");
    assert_eq!(compass_point(359.0), "N");
    assert_eq!(compass_point(266.0), "W");
  }
}
