//! Pointer-to-time mapping for the timeline track.
use serde::{Deserialize, Serialize};

use crate::Seconds;

/// Rendered placement of the track element in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    /// Left edge of the scroll container (or of the track itself when the
    /// track is not scrolled).
    pub left: f64,
    /// Rendered width of the full track, zoom included.
    pub width: f64,
    /// Horizontal scroll offset of the container.
    #[serde(default)]
    pub scroll_offset: f64,
}

impl TrackGeometry {
    pub fn new(left: f64, width: f64) -> Self {
        Self {
            left,
            width,
            scroll_offset: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_offset: f64) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    /// Pointer position as a fraction of the track, clamped to [0, 1].
    pub fn fraction_at(&self, pointer_x: f64) -> f64 {
        if !(self.width > 0.0) || !pointer_x.is_finite() {
            return 0.0;
        }
        ((pointer_x - self.left + self.scroll_offset) / self.width).clamp(0.0, 1.0)
    }

    /// Map a pointer X to a time in `[0, duration]`.
    ///
    /// A non-positive or non-finite duration maps everything to 0.
    pub fn time_at(&self, pointer_x: f64, duration: Seconds) -> Seconds {
        if !(duration > 0.0) || !duration.is_finite() {
            return 0.0;
        }
        self.fraction_at(pointer_x) * duration
    }

    /// Pointer X of a given time; the inverse of [`time_at`](Self::time_at)
    /// for times inside the track.
    pub fn x_at(&self, time: Seconds, duration: Seconds) -> f64 {
        self.left - self.scroll_offset + fraction_of(time, duration) * self.width
    }
}

/// Position of `time` along `[0, duration]`, clamped to [0, 1]. Used to place
/// clip blocks and the playhead.
pub fn fraction_of(time: Seconds, duration: Seconds) -> f64 {
    if !(duration > 0.0) || !duration.is_finite() || !time.is_finite() {
        return 0.0;
    }
    (time / duration).clamp(0.0, 1.0)
}

pub const ZOOM_MIN: u32 = 50;
pub const ZOOM_MAX: u32 = 200;
pub const ZOOM_STEP: u32 = 25;

/// Track zoom in percent of the fitted width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Zoom(u32);

impl TryFrom<u32> for Zoom {
    type Error = String;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        if (ZOOM_MIN..=ZOOM_MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(format!(
                "zoom {}% outside {}..={}",
                percent, ZOOM_MIN, ZOOM_MAX
            ))
        }
    }
}

impl From<Zoom> for u32 {
    fn from(zoom: Zoom) -> u32 {
        zoom.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(100)
    }
}

impl Zoom {
    pub fn percent(self) -> u32 {
        self.0
    }

    pub fn zoom_in(self) -> Self {
        Self((self.0 + ZOOM_STEP).min(ZOOM_MAX))
    }

    pub fn zoom_out(self) -> Self {
        Self(self.0.saturating_sub(ZOOM_STEP).max(ZOOM_MIN))
    }

    /// Rendered track width for a container of `fitted_width` pixels.
    pub fn track_width(self, fitted_width: f64) -> f64 {
        fitted_width * self.0 as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_inside_track_linearly() {
        let geom = TrackGeometry::new(100.0, 400.0);
        assert_eq!(geom.time_at(100.0, 60.0), 0.0);
        assert_eq!(geom.time_at(300.0, 60.0), 30.0);
        assert_eq!(geom.time_at(500.0, 60.0), 60.0);
    }

    #[test]
    fn every_in_bounds_pointer_maps_into_duration() {
        let geom = TrackGeometry::new(20.0, 333.0);
        let duration = 47.5;
        for px in 20..=353 {
            let t = geom.time_at(px as f64, duration);
            assert!((0.0..=duration).contains(&t), "x={} -> {}", px, t);
        }
    }

    #[test]
    fn clamps_outside_track() {
        let geom = TrackGeometry::new(100.0, 400.0);
        for x in [-1000.0, 0.0, 99.9] {
            assert_eq!(geom.time_at(x, 60.0), 0.0);
        }
        for x in [500.1, 800.0, 1e9] {
            assert_eq!(geom.time_at(x, 60.0), 60.0);
        }
    }

    #[test]
    fn scroll_offset_shifts_the_origin() {
        // Ruler scrolled by 200px on a 1000px-wide zoomed track.
        let geom = TrackGeometry::new(0.0, 1000.0).with_scroll(200.0);
        assert_eq!(geom.time_at(300.0, 100.0), 50.0);
        assert_eq!(geom.x_at(50.0, 100.0), 300.0);
    }

    #[test]
    fn degenerate_inputs_yield_zero() {
        let geom = TrackGeometry::new(0.0, 400.0);
        assert_eq!(geom.time_at(200.0, 0.0), 0.0);
        assert_eq!(geom.time_at(200.0, -5.0), 0.0);
        assert_eq!(geom.time_at(200.0, f64::NAN), 0.0);
        assert_eq!(TrackGeometry::new(0.0, 0.0).time_at(200.0, 60.0), 0.0);
        assert_eq!(geom.time_at(f64::NAN, 60.0), 0.0);
        assert_eq!(fraction_of(5.0, 0.0), 0.0);
    }

    #[test]
    fn zoom_steps_and_bounds() {
        let z = Zoom::default();
        assert_eq!(z.zoom_in().percent(), 125);
        let mut max = z;
        for _ in 0..10 {
            max = max.zoom_in();
        }
        assert_eq!(max.percent(), ZOOM_MAX);
        let mut min = z;
        for _ in 0..10 {
            min = min.zoom_out();
        }
        assert_eq!(min.percent(), ZOOM_MIN);
        assert_eq!(Zoom::default().zoom_out().track_width(800.0), 600.0);
    }

    #[test]
    fn zoom_deserializes_only_in_range() {
        let z: Zoom = serde_json::from_str("150").unwrap();
        assert_eq!(z.percent(), 150);
        assert_eq!(serde_json::to_string(&z).unwrap(), "150");
        assert!(serde_json::from_str::<Zoom>("5").is_err());
        assert!(serde_json::from_str::<Zoom>("400").is_err());
    }
}
