use serde::{Deserialize, Serialize};

use crate::{Seconds, TrackGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Seek request for the playback surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seek(pub Seconds);

/// Tracks the current time and the playhead drag.
///
/// Every method that moves the playhead updates [`current_time`] and returns
/// the [`Seek`] the caller must forward to the video surface. While a drag is
/// in progress, time reports coming back from playback are dropped so they do
/// not fight the pointer.
///
/// [`current_time`]: PlayheadController::current_time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SavedPlayhead")]
pub struct PlayheadController {
    current_time: Seconds,
    duration: Seconds,
    drag: DragState,
}

#[derive(Deserialize)]
struct SavedPlayhead {
    current_time: Seconds,
    duration: Seconds,
    #[serde(default)]
    drag: DragState,
}

impl TryFrom<SavedPlayhead> for PlayheadController {
    type Error = String;

    fn try_from(saved: SavedPlayhead) -> Result<Self, Self::Error> {
        let SavedPlayhead {
            current_time,
            duration,
            drag,
        } = saved;
        if !duration.is_finite() || duration < 0.0 {
            return Err(format!("invalid playhead duration {}", duration));
        }
        if !current_time.is_finite() || !(0.0..=duration).contains(&current_time) {
            return Err(format!(
                "playhead time {} outside [0, {}]",
                current_time, duration
            ));
        }
        Ok(Self {
            current_time,
            duration,
            drag,
        })
    }
}

impl PlayheadController {
    pub fn new(duration: Seconds) -> Self {
        Self {
            current_time: 0.0,
            duration: duration.max(0.0),
            drag: DragState::Idle,
        }
    }

    pub fn current_time(&self) -> Seconds {
        self.current_time
    }

    pub fn duration(&self) -> Seconds {
        self.duration
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag == DragState::Dragging
    }

    pub fn set_duration(&mut self, duration: Seconds) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        if self.current_time > self.duration {
            self.current_time = self.duration;
        }
    }

    /// Pointer pressed on the playhead handle. Returns false if a drag is
    /// already running.
    pub fn begin_drag(&mut self) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.drag = DragState::Dragging;
        true
    }

    /// Global pointer move. Only meaningful while dragging.
    pub fn drag_to(&mut self, pointer_x: f64, geometry: &TrackGeometry) -> Option<Seek> {
        if !self.is_dragging() {
            return None;
        }
        Some(self.move_to(geometry.time_at(pointer_x, self.duration)))
    }

    /// Global pointer release, wherever the pointer is.
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Click on the track body. Ignored while a drag is running, since the
    /// release that ends a drag also produces a click.
    pub fn click_track(&mut self, pointer_x: f64, geometry: &TrackGeometry) -> Option<Seek> {
        if self.is_dragging() {
            return None;
        }
        Some(self.move_to(geometry.time_at(pointer_x, self.duration)))
    }

    /// Click on the time ruler; always seeks.
    pub fn click_ruler(&mut self, pointer_x: f64, geometry: &TrackGeometry) -> Seek {
        self.move_to(geometry.time_at(pointer_x, self.duration))
    }

    /// Programmatic seek, clamped to the timeline.
    pub fn seek(&mut self, time: Seconds) -> Seek {
        let t = if time.is_finite() { time.clamp(0.0, self.duration) } else { 0.0 };
        self.move_to(t)
    }

    /// Time reported by the playback surface. Returns whether it was applied.
    pub fn playback_tick(&mut self, time: Seconds, playing: bool) -> bool {
        if !playing || self.is_dragging() || !time.is_finite() {
            return false;
        }
        self.current_time = time.clamp(0.0, self.duration);
        true
    }

    fn move_to(&mut self, time: Seconds) -> Seek {
        self.current_time = time;
        Seek(time)
    }
}
