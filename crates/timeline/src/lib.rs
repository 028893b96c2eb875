use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

mod coords;
pub use coords::*;
mod playhead;
pub use playhead::*;
mod history;
pub use history::*;
pub mod edit_operations;
pub mod timecode;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),
    #[error("cut time {at:.3}s is outside clip {clip} [{start:.3}, {end:.3})")]
    CutOutsideClip {
        clip: ClipId,
        at: Seconds,
        start: Seconds,
        end: Seconds,
    },
    #[error("clip {0} is already at its minimum length")]
    TrimAtMinimum(ClipId),
    #[error("invalid span [{start}, {end}]")]
    InvalidSpan { start: Seconds, end: Seconds },
}

pub type Seconds = f64; // wall-clock seconds from the start of the timeline

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to the media behind a clip: a remote URL, a local path, or
/// whatever the playback surface knows how to open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_span(start: Seconds, end: Seconds) -> Result<(), TimelineError> {
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
        return Err(TimelineError::InvalidSpan { start, end });
    }
    Ok(())
}

/// A time-bounded reference to video media placed on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub start: Seconds,
    pub end: Seconds,
    #[serde(default)]
    pub source: Option<MediaRef>,
}

impl Clip {
    pub fn new(
        name: impl Into<String>,
        start: Seconds,
        end: Seconds,
        source: Option<MediaRef>,
    ) -> Result<Self, TimelineError> {
        check_span(start, end)?;
        Ok(Self {
            id: ClipId::new(),
            name: name.into(),
            start,
            end,
            source,
        })
    }

    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: Seconds) -> bool {
        t >= self.start && t < self.end
    }
}

/// Background audio placed on its own lane; same temporal rules as [`Clip`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    pub id: ClipId,
    pub name: String,
    pub start: Seconds,
    pub end: Seconds,
    #[serde(default)]
    pub source: Option<MediaRef>,
}

impl AudioTrack {
    pub fn new(
        name: impl Into<String>,
        start: Seconds,
        end: Seconds,
        source: Option<MediaRef>,
    ) -> Result<Self, TimelineError> {
        check_span(start, end)?;
        Ok(Self {
            id: ClipId::new(),
            name: name.into(),
            start,
            end,
            source,
        })
    }

    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }
}

/// Furthest end point across both lanes, 0 for an empty timeline.
pub fn content_end(clips: &[Clip], audio_tracks: &[AudioTrack]) -> Seconds {
    clips
        .iter()
        .map(|c| c.end)
        .chain(audio_tracks.iter().map(|t| t.end))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_rejects_inverted_span() {
        assert_eq!(
            Clip::new("bad", 5.0, 2.0, None),
            Err(TimelineError::InvalidSpan { start: 5.0, end: 2.0 })
        );
        assert!(Clip::new("nan", f64::NAN, 2.0, None).is_err());
        assert!(AudioTrack::new("neg", -1.0, 2.0, None).is_err());
    }

    #[test]
    fn clip_containment_is_half_open() {
        let clip = Clip::new("a", 2.0, 10.0, None).unwrap();
        assert!(clip.contains(2.0));
        assert!(clip.contains(9.999));
        assert!(!clip.contains(10.0));
        assert!(!clip.contains(1.0));
        assert_eq!(clip.duration(), 8.0);
    }

    #[test]
    fn content_end_spans_both_lanes() {
        let clips = vec![Clip::new("v", 0.0, 12.0, None).unwrap()];
        let audio = vec![AudioTrack::new("a", 0.0, 20.0, None).unwrap()];
        assert_eq!(content_end(&clips, &audio), 20.0);
        assert_eq!(content_end(&[], &[]), 0.0);
    }

    #[test]
    fn ids_serialize_transparently() {
        let clip = Clip::new("a", 0.0, 1.0, Some(MediaRef::new("blob:1"))).unwrap();
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["id"], serde_json::json!(clip.id.0.to_string()));
        assert_eq!(json["source"], serde_json::json!("blob:1"));
    }
}
