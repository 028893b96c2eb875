//! Structural edits over the clip and audio lanes.
//!
//! Every function takes the current lane by reference and returns the
//! complete new lane, ready to be stored as a history snapshot. An `Err`
//! means nothing changed and nothing should be pushed.
use crate::{AudioTrack, Clip, ClipId, MediaRef, Seconds, TimelineError};

/// Amount removed from a clip's end by one trim.
pub const TRIM_STEP: Seconds = 1.0;

/// Shortest clip a trim may leave behind.
pub const MIN_CLIP_LENGTH: Seconds = 0.1;

/// Length given to media appended from the media panel.
pub const ADDED_MEDIA_LENGTH: Seconds = 10.0;

pub const MAIN_CLIP_NAME: &str = "Main Video";

fn position(clips: &[Clip], clip_id: ClipId) -> Result<usize, TimelineError> {
    clips
        .iter()
        .position(|c| c.id == clip_id)
        .ok_or(TimelineError::ClipNotFound(clip_id))
}

/// The single clip seeded after an upload, spanning the reported duration.
pub fn main_clip(duration: Option<Seconds>, source: Option<MediaRef>) -> Clip {
    let end = duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);
    Clip {
        id: ClipId::new(),
        name: MAIN_CLIP_NAME.to_string(),
        start: 0.0,
        end,
        source,
    }
}

/// Split a clip in two at `at`.
///
/// The original keeps `[start, at)` and a new clip `[at, end)` named
/// `"<name> (Cut)"` is inserted right after it. `at` must fall strictly
/// inside the clip.
pub fn cut_clip(clips: &[Clip], clip_id: ClipId, at: Seconds) -> Result<Vec<Clip>, TimelineError> {
    let idx = position(clips, clip_id)?;
    let clip = &clips[idx];
    if !(at > clip.start && at < clip.end) {
        return Err(TimelineError::CutOutsideClip {
            clip: clip_id,
            at,
            start: clip.start,
            end: clip.end,
        });
    }

    let tail = Clip {
        id: ClipId::new(),
        name: format!("{} (Cut)", clip.name),
        start: at,
        end: clip.end,
        source: clip.source.clone(),
    };

    let mut out = clips.to_vec();
    out[idx].end = at;
    out.insert(idx + 1, tail);
    Ok(out)
}

/// Pull a clip's end in by `step`, never below `start + MIN_CLIP_LENGTH`.
pub fn trim_clip_end(
    clips: &[Clip],
    clip_id: ClipId,
    step: Seconds,
) -> Result<Vec<Clip>, TimelineError> {
    if !(step > 0.0) || !step.is_finite() {
        return Err(TimelineError::InvalidOp(format!("trim step {}", step)));
    }
    let idx = position(clips, clip_id)?;
    let clip = &clips[idx];
    let new_end = (clip.end - step).max(clip.start + MIN_CLIP_LENGTH);
    if new_end >= clip.end {
        return Err(TimelineError::TrimAtMinimum(clip_id));
    }

    let mut out = clips.to_vec();
    out[idx].end = new_end;
    Ok(out)
}

pub fn delete_clip(clips: &[Clip], clip_id: ClipId) -> Result<Vec<Clip>, TimelineError> {
    let idx = position(clips, clip_id)?;
    let mut out = clips.to_vec();
    out.remove(idx);
    Ok(out)
}

/// Append a media clip after the last clip in sequence order.
pub fn append_media(
    clips: &[Clip],
    name: impl Into<String>,
    source: Option<MediaRef>,
) -> Result<Vec<Clip>, TimelineError> {
    let start = clips.last().map(|c| c.end).unwrap_or(0.0);
    let clip = Clip::new(name, start, start + ADDED_MEDIA_LENGTH, source)?;
    let mut out = clips.to_vec();
    out.push(clip);
    Ok(out)
}

/// Append a music track covering `[0, duration]`.
pub fn add_audio_track(
    tracks: &[AudioTrack],
    name: impl Into<String>,
    source: Option<MediaRef>,
    duration: Seconds,
) -> Result<Vec<AudioTrack>, TimelineError> {
    let track = AudioTrack::new(name, 0.0, duration, source)?;
    let mut out = tracks.to_vec();
    out.push(track);
    Ok(out)
}

/// Give zero-length seed clips the now-known source duration.
///
/// Returns true when any clip changed.
pub fn stretch_unsized(clips: &mut [Clip], duration: Seconds) -> bool {
    if !(duration > 0.0) || !duration.is_finite() {
        return false;
    }
    let mut changed = false;
    for clip in clips.iter_mut().filter(|c| c.start == 0.0 && c.end == 0.0) {
        clip.end = duration;
        changed = true;
    }
    changed
}
