/// Clock readouts and ruler labels for the timeline toolbar.
use crate::Seconds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readout style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    /// Minutes and seconds (MM:SS), used for the current time
    #[default]
    Short,
    /// Hours, minutes and seconds (HH:MM:SS), used for the total duration
    Detail,
    /// Compact ruler label: `"7s"` under a minute, `"1:05"` above
    Ruler,
}

/// Whole-second clock value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub format: ClockFormat,
}

impl Clock {
    /// Truncates to whole seconds; NaN, infinite or negative input reads as 0.
    pub fn from_seconds(time: Seconds, format: ClockFormat) -> Self {
        let total = if time.is_finite() && time > 0.0 {
            time.floor() as u64
        } else {
            0
        };
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
            format,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.hours * 60 + self.minutes
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            ClockFormat::Short => write!(f, "{:02}:{:02}", self.total_minutes(), self.seconds),
            ClockFormat::Detail => write!(
                f,
                "{:02}:{:02}:{:02}",
                self.hours, self.minutes, self.seconds
            ),
            ClockFormat::Ruler => {
                if self.total_minutes() > 0 {
                    write!(f, "{}:{:02}", self.total_minutes(), self.seconds)
                } else {
                    write!(f, "{}s", self.seconds)
                }
            }
        }
    }
}

pub fn format_clock(time: Seconds) -> String {
    Clock::from_seconds(time, ClockFormat::Short).to_string()
}

pub fn format_clock_detail(time: Seconds) -> String {
    Clock::from_seconds(time, ClockFormat::Detail).to_string()
}

/// Number of labelled ticks drawn across the ruler.
pub const RULER_MARKER_COUNT: usize = 11;

#[derive(Debug, Clone, PartialEq)]
pub struct RulerMarker {
    pub time: Seconds,
    /// Position along the ruler in [0, 1]
    pub position: f64,
    pub label: String,
}

/// Evenly spaced ruler ticks from 0 to `duration`.
pub fn ruler_markers(duration: Seconds) -> Vec<RulerMarker> {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    let last = (RULER_MARKER_COUNT - 1) as f64;
    (0..RULER_MARKER_COUNT)
        .map(|i| {
            let position = i as f64 / last;
            let time = duration * position;
            RulerMarker {
                time,
                position,
                label: Clock::from_seconds(time, ClockFormat::Ruler).to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_detail_readouts() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(65.9), "01:05");
        assert_eq!(format_clock(3725.0), "62:05");
        assert_eq!(format_clock_detail(3725.0), "01:02:05");
        assert_eq!(format_clock_detail(59.99), "00:00:59");
    }

    #[test]
    fn degenerate_times_read_as_zero() {
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(-3.0), "00:00");
        assert_eq!(format_clock_detail(f64::INFINITY), "00:00:00");
    }

    #[test]
    fn ruler_has_eleven_even_ticks() {
        let markers = ruler_markers(100.0);
        assert_eq!(markers.len(), RULER_MARKER_COUNT);
        assert_eq!(markers[0].label, "0s");
        assert_eq!(markers[5].time, 50.0);
        assert_eq!(markers[5].label, "50s");
        assert_eq!(markers[10].label, "1:40");
        assert_eq!(markers[10].position, 1.0);
    }

    #[test]
    fn ruler_for_empty_timeline_is_all_zero() {
        assert!(ruler_markers(0.0).iter().all(|m| m.time == 0.0 && m.label == "0s"));
    }
}
