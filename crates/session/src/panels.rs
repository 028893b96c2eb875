//! Look adjustments, filters, effects, transitions and overlays.
//!
//! None of this touches the clip lanes or the edit history.

use serde::{Deserialize, Serialize};
use timeline::{ClipId, Seconds};
use uuid::Uuid;

/// Length of an effect dropped at the playhead.
pub const EFFECT_LENGTH: Seconds = 3.0;

/// Overlay anchor, in percent of the frame.
pub const CENTER: Position = Position { x: 50.0, y: 50.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Highlight,
    Shadows,
    Temperature,
    Tint,
    Sharpness,
    Vignette,
}

impl Adjustment {
    pub fn range(&self) -> (i32, i32) {
        match self {
            Self::Hue => (-180, 180),
            Self::Sharpness | Self::Vignette => (0, 100),
            _ => (-100, 100),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub hue: i32,
    pub highlight: i32,
    pub shadows: i32,
    pub temperature: i32,
    pub tint: i32,
    pub sharpness: i32,
    pub vignette: i32,
}

impl Adjustments {
    fn slot(&mut self, key: Adjustment) -> &mut i32 {
        match key {
            Adjustment::Brightness => &mut self.brightness,
            Adjustment::Contrast => &mut self.contrast,
            Adjustment::Saturation => &mut self.saturation,
            Adjustment::Hue => &mut self.hue,
            Adjustment::Highlight => &mut self.highlight,
            Adjustment::Shadows => &mut self.shadows,
            Adjustment::Temperature => &mut self.temperature,
            Adjustment::Tint => &mut self.tint,
            Adjustment::Sharpness => &mut self.sharpness,
            Adjustment::Vignette => &mut self.vignette,
        }
    }

    pub fn get(&self, key: Adjustment) -> i32 {
        match key {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
            Adjustment::Hue => self.hue,
            Adjustment::Highlight => self.highlight,
            Adjustment::Shadows => self.shadows,
            Adjustment::Temperature => self.temperature,
            Adjustment::Tint => self.tint,
            Adjustment::Sharpness => self.sharpness,
            Adjustment::Vignette => self.vignette,
        }
    }

    /// Set one slider, clamped to its range. Returns the stored value.
    pub fn set(&mut self, key: Adjustment, value: i32) -> i32 {
        let (lo, hi) = key.range();
        let value = value.clamp(lo, hi);
        *self.slot(key) = value;
        value
    }

    pub fn merge(&mut self, values: &[(Adjustment, i32)]) {
        for &(key, value) in values {
            self.set(key, value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentPreset {
    pub name: &'static str,
    pub values: &'static [(Adjustment, i32)],
}

use Adjustment::{Brightness as B, Contrast as C, Hue as H, Saturation as S, Temperature as T};

pub const ADJUSTMENT_PRESETS: [AdjustmentPreset; 4] = [
    AdjustmentPreset {
        name: "Natural",
        values: &[(B, 0), (C, 0), (S, 0)],
    },
    AdjustmentPreset {
        name: "Vibrant",
        values: &[(B, 10), (C, 15), (S, 30)],
    },
    AdjustmentPreset {
        name: "Moody",
        values: &[(B, -20), (C, 30), (S, -10)],
    },
    AdjustmentPreset {
        name: "Bright",
        values: &[(B, 30), (C, 10), (S, 10)],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub adjustments: &'static [(Adjustment, i32)],
}

macro_rules! filter {
    ($id:literal, $name:literal, [$($key:ident = $value:expr),* $(,)?]) => {
        FilterPreset {
            id: $id,
            name: $name,
            adjustments: &[$(($key, $value)),*],
        }
    };
}

pub const FILTER_PRESETS: [FilterPreset; 16] = [
    filter!("none", "None", [B = 0, C = 0, S = 0, H = 0]),
    filter!("vivid", "Vivid", [S = 50, C = 10]),
    filter!("dramatic", "Dramatic", [C = 50, S = 20]),
    filter!("warm", "Warm", [T = 30, S = 20]),
    filter!("cool", "Cool", [H = 180, S = 10]),
    filter!("vintage", "Vintage", [T = 40, C = 10, S = -20]),
    filter!("black-white", "B&W", [S = -100]),
    filter!("noir", "Noir", [S = -100, C = 50]),
    filter!("faded", "Faded", [B = 10, C = -10, S = -20]),
    filter!("cold", "Cold", [B = -10, S = 50, H = 200]),
    filter!("sunset", "Sunset", [T = 40, S = 50, H = -30]),
    filter!("ocean", "Ocean", [S = 20, H = 180, B = 5]),
    filter!("forest", "Forest", [S = 30, H = 90]),
    filter!("neon", "Neon", [S = 100, C = 20, B = 10]),
    filter!("soft", "Soft", [B = 5, C = -5, S = -10]),
    filter!("harsh", "Harsh", [C = 40, S = 20]),
];

pub fn find_filter(id: &str) -> Option<&'static FilterPreset> {
    FILTER_PRESETS
        .iter()
        .find(|f| f.id.eq_ignore_ascii_case(id) || f.name.eq_ignore_ascii_case(id))
}

pub fn find_adjustment_preset(name: &str) -> Option<&'static AdjustmentPreset> {
    ADJUSTMENT_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub id: Uuid,
    pub name: String,
    pub start_time: Seconds,
    pub duration: Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedTransition {
    pub id: Uuid,
    pub name: String,
    pub clip_id: ClipId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub text: String,
    pub font: String,
    pub style: String,
    pub color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: "Your Text Here".to_string(),
            font: "Inter".to_string(),
            style: "default".to_string(),
            color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub id: Uuid,
    #[serde(flatten)]
    pub style: TextStyle,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: Uuid,
    pub name: String,
    pub glyph: String,
    pub position: Position,
}

/// Everything the side panels have applied to the current video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub adjustments: Adjustments,
    pub active_filter: Option<String>,
    pub effects: Vec<AppliedEffect>,
    pub transition: Option<AppliedTransition>,
    pub texts: Vec<TextOverlay>,
    pub stickers: Vec<Sticker>,
}

impl PanelState {
    pub fn apply_filter(&mut self, filter: &FilterPreset) {
        self.active_filter = Some(filter.id.to_string());
        self.adjustments.merge(filter.adjustments);
    }

    pub fn apply_preset(&mut self, preset: &AdjustmentPreset) {
        self.adjustments.merge(preset.values);
    }

    pub fn add_effect(&mut self, name: impl Into<String>, at: Seconds) -> &AppliedEffect {
        self.effects.push(AppliedEffect {
            id: Uuid::new_v4(),
            name: name.into(),
            start_time: at,
            duration: EFFECT_LENGTH,
        });
        &self.effects[self.effects.len() - 1]
    }

    /// Replaces whatever transition was applied before.
    pub fn set_transition(&mut self, name: impl Into<String>, clip_id: ClipId) {
        self.transition = Some(AppliedTransition {
            id: Uuid::new_v4(),
            name: name.into(),
            clip_id,
        });
    }

    pub fn add_text(&mut self, style: TextStyle) -> &TextOverlay {
        self.texts.push(TextOverlay {
            id: Uuid::new_v4(),
            style,
            position: CENTER,
        });
        &self.texts[self.texts.len() - 1]
    }

    pub fn add_sticker(&mut self, name: impl Into<String>, glyph: impl Into<String>) -> &Sticker {
        self.stickers.push(Sticker {
            id: Uuid::new_v4(),
            name: name.into(),
            glyph: glyph.into(),
            position: CENTER,
        });
        &self.stickers[self.stickers.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliders_clamp_to_their_range() {
        let mut adj = Adjustments::default();
        assert_eq!(adj.set(Adjustment::Brightness, 250), 100);
        assert_eq!(adj.set(Adjustment::Hue, -400), -180);
        assert_eq!(adj.set(Adjustment::Vignette, -5), 0);
        assert_eq!(adj.get(Adjustment::Brightness), 100);
        assert_eq!(adj.get(Adjustment::Tint), 0);
    }

    #[test]
    fn filter_replaces_active_and_merges_values() {
        let mut panels = PanelState::default();
        panels.adjustments.set(Adjustment::Sharpness, 40);

        panels.apply_filter(find_filter("noir").unwrap());
        assert_eq!(panels.active_filter.as_deref(), Some("noir"));
        assert_eq!(panels.adjustments.saturation, -100);
        assert_eq!(panels.adjustments.contrast, 50);

        panels.apply_filter(find_filter("B&W").unwrap());
        assert_eq!(panels.active_filter.as_deref(), Some("black-white"));
        // untouched keys survive the merge
        assert_eq!(panels.adjustments.contrast, 50);
        assert_eq!(panels.adjustments.sharpness, 40);
    }

    #[test]
    fn out_of_range_filter_values_are_clamped() {
        let mut panels = PanelState::default();
        panels.apply_filter(find_filter("cold").unwrap());
        assert_eq!(panels.adjustments.hue, 180);
    }

    #[test]
    fn presets_cover_the_panel() {
        assert_eq!(FILTER_PRESETS.len(), 16);
        let mut panels = PanelState::default();
        panels.apply_preset(find_adjustment_preset("moody").unwrap());
        assert_eq!(
            (
                panels.adjustments.brightness,
                panels.adjustments.contrast,
                panels.adjustments.saturation
            ),
            (-20, 30, -10)
        );
    }

    #[test]
    fn effects_and_overlays() {
        let mut panels = PanelState::default();
        let effect = panels.add_effect("VHS", 12.5).clone();
        assert_eq!((effect.start_time, effect.duration), (12.5, EFFECT_LENGTH));

        let text = panels.add_text(TextStyle::default()).clone();
        assert_eq!(text.position, CENTER);
        assert_eq!(text.style.text, "Your Text Here");

        panels.add_sticker("Fire", "🔥");
        assert_eq!(panels.stickers[0].position, Position { x: 50.0, y: 50.0 });

        let clip = ClipId::new();
        panels.set_transition("Fade", clip);
        panels.set_transition("Wipe Left", clip);
        assert_eq!(panels.transition.as_ref().map(|t| t.name.as_str()), Some("Wipe Left"));
    }
}
