//! Font registry seam
//!
//! Fonts are resolved once per node per fold. Metrics are Q26.6 fixed point.

use std::collections::HashMap;

use stacker_dom::{FontId, StyleFlags};

/// Fractional bits in text metrics
pub const TEXT_METRIC_PRECISION: u32 = 6;

/// Convert Q26.6 to whole pixels, rounding to nearest
#[inline]
pub fn metric_to_px(value: i32) -> i32 {
    (value + (1 << (TEXT_METRIC_PRECISION - 1))) >> TEXT_METRIC_PRECISION
}

#[inline]
pub fn px_to_metric(px: i32) -> i32 {
    px << TEXT_METRIC_PRECISION
}

/// Metrics of a resolved font, Q26.6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontMetrics {
    pub height: i32,
    pub paragraph_indent_width: i32,
}

impl FontMetrics {
    /// Leading used when none is set: an eighth of the line height
    pub fn default_leading_px(&self) -> i32 {
        metric_to_px(self.height / 8)
    }

    pub fn paragraph_indent_px(&self) -> i32 {
        metric_to_px(self.paragraph_indent_width)
    }
}

/// Font lookup used by the folder
pub trait FontRegistry {
    fn font_id(&mut self, face: &str, size: i32, flags: StyleFlags) -> FontId;
    fn metrics(&self, id: FontId) -> FontMetrics;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    face: String,
    size: i32,
    flags: StyleFlags,
}

/// Registry that interns `(face, size, flags)` and synthesises metrics
/// from the size
#[derive(Debug, Default)]
pub struct BasicFontRegistry {
    fonts: Vec<FontKey>,
    by_key: HashMap<FontKey, FontId>,
}

impl BasicFontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct fonts handed out
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl FontRegistry for BasicFontRegistry {
    fn font_id(&mut self, face: &str, size: i32, flags: StyleFlags) -> FontId {
        let key = FontKey {
            face: face.to_ascii_lowercase(),
            size: size.max(1),
            flags: flags & StyleFlags::FONT,
        };
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = FontId(self.fonts.len() as u32);
        tracing::trace!(face = %key.face, size = key.size, id = id.0, "registered font");
        self.fonts.push(key.clone());
        self.by_key.insert(key, id);
        id
    }

    fn metrics(&self, id: FontId) -> FontMetrics {
        let size = self.fonts.get(id.0 as usize).map_or(16, |k| k.size);
        let em = px_to_metric(size);
        FontMetrics {
            height: em * 6 / 5,
            paragraph_indent_width: em * 2,
        }
    }
}
