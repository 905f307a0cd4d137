//! Style engine configuration

use serde::{Deserialize, Serialize};

/// Style engine configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of a node's matched-rule slot array
    pub max_matched_rules: usize,

    /// Class-modifying rules tracked before the class fixpoint gives up
    pub max_visited_class_rules: usize,

    /// Root font face
    pub default_font_face: String,

    /// Root font size (px)
    pub default_font_size: i32,

    /// Root text colour (ARGB)
    pub default_text_color: u32,

    /// Root selection text colour (ARGB)
    pub default_selection_color: u32,

    /// Root selection fill colour (ARGB)
    pub default_selection_fill_color: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_matched_rules: 32,
            max_visited_class_rules: 16,
            default_font_face: "sans".to_string(),
            default_font_size: 16,
            default_text_color: 0xFF00_0000,
            default_selection_color: 0xFFFF_FFFF,
            default_selection_fill_color: 0xFF38_74D8,
        }
    }
}
