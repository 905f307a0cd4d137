//! Token vocabulary
//!
//! Bare identifiers accepted as attribute values, and the named colour table.

use crate::AttributeSemantic;
use crate::header::mode;

/// Token that resets any attribute to the undefined mode
pub const UNDEFINED: &str = "undefined";

/// Compare a token ignoring case and treating `_` as `-`
fn token_eq(token: &str, expected: &str) -> bool {
    token.len() == expected.len()
        && token
            .bytes()
            .zip(expected.bytes())
            .all(|(a, b)| a.to_ascii_lowercase() == b || (a == b'_' && b == b'-'))
}

fn lookup(token: &str, table: &[(&str, u8)]) -> Option<u8> {
    table.iter().find(|(name, _)| token_eq(token, name)).map(|(_, m)| *m)
}

const DIMENSION_TOKENS: &[(&str, u8)] = &[("auto", mode::AUTO)];

const BACKGROUND_SIZE_TOKENS: &[(&str, u8)] = &[
    ("auto", mode::AUTO),
    ("contain", mode::CONTAIN),
    ("cover", mode::COVER),
    ("stretch", mode::STRETCH),
];

const FLAG_TOKENS: &[(&str, u8)] = &[
    ("true", mode::TRUE),
    ("yes", mode::TRUE),
    ("on", mode::TRUE),
    ("false", mode::FALSE),
    ("no", mode::FALSE),
    ("off", mode::FALSE),
];

const ALIGNMENT_TOKENS: &[(&str, u8)] = &[
    ("start", mode::ALIGN_START),
    ("left", mode::ALIGN_START),
    ("top", mode::ALIGN_START),
    ("middle", mode::ALIGN_MIDDLE),
    ("center", mode::ALIGN_MIDDLE),
    ("end", mode::ALIGN_END),
    ("right", mode::ALIGN_END),
    ("bottom", mode::ALIGN_END),
];

const JUSTIFY_TOKENS: &[(&str, u8)] = &[
    ("left", mode::JUSTIFY_LEFT),
    ("right", mode::JUSTIFY_RIGHT),
    ("center", mode::JUSTIFY_CENTER),
    ("flush", mode::JUSTIFY_FLUSH),
];

const LAYOUT_TOKENS: &[(&str, u8)] = &[
    ("none", mode::LAYOUT_NONE),
    ("block", mode::LAYOUT_BLOCK),
    ("inline", mode::LAYOUT_INLINE),
    ("inline-container", mode::LAYOUT_INLINE_CONTAINER),
];

const WHITE_SPACE_TOKENS: &[(&str, u8)] = &[
    ("normal", mode::WHITE_SPACE_NORMAL),
    ("preserve", mode::WHITE_SPACE_PRESERVE),
];

const WRAP_TOKENS: &[(&str, u8)] = &[
    ("none", mode::WRAP_NONE),
    ("word", mode::WRAP_WORD),
    ("character", mode::WRAP_CHARACTER),
];

const BOX_TOKENS: &[(&str, u8)] = &[
    ("border", mode::BOX_BORDER),
    ("padding", mode::BOX_PADDING),
    ("content", mode::BOX_CONTENT),
];

const CURSOR_TOKENS: &[(&str, u8)] = &[
    ("default", mode::CURSOR_DEFAULT),
    ("pointer", mode::CURSOR_POINTER),
    ("text", mode::CURSOR_TEXT),
    ("move", mode::CURSOR_MOVE),
    ("wait", mode::CURSOR_WAIT),
    ("resize-horizontal", mode::CURSOR_RESIZE_HORIZONTAL),
    ("resize-vertical", mode::CURSOR_RESIZE_VERTICAL),
];

const EDGE_TOKENS: &[(&str, u8)] = &[
    ("none", mode::EDGE_NONE),
    ("left", mode::EDGE_LEFT),
    ("right", mode::EDGE_RIGHT),
    ("top", mode::EDGE_TOP),
    ("bottom", mode::EDGE_BOTTOM),
    ("horizontal", mode::EDGE_HORIZONTAL),
    ("vertical", mode::EDGE_VERTICAL),
    ("all", mode::EDGE_ALL),
];

/// Mode for a token under a semantic, if the semantic knows the token
pub fn mode_for_token(semantic: AttributeSemantic, token: &str) -> Option<u8> {
    use AttributeSemantic as S;
    match semantic {
        S::Dimension | S::AbsoluteDimension => lookup(token, DIMENSION_TOKENS),
        S::BackgroundSize => lookup(token, BACKGROUND_SIZE_TOKENS),
        S::Flag => lookup(token, FLAG_TOKENS),
        S::Alignment => lookup(token, ALIGNMENT_TOKENS),
        S::Justification => lookup(token, JUSTIFY_TOKENS),
        S::Layout => lookup(token, LAYOUT_TOKENS),
        S::WhiteSpace => lookup(token, WHITE_SPACE_TOKENS),
        S::WrapMode => lookup(token, WRAP_TOKENS),
        S::BoundingBox => lookup(token, BOX_TOKENS),
        S::Cursor => lookup(token, CURSOR_TOKENS),
        S::Background if token_eq(token, "none") => Some(mode::BACKGROUND_NONE),
        _ => None,
    }
}

/// Parse an edge list such as `"left top"` or `"horizontal"` into a mask
pub fn parse_edges(value: &str) -> Option<u8> {
    let mut mask = 0u8;
    let mut any = false;
    for token in value.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        mask |= lookup(token, EDGE_TOKENS)?;
        any = true;
    }
    any.then(|| normalize_edges(mask))
}

/// Clear the NONE bit when a real edge is present, and fall back to NONE
/// when no edge is left
pub fn normalize_edges(mask: u8) -> u8 {
    let edges = mask & mode::EDGE_ALL;
    if edges != 0 { edges } else { mode::EDGE_NONE }
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("transparent", 0x0000_0000),
    ("black", 0xFF00_0000),
    ("white", 0xFFFF_FFFF),
    ("red", 0xFFFF_0000),
    ("green", 0xFF00_8000),
    ("lime", 0xFF00_FF00),
    ("blue", 0xFF00_00FF),
    ("yellow", 0xFFFF_FF00),
    ("cyan", 0xFF00_FFFF),
    ("magenta", 0xFFFF_00FF),
    ("gray", 0xFF80_8080),
    ("grey", 0xFF80_8080),
    ("silver", 0xFFC0_C0C0),
    ("maroon", 0xFF80_0000),
    ("navy", 0xFF00_0080),
    ("orange", 0xFFFF_A500),
    ("purple", 0xFF80_0080),
    ("teal", 0xFF00_8080),
];

/// ARGB value of a named colour
pub fn named_color(name: &str) -> Option<u32> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| token_eq(name, n))
        .map(|(_, argb)| *argb)
}

/// Parse `#rgb`, `#rrggbb` or `#aarrggbb`
pub fn parse_hex_color(text: &str) -> Option<u32> {
    let hex = text.strip_prefix('#')?;
    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        3 => {
            let r = (value >> 8) & 0xF;
            let g = (value >> 4) & 0xF;
            let b = value & 0xF;
            Some(0xFF00_0000 | (r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11))
        }
        6 => Some(0xFF00_0000 | value),
        8 => Some(value),
        _ => None,
    }
}
