//! Computed node style
//!
//! The folder maps folded attributes onto a [`NodeStyle`]. Comparing the
//! old and new style tells the update pass whether text must be
//! re-tokenized or only re-measured.

use stacker_attr::mode;

/// Interned font handle from the font registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontId(pub u32);

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const ENABLED = 1 << 3;

        /// Flags that select a font
        const FONT = Self::BOLD.bits() | Self::ITALIC.bits() | Self::UNDERLINE.bits();
    }
}

/// Layout mode, requested by the `layout` attribute or established from
/// the parent chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    None,
    #[default]
    Block,
    Inline,
    InlineContainer,
}

impl LayoutMode {
    pub fn from_mode(m: u8) -> Option<Self> {
        Some(match m {
            mode::LAYOUT_NONE => Self::None,
            mode::LAYOUT_BLOCK => Self::Block,
            mode::LAYOUT_INLINE => Self::Inline,
            mode::LAYOUT_INLINE_CONTAINER => Self::InlineContainer,
            _ => return None,
        })
    }

    /// Mode a node actually gets, given what it asks for and what its
    /// parent established (`None` for the root).
    ///
    /// `none` propagates down. Inline content outside an inline context
    /// gets a container of its own.
    pub fn establish(requested: LayoutMode, parent: Option<LayoutMode>) -> LayoutMode {
        match (requested, parent) {
            (_, Some(LayoutMode::None)) | (LayoutMode::None, _) => LayoutMode::None,
            (LayoutMode::Block, _) => LayoutMode::Block,
            (LayoutMode::InlineContainer, _) => LayoutMode::InlineContainer,
            (LayoutMode::Inline, Some(LayoutMode::Inline | LayoutMode::InlineContainer)) => LayoutMode::Inline,
            (LayoutMode::Inline, _) => LayoutMode::InlineContainer,
        }
    }

    /// Whether this mode owns a paragraph of inline content
    #[inline]
    pub fn is_inline_context(self) -> bool {
        matches!(self, Self::Inline | Self::InlineContainer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Justification {
    #[default]
    Left,
    Right,
    Center,
    Flush,
}

impl Justification {
    pub fn from_mode(m: u8) -> Option<Self> {
        Some(match m {
            mode::JUSTIFY_LEFT => Self::Left,
            mode::JUSTIFY_RIGHT => Self::Right,
            mode::JUSTIFY_CENTER => Self::Center,
            mode::JUSTIFY_FLUSH => Self::Flush,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WhiteSpace {
    #[default]
    Normal,
    Preserve,
}

impl WhiteSpace {
    pub fn from_mode(m: u8) -> Option<Self> {
        match m {
            mode::WHITE_SPACE_NORMAL => Some(Self::Normal),
            mode::WHITE_SPACE_PRESERVE => Some(Self::Preserve),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    None,
    #[default]
    Word,
    Character,
}

impl WrapMode {
    pub fn from_mode(m: u8) -> Option<Self> {
        Some(match m {
            mode::WRAP_NONE => Self::None,
            mode::WRAP_WORD => Self::Word,
            mode::WRAP_CHARACTER => Self::Character,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Text,
    Move,
    Wait,
    ResizeHorizontal,
    ResizeVertical,
}

impl Cursor {
    pub fn from_mode(m: u8) -> Option<Self> {
        Some(match m {
            mode::CURSOR_DEFAULT => Self::Default,
            mode::CURSOR_POINTER => Self::Pointer,
            mode::CURSOR_TEXT => Self::Text,
            mode::CURSOR_MOVE => Self::Move,
            mode::CURSOR_WAIT => Self::Wait,
            mode::CURSOR_RESIZE_HORIZONTAL => Self::ResizeHorizontal,
            mode::CURSOR_RESIZE_VERTICAL => Self::ResizeVertical,
            _ => return None,
        })
    }
}

/// Computed style of a node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeStyle {
    pub font_face: String,
    /// Pixels
    pub font_size: i32,
    pub font_id: FontId,
    /// ARGB
    pub text_color: u32,
    /// ARGB, modulates everything the node paints
    pub tint: u32,
    /// Extra line spacing in pixels
    pub leading: i32,
    /// Hanging paragraph indent in pixels
    pub indent: i32,
    pub justification: Justification,
    pub white_space: WhiteSpace,
    pub wrap: WrapMode,
    pub cursor: Cursor,
    pub flags: StyleFlags,
}

impl NodeStyle {
    /// Differences that change how text splits into tokens
    pub fn needs_reconstruct(&self, other: &NodeStyle) -> bool {
        self.font_id != other.font_id || self.white_space != other.white_space || self.wrap != other.wrap
    }

    /// Differences that change measured text, but not its tokens
    pub fn needs_remeasure(&self, other: &NodeStyle) -> bool {
        self.font_size != other.font_size
            || self.leading != other.leading
            || self.indent != other.indent
            || self.justification != other.justification
            || self.text_color != other.text_color
            || self.tint != other.tint
            || self.flags.contains(StyleFlags::UNDERLINE) != other.flags.contains(StyleFlags::UNDERLINE)
    }

    #[inline]
    pub fn font_flags(&self) -> StyleFlags {
        self.flags & StyleFlags::FONT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_layout() {
        use LayoutMode::*;
        assert_eq!(LayoutMode::establish(Block, Some(Block)), Block);
        assert_eq!(LayoutMode::establish(Inline, Some(Block)), InlineContainer);
        assert_eq!(LayoutMode::establish(Inline, Some(InlineContainer)), Inline);
        assert_eq!(LayoutMode::establish(Inline, Some(Inline)), Inline);
        assert_eq!(LayoutMode::establish(Block, Some(None)), None);
        assert_eq!(LayoutMode::establish(Inline, Option::None), InlineContainer);
    }

    #[test]
    fn test_style_diff() {
        let a = NodeStyle::default();
        let mut b = a.clone();
        b.text_color = 0xFFFF_0000;
        assert!(!a.needs_reconstruct(&b));
        assert!(a.needs_remeasure(&b));

        let mut c = a.clone();
        c.wrap = WrapMode::None;
        assert!(a.needs_reconstruct(&c));
        assert!(!a.needs_remeasure(&c));
    }

    #[test]
    fn test_modes_decode() {
        assert_eq!(LayoutMode::from_mode(mode::LAYOUT_INLINE), Some(LayoutMode::Inline));
        assert_eq!(LayoutMode::from_mode(mode::UNDEFINED), Option::None);
        assert_eq!(Justification::from_mode(mode::JUSTIFY_FLUSH), Some(Justification::Flush));
        assert_eq!(Cursor::from_mode(mode::CURSOR_TEXT), Some(Cursor::Text));
    }
}
