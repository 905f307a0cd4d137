//! Attribute Catalogue
//!
//! Fixed set of attribute names. Each name maps to one semantic that decides
//! which values, storage types and operators it accepts.

use crate::header::{StorageMask, mode};
use crate::OperatorMask;

/// Attribute identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AttributeName {
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    MarginLeft,
    MarginRight,
    MarginTop,
    MarginBottom,
    Padding,
    Margin,
    Font,
    FontSize,
    Bold,
    Italic,
    Underline,
    Leading,
    Indent,
    Color,
    Tint,
    Justify,
    Align,
    Valign,
    WhiteSpace,
    Wrap,
    Enabled,
    Layout,
    Class,
    Url,
    Clip,
    ClipLeft,
    ClipRight,
    ClipTop,
    ClipBottom,
    Flex,
    Background,
    BackgroundSize,
    BackgroundBox,
    Cursor,
    SelectionColor,
    SelectionFillColor,
}

/// Number of attribute names
pub const NUM_ATTRIBUTES: usize = 46;

/// Kind of value an attribute expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    /// Absolute, fractional or auto length
    Dimension,
    /// Absolute or auto length
    AbsoluteDimension,
    Real,
    String,
    StringSet,
    Url,
    Alignment,
    Justification,
    Color,
    Flag,
    Layout,
    Edges,
    WhiteSpace,
    WrapMode,
    Background,
    BackgroundSize,
    BoundingBox,
    Cursor,
    /// Expands into other attributes, has no storage of its own
    Shorthand,
}

/// Expansion of a shorthand name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    /// Same value assigned to four sides, in left/right/top/bottom order
    Sides([AttributeName; 4]),
    /// Boolean toggling one bit of an edges attribute
    EdgeFlag(AttributeName, u8),
}

impl AttributeName {
    pub const ALL: [AttributeName; NUM_ATTRIBUTES] = [
        Self::Width,
        Self::Height,
        Self::MinWidth,
        Self::MinHeight,
        Self::MaxWidth,
        Self::MaxHeight,
        Self::PaddingLeft,
        Self::PaddingRight,
        Self::PaddingTop,
        Self::PaddingBottom,
        Self::MarginLeft,
        Self::MarginRight,
        Self::MarginTop,
        Self::MarginBottom,
        Self::Padding,
        Self::Margin,
        Self::Font,
        Self::FontSize,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Leading,
        Self::Indent,
        Self::Color,
        Self::Tint,
        Self::Justify,
        Self::Align,
        Self::Valign,
        Self::WhiteSpace,
        Self::Wrap,
        Self::Enabled,
        Self::Layout,
        Self::Class,
        Self::Url,
        Self::Clip,
        Self::ClipLeft,
        Self::ClipRight,
        Self::ClipTop,
        Self::ClipBottom,
        Self::Flex,
        Self::Background,
        Self::BackgroundSize,
        Self::BackgroundBox,
        Self::Cursor,
        Self::SelectionColor,
        Self::SelectionFillColor,
    ];

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical markup spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::MinWidth => "min-width",
            Self::MinHeight => "min-height",
            Self::MaxWidth => "max-width",
            Self::MaxHeight => "max-height",
            Self::PaddingLeft => "padding-left",
            Self::PaddingRight => "padding-right",
            Self::PaddingTop => "padding-top",
            Self::PaddingBottom => "padding-bottom",
            Self::MarginLeft => "margin-left",
            Self::MarginRight => "margin-right",
            Self::MarginTop => "margin-top",
            Self::MarginBottom => "margin-bottom",
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Font => "font",
            Self::FontSize => "font-size",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Leading => "leading",
            Self::Indent => "indent",
            Self::Color => "color",
            Self::Tint => "tint",
            Self::Justify => "justify",
            Self::Align => "align",
            Self::Valign => "valign",
            Self::WhiteSpace => "white-space",
            Self::Wrap => "wrap",
            Self::Enabled => "enabled",
            Self::Layout => "layout",
            Self::Class => "class",
            Self::Url => "url",
            Self::Clip => "clip",
            Self::ClipLeft => "clip-left",
            Self::ClipRight => "clip-right",
            Self::ClipTop => "clip-top",
            Self::ClipBottom => "clip-bottom",
            Self::Flex => "flex",
            Self::Background => "background",
            Self::BackgroundSize => "background-size",
            Self::BackgroundBox => "background-box",
            Self::Cursor => "cursor",
            Self::SelectionColor => "selection-color",
            Self::SelectionFillColor => "selection-fill-color",
        }
    }

    /// Look up a name as written in markup. `_` and `-` are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
            .collect();
        Self::ALL.iter().copied().find(|n| n.as_str() == normalized)
    }

    pub fn semantic(self) -> AttributeSemantic {
        use AttributeSemantic as S;
        match self {
            Self::Width
            | Self::Height
            | Self::MinWidth
            | Self::MinHeight
            | Self::MaxWidth
            | Self::MaxHeight
            | Self::PaddingLeft
            | Self::PaddingRight
            | Self::PaddingTop
            | Self::PaddingBottom
            | Self::MarginLeft
            | Self::MarginRight
            | Self::MarginTop
            | Self::MarginBottom => S::Dimension,
            Self::FontSize | Self::Leading | Self::Indent => S::AbsoluteDimension,
            Self::Padding | Self::Margin => S::Shorthand,
            Self::ClipLeft | Self::ClipRight | Self::ClipTop | Self::ClipBottom => S::Shorthand,
            Self::Font => S::String,
            Self::Bold | Self::Italic | Self::Underline | Self::Enabled => S::Flag,
            Self::Color | Self::Tint | Self::SelectionColor | Self::SelectionFillColor => S::Color,
            Self::Justify => S::Justification,
            Self::Align | Self::Valign => S::Alignment,
            Self::WhiteSpace => S::WhiteSpace,
            Self::Wrap => S::WrapMode,
            Self::Layout => S::Layout,
            Self::Class => S::StringSet,
            Self::Url => S::Url,
            Self::Clip => S::Edges,
            Self::Flex => S::Real,
            Self::Background => S::Background,
            Self::BackgroundSize => S::BackgroundSize,
            Self::BackgroundBox => S::BoundingBox,
            Self::Cursor => S::Cursor,
        }
    }

    /// Whether descendants see this attribute when they do not set it
    pub fn is_inheritable(self) -> bool {
        matches!(
            self,
            Self::Font
                | Self::FontSize
                | Self::Bold
                | Self::Italic
                | Self::Underline
                | Self::Leading
                | Self::Indent
                | Self::Color
                | Self::Tint
                | Self::Justify
                | Self::WhiteSpace
                | Self::Wrap
                | Self::Enabled
                | Self::Cursor
                | Self::SelectionColor
                | Self::SelectionFillColor
        )
    }

    pub fn shorthand(self) -> Option<Shorthand> {
        Some(match self {
            Self::Padding => Shorthand::Sides([
                Self::PaddingLeft,
                Self::PaddingRight,
                Self::PaddingTop,
                Self::PaddingBottom,
            ]),
            Self::Margin => Shorthand::Sides([
                Self::MarginLeft,
                Self::MarginRight,
                Self::MarginTop,
                Self::MarginBottom,
            ]),
            Self::ClipLeft => Shorthand::EdgeFlag(Self::Clip, mode::EDGE_LEFT),
            Self::ClipRight => Shorthand::EdgeFlag(Self::Clip, mode::EDGE_RIGHT),
            Self::ClipTop => Shorthand::EdgeFlag(Self::Clip, mode::EDGE_TOP),
            Self::ClipBottom => Shorthand::EdgeFlag(Self::Clip, mode::EDGE_BOTTOM),
            _ => return None,
        })
    }

    /// Attributes whose change alters the font ID
    pub fn affects_font(self) -> bool {
        matches!(self, Self::Font | Self::FontSize | Self::Bold | Self::Italic | Self::Underline)
    }
}

impl std::fmt::Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AttributeSemantic {
    /// Operators the semantic accepts
    pub fn operators(self) -> OperatorMask {
        match self {
            Self::Dimension | Self::AbsoluteDimension | Self::Real => {
                OperatorMask::ASSIGN | OperatorMask::ARITHMETIC
            }
            Self::Color => OperatorMask::ASSIGN | OperatorMask::MULTIPLY,
            Self::StringSet | Self::Edges => OperatorMask::ASSIGN | OperatorMask::ADDITIVE,
            Self::String | Self::Url => OperatorMask::ASSIGN | OperatorMask::ADD,
            Self::Shorthand => OperatorMask::ASSIGN | OperatorMask::ARITHMETIC,
            _ => OperatorMask::ASSIGN,
        }
    }

    /// Storage types permitted for a value in the given mode
    pub fn storage_mask(self, m: u8) -> StorageMask {
        if m == mode::UNDEFINED {
            return StorageMask::NONE;
        }
        match self {
            Self::Dimension | Self::AbsoluteDimension | Self::BackgroundSize => match m {
                mode::ABSOLUTE => StorageMask::NUMERIC,
                mode::FRACTIONAL => StorageMask::INT16,
                _ => StorageMask::NONE,
            },
            Self::Real => StorageMask::NUMERIC,
            Self::String | Self::Url | Self::StringSet => StorageMask::STRING,
            Self::Color => StorageMask::INT32,
            Self::Background => match m {
                mode::BACKGROUND_COLOR => StorageMask::INT32,
                mode::BACKGROUND_URL => StorageMask::STRING,
                _ => StorageMask::NONE,
            },
            _ => StorageMask::NONE,
        }
    }

    /// Numeric semantics fold with arithmetic
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Dimension | Self::AbsoluteDimension | Self::Real | Self::BackgroundSize
        )
    }
}

/// Bitset over attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct AttributeSet(u64);

impl AttributeSet {
    pub const EMPTY: AttributeSet = AttributeSet(0);

    #[inline]
    pub fn insert(&mut self, name: AttributeName) {
        self.0 |= 1 << name.index();
    }

    #[inline]
    pub fn remove(&mut self, name: AttributeName) {
        self.0 &= !(1 << name.index());
    }

    #[inline]
    pub fn contains(&self, name: AttributeName) -> bool {
        self.0 & (1 << name.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Is every member of `other` also in `self`
    pub fn is_superset(&self, other: &AttributeSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn iter(&self) -> impl Iterator<Item = AttributeName> + '_ {
        AttributeName::ALL.iter().copied().filter(move |n| self.contains(*n))
    }
}

impl FromIterator<AttributeName> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeName>>(iter: I) -> Self {
        let mut set = AttributeSet::EMPTY;
        for name in iter {
            set.insert(name);
        }
        set
    }
}
