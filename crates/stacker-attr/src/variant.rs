//! Parsed values and assignment operators
//!
//! The markup parser hands the engine `lhs op= rhs` triples. The value is a
//! tagged [`Variant`] plus a [`ValueSemantic`] describing how the literal was
//! written (`50%`, `#ff0000`, `url(...)`, a bare token, ...).

use std::fmt;

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Operator {
    /// `=`
    #[default]
    Set = 0,
    /// `:=` - assignment that always produces a folded record
    Override = 1,
    /// `+=`
    Add = 2,
    /// `-=`
    Subtract = 3,
    /// `*=`
    Multiply = 4,
    /// `/=`
    Divide = 5,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Set,
        Operator::Override,
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    /// Decode from header bits
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    /// Modifiers need a base value to act on
    #[inline]
    pub fn is_modifier(self) -> bool {
        !matches!(self, Self::Set | Self::Override)
    }

    #[inline]
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Subtract)
    }

    #[inline]
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Self::Multiply | Self::Divide)
    }

    /// Single-bit mask for operator sets
    #[inline]
    pub const fn mask(self) -> OperatorMask {
        OperatorMask::from_bits_retain(1 << (self as u8))
    }

    /// Markup spelling
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Override => ":=",
            Self::Add => "+=",
            Self::Subtract => "-=",
            Self::Multiply => "*=",
            Self::Divide => "/=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

bitflags::bitflags! {
    /// Set of operators an attribute semantic accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperatorMask: u8 {
        const SET = 1 << 0;
        const OVERRIDE = 1 << 1;
        const ADD = 1 << 2;
        const SUBTRACT = 1 << 3;
        const MULTIPLY = 1 << 4;
        const DIVIDE = 1 << 5;
        const ASSIGN = Self::SET.bits() | Self::OVERRIDE.bits();
        const ADDITIVE = Self::ADD.bits() | Self::SUBTRACT.bits();
        const ARITHMETIC = Self::ADDITIVE.bits() | Self::MULTIPLY.bits() | Self::DIVIDE.bits();
    }
}

impl OperatorMask {
    #[inline]
    pub fn permits(self, op: Operator) -> bool {
        self.contains(op.mask())
    }
}

/// How a literal was written in the markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueSemantic {
    /// Plain number or string
    #[default]
    None,
    /// `true` / `false` / `0` / `1`
    Boolean,
    /// Number followed by `%`
    Percentage,
    /// `#aarrggbb` literal
    Color,
    /// `url(...)`
    Url,
    /// Comma or whitespace separated strings
    StringList,
    /// Bare identifier (`auto`, `block`, `red`)
    Token,
    /// Edge bitmask or edge names
    Edges,
}

/// Tagged value produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Integer(i32),
    Float(f32),
    String(String),
}

impl Variant {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Integer(v) => Some(*v as f64),
            Variant::Float(v) => Some(*v as f64),
            Variant::String(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == Some(0.0)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Integer(v)
    }
}

impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Variant::Float(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

/// One parsed `lhs op= rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssignment {
    pub name: crate::AttributeName,
    pub op: Operator,
    pub value: Variant,
    pub semantic: ValueSemantic,
}

impl AttributeAssignment {
    pub fn new(
        name: crate::AttributeName,
        op: Operator,
        value: impl Into<Variant>,
        semantic: ValueSemantic,
    ) -> Self {
        Self {
            name,
            op,
            value: value.into(),
            semantic,
        }
    }

    /// Plain assignment with no value semantic
    pub fn set(name: crate::AttributeName, value: impl Into<Variant>) -> Self {
        Self::new(name, Operator::Set, value, ValueSemantic::None)
    }

    /// Assignment of a bare token such as `auto` or `block`
    pub fn token(name: crate::AttributeName, op: Operator, token: &str) -> Self {
        Self::new(name, op, token, ValueSemantic::Token)
    }
}
