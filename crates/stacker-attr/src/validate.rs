//! Value validation
//!
//! Turns a parsed `(name, value, semantic, op)` into an encoded record, or
//! rejects it. Nothing is written to a buffer until encoding succeeds.

use crate::buffer::{Attribute, AttributeData};
use crate::header::{StorageType, mode};
use crate::{AttrError, AttrResult, AttributeName, AttributeSemantic, Operator, ValueSemantic, Variant};
use crate::{fixed, string_set, tokens};

/// Encode a value for a non-shorthand attribute
pub fn encode(name: AttributeName, value: &Variant, semantic: ValueSemantic, op: Operator) -> AttrResult<Attribute> {
    let attr_semantic = name.semantic();
    if attr_semantic == AttributeSemantic::Shorthand {
        return Err(AttrError::InvalidOperation);
    }
    if !attr_semantic.operators().permits(op) {
        return Err(AttrError::InvalidOperation);
    }

    if is_undefined_token(attr_semantic, value, semantic) {
        if op.is_modifier() {
            return Err(AttrError::InvalidOperation);
        }
        return Ok(Attribute::mode_only(name, mode::UNDEFINED, op));
    }

    let attr = match attr_semantic {
        AttributeSemantic::Dimension | AttributeSemantic::AbsoluteDimension | AttributeSemantic::BackgroundSize => {
            encode_dimension(name, attr_semantic, value, semantic, op)?
        }
        AttributeSemantic::Real => match (value, semantic) {
            (Variant::String(_), _) => return Err(AttrError::TypeMismatch),
            (_, ValueSemantic::None) => encode_number(name, mode::VALUE, op, value)?,
            _ => return Err(AttrError::TypeMismatch),
        },
        AttributeSemantic::String | AttributeSemantic::Url => match value {
            Variant::String(s) if !s.as_bytes().contains(&0) => Attribute::string(name, mode::VALUE, op, s),
            _ => return Err(AttrError::TypeMismatch),
        },
        AttributeSemantic::StringSet => match value {
            Variant::String(s) => {
                let payload = string_set::canonicalize(s)?;
                Attribute::new(name, StorageType::String, mode::VALUE, op, payload)
            }
            _ => return Err(AttrError::TypeMismatch),
        },
        AttributeSemantic::Color => Attribute::int32(name, mode::VALUE, op, parse_color(value, semantic)? as i32),
        AttributeSemantic::Flag => Attribute::mode_only(name, parse_flag(value)?, op),
        AttributeSemantic::Edges => Attribute::mode_only(name, parse_edge_value(value)?, op),
        AttributeSemantic::Background => encode_background(name, value, semantic, op)?,
        AttributeSemantic::Alignment
        | AttributeSemantic::Justification
        | AttributeSemantic::Layout
        | AttributeSemantic::WhiteSpace
        | AttributeSemantic::WrapMode
        | AttributeSemantic::BoundingBox
        | AttributeSemantic::Cursor => match value {
            Variant::String(s) => {
                Attribute::mode_only(name, tokens::mode_for_token(attr_semantic, s).ok_or(AttrError::OutOfBounds)?, op)
            }
            _ => return Err(AttrError::TypeMismatch),
        },
        AttributeSemantic::Shorthand => return Err(AttrError::InvalidOperation),
    };

    if !attr_semantic.storage_mask(attr.mode()).permits(attr.storage()) {
        return Err(AttrError::TypeMismatch);
    }
    Ok(attr)
}

/// Encode a boolean edge toggle as an edge modifier on `target`
pub fn encode_edge_flag(
    target: AttributeName,
    bit: u8,
    value: &Variant,
    _semantic: ValueSemantic,
    op: Operator,
) -> AttrResult<Attribute> {
    if op.is_modifier() {
        return Err(AttrError::InvalidOperation);
    }
    let edge_op = if parse_flag(value)? == mode::TRUE {
        Operator::Add
    } else {
        Operator::Subtract
    };
    Ok(Attribute::mode_only(target, bit, edge_op))
}

fn is_undefined_token(attr_semantic: AttributeSemantic, value: &Variant, semantic: ValueSemantic) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    if !s.trim().eq_ignore_ascii_case(tokens::UNDEFINED) {
        return false;
    }
    match semantic {
        ValueSemantic::Token => true,
        ValueSemantic::None => !matches!(
            attr_semantic,
            AttributeSemantic::String | AttributeSemantic::Url | AttributeSemantic::StringSet
        ),
        _ => false,
    }
}

fn encode_dimension(
    name: AttributeName,
    attr_semantic: AttributeSemantic,
    value: &Variant,
    semantic: ValueSemantic,
    op: Operator,
) -> AttrResult<Attribute> {
    match (value, semantic) {
        (Variant::String(s), _) => {
            if op.is_modifier() {
                return Err(AttrError::InvalidOperation);
            }
            let m = tokens::mode_for_token(attr_semantic, s).ok_or(AttrError::OutOfBounds)?;
            Ok(Attribute::mode_only(name, m, op))
        }
        (_, ValueSemantic::Percentage) => {
            if attr_semantic == AttributeSemantic::AbsoluteDimension {
                return Err(AttrError::TypeMismatch);
            }
            let raw = match value {
                Variant::Integer(p) if (0..=100).contains(p) => fixed::percent_to_i16(*p),
                Variant::Float(p) if (0.0..=100.0).contains(p) => fixed::percent_f32_to_i16(*p),
                _ => return Err(AttrError::OutOfBounds),
            };
            if op == Operator::Divide && raw == 0 {
                return Err(AttrError::OutOfBounds);
            }
            Ok(Attribute::int16(name, mode::FRACTIONAL, op, raw))
        }
        (_, ValueSemantic::None) => encode_number(name, mode::ABSOLUTE, op, value),
        _ => Err(AttrError::TypeMismatch),
    }
}

fn encode_number(name: AttributeName, m: u8, op: Operator, value: &Variant) -> AttrResult<Attribute> {
    let number = value.as_f64().ok_or(AttrError::TypeMismatch)?;
    if !number.is_finite() {
        return Err(AttrError::OutOfBounds);
    }
    if op == Operator::Divide && number == 0.0 {
        return Err(AttrError::OutOfBounds);
    }
    Ok(match value {
        Variant::Integer(v) => narrow_int(name, m, op, *v),
        _ => narrow(name, m, op, number),
    })
}

fn narrow_int(name: AttributeName, m: u8, op: Operator, v: i32) -> Attribute {
    match i16::try_from(v) {
        Ok(small) => Attribute::int16(name, m, op, small),
        Err(_) => Attribute::int32(name, m, op, v),
    }
}

/// Narrowest numeric record holding `value`: int16, then int32, then float32
pub fn narrow(name: AttributeName, m: u8, op: Operator, value: f64) -> Attribute {
    if value.fract() == 0.0 {
        if value >= i16::MIN as f64 && value <= i16::MAX as f64 {
            return Attribute::int16(name, m, op, value as i16);
        }
        if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
            return Attribute::int32(name, m, op, value as i32);
        }
    }
    Attribute::float32(name, m, op, value as f32)
}

/// ARGB colour from an integer, a named colour or a hex literal
pub fn parse_color(value: &Variant, semantic: ValueSemantic) -> AttrResult<u32> {
    match (value, semantic) {
        (Variant::Integer(v), ValueSemantic::Color | ValueSemantic::None) => Ok(*v as u32),
        (Variant::String(s), _) => {
            let s = s.trim();
            tokens::named_color(s)
                .or_else(|| tokens::parse_hex_color(s))
                .ok_or(AttrError::OutOfBounds)
        }
        _ => Err(AttrError::TypeMismatch),
    }
}

fn parse_flag(value: &Variant) -> AttrResult<u8> {
    match value {
        Variant::Integer(0) => Ok(mode::FALSE),
        Variant::Integer(1) => Ok(mode::TRUE),
        Variant::Integer(_) => Err(AttrError::OutOfBounds),
        Variant::String(s) => tokens::mode_for_token(AttributeSemantic::Flag, s.trim()).ok_or(AttrError::OutOfBounds),
        Variant::Float(_) => Err(AttrError::TypeMismatch),
    }
}

fn parse_edge_value(value: &Variant) -> AttrResult<u8> {
    match value {
        Variant::String(s) => tokens::parse_edges(s).ok_or(AttrError::OutOfBounds),
        Variant::Integer(mask) if (0..=(mode::EDGE_ALL | mode::EDGE_NONE) as i32).contains(mask) => {
            Ok(tokens::normalize_edges(*mask as u8))
        }
        Variant::Integer(_) => Err(AttrError::OutOfBounds),
        Variant::Float(_) => Err(AttrError::TypeMismatch),
    }
}

fn encode_background(name: AttributeName, value: &Variant, semantic: ValueSemantic, op: Operator) -> AttrResult<Attribute> {
    match (value, semantic) {
        (Variant::String(s), ValueSemantic::Url) => Ok(Attribute::string(name, mode::BACKGROUND_URL, op, s)),
        (Variant::String(s), _) => {
            if let Some(m) = tokens::mode_for_token(AttributeSemantic::Background, s.trim()) {
                return Ok(Attribute::mode_only(name, m, op));
            }
            let argb = parse_color(value, semantic)?;
            Ok(Attribute::int32(name, mode::BACKGROUND_COLOR, op, argb as i32))
        }
        (Variant::Integer(_), _) => {
            let argb = parse_color(value, semantic)?;
            Ok(Attribute::int32(name, mode::BACKGROUND_COLOR, op, argb as i32))
        }
        (Variant::Float(_), _) => Err(AttrError::TypeMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(name: AttributeName, value: impl Into<Variant>, semantic: ValueSemantic) -> AttrResult<Attribute> {
        encode(name, &value.into(), semantic, Operator::Set)
    }

    #[test]
    fn test_narrowest_storage() {
        assert_eq!(enc(AttributeName::Width, 100, ValueSemantic::None).unwrap().storage(), StorageType::Int16);
        assert_eq!(enc(AttributeName::Width, 70000, ValueSemantic::None).unwrap().storage(), StorageType::Int32);
        assert_eq!(enc(AttributeName::Width, 12.0f32, ValueSemantic::None).unwrap().storage(), StorageType::Int16);
        assert_eq!(enc(AttributeName::Width, 12.5f32, ValueSemantic::None).unwrap().storage(), StorageType::Float32);
    }

    #[test]
    fn test_percentages() {
        let half = enc(AttributeName::Width, 50, ValueSemantic::Percentage).unwrap();
        assert_eq!(half.mode(), mode::FRACTIONAL);
        assert_eq!(half.read_int(), 16383);
        assert_eq!(enc(AttributeName::Width, 101, ValueSemantic::Percentage), Err(AttrError::OutOfBounds));
        assert_eq!(enc(AttributeName::FontSize, 50, ValueSemantic::Percentage), Err(AttrError::TypeMismatch));
    }

    #[test]
    fn test_undefined_token() {
        let attr = enc(AttributeName::Layout, "undefined", ValueSemantic::Token).unwrap();
        assert_eq!(attr.mode(), mode::UNDEFINED);
        assert_eq!(attr.storage(), StorageType::None);
        // A font may legitimately be called "undefined"
        let font = enc(AttributeName::Font, "undefined", ValueSemantic::None).unwrap();
        assert_eq!(font.read_str(), "undefined");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(enc(AttributeName::Width, "auto", ValueSemantic::Token).unwrap().mode(), mode::AUTO);
        assert_eq!(enc(AttributeName::Width, "sideways", ValueSemantic::Token), Err(AttrError::OutOfBounds));
        assert_eq!(enc(AttributeName::Layout, 3, ValueSemantic::None), Err(AttrError::TypeMismatch));
    }

    #[test]
    fn test_operator_checks() {
        let err = encode(AttributeName::Layout, &"block".into(), ValueSemantic::Token, Operator::Add);
        assert_eq!(err, Err(AttrError::InvalidOperation));
        let err = encode(AttributeName::Width, &0.into(), ValueSemantic::None, Operator::Divide);
        assert_eq!(err, Err(AttrError::OutOfBounds));
    }

    #[test]
    fn test_colors_and_flags() {
        assert_eq!(enc(AttributeName::Color, "red", ValueSemantic::Token).unwrap().read_int() as u32, 0xFFFF_0000);
        assert_eq!(
            enc(AttributeName::Color, 0x8000_00FFu32 as i32, ValueSemantic::Color).unwrap().read_int() as u32,
            0x8000_00FF
        );
        assert_eq!(enc(AttributeName::Bold, 1, ValueSemantic::Boolean).unwrap().mode(), mode::TRUE);
        assert_eq!(enc(AttributeName::Bold, "false", ValueSemantic::Token).unwrap().mode(), mode::FALSE);
        assert_eq!(enc(AttributeName::Bold, 2, ValueSemantic::Boolean), Err(AttrError::OutOfBounds));
    }

    #[test]
    fn test_background() {
        let bg = enc(AttributeName::Background, "img/tile.png", ValueSemantic::Url).unwrap();
        assert_eq!(bg.mode(), mode::BACKGROUND_URL);
        assert_eq!(bg.read_str(), "img/tile.png");
        let bg = enc(AttributeName::Background, "#102030", ValueSemantic::Color).unwrap();
        assert_eq!(bg.mode(), mode::BACKGROUND_COLOR);
        assert_eq!(enc(AttributeName::Background, "none", ValueSemantic::Token).unwrap().mode(), mode::BACKGROUND_NONE);
    }
}
