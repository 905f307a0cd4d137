//! Operator folding
//!
//! `fold(a, b)` computes one record equivalent to applying `a` then `b`.
//! An assignment followed by a modifier yields an assignment. Two modifiers
//! of the same family compose into one modifier; mixing families does not
//! compose and reports [`AttrError::CannotFold`].

use crate::buffer::{Attribute, AttributeData};
use crate::header::{StorageType, mode};
use crate::validate::narrow;
use crate::{AttrError, AttrResult, AttributeSemantic, Operator, fixed, string_set, tokens};

use AttributeSemantic as S;

/// Compose two records for the same attribute. The result is marked folded.
pub fn fold<A, B>(a: &A, b: &B) -> AttrResult<Attribute>
where
    A: AttributeData + ?Sized,
    B: AttributeData + ?Sized,
{
    if a.name() != b.name() {
        return Err(AttrError::InvalidOperation);
    }
    if !b.op().is_modifier() {
        return Ok(b.to_attribute().with_folded(true));
    }
    let result = if a.op().is_modifier() {
        compose(a, b)?
    } else {
        apply(a, b)?
    };
    Ok(result.with_folded(true))
}

/// Modes that carry a value a modifier can act on
fn has_value(semantic: AttributeSemantic, m: u8) -> bool {
    match semantic {
        AttributeSemantic::Dimension | AttributeSemantic::AbsoluteDimension | AttributeSemantic::BackgroundSize => {
            m == mode::ABSOLUTE || m == mode::FRACTIONAL
        }
        AttributeSemantic::Edges => m != mode::UNDEFINED,
        _ => m == mode::VALUE,
    }
}

/// Raw payload number, without fraction scaling
fn number<D: AttributeData + ?Sized>(d: &D) -> f64 {
    match d.storage() {
        StorageType::Float32 => d.read_float() as f64,
        _ => d.read_int() as f64,
    }
}

/// Multiplicative factor a record stands for
fn factor<D: AttributeData + ?Sized>(d: &D) -> f64 {
    if d.mode() == mode::FRACTIONAL {
        number(d) / fixed::INT16_ONE as f64
    } else {
        number(d)
    }
}

/// Assignment `a` followed by modifier `b`; keeps `a`'s operator
fn apply<A, B>(a: &A, b: &B) -> AttrResult<Attribute>
where
    A: AttributeData + ?Sized,
    B: AttributeData + ?Sized,
{
    let name = a.name();
    let semantic = name.semantic();
    if !has_value(semantic, a.mode()) {
        // auto and undefined bases absorb modifiers
        return Ok(a.to_attribute());
    }
    let op = a.op();
    match semantic {
        S::Dimension | S::AbsoluteDimension | S::BackgroundSize | S::Real => apply_number(a, b),
        S::Color => match b.op() {
            Operator::Multiply => Ok(Attribute::int32(
                name,
                a.mode(),
                op,
                modulate(a.read_int() as u32, b.read_int() as u32) as i32,
            )),
            _ => Err(AttrError::InvalidOperation),
        },
        S::Edges => {
            let m = match b.op() {
                Operator::Add => a.mode() | b.mode(),
                Operator::Subtract => a.mode() & !b.mode(),
                _ => return Err(AttrError::InvalidOperation),
            };
            Ok(Attribute::mode_only(name, tokens::normalize_edges(m), op))
        }
        S::String | S::Url => match b.op() {
            Operator::Add => {
                let joined = format!("{}{}", a.read_str(), b.read_str());
                Ok(Attribute::string(name, a.mode(), op, &joined))
            }
            _ => Err(AttrError::InvalidOperation),
        },
        S::StringSet => {
            let payload = match b.op() {
                Operator::Add => string_set::union(a.payload(), b.payload()),
                Operator::Subtract => string_set::difference(a.payload(), b.payload()),
                _ => return Err(AttrError::InvalidOperation),
            };
            Ok(Attribute::new(name, StorageType::String, a.mode(), op, payload))
        }
        _ => Err(AttrError::InvalidOperation),
    }
}

fn apply_number<A, B>(a: &A, b: &B) -> AttrResult<Attribute>
where
    A: AttributeData + ?Sized,
    B: AttributeData + ?Sized,
{
    let name = a.name();
    let op = a.op();
    let fractional = a.mode() == mode::FRACTIONAL;
    match b.op() {
        Operator::Add | Operator::Subtract => {
            if a.mode() != b.mode() {
                return Err(AttrError::CannotFold);
            }
            let rhs = if b.op() == Operator::Subtract { -number(b) } else { number(b) };
            let sum = number(a) + rhs;
            if fractional {
                Ok(Attribute::int16(name, mode::FRACTIONAL, op, fixed::clamp(sum as i64) as i16))
            } else {
                Ok(narrow(name, a.mode(), op, sum))
            }
        }
        Operator::Multiply | Operator::Divide => {
            let divide = b.op() == Operator::Divide;
            if fractional {
                let raw = if b.mode() == mode::FRACTIONAL {
                    let (x, y) = (number(a) as i32, number(b) as i32);
                    if divide { fixed::div(x, y) } else { fixed::mul(x, y) }
                } else {
                    let f = factor(b);
                    if divide && f == 0.0 {
                        return Err(AttrError::OutOfBounds);
                    }
                    let scaled = if divide { number(a) / f } else { number(a) * f };
                    scaled.round() as i32
                };
                Ok(Attribute::int16(name, mode::FRACTIONAL, op, fixed::clamp(raw as i64) as i16))
            } else {
                let f = factor(b);
                if divide && f == 0.0 {
                    return Err(AttrError::OutOfBounds);
                }
                let value = if divide { number(a) / f } else { number(a) * f };
                Ok(narrow(name, a.mode(), op, value))
            }
        }
        _ => Err(AttrError::InvalidOperation),
    }
}

/// Two modifiers composed into one
fn compose<A, B>(a: &A, b: &B) -> AttrResult<Attribute>
where
    A: AttributeData + ?Sized,
    B: AttributeData + ?Sized,
{
    let name = a.name();
    let (x, y) = (a.op(), b.op());
    let same_family = (x.is_additive() && y.is_additive()) || (x.is_multiplicative() && y.is_multiplicative());
    if !same_family {
        return Err(AttrError::CannotFold);
    }
    match name.semantic() {
        S::Dimension | S::AbsoluteDimension | S::BackgroundSize | S::Real => compose_number(a, b),
        S::Color => Ok(Attribute::int32(
            name,
            a.mode(),
            x,
            modulate(a.read_int() as u32, b.read_int() as u32) as i32,
        )),
        S::Edges => {
            if x != y {
                return Err(AttrError::CannotFold);
            }
            Ok(Attribute::mode_only(name, tokens::normalize_edges(a.mode() | b.mode()), x))
        }
        S::String | S::Url => {
            let joined = format!("{}{}", a.read_str(), b.read_str());
            Ok(Attribute::string(name, a.mode(), x, &joined))
        }
        S::StringSet => {
            if x != y {
                return Err(AttrError::CannotFold);
            }
            let payload = string_set::union(a.payload(), b.payload());
            Ok(Attribute::new(name, StorageType::String, a.mode(), x, payload))
        }
        _ => Err(AttrError::InvalidOperation),
    }
}

fn compose_number<A, B>(a: &A, b: &B) -> AttrResult<Attribute>
where
    A: AttributeData + ?Sized,
    B: AttributeData + ?Sized,
{
    let name = a.name();
    let (x, y) = (a.op(), b.op());
    if x.is_additive() {
        if a.mode() != b.mode() {
            return Err(AttrError::CannotFold);
        }
        // Signed net in the first operator's convention; a negative net flips it
        let net = if x == y { number(a) + number(b) } else { number(a) - number(b) };
        let (op, value) = if net < 0.0 { (flip_additive(x), -net) } else { (x, net) };
        if a.mode() == mode::FRACTIONAL {
            return Ok(Attribute::int16(name, mode::FRACTIONAL, op, fixed::clamp(value as i64) as i16));
        }
        return Ok(narrow(name, a.mode(), op, value));
    }

    if a.mode() == mode::FRACTIONAL && b.mode() == mode::FRACTIONAL && x == y {
        let raw = fixed::mul(number(a) as i32, number(b) as i32);
        return Ok(Attribute::int16(name, mode::FRACTIONAL, x, fixed::clamp(raw as i64) as i16));
    }
    let (fa, fb) = (factor(a), factor(b));
    let value = if x == y {
        fa * fb
    } else {
        if fb == 0.0 {
            return Err(AttrError::OutOfBounds);
        }
        fa / fb
    };
    if value == 0.0 && x == Operator::Divide {
        return Err(AttrError::OutOfBounds);
    }
    let m = if name.semantic() == S::Real { mode::VALUE } else { mode::ABSOLUTE };
    Ok(narrow(name, m, x, value))
}

fn flip_additive(op: Operator) -> Operator {
    match op {
        Operator::Add => Operator::Subtract,
        _ => Operator::Add,
    }
}

/// Per-channel product of two ARGB colours
pub fn modulate(x: u32, y: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0, 8, 16, 24] {
        let cx = (x >> shift) & 0xFF;
        let cy = (y >> shift) & 0xFF;
        out |= ((cx * cy + 127) / 255) << shift;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeName;

    fn width(op: Operator, v: i16) -> Attribute {
        Attribute::int16(AttributeName::Width, mode::ABSOLUTE, op, v)
    }

    fn width_pct(op: Operator, p: i32) -> Attribute {
        Attribute::int16(AttributeName::Width, mode::FRACTIONAL, op, fixed::percent_to_i16(p))
    }

    #[test]
    fn test_set_then_modifiers() {
        let r = fold(&width(Operator::Set, 100), &width(Operator::Add, 5)).unwrap();
        assert_eq!(r.op(), Operator::Set);
        assert_eq!(r.read_int(), 105);
        assert!(r.is_folded());
        let r = fold(&r, &width(Operator::Multiply, 2)).unwrap();
        assert_eq!(r.read_int(), 210);
    }

    #[test]
    fn test_override_kept() {
        let r = fold(&width(Operator::Override, 10), &width(Operator::Subtract, 3)).unwrap();
        assert_eq!(r.op(), Operator::Override);
        assert_eq!(r.read_int(), 7);
    }

    #[test]
    fn test_modifier_composition() {
        let r = fold(&width(Operator::Add, 5), &width(Operator::Subtract, 2)).unwrap();
        assert_eq!((r.op(), r.read_int()), (Operator::Add, 3));
        let r = fold(&width(Operator::Subtract, 5), &width(Operator::Subtract, 2)).unwrap();
        assert_eq!((r.op(), r.read_int()), (Operator::Subtract, 7));
        let r = fold(&width(Operator::Subtract, 5), &width(Operator::Add, 2)).unwrap();
        assert_eq!((r.op(), r.read_int()), (Operator::Subtract, 3));
        let r = fold(&width(Operator::Multiply, 3), &width(Operator::Multiply, 2)).unwrap();
        assert_eq!((r.op(), r.read_int()), (Operator::Multiply, 6));
        let r = fold(&width(Operator::Multiply, 3), &width(Operator::Divide, 2)).unwrap();
        assert_eq!(r.storage(), StorageType::Float32);
        assert!((r.read_float() - 1.5).abs() < 1e-6);
        assert_eq!(
            fold(&width(Operator::Add, 1), &width(Operator::Multiply, 2)),
            Err(AttrError::CannotFold)
        );
    }

    #[test]
    fn test_fraction_mixing() {
        assert_eq!(
            fold(&width(Operator::Set, 10), &width_pct(Operator::Add, 10)),
            Err(AttrError::CannotFold)
        );
        let r = fold(&width(Operator::Set, 200), &width_pct(Operator::Multiply, 50)).unwrap();
        assert_eq!(r.read_int(), 100);
        let r = fold(&width_pct(Operator::Set, 100), &width_pct(Operator::Multiply, 50)).unwrap();
        assert_eq!(r.mode(), mode::FRACTIONAL);
        assert_eq!(r.read_int(), 16383);
    }

    #[test]
    fn test_fraction_composition_flips_on_negative_net() {
        let r = fold(&width_pct(Operator::Subtract, 20), &width_pct(Operator::Add, 30)).unwrap();
        assert_eq!(r.op(), Operator::Add);
        assert_eq!(r.read_int(), (fixed::percent_to_i16(30) - fixed::percent_to_i16(20)) as i32);

        let base = width_pct(Operator::Set, 50);
        let sequential = fold(
            &fold(&base, &width_pct(Operator::Subtract, 20)).unwrap(),
            &width_pct(Operator::Add, 30),
        )
        .unwrap();
        assert_eq!(fold(&base, &r).unwrap().read_int(), sequential.read_int());

        let r = fold(&width(Operator::Add, 2), &width(Operator::Subtract, 5)).unwrap();
        assert_eq!((r.op(), r.read_int()), (Operator::Subtract, 3));
    }

    #[test]
    fn test_auto_absorbs_modifiers() {
        let auto = Attribute::mode_only(AttributeName::Width, mode::AUTO, Operator::Set);
        let r = fold(&auto, &width(Operator::Add, 5)).unwrap();
        assert_eq!(r.mode(), mode::AUTO);
    }

    #[test]
    fn test_color_modulation() {
        assert_eq!(modulate(0xFFFF_FFFF, 0xFF80_4020), 0xFF80_4020);
        assert_eq!(modulate(0xFF00_0000, 0xFFFF_FFFF), 0xFF00_0000);
        let base = Attribute::int32(AttributeName::Color, mode::VALUE, Operator::Set, 0xFFFF_FFFFu32 as i32);
        let tint = Attribute::int32(AttributeName::Color, mode::VALUE, Operator::Multiply, 0x80FF_0000u32 as i32);
        assert_eq!(fold(&base, &tint).unwrap().read_int() as u32, 0x80FF_0000);
    }

    #[test]
    fn test_edges_fold() {
        let set = Attribute::mode_only(AttributeName::Clip, mode::EDGE_HORIZONTAL, Operator::Set);
        let sub = Attribute::mode_only(AttributeName::Clip, mode::EDGE_LEFT, Operator::Subtract);
        assert_eq!(fold(&set, &sub).unwrap().mode(), mode::EDGE_RIGHT);
        let add = Attribute::mode_only(AttributeName::Clip, mode::EDGE_TOP, Operator::Add);
        assert_eq!(fold(&sub, &add), Err(AttrError::CannotFold));
    }

    #[test]
    fn test_strings_concatenate() {
        let a = Attribute::string(AttributeName::Url, mode::VALUE, Operator::Set, "http://host/");
        let b = Attribute::string(AttributeName::Url, mode::VALUE, Operator::Add, "index");
        assert_eq!(fold(&a, &b).unwrap().read_str(), "http://host/index");
    }
}
