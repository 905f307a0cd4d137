//! Property tests for encoding and folding

use proptest::prelude::*;
use stacker_attr::{
    Attribute, AttributeBuffer, AttributeData, AttributeName, Operator, StorageType, ValueSemantic, Variant, fold,
    fixed, mode, string_set,
};

fn width(m: u8, op: Operator, raw: i16) -> Attribute {
    Attribute::int16(AttributeName::Width, m, op, raw)
}

fn fold_sequentially(base: &Attribute, modifiers: &[Attribute]) -> Attribute {
    modifiers.iter().fold(base.clone(), |acc, m| fold(&acc, m).unwrap())
}

/// Modifiers composed into one before being applied to `base`
fn fold_composed(base: &Attribute, modifiers: &[Attribute]) -> Attribute {
    let composed = modifiers[1..]
        .iter()
        .fold(modifiers[0].clone(), |acc, m| fold(&acc, m).unwrap());
    fold(base, &composed).unwrap()
}

fn additive(subtract: bool) -> Operator {
    if subtract { Operator::Subtract } else { Operator::Add }
}

fn multiplicative(divide: bool) -> Operator {
    if divide { Operator::Divide } else { Operator::Multiply }
}

proptest! {
    #[test]
    fn integers_use_narrowest_storage(v in any::<i32>()) {
        let mut buf = AttributeBuffer::new();
        buf.set(AttributeName::Width, &Variant::Integer(v), ValueSemantic::None, Operator::Set, false).unwrap();
        let width = buf.find(AttributeName::Width).unwrap();
        let expected = if i16::try_from(v).is_ok() { StorageType::Int16 } else { StorageType::Int32 };
        prop_assert_eq!(width.storage(), expected);
        prop_assert_eq!(width.read_int(), v);
    }

    #[test]
    fn percentages_round_trip(p in 0i32..=100) {
        let mut buf = AttributeBuffer::new();
        buf.set(AttributeName::Height, &Variant::Integer(p), ValueSemantic::Percentage, Operator::Set, false).unwrap();
        let height = buf.find(AttributeName::Height).unwrap();
        prop_assert_eq!(height.mode(), mode::FRACTIONAL);
        prop_assert!((height.read_float() * 100.0 - p as f32).abs() < 0.01);
    }

    #[test]
    fn additive_folding_is_associative(a in -1000i16..1000, b in -1000i16..1000, c in -1000i16..1000) {
        let base = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Set, a);
        let add_b = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Add, b);
        let sub_c = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Subtract, c);

        let left = fold(&fold(&base, &add_b).unwrap(), &sub_c).unwrap();
        let right = fold(&base, &fold(&add_b, &sub_c).unwrap()).unwrap();
        prop_assert_eq!(left.read_int(), right.read_int());
        prop_assert_eq!(left.read_int(), a as i32 + b as i32 - c as i32);
    }

    #[test]
    fn multiplicative_folding_is_associative(a in 1i16..100, b in 1i16..10, c in 1i16..10) {
        let base = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Set, a);
        let mul_b = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Multiply, b);
        let mul_c = Attribute::int16(AttributeName::Width, mode::ABSOLUTE, Operator::Multiply, c);

        let left = fold(&fold(&base, &mul_b).unwrap(), &mul_c).unwrap();
        let right = fold(&base, &fold(&mul_b, &mul_c).unwrap()).unwrap();
        prop_assert_eq!(left.read_int(), right.read_int());
    }

    #[test]
    fn string_sets_have_no_duplicates(words in prop::collection::vec("[a-d]{1,2}", 0..8)) {
        let input = words.join(" ");
        let stored = string_set::canonicalize(&input).unwrap();
        let elements: Vec<_> = string_set::elements(&stored).collect();
        let mut sorted = elements.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), elements.len());
        prop_assert_eq!(stored.last(), Some(&0u8));
    }

    #[test]
    fn fractional_additive_sequences_compose(
        base in 40i32..=60,
        steps in prop::collection::vec((any::<bool>(), 0i32..=10), 1..4),
    ) {
        let base = width(mode::FRACTIONAL, Operator::Set, fixed::percent_to_i16(base));
        let modifiers: Vec<Attribute> = steps
            .iter()
            .map(|&(sub, p)| width(mode::FRACTIONAL, additive(sub), fixed::percent_to_i16(p)))
            .collect();

        let sequential = fold_sequentially(&base, &modifiers);
        let composed = fold_composed(&base, &modifiers);
        prop_assert_eq!(composed.mode(), mode::FRACTIONAL);
        prop_assert_eq!(sequential.read_int(), composed.read_int());
    }

    #[test]
    fn fractional_multiplicative_pairs_compose(
        base in 5i32..=24,
        first in (any::<bool>(), 50i32..=100),
        second in (any::<bool>(), 50i32..=100),
    ) {
        let base = width(mode::FRACTIONAL, Operator::Set, fixed::percent_to_i16(base));
        let modifiers: Vec<Attribute> = [first, second]
            .iter()
            .map(|&(div, p)| width(mode::FRACTIONAL, multiplicative(div), fixed::percent_to_i16(p)))
            .collect();

        let sequential = fold_sequentially(&base, &modifiers);
        let composed = fold_composed(&base, &modifiers);
        prop_assert_eq!(composed.mode(), mode::FRACTIONAL);
        prop_assert!((sequential.read_int() - composed.read_int()).abs() <= 16);
    }

    #[test]
    fn absolute_multiplicative_sequences_compose(
        base in 1i16..1000,
        steps in prop::collection::vec((any::<bool>(), 1i16..8), 1..4),
    ) {
        let base = width(mode::ABSOLUTE, Operator::Set, base);
        let modifiers: Vec<Attribute> = steps
            .iter()
            .map(|&(div, f)| width(mode::ABSOLUTE, multiplicative(div), f))
            .collect();

        let sequential = fold_sequentially(&base, &modifiers).read_float();
        let composed = fold_composed(&base, &modifiers).read_float();
        prop_assert!((sequential - composed).abs() <= sequential.abs() * 1e-4);
    }
}
