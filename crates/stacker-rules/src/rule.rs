//! Style rules
//!
//! A rule pairs a parsed selector with an attribute buffer. Rules live in a
//! [`RuleTable`](crate::RuleTable) and are addressed by generational
//! [`RuleId`]s, so a handle to a destroyed rule never resolves to its
//! successor in the same slot.

use stacker_attr::{AttributeAssignment, AttributeBuffer, AttributeData, AttributeName, Operator, ValueSemantic, Variant};

use crate::error::{RuleError, RuleResult};
use crate::selector::{ParsedSelector, parse_selector};

/// Priority at and above which rules are weaker than a node's own attributes
pub const PRIORITY_OVERRIDE: i32 = 0;

/// Default priority for markup rules
pub const PRIORITY_DEFAULT: i32 = 10;

bitflags::bitflags! {
    /// Rule state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RuleFlags: u32 {
        const ENABLED = 1 << 0;
        /// Lives in the system table and applies to every document
        const GLOBAL = 1 << 1;
        /// Some attribute assigns or modifies `class`
        const MODIFIES_CLASS = 1 << 2;
        const IN_DOCUMENT_TABLE = 1 << 3;
        const IN_SYSTEM_TABLE = 1 << 4;
    }
}

impl RuleFlags {
    /// Bits the engine maintains itself
    pub const INTERNAL: RuleFlags = RuleFlags::MODIFIES_CLASS
        .union(RuleFlags::IN_DOCUMENT_TABLE)
        .union(RuleFlags::IN_SYSTEM_TABLE);
}

/// Which table owns a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleScope {
    System,
    Document,
}

/// Generational rule handle, valid only in the table that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId {
    /// Identity of the issuing table
    pub table: u32,
    pub scope: RuleScope,
    pub index: u32,
    pub generation: u32,
}

/// Selector plus attributes
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector_text: String,
    pub selector: ParsedSelector,
    pub attributes: AttributeBuffer,
    pub flags: RuleFlags,
    /// Lower numbers are stronger
    pub priority: i32,
    /// Bumped on every mutation, seeded from the system-wide counter
    pub revision: u64,
    /// Creation order, breaks priority ties
    pub order: u64,
}

impl Rule {
    /// Parse the selector and store the attributes. Attribute failures
    /// abort creation.
    pub fn new(selector_text: &str, attributes: &[AttributeAssignment], flags: RuleFlags, priority: i32) -> RuleResult<Self> {
        if selector_text.trim().is_empty() {
            return Err(RuleError::MissingSelector);
        }
        let selector = parse_selector(selector_text)?;
        let mut rule = Self {
            selector_text: selector_text.trim().to_string(),
            selector,
            attributes: AttributeBuffer::new(),
            flags: flags - RuleFlags::INTERNAL,
            priority,
            revision: 0,
            order: 0,
        };
        for a in attributes {
            rule.attributes.set(a.name, &a.value, a.semantic, a.op, true)?;
        }
        rule.refresh_flags();
        Ok(rule)
    }

    /// Store one attribute. Returns whether the buffer changed.
    pub fn set_attribute(
        &mut self,
        name: AttributeName,
        value: &Variant,
        semantic: ValueSemantic,
        op: Operator,
    ) -> RuleResult<bool> {
        let changed = self.attributes.set(name, value, semantic, op, true)?;
        if changed {
            self.refresh_flags();
        }
        Ok(changed)
    }

    fn refresh_flags(&mut self) {
        let modifies_class = self.attributes.iter().any(|a| a.name() == AttributeName::Class);
        self.flags.set(RuleFlags::MODIFIES_CLASS, modifies_class);
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(RuleFlags::ENABLED)
    }

    #[inline]
    pub fn modifies_class(&self) -> bool {
        self.flags.contains(RuleFlags::MODIFIES_CLASS)
    }

    /// Outranks the attributes of the node it matches
    #[inline]
    pub fn overrides_node(&self) -> bool {
        self.priority < PRIORITY_OVERRIDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifies_class_is_derived() {
        let rule = Rule::new(
            ".a",
            &[AttributeAssignment::new(AttributeName::Class, Operator::Add, "b", ValueSemantic::StringList)],
            RuleFlags::ENABLED | RuleFlags::MODIFIES_CLASS | RuleFlags::IN_SYSTEM_TABLE,
            PRIORITY_DEFAULT,
        )
        .unwrap();
        assert!(rule.modifies_class());
        assert!(!rule.flags.contains(RuleFlags::IN_SYSTEM_TABLE));

        let plain = Rule::new("p", &[AttributeAssignment::set(AttributeName::Width, 4)], RuleFlags::ENABLED, 0).unwrap();
        assert!(!plain.modifies_class());
    }

    #[test]
    fn test_rule_errors() {
        assert_eq!(Rule::new(" ", &[], RuleFlags::ENABLED, 0).unwrap_err(), RuleError::MissingSelector);
        assert!(matches!(
            Rule::new("p.", &[], RuleFlags::ENABLED, 0).unwrap_err(),
            RuleError::Selector(_)
        ));
        let bad = [AttributeAssignment::token(AttributeName::Layout, Operator::Set, "grid")];
        assert_eq!(
            Rule::new("p", &bad, RuleFlags::ENABLED, 0).unwrap_err(),
            RuleError::Attr(stacker_attr::AttrError::OutOfBounds)
        );
    }
}
