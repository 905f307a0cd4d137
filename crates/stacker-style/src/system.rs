//! System
//!
//! Process-wide state shared by documents: configuration, the font
//! registry, the global rule table and the rule revision counters. The rule
//! API lives here because a rule goes either into the global table or into
//! a document's table.

use stacker_attr::{AttributeAssignment, AttributeName, Operator, ValueSemantic, Variant};
use stacker_rules::{Rule, RuleError, RuleFlags, RuleId, RuleScope, RuleTable};

use crate::font::{BasicFontRegistry, FontRegistry};
use crate::{Config, Document, StyleResult};

pub struct System {
    pub(crate) config: Config,
    pub(crate) fonts: Box<dyn FontRegistry>,
    pub(crate) rules: RuleTable,
    /// Source of rule revisions and creation order
    rule_revision: u64,
    /// Bumped whenever the set of matchable global rules changes
    pub(crate) table_revision: u64,
}

impl System {
    pub fn new(config: Config) -> Self {
        Self::with_font_registry(config, Box::new(BasicFontRegistry::new()))
    }

    pub fn with_font_registry(config: Config, fonts: Box<dyn FontRegistry>) -> Self {
        tracing::info!(
            max_matched_rules = config.max_matched_rules,
            font = %config.default_font_face,
            "style system initialized"
        );
        Self {
            config,
            fonts,
            rules: RuleTable::new(RuleScope::System),
            rule_revision: 0,
            table_revision: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fonts(&self) -> &dyn FontRegistry {
        self.fonts.as_ref()
    }

    pub fn fonts_mut(&mut self) -> &mut dyn FontRegistry {
        self.fonts.as_mut()
    }

    /// The global rule table
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Current value of the rule revision counter
    pub fn rule_revision(&self) -> u64 {
        self.rule_revision
    }

    fn next_revision(&mut self) -> u64 {
        self.rule_revision += 1;
        self.rule_revision
    }

    /// Note that the matchable rules of `scope` changed
    fn touch_table(&mut self, doc: Option<&mut Document>, scope: RuleScope) {
        match (scope, doc) {
            (RuleScope::Document, Some(doc)) => doc.table_revision += 1,
            _ => self.table_revision += 1,
        }
    }

    /// Create a rule. Rules flagged `GLOBAL`, or created without a document,
    /// go into the system table.
    pub fn create_rule(
        &mut self,
        doc: Option<&mut Document>,
        selector: &str,
        attributes: &[AttributeAssignment],
        flags: RuleFlags,
        priority: i32,
    ) -> StyleResult<RuleId> {
        let mut rule = Rule::new(selector, attributes, flags, priority)?;
        rule.revision = self.next_revision();
        rule.order = rule.revision;

        let global = doc.is_none() || flags.contains(RuleFlags::GLOBAL);
        let id = match doc {
            Some(doc) if !global => {
                doc.table_revision += 1;
                doc.rules.insert(rule)
            }
            _ => {
                self.table_revision += 1;
                self.rules.insert(rule)
            }
        };
        tracing::debug!(selector, priority, scope = ?id.scope, "created rule");
        Ok(id)
    }

    /// Destroy a rule. Handles to it stop resolving.
    pub fn destroy_rule(&mut self, doc: Option<&mut Document>, id: RuleId) -> StyleResult<()> {
        let rule = match (id.scope, doc) {
            (RuleScope::System, _) => {
                let rule = self.rules.remove(id)?;
                self.table_revision += 1;
                rule
            }
            (RuleScope::Document, Some(doc)) => {
                let rule = doc.rules.remove(id)?;
                doc.table_revision += 1;
                rule
            }
            (RuleScope::Document, None) => return Err(RuleError::NoSuchRule.into()),
        };
        self.next_revision();
        tracing::debug!(selector = %rule.selector_text, scope = ?id.scope, "destroyed rule");
        Ok(())
    }

    /// Look up a rule in the table its handle names
    pub fn rule<'a>(&'a self, doc: Option<&'a Document>, id: RuleId) -> Option<&'a Rule> {
        match id.scope {
            RuleScope::System => self.rules.get(id),
            RuleScope::Document => doc?.rules.get(id),
        }
    }

    fn rule_mut<'a>(&'a mut self, doc: Option<&'a mut Document>, id: RuleId) -> StyleResult<&'a mut Rule> {
        let rule = match id.scope {
            RuleScope::System => self.rules.get_mut(id),
            RuleScope::Document => doc.and_then(|d| d.rules.get_mut(id)),
        };
        Ok(rule.ok_or(RuleError::NoSuchRule)?)
    }

    pub fn rule_flags(&self, doc: Option<&Document>, id: RuleId) -> StyleResult<RuleFlags> {
        Ok(self.rule(doc, id).ok_or(RuleError::NoSuchRule)?.flags)
    }

    /// Replace the caller-controlled flags of a rule. Returns whether they
    /// changed.
    pub fn set_rule_flags(&mut self, mut doc: Option<&mut Document>, id: RuleId, flags: RuleFlags) -> StyleResult<bool> {
        let revision = self.rule_revision + 1;
        let rule = self.rule_mut(doc.as_deref_mut(), id)?;
        let kept = rule.flags & (RuleFlags::INTERNAL | RuleFlags::GLOBAL);
        let updated = kept | (flags - RuleFlags::INTERNAL - RuleFlags::GLOBAL);
        if updated == rule.flags {
            return Ok(false);
        }
        let enabled_changed = rule.is_enabled() != updated.contains(RuleFlags::ENABLED);
        rule.flags = updated;
        rule.revision = revision;
        self.rule_revision = revision;
        if enabled_changed {
            self.touch_table(doc, id.scope);
        }
        Ok(true)
    }

    /// Store one attribute on a rule. Returns whether the rule changed.
    pub fn set_rule_attribute(
        &mut self,
        mut doc: Option<&mut Document>,
        id: RuleId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: &Variant,
        op: Operator,
    ) -> StyleResult<bool> {
        let revision = self.rule_revision + 1;
        let rule = self.rule_mut(doc.as_deref_mut(), id)?;
        if !rule.set_attribute(name, value, semantic, op)? {
            return Ok(false);
        }
        rule.revision = revision;
        self.rule_revision = revision;
        if name == AttributeName::Class {
            self.touch_table(doc, id.scope);
        }
        Ok(true)
    }

    pub fn set_rule_integer_attribute(
        &mut self,
        doc: Option<&mut Document>,
        id: RuleId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: i32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.set_rule_attribute(doc, id, name, semantic, &Variant::Integer(value), op)
    }

    pub fn set_rule_float_attribute(
        &mut self,
        doc: Option<&mut Document>,
        id: RuleId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: f32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.set_rule_attribute(doc, id, name, semantic, &Variant::Float(value), op)
    }

    pub fn set_rule_string_attribute(
        &mut self,
        doc: Option<&mut Document>,
        id: RuleId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: &str,
        op: Operator,
    ) -> StyleResult<bool> {
        self.set_rule_attribute(doc, id, name, semantic, &Variant::from(value), op)
    }

    /// Destroy every rule in the global table, or in `doc`'s table
    pub fn clear_rules(&mut self, doc: Option<&mut Document>) {
        match doc {
            Some(doc) => {
                doc.rules.clear();
                doc.table_revision += 1;
            }
            None => {
                self.rules.clear();
                self.table_revision += 1;
            }
        }
        self.next_revision();
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
