//! End-to-end scenarios for the style engine
//!
//! Rule priority, class fixpoints, stale rule slots, inheritance and the
//! messages the update pass sends to a layout sink.

use stacker_attr::{AttributeAssignment, AttributeData, AttributeName, Operator, ValueSemantic};
use stacker_dom::{BoxId, LayoutMode, NodeId};
use stacker_rules::{PRIORITY_DEFAULT, PRIORITY_OVERRIDE, RuleFlags};
use stacker_style::{Config, Document, LayoutSink, NullSink, System};
use tracing_subscriber::EnvFilter;

const RED: u32 = 0xFFFF_0000;
const BLUE: u32 = 0xFF00_00FF;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (System, Document) {
    init_tracing();
    let system = System::default();
    let doc = Document::new(&system);
    (system, doc)
}

fn color(value: &str) -> AttributeAssignment {
    AttributeAssignment::token(AttributeName::Color, Operator::Set, value)
}

fn class(op: Operator, value: &str) -> AttributeAssignment {
    AttributeAssignment::new(AttributeName::Class, op, value, ValueSemantic::StringList)
}

fn element(doc: &mut Document, parent: NodeId, tag: &str, classes: &str) -> anyhow::Result<NodeId> {
    let id = doc.create_element(tag);
    if !classes.is_empty() {
        doc.set_string_attribute(id, AttributeName::Class, ValueSemantic::StringList, classes, Operator::Set)?;
    }
    doc.append_child(parent, id)?;
    Ok(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    RebuildBox(NodeId, LayoutMode),
    Recompose(NodeId),
    Reconstruct(NodeId),
    Remeasure(NodeId),
    Expand(NodeId, bool, bool),
}

#[derive(Default)]
struct RecordingSink {
    events: Vec<Event>,
    next_box: u32,
}

impl RecordingSink {
    fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl LayoutSink for RecordingSink {
    fn rebuild_box(&mut self, node: NodeId, mode: LayoutMode) -> Option<BoxId> {
        self.events.push(Event::RebuildBox(node, mode));
        self.next_box += 1;
        Some(BoxId(self.next_box))
    }

    fn recompose_child_boxes(&mut self, node: NodeId) {
        self.events.push(Event::Recompose(node));
    }

    fn reconstruct_paragraph(&mut self, node: NodeId) {
        self.events.push(Event::Reconstruct(node));
    }

    fn remeasure_paragraph(&mut self, node: NodeId) {
        self.events.push(Event::Remeasure(node));
    }

    fn expand(&mut self, node: NodeId, width: bool, height: bool) {
        self.events.push(Event::Expand(node, width, height));
    }
}

// ============================================================================
// RULE PRIORITY
// ============================================================================

#[test]
fn test_lower_priority_number_wins() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    system.create_rule(Some(&mut doc), ".a", &[color("red")], RuleFlags::ENABLED, 5)?;
    system.create_rule(Some(&mut doc), ".a", &[color("blue")], RuleFlags::ENABLED, 10)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "a")?;

    doc.update(&mut system, &mut NullSink)?;
    let found = doc.find_attribute(&system, p, AttributeName::Color).expect("color resolves");
    assert_eq!(found.read_int() as u32, RED);
    assert_eq!(doc.node(p)?.style.text_color, RED);
    Ok(())
}

#[test]
fn test_node_beats_normal_rule_but_not_override() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    system.create_rule(Some(&mut doc), "p", &[color("blue")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    system.create_rule(Some(&mut doc), "span", &[color("blue")], RuleFlags::ENABLED, PRIORITY_OVERRIDE - 1)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "")?;
    let span = element(&mut doc, root, "span", "")?;
    for id in [p, span] {
        doc.set_string_attribute(id, AttributeName::Color, ValueSemantic::Token, "red", Operator::Set)?;
    }

    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.read_as_integer(&system, p, AttributeName::Color, 0) as u32, RED);
    assert_eq!(doc.read_as_integer(&system, span, AttributeName::Color, 0) as u32, BLUE);
    Ok(())
}

#[test]
fn test_global_rule_applies_to_every_document() -> anyhow::Result<()> {
    let (mut system, mut first) = setup();
    let mut second = Document::new(&system);
    system.create_rule(None, "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    for doc in [&mut first, &mut second] {
        let root = doc.root();
        let p = element(doc, root, "p", "")?;
        doc.update(&mut system, &mut NullSink)?;
        assert_eq!(doc.node(p)?.style.text_color, RED);
    }
    Ok(())
}

// ============================================================================
// CLASS FIXPOINT
// ============================================================================

#[test]
fn test_class_cycle_add_then_remove() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let strong = PRIORITY_OVERRIDE - 1;
    system.create_rule(Some(&mut doc), ".a", &[class(Operator::Add, "b")], RuleFlags::ENABLED, strong)?;
    system.create_rule(Some(&mut doc), ".b", &[class(Operator::Subtract, "a")], RuleFlags::ENABLED, strong)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "a")?;

    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.read_as_string(&system, p, AttributeName::Class, ""), "b");
    assert_eq!(doc.node(p)?.rule_slots.len(), 2);

    // Settled: nothing to rematch on the next pass
    let stats = doc.update(&mut system, &mut NullSink)?;
    assert_eq!(stats.rematched, 0);
    assert_eq!(doc.read_as_string(&system, p, AttributeName::Class, ""), "b");
    Ok(())
}

#[test]
fn test_mutually_adding_classes_terminate() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let strong = PRIORITY_OVERRIDE - 1;
    system.create_rule(Some(&mut doc), ".a", &[class(Operator::Add, "b")], RuleFlags::ENABLED, strong)?;
    system.create_rule(Some(&mut doc), ".b", &[class(Operator::Add, "a")], RuleFlags::ENABLED, strong)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "a")?;

    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.read_as_string(&system, p, AttributeName::Class, ""), "a,b");
    Ok(())
}

#[test]
fn test_class_rule_feeds_descendant_selector() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    system.create_rule(Some(&mut doc), "div", &[class(Operator::Add, "dark")], RuleFlags::ENABLED, -1)?;
    system.create_rule(Some(&mut doc), ".dark p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let div = element(&mut doc, root, "div", "")?;
    let p = element(&mut doc, div, "p", "")?;

    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.node(p)?.style.text_color, RED);
    Ok(())
}

// ============================================================================
// RULE LIFECYCLE
// ============================================================================

#[test]
fn test_destroyed_rule_never_reported() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let rule = system.create_rule(Some(&mut doc), "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "")?;
    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.node(p)?.rule_slots.len(), 1);

    system.destroy_rule(Some(&mut doc), rule)?;
    let successor = system.create_rule(Some(&mut doc), "span", &[color("blue")], RuleFlags::ENABLED, 1)?;
    assert_ne!(successor, rule);
    assert!(system.rule(Some(&doc), rule).is_none());

    doc.update(&mut system, &mut NullSink)?;
    let node = doc.node(p)?;
    assert!(node.rule_slots.iter().all(|s| s.rule != rule));
    assert_eq!(node.style.text_color, Config::default().default_text_color);
    assert_eq!(system.destroy_rule(Some(&mut doc), rule).map_err(|e| e.code()), Err(-13));
    Ok(())
}

#[test]
fn test_rule_handle_belongs_to_one_document() -> anyhow::Result<()> {
    let (mut system, mut a) = setup();
    let mut b = Document::new(&system);
    let ra = system.create_rule(Some(&mut a), "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let rb = system.create_rule(Some(&mut b), "p", &[color("blue")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    assert_ne!(ra, rb);
    assert!(system.rule(Some(&b), ra).is_none());

    assert_eq!(system.destroy_rule(Some(&mut b), ra).map_err(|e| e.code()), Err(-13));
    assert_eq!(
        system.set_rule_flags(Some(&mut b), ra, RuleFlags::empty()).map_err(|e| e.code()),
        Err(-13)
    );
    assert!(system.rule(Some(&b), rb).is_some());
    assert!(system.rule(Some(&a), ra).is_some());
    Ok(())
}

#[test]
fn test_rule_edit_refolds_matching_nodes() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let rule = system.create_rule(Some(&mut doc), "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "")?;
    doc.update(&mut system, &mut NullSink)?;

    let changed = system.set_rule_string_attribute(
        Some(&mut doc),
        rule,
        AttributeName::Color,
        ValueSemantic::Token,
        "blue",
        Operator::Set,
    )?;
    assert!(changed);
    let stats = doc.update(&mut system, &mut NullSink)?;
    assert!(stats.rematched >= 1);
    assert_eq!(doc.node(p)?.style.text_color, BLUE);
    Ok(())
}

#[test]
fn test_disabled_rule_stops_applying() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let rule = system.create_rule(Some(&mut doc), "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "")?;
    doc.update(&mut system, &mut NullSink)?;

    assert!(system.set_rule_flags(Some(&mut doc), rule, RuleFlags::empty())?);
    assert!(!system.rule_flags(Some(&doc), rule)?.contains(RuleFlags::ENABLED));
    doc.update(&mut system, &mut NullSink)?;
    assert!(doc.node(p)?.rule_slots.is_empty());
    assert_eq!(doc.node(p)?.style.text_color, Config::default().default_text_color);
    Ok(())
}

// ============================================================================
// INHERITANCE AND READS
// ============================================================================

#[test]
fn test_only_inheritable_attributes_reach_children() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    doc.set_integer_attribute(root, AttributeName::Width, ValueSemantic::None, 100, Operator::Set)?;
    doc.set_string_attribute(root, AttributeName::Color, ValueSemantic::Token, "red", Operator::Set)?;
    let p = element(&mut doc, root, "p", "")?;
    doc.update(&mut system, &mut NullSink)?;

    assert!(doc.find_attribute(&system, p, AttributeName::Width).is_none());
    assert_eq!(doc.read_as_integer(&system, root, AttributeName::Width, 0), 100);
    let (inherited, owner) = doc
        .find_inherited_attribute(&system, p, AttributeName::Color)
        .expect("color inherits");
    assert_eq!(inherited.read_int() as u32, RED);
    assert_eq!(owner, root);
    Ok(())
}

#[test]
fn test_modifier_applies_on_inherited_value() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    doc.set_integer_attribute(root, AttributeName::FontSize, ValueSemantic::None, 20, Operator::Set)?;
    let p = element(&mut doc, root, "p", "")?;
    doc.set_integer_attribute(p, AttributeName::FontSize, ValueSemantic::None, 4, Operator::Add)?;
    doc.update(&mut system, &mut NullSink)?;

    assert_eq!(doc.read_as_integer(&system, p, AttributeName::FontSize, 0), 24);
    assert_eq!(doc.node(p)?.style.font_size, 24);
    Ok(())
}

#[test]
fn test_rules_ignored_on_request() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    system.create_rule(Some(&mut doc), "p", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let p = element(&mut doc, root, "p", "")?;
    doc.update(&mut system, &mut NullSink)?;

    assert!(doc.find_attribute(&system, p, AttributeName::Color).is_some());
    assert!(doc.find_attribute_no_rules(&system, p, AttributeName::Color).is_none());
    Ok(())
}

#[test]
fn test_auto_leading_uses_font_metrics() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    doc.set_integer_attribute(root, AttributeName::FontSize, ValueSemantic::None, 20, Operator::Set)?;
    let p = element(&mut doc, root, "p", "")?;
    doc.set_string_attribute(p, AttributeName::Leading, ValueSemantic::Token, "auto", Operator::Set)?;
    doc.update(&mut system, &mut NullSink)?;

    assert_eq!(doc.read_as_integer(&system, p, AttributeName::Leading, -1), 3);
    assert_eq!(doc.node(p)?.style.leading, 3);
    Ok(())
}

#[test]
fn test_read_defaults_and_fractions() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    let div = element(&mut doc, root, "div", "box wide")?;
    doc.set_integer_attribute(div, AttributeName::Width, ValueSemantic::Percentage, 50, Operator::Set)?;
    doc.set_string_attribute(div, AttributeName::Url, ValueSemantic::Url, "https://example.org/", Operator::Set)?;
    doc.update(&mut system, &mut NullSink)?;

    let width = doc.read_as_float(&system, div, AttributeName::Width, 0.0);
    assert!((width - 0.5).abs() < 1e-3);
    assert_eq!(doc.read_as_float(&system, div, AttributeName::Height, 7.5), 7.5);
    assert_eq!(doc.read_as_string(&system, div, AttributeName::Class, ""), "box,wide");
    assert_eq!(doc.read_as_url(&system, div, AttributeName::Url, ""), "https://example.org/");
    assert_eq!(doc.read_as_url(&system, root, AttributeName::Url, "none"), "none");
    Ok(())
}

#[test]
fn test_root_selection_colors() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    doc.set_string_attribute(root, AttributeName::SelectionFillColor, ValueSemantic::Token, "red", Operator::Set)?;
    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.selection().fill_color, RED);
    assert_eq!(doc.selection().color, Config::default().default_selection_color);
    Ok(())
}

// ============================================================================
// UPDATE PASS
// ============================================================================

#[test]
fn test_update_reports_layout_work() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let mut sink = RecordingSink::default();
    let root = doc.root();
    let div = element(&mut doc, root, "div", "")?;
    let text = doc.create_text("hello");
    doc.append_child(div, text)?;

    let stats = doc.update(&mut system, &mut sink)?;
    assert_eq!(stats.visited, 3);
    let events = sink.take();
    assert!(events.contains(&Event::RebuildBox(div, LayoutMode::Block)));
    assert!(events.contains(&Event::RebuildBox(text, LayoutMode::InlineContainer)));
    assert!(events.contains(&Event::Reconstruct(text)));
    assert!(events.contains(&Event::Recompose(root)));

    // Clean document: nothing to do
    let stats = doc.update(&mut system, &mut sink)?;
    assert_eq!(stats.folded, 0);
    assert!(sink.take().is_empty());

    assert!(doc.set_text(text, "world")?);
    doc.update(&mut system, &mut sink)?;
    assert_eq!(sink.take(), vec![Event::Reconstruct(text)]);

    doc.set_integer_attribute(div, AttributeName::Width, ValueSemantic::None, 300, Operator::Set)?;
    doc.update(&mut system, &mut sink)?;
    assert_eq!(sink.take(), vec![Event::Expand(div, true, false)]);
    Ok(())
}

#[test]
fn test_font_change_remeasures_or_reconstructs() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let mut sink = RecordingSink::default();
    let root = doc.root();
    let div = element(&mut doc, root, "div", "")?;
    let text = doc.create_text("hello");
    doc.append_child(div, text)?;
    doc.update(&mut system, &mut sink)?;
    sink.take();

    doc.set_string_attribute(div, AttributeName::Color, ValueSemantic::Token, "blue", Operator::Set)?;
    let stats = doc.update(&mut system, &mut sink)?;
    assert_eq!(sink.take(), vec![Event::Remeasure(text)]);
    assert!(stats.prefixes_changed >= 1);
    assert_eq!(stats.styles_changed, 2);
    assert_eq!(stats.layouts_changed, 0);
    assert!(stats.attributes_resolved >= 1);

    doc.set_integer_attribute(div, AttributeName::FontSize, ValueSemantic::None, 30, Operator::Set)?;
    doc.update(&mut system, &mut sink)?;
    assert_eq!(sink.take(), vec![Event::Reconstruct(text)]);
    Ok(())
}

#[test]
fn test_hidden_node_keeps_its_box() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let mut sink = RecordingSink::default();
    let root = doc.root();
    let div = element(&mut doc, root, "div", "")?;
    doc.update(&mut system, &mut sink)?;
    let original = doc.node(div)?.counterpart;
    assert!(original.is_some());

    doc.set_string_attribute(div, AttributeName::Layout, ValueSemantic::Token, "none", Operator::Set)?;
    doc.update(&mut system, &mut sink)?;
    assert_eq!(doc.node(div)?.layout, LayoutMode::None);
    assert_eq!(doc.node(div)?.counterpart, None);
    sink.take();

    assert!(doc.remove_attribute(div, AttributeName::Layout)?);
    doc.update(&mut system, &mut sink)?;
    assert_eq!(doc.node(div)?.layout, LayoutMode::Block);
    assert_eq!(doc.node(div)?.counterpart, original);
    assert!(!sink.take().iter().any(|e| matches!(e, Event::RebuildBox(..))));
    Ok(())
}

#[test]
fn test_interaction_state_rematches() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    system.create_rule(Some(&mut doc), "a:highlighted", &[color("red")], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
    let root = doc.root();
    let link = element(&mut doc, root, "a", "")?;
    doc.update(&mut system, &mut NullSink)?;
    assert!(doc.node(link)?.rule_slots.is_empty());

    assert!(doc.set_interaction_state(link, stacker_rules::InteractionState::Highlighted)?);
    doc.update(&mut system, &mut NullSink)?;
    assert_eq!(doc.node(link)?.style.text_color, RED);
    Ok(())
}

// ============================================================================
// QUERIES AND ERRORS
// ============================================================================

#[test]
fn test_match_nodes_in_document_order() -> anyhow::Result<()> {
    let (_system, mut doc) = setup();
    let root = doc.root();
    let div = element(&mut doc, root, "div", "")?;
    let p1 = element(&mut doc, div, "p", "")?;
    let span = element(&mut doc, root, "span", "")?;
    let p2 = element(&mut doc, span, "p", "")?;
    let p3 = element(&mut doc, div, "p", "x")?;

    assert_eq!(doc.match_nodes(root, "div p", 16)?, vec![p1, p3]);
    assert_eq!(doc.match_nodes(root, "p", 16)?, vec![p1, p3, p2]);
    assert_eq!(doc.match_nodes(root, "p.x, span", 1)?, vec![p3]);
    assert_eq!(doc.match_nodes(span, "p.x, span", 8)?, vec![span]);
    Ok(())
}

#[test]
fn test_errors_carry_negative_codes() -> anyhow::Result<()> {
    let (mut system, mut doc) = setup();
    let root = doc.root();
    let err = doc.match_nodes(root, "", 4).unwrap_err();
    assert!(err.code() < 0);
    let err = system
        .create_rule(Some(&mut doc), "   ", &[], RuleFlags::ENABLED, PRIORITY_DEFAULT)
        .unwrap_err();
    assert_eq!(err.code(), -12);
    let text = doc.create_text("leaf");
    let child = doc.create_element("p");
    assert_eq!(doc.append_child(text, child).unwrap_err().code(), -15);
    Ok(())
}

#[test]
fn test_failed_set_leaves_node_unchanged() -> anyhow::Result<()> {
    let (_system, mut doc) = setup();
    let root = doc.root();
    let before = doc.change_clock();
    let result = doc.set_string_attribute(root, AttributeName::Width, ValueSemantic::Token, "sideways", Operator::Set);
    assert!(result.is_err());
    assert!(doc.node(root)?.attributes.is_empty());
    assert_eq!(doc.change_clock(), before);
    Ok(())
}

#[test]
fn test_config_from_json() -> anyhow::Result<()> {
    let config: Config = serde_json::from_str(r#"{ "max_matched_rules": 4, "default_font_face": "serif" }"#)?;
    assert_eq!(config.max_matched_rules, 4);
    assert_eq!(config.default_font_face, "serif");
    assert_eq!(config.max_visited_class_rules, Config::default().max_visited_class_rules);

    let back: Config = serde_json::from_str(&serde_json::to_string(&config)?)?;
    assert_eq!(back, config);
    Ok(())
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest::proptest! {
    #[test]
    fn prop_inherited_font_size_takes_child_modifier(base in 1i32..200, delta in 0i32..50) {
        let (mut system, mut doc) = setup();
        let root = doc.root();
        doc.set_integer_attribute(root, AttributeName::FontSize, ValueSemantic::None, base, Operator::Set).unwrap();
        let p = element(&mut doc, root, "p", "").unwrap();
        doc.set_integer_attribute(p, AttributeName::FontSize, ValueSemantic::None, delta, Operator::Add).unwrap();
        doc.update(&mut system, &mut NullSink).unwrap();

        proptest::prop_assert_eq!(doc.read_as_integer(&system, p, AttributeName::FontSize, 0), base + delta);
        proptest::prop_assert_eq!(doc.read_as_integer(&system, root, AttributeName::FontSize, 0), base);
    }
}
