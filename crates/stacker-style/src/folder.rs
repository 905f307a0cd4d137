//! Attribute Folder
//!
//! Reduces the attribute records that apply to a node into one folded record
//! per attribute and a computed [`NodeStyle`].
//!
//! At each level of the parent chain the contributing buffers are, in
//! application order: rules weaker than the node, the node's own records,
//! then rules that override the node. Resolution scans a level from the
//! strongest record down, collecting modifiers until an assignment settles
//! the attribute. Inheritable attributes keep walking up; a clean ancestor's
//! folded record stands in for everything above it.

use stacker_attr::{
    Attribute, AttributeBuffer, AttributeData, AttributeName, AttributeRef, AttributeSet, Operator, StorageType,
    fold, mode, string_set, validate,
};
use stacker_dom::{
    BackgroundFill, BackgroundLayer, BackgroundSize, BoundingBox, Cursor, DomTree, Justification, LayoutMode,
    Node, NodeFlags, NodeId, NodeStyle, StyleFlags, WhiteSpace, WrapMode,
};
use stacker_rules::{Rule, RuleId, RuleTable};

use crate::font::{FontMetrics, FontRegistry};
use crate::{Config, SelectionStyle, StyleResult};

/// The two rule tables a document sees
#[derive(Clone, Copy)]
pub(crate) struct RuleSource<'a> {
    pub system: &'a RuleTable,
    pub document: &'a RuleTable,
}

impl<'a> RuleSource<'a> {
    pub fn get(&self, id: RuleId) -> Option<&'a Rule> {
        self.system.get(id).or_else(|| self.document.get(id))
    }

    pub fn tables(&self) -> [&'a RuleTable; 2] {
        [self.document, self.system]
    }
}

/// Buffers contributing at one node, weakest first
pub(crate) fn level_buffers<'a>(rules: Option<RuleSource<'a>>, node: &'a Node) -> Vec<&'a AttributeBuffer> {
    let mut buffers = Vec::with_capacity(node.rule_slots.len() + 1);
    let mut strong = Vec::new();
    if let Some(rules) = rules {
        for slot in &node.rule_slots {
            let Some(rule) = rules.get(slot.rule).filter(|r| r.is_enabled()) else {
                continue;
            };
            if rule.overrides_node() {
                strong.push(&rule.attributes);
            } else {
                buffers.push(&rule.attributes);
            }
        }
    }
    buffers.push(&node.attributes);
    buffers.extend(strong);
    buffers
}

/// Unfolded records for `name` at a level, strongest first
fn level_records<'a>(buffers: &[&'a AttributeBuffer], name: AttributeName) -> Vec<AttributeRef<'a>> {
    let mut records = Vec::new();
    for &buffer in buffers.iter().rev() {
        let mut chain: Vec<AttributeRef<'a>> = buffer.chain(name).collect();
        chain.reverse();
        records.extend(chain);
    }
    records
}

/// Attributes given a default value when set to `auto`
fn defaults_on_auto(name: AttributeName) -> bool {
    use AttributeName as A;
    matches!(
        name,
        A::PaddingLeft
            | A::PaddingRight
            | A::PaddingTop
            | A::PaddingBottom
            | A::MarginLeft
            | A::MarginRight
            | A::MarginTop
            | A::MarginBottom
            | A::Leading
            | A::Indent
    )
}

/// Effective value of an attribute and the node that supplied its base
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: Attribute,
    pub owner: NodeId,
}

/// Per-attribute resolution over the parent chain
pub(crate) struct Resolver<'a> {
    pub tree: &'a DomTree,
    pub rules: Option<RuleSource<'a>>,
    pub config: &'a Config,
    /// Metrics of the node's font, for leading and indent defaults
    pub metrics: FontMetrics,
}

impl Resolver<'_> {
    /// Value used when nothing in the chain assigns the attribute
    fn default_value(&self, name: AttributeName) -> Option<Attribute> {
        use AttributeName as A;
        let set = Operator::Set;
        let c = self.config;
        Some(match name {
            A::PaddingLeft
            | A::PaddingRight
            | A::PaddingTop
            | A::PaddingBottom
            | A::MarginLeft
            | A::MarginRight
            | A::MarginTop
            | A::MarginBottom => Attribute::int16(name, mode::ABSOLUTE, set, 0),
            A::Leading => validate::narrow(name, mode::ABSOLUTE, set, self.metrics.default_leading_px() as f64),
            A::Indent => validate::narrow(name, mode::ABSOLUTE, set, self.metrics.paragraph_indent_px() as f64),
            A::Clip => Attribute::mode_only(name, mode::EDGE_NONE, set),
            A::Class => Attribute::new(
                name,
                StorageType::String,
                mode::VALUE,
                set,
                string_set::encode(std::iter::empty()),
            ),
            A::Font => Attribute::string(name, mode::VALUE, set, &c.default_font_face),
            A::FontSize => validate::narrow(name, mode::ABSOLUTE, set, c.default_font_size as f64),
            A::Color => Attribute::int32(name, mode::VALUE, set, c.default_text_color as i32),
            A::Tint => Attribute::int32(name, mode::VALUE, set, -1),
            A::SelectionColor => Attribute::int32(name, mode::VALUE, set, c.default_selection_color as i32),
            A::SelectionFillColor => Attribute::int32(name, mode::VALUE, set, c.default_selection_fill_color as i32),
            _ => return None,
        })
    }

    /// Resolve one attribute for `node`. Shorthands have no value of their own.
    pub fn resolve(&self, node: NodeId, name: AttributeName) -> Option<Resolution> {
        if name.shorthand().is_some() {
            return None;
        }
        let inheritable = name.is_inheritable();
        let mut modifiers: Vec<Attribute> = Vec::new();
        let mut base: Option<(Attribute, NodeId)> = None;
        let mut wants_default = false;

        'levels: for (depth, id) in self.tree.ancestors(node).enumerate() {
            if depth > 0 && !inheritable {
                break;
            }
            let Some(n) = self.tree.get(id) else {
                break;
            };
            if depth > 0 && self.rules.is_some() && !n.flags.contains(NodeFlags::FOLD_ATTRIBUTES) {
                if let Some(folded) = n.attributes.find_folded(name) {
                    if folded.op().is_modifier() {
                        modifiers.push(folded.to_attribute());
                    } else {
                        base = Some((folded.to_attribute(), id));
                    }
                    break;
                }
                continue;
            }
            let buffers = level_buffers(self.rules, n);
            for record in level_records(&buffers, name) {
                if record.op().is_modifier() {
                    modifiers.push(record.to_attribute());
                } else if record.mode() == mode::AUTO && defaults_on_auto(name) {
                    wants_default = true;
                    break 'levels;
                } else {
                    base = Some((record.to_attribute(), id));
                    break 'levels;
                }
            }
        }

        let (mut acc, owner) = match base {
            Some((record, owner)) => (Some(record), owner),
            None if wants_default || !modifiers.is_empty() => (self.default_value(name), node),
            None => return None,
        };
        // Collected strongest-first; the furthest modifier applies first
        for modifier in modifiers.into_iter().rev() {
            acc = Some(match acc {
                None => modifier,
                Some(lhs) => match fold(&lhs, &modifier) {
                    Ok(folded) => folded,
                    Err(error) => {
                        tracing::debug!(attribute = %name, %error, "modifier dropped");
                        lhs
                    }
                },
            });
        }
        acc.map(|record| Resolution {
            record: record.with_folded(true),
            owner,
        })
    }

    /// Names with a record anywhere at the node's own level
    pub fn required(&self, node: &Node) -> AttributeSet {
        level_buffers(self.rules, node)
            .into_iter()
            .flat_map(|b| b.unfolded())
            .map(|r| r.name())
            .collect()
    }
}

/// Style of a parentless node
pub(crate) fn root_style(config: &Config, fonts: &mut dyn FontRegistry) -> NodeStyle {
    let mut style = NodeStyle {
        font_face: config.default_font_face.clone(),
        font_size: config.default_font_size,
        text_color: config.default_text_color,
        tint: 0xFFFF_FFFF,
        flags: StyleFlags::ENABLED,
        ..NodeStyle::default()
    };
    style.font_id = fonts.font_id(&style.font_face, style.font_size, style.font_flags());
    let metrics = fonts.metrics(style.font_id);
    style.leading = metrics.default_leading_px();
    style.indent = metrics.paragraph_indent_px();
    style
}

fn apply_flag(style: &mut NodeStyle, flag: StyleFlags, m: u8) {
    match m {
        mode::TRUE => style.flags.insert(flag),
        mode::FALSE => style.flags.remove(flag),
        _ => {}
    }
}

/// Copy an assignment into the style. Returns whether it selects a font.
fn apply_to_style(style: &mut NodeStyle, requested: &mut LayoutMode, record: &Attribute) -> bool {
    use AttributeName as A;
    if record.op().is_modifier() {
        return false;
    }
    let m = record.mode();
    match record.name() {
        A::Font if m == mode::VALUE => style.font_face = record.read_str().to_string(),
        A::FontSize if m == mode::ABSOLUTE => style.font_size = record.read_float().round() as i32,
        A::Bold => apply_flag(style, StyleFlags::BOLD, m),
        A::Italic => apply_flag(style, StyleFlags::ITALIC, m),
        A::Underline => apply_flag(style, StyleFlags::UNDERLINE, m),
        A::Enabled => apply_flag(style, StyleFlags::ENABLED, m),
        A::Color if m == mode::VALUE => style.text_color = record.read_int() as u32,
        A::Tint if m == mode::VALUE => style.tint = record.read_int() as u32,
        A::Leading if m == mode::ABSOLUTE => style.leading = record.read_float().round() as i32,
        A::Indent if m == mode::ABSOLUTE => style.indent = record.read_float().round() as i32,
        A::Justify => style.justification = Justification::from_mode(m).unwrap_or(style.justification),
        A::WhiteSpace => style.white_space = WhiteSpace::from_mode(m).unwrap_or(style.white_space),
        A::Wrap => style.wrap = WrapMode::from_mode(m).unwrap_or(style.wrap),
        A::Cursor => style.cursor = Cursor::from_mode(m).unwrap_or(style.cursor),
        A::Layout => *requested = LayoutMode::from_mode(m).unwrap_or(*requested),
        _ => return false,
    }
    record.name().affects_font()
}

const FONT_ATTRIBUTES: [AttributeName; 5] = [
    AttributeName::Font,
    AttributeName::FontSize,
    AttributeName::Bold,
    AttributeName::Italic,
    AttributeName::Underline,
];

const WIDTH_ATTRIBUTES: [AttributeName; 7] = [
    AttributeName::Width,
    AttributeName::MinWidth,
    AttributeName::MaxWidth,
    AttributeName::PaddingLeft,
    AttributeName::PaddingRight,
    AttributeName::MarginLeft,
    AttributeName::MarginRight,
];

const HEIGHT_ATTRIBUTES: [AttributeName; 7] = [
    AttributeName::Height,
    AttributeName::MinHeight,
    AttributeName::MaxHeight,
    AttributeName::PaddingTop,
    AttributeName::PaddingBottom,
    AttributeName::MarginTop,
    AttributeName::MarginBottom,
];

const BACKGROUND_ATTRIBUTES: [AttributeName; 3] = [
    AttributeName::Background,
    AttributeName::BackgroundSize,
    AttributeName::BackgroundBox,
];

fn folded_differs(old: &AttributeBuffer, new: &AttributeBuffer, names: &[AttributeName]) -> bool {
    names.iter().any(|&name| {
        let a = old.find_folded(name).map(|r| r.to_attribute());
        let b = new.find(name).map(|r| r.to_attribute());
        a != b
    })
}

/// What a fold changed
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FoldReport {
    pub attributes: usize,
    pub prefix_changed: bool,
    pub style_changed: bool,
    pub layout_changed: bool,
}

/// Everything needed to fold nodes of one document
pub(crate) struct Folder<'a> {
    pub rules: RuleSource<'a>,
    pub config: &'a Config,
    pub fonts: &'a mut dyn FontRegistry,
}

impl Folder<'_> {
    /// Recompute the folded prefix and style of `id`. The parent must be
    /// folded already.
    pub fn fold_node(
        &mut self,
        tree: &mut DomTree,
        id: NodeId,
        clock: u64,
        selection: &mut SelectionStyle,
    ) -> StyleResult<FoldReport> {
        let node = tree.node(id)?;
        let parent = node.parent().and_then(|p| tree.get(p));
        let mut style = match parent {
            Some(p) => p.style.clone(),
            None => root_style(self.config, self.fonts),
        };
        let parent_layout = parent.map(|p| p.layout);
        let mut requested = if node.is_text() { LayoutMode::Inline } else { LayoutMode::Block };

        let mut resolver = Resolver {
            tree: &*tree,
            rules: Some(self.rules),
            config: self.config,
            metrics: self.fonts.metrics(style.font_id),
        };
        let required = resolver.required(node);
        let mut resolved: Vec<Resolution> = Vec::with_capacity(required.len());

        let mut font_changed = parent.is_none();
        for name in FONT_ATTRIBUTES.into_iter().filter(|n| required.contains(*n)) {
            if let Some(r) = resolver.resolve(id, name) {
                font_changed |= apply_to_style(&mut style, &mut requested, &r.record);
                resolved.push(r);
            }
        }
        if font_changed {
            style.font_id = self.fonts.font_id(&style.font_face, style.font_size, style.font_flags());
            resolver.metrics = self.fonts.metrics(style.font_id);
        }
        for name in required.iter().filter(|n| !n.affects_font()) {
            let Some(r) = resolver.resolve(id, name) else {
                continue;
            };
            apply_to_style(&mut style, &mut requested, &r.record);
            if parent.is_none() && !r.record.op().is_modifier() {
                match name {
                    AttributeName::SelectionColor => selection.color = r.record.read_int() as u32,
                    AttributeName::SelectionFillColor => selection.fill_color = r.record.read_int() as u32,
                    _ => {}
                }
            }
            resolved.push(r);
        }
        resolved.sort_by_key(|r| r.record.name());

        let mut prefix = AttributeBuffer::new();
        for r in &resolved {
            prefix.append(&r.record);
        }
        tracing::trace!(node = %id, attributes = resolved.len(), "folded attributes");

        let node = tree.node_mut(id)?;
        let old_end = node.attributes.folded_end();
        let prefix_changed = node.attributes.as_bytes()[..old_end] != *prefix.as_bytes();
        let mut flags = NodeFlags::empty();
        if prefix_changed {
            if folded_differs(&node.attributes, &prefix, &WIDTH_ATTRIBUTES) {
                flags |= NodeFlags::EXPAND_WIDTH;
            }
            if folded_differs(&node.attributes, &prefix, &HEIGHT_ATTRIBUTES) {
                flags |= NodeFlags::EXPAND_HEIGHT;
            }
            if folded_differs(&node.attributes, &prefix, &BACKGROUND_ATTRIBUTES) {
                flags |= NodeFlags::UPDATE_BACKGROUND_LAYERS;
            }
            node.attributes.replace_folded(&prefix);
        }

        let style_changed = node.style != style;
        if node.style.needs_reconstruct(&style) {
            flags |= NodeFlags::RECONSTRUCT_PARAGRAPH;
        } else if node.style.needs_remeasure(&style) {
            flags |= NodeFlags::REMEASURE_PARAGRAPH;
        }
        node.style = style;
        node.requested_layout = requested;

        let established = LayoutMode::establish(requested, parent_layout);
        let layout_changed = established != node.layout;
        if layout_changed {
            flags |= switch_layout(node, established);
        }
        if prefix_changed || style_changed || layout_changed {
            flags |= NodeFlags::FOLD_CHILD_ATTRIBUTES;
        }
        node.flags |= flags;
        node.flags -= NodeFlags::FOLD_ATTRIBUTES;
        node.fold_clock = clock;

        Ok(FoldReport {
            attributes: resolved.len(),
            prefix_changed,
            style_changed,
            layout_changed,
        })
    }
}

/// Move a node to a new established layout mode. A node hidden with `none`
/// keeps its box, and gets it back if it returns to the same mode.
fn switch_layout(node: &mut Node, established: LayoutMode) -> NodeFlags {
    let previous = std::mem::replace(&mut node.layout, established);
    if established == LayoutMode::None {
        node.hidden_layout = Some(stacker_dom::HiddenLayout {
            counterpart: node.counterpart.take(),
            mode: previous,
        });
        return NodeFlags::RECOMPOSE_CHILD_BOXES;
    }
    if previous == LayoutMode::None {
        if let Some(hidden) = node.hidden_layout.take().filter(|h| h.mode == established) {
            node.counterpart = hidden.counterpart;
            return NodeFlags::RECOMPOSE_CHILD_BOXES;
        }
    }
    node.hidden_layout = None;
    NodeFlags::REBUILD_BOX
}

/// Rebuild the background layer from the folded background attributes
pub(crate) fn rebuild_background(node: &mut Node) -> bool {
    let attrs = &node.attributes;
    let fill = attrs.find_folded(AttributeName::Background).and_then(|r| match r.mode() {
        mode::BACKGROUND_COLOR => Some(BackgroundFill::Color(r.read_int() as u32)),
        mode::BACKGROUND_URL => Some(BackgroundFill::Url(r.read_str().to_string())),
        _ => None,
    });
    let layer = fill.map(|fill| BackgroundLayer {
        fill,
        size: attrs
            .find_folded(AttributeName::BackgroundSize)
            .map(|r| BackgroundSize::from_mode(r.mode(), r.read_float()))
            .unwrap_or_default(),
        bounding_box: attrs
            .find_folded(AttributeName::BackgroundBox)
            .map(|r| BoundingBox::from_mode(r.mode()))
            .unwrap_or_default(),
    });
    let changed = node.background != layer;
    node.background = layer;
    node.flags -= NodeFlags::UPDATE_BACKGROUND_LAYERS;
    changed
}
