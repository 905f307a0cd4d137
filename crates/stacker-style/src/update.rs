//! Update pass
//!
//! Two walks over the document. Pre-order brings rule keys, matched rules,
//! folded attributes and background layers up to date, pushing dirty bits
//! down to children. Post-order reports box and paragraph work to the
//! layout sink, pushing dirty bits up to parents.

use stacker_dom::{LayoutMode, NodeFlags, NodeId, TreeLinks};

use crate::folder::{Folder, RuleSource, rebuild_background};
use crate::{Document, LayoutSink, StyleResult, System, matching};

/// Work done by one update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub visited: usize,
    pub rematched: usize,
    pub folded: usize,
    /// Attributes resolved while folding
    pub attributes_resolved: usize,
    pub prefixes_changed: usize,
    pub styles_changed: usize,
    pub layouts_changed: usize,
    pub backgrounds: usize,
    pub boxes_rebuilt: usize,
    pub paragraphs: usize,
}

impl Document {
    /// Bring every node under the root up to date and report layout work
    /// to `sink`
    pub fn update(&mut self, system: &mut System, sink: &mut dyn LayoutSink) -> StyleResult<UpdateStats> {
        let mut stats = UpdateStats::default();
        if self.seen_system_revision != system.table_revision || self.seen_table_revision != self.table_revision {
            self.tree
                .node_mut(self.root)?
                .mark(NodeFlags::UPDATE_MATCHED_RULES | NodeFlags::UPDATE_CHILD_RULES);
            self.seen_system_revision = system.table_revision;
            self.seen_table_revision = self.table_revision;
        }

        self.pre_order_pass(system, &mut stats)?;
        self.post_order_pass(sink, &mut stats)?;

        tracing::info!(
            visited = stats.visited,
            rematched = stats.rematched,
            folded = stats.folded,
            styles = stats.styles_changed,
            boxes = stats.boxes_rebuilt,
            "document updated"
        );
        Ok(stats)
    }

    fn pre_order_pass(&mut self, system: &mut System, stats: &mut UpdateStats) -> StyleResult<()> {
        let rules = RuleSource {
            system: &system.rules,
            document: &self.rules,
        };
        let mut folder = Folder {
            rules,
            config: &self.config,
            fonts: system.fonts.as_mut(),
        };
        let clock = self.change_clock;
        let ids: Vec<NodeId> = self.tree.pre_order(self.root).collect();

        for id in ids {
            stats.visited += 1;
            let node = self.tree.node_mut(id)?;
            if !matching::slots_current(rules, node) {
                node.flags |= NodeFlags::UPDATE_MATCHED_RULES;
            }

            if node
                .flags
                .intersects(NodeFlags::UPDATE_RULE_KEYS | NodeFlags::UPDATE_MATCHED_RULES)
            {
                let outcome = matching::update_matched_rules(&mut self.tree, rules, &self.config, id)?;
                stats.rematched += 1;
                let node = self.tree.node_mut(id)?;
                if outcome.slots_changed {
                    node.flags |= NodeFlags::FOLD_ATTRIBUTES;
                }
                if outcome.keys_changed {
                    node.flags |= NodeFlags::UPDATE_CHILD_RULES;
                }
            }

            if self.tree.node(id)?.flags.contains(NodeFlags::FOLD_ATTRIBUTES) {
                let report = folder.fold_node(&mut self.tree, id, clock, &mut self.selection)?;
                stats.folded += 1;
                stats.attributes_resolved += report.attributes;
                stats.prefixes_changed += usize::from(report.prefix_changed);
                stats.styles_changed += usize::from(report.style_changed);
                stats.layouts_changed += usize::from(report.layout_changed);
            }

            let node = self.tree.node_mut(id)?;
            if node.flags.contains(NodeFlags::UPDATE_BACKGROUND_LAYERS) {
                rebuild_background(node);
                stats.backgrounds += 1;
            }

            let mut down = NodeFlags::empty();
            if node.flags.contains(NodeFlags::UPDATE_CHILD_RULES) {
                down |= NodeFlags::UPDATE_MATCHED_RULES | NodeFlags::UPDATE_CHILD_RULES;
            }
            if node.flags.contains(NodeFlags::FOLD_CHILD_ATTRIBUTES) {
                down |= NodeFlags::FOLD_ATTRIBUTES;
            }
            node.flags -= NodeFlags::PRE_ORDER;
            if !down.is_empty() {
                let children: Vec<NodeId> = self.tree.children(id).collect();
                for child in children {
                    self.tree.node_mut(child)?.mark(down);
                }
            }
        }
        Ok(())
    }

    fn post_order_pass(&mut self, sink: &mut dyn LayoutSink, stats: &mut UpdateStats) -> StyleResult<()> {
        let ids: Vec<NodeId> = self.tree.post_order(self.root).collect();
        for id in ids {
            let node = self.tree.node_mut(id)?;
            let flags = node.flags & NodeFlags::POST_ORDER;
            if flags.is_empty() {
                continue;
            }
            let mut up = NodeFlags::empty();

            if flags.contains(NodeFlags::REBUILD_BOX) {
                node.counterpart = sink.rebuild_box(id, node.layout);
                stats.boxes_rebuilt += 1;
                up |= NodeFlags::RECOMPOSE_CHILD_BOXES;
            }
            if flags.contains(NodeFlags::RECOMPOSE_CHILD_BOXES) {
                sink.recompose_child_boxes(id);
            }

            let paragraph = flags & (NodeFlags::RECONSTRUCT_PARAGRAPH | NodeFlags::REMEASURE_PARAGRAPH);
            if !paragraph.is_empty() {
                match node.layout {
                    LayoutMode::InlineContainer => {
                        if paragraph.contains(NodeFlags::RECONSTRUCT_PARAGRAPH) {
                            sink.reconstruct_paragraph(id);
                        } else {
                            sink.remeasure_paragraph(id);
                        }
                        stats.paragraphs += 1;
                    }
                    LayoutMode::Inline => up |= paragraph,
                    LayoutMode::Block | LayoutMode::None => {}
                }
            }

            if flags.intersects(NodeFlags::EXPAND_WIDTH | NodeFlags::EXPAND_HEIGHT) {
                sink.expand(
                    id,
                    flags.contains(NodeFlags::EXPAND_WIDTH),
                    flags.contains(NodeFlags::EXPAND_HEIGHT),
                );
            }
            node.flags -= NodeFlags::POST_ORDER;

            if let Some(parent) = node.parent().filter(|_| !up.is_empty()) {
                self.tree.node_mut(parent)?.mark(up);
            }
        }
        Ok(())
    }
}
