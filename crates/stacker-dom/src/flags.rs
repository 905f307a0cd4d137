//! Node dirty flags
//!
//! Flags accumulate between update passes. The pre-order pass consumes the
//! top-down set, the post-order pass the bottom-up set.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// Regenerate rule keys from the class attribute
        const UPDATE_RULE_KEYS = 1 << 0;
        /// Rematch rules against this node
        const UPDATE_MATCHED_RULES = 1 << 1;
        /// Rematch rules for the whole subtree below
        const UPDATE_CHILD_RULES = 1 << 2;
        /// Recompute folded attributes and style
        const FOLD_ATTRIBUTES = 1 << 3;
        /// Refold direct children, set when folded values changed
        const FOLD_CHILD_ATTRIBUTES = 1 << 4;
        const UPDATE_BACKGROUND_LAYERS = 1 << 5;

        /// Established layout mode changed
        const REBUILD_BOX = 1 << 8;
        const RECOMPOSE_CHILD_BOXES = 1 << 9;
        /// Text must be re-tokenized (font, white-space or wrap changed)
        const RECONSTRUCT_PARAGRAPH = 1 << 10;
        /// Text must be re-measured (sizes or colours changed)
        const REMEASURE_PARAGRAPH = 1 << 11;
        const EXPAND_WIDTH = 1 << 12;
        const EXPAND_HEIGHT = 1 << 13;

        const PRE_ORDER = Self::UPDATE_RULE_KEYS.bits()
            | Self::UPDATE_MATCHED_RULES.bits()
            | Self::UPDATE_CHILD_RULES.bits()
            | Self::FOLD_ATTRIBUTES.bits()
            | Self::FOLD_CHILD_ATTRIBUTES.bits()
            | Self::UPDATE_BACKGROUND_LAYERS.bits();
        const POST_ORDER = Self::REBUILD_BOX.bits()
            | Self::RECOMPOSE_CHILD_BOXES.bits()
            | Self::RECONSTRUCT_PARAGRAPH.bits()
            | Self::REMEASURE_PARAGRAPH.bits()
            | Self::EXPAND_WIDTH.bits()
            | Self::EXPAND_HEIGHT.bits();

        /// Everything a freshly inserted node needs
        const NEW_NODE = Self::UPDATE_RULE_KEYS.bits()
            | Self::UPDATE_MATCHED_RULES.bits()
            | Self::FOLD_ATTRIBUTES.bits()
            | Self::UPDATE_BACKGROUND_LAYERS.bits()
            | Self::REBUILD_BOX.bits();
    }
}
