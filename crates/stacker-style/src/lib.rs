//! Stacker Style
//!
//! The style engine proper: nodes compose their own attributes with those of
//! matched rules and their ancestors, and an update pass turns the result
//! into computed styles and layout invalidations.
//!
//! # Example
//! ```rust,ignore
//! use stacker_style::{Document, NullSink, System};
//! use stacker_style::attr::{AttributeAssignment, AttributeName, Operator, ValueSemantic};
//! use stacker_style::rules::{PRIORITY_DEFAULT, RuleFlags};
//!
//! let mut system = System::default();
//! let mut doc = Document::new(&system);
//! let color = AttributeAssignment::new(AttributeName::Color, Operator::Set, "red", ValueSemantic::Token);
//! system.create_rule(Some(&mut doc), "p", &[color], RuleFlags::ENABLED, PRIORITY_DEFAULT)?;
//! let p = doc.create_element("p");
//! doc.append_child(doc.root(), p)?;
//! doc.update(&mut system, &mut NullSink)?;
//! ```

mod config;
mod document;
mod error;
mod folder;
pub mod font;
mod matching;
mod sink;
mod system;
mod update;

pub use config::Config;
pub use document::{Document, SelectionStyle};
pub use error::{StyleError, StyleResult};
pub use folder::Resolution;
pub use font::{BasicFontRegistry, FontMetrics, FontRegistry, TEXT_METRIC_PRECISION};
pub use sink::{LayoutSink, NullSink};
pub use system::System;
pub use update::UpdateStats;

// Re-export sub-crates
pub use stacker_attr as attr;
pub use stacker_dom as dom;
pub use stacker_rules as rules;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
