//! Stacker Attributes
//!
//! Compact storage for style attributes:
//! - Bit-packed record headers over a single byte vector
//! - Validation of parsed values against each attribute's semantic
//! - Operator folding (`=`, `:=`, `+=`, `-=`, `*=`, `/=`)
//! - Fixed-point fractions and string sets

pub mod buffer;
mod error;
pub mod fixed;
pub mod fold;
pub mod header;
mod names;
pub mod string_set;
pub mod tokens;
pub mod validate;
mod variant;

pub use buffer::{Attribute, AttributeBuffer, AttributeData, AttributeRef};
pub use error::{AttrError, AttrResult};
pub use fold::fold;
pub use header::{Header, StorageMask, StorageType, mode};
pub use names::{AttributeName, AttributeSemantic, AttributeSet, NUM_ATTRIBUTES, Shorthand};
pub use variant::{AttributeAssignment, Operator, OperatorMask, ValueSemantic, Variant};
