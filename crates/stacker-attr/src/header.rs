//! Bit-packed attribute record headers
//!
//! Every record in an [`AttributeBuffer`](crate::AttributeBuffer) starts with
//! an 8-byte little-endian header:
//!
//! ```text
//!  bits  0..8   name
//!  bits  8..11  storage type
//!  bits 11..19  mode
//!  bits 19..22  operator
//!  bit  22      folded
//!  bits 32..64  payload size in bytes
//! ```

use crate::{AttrError, AttrResult, AttributeName, Operator};

/// Payload storage discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StorageType {
    None = 0,
    Int16 = 1,
    Int32 = 2,
    Float32 = 3,
    String = 4,
}

impl StorageType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Self::None,
            1 => Self::Int16,
            2 => Self::Int32,
            3 => Self::Float32,
            4 => Self::String,
            _ => return None,
        })
    }

    /// Payload size for fixed-width types
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::String => None,
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int16 | Self::Int32 | Self::Float32)
    }

    /// Single-bit mask for storage sets
    #[inline]
    pub const fn mask(self) -> StorageMask {
        StorageMask::from_bits_retain(1 << (self as u8))
    }

    /// Largest value representable, used as the fixed-point unit in fractional mode
    pub fn type_max(self) -> f64 {
        match self {
            Self::Int16 => i16::MAX as f64,
            Self::Int32 => i32::MAX as f64,
            _ => 1.0,
        }
    }

    /// The wider of two numeric storage types
    pub fn wider(self, other: StorageType) -> StorageType {
        if self >= other { self } else { other }
    }
}

bitflags::bitflags! {
    /// Permitted storage types for a mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StorageMask: u8 {
        const NONE = 1 << 0;
        const INT16 = 1 << 1;
        const INT32 = 1 << 2;
        const FLOAT32 = 1 << 3;
        const STRING = 1 << 4;
        const INTEGER = Self::INT16.bits() | Self::INT32.bits();
        const NUMERIC = Self::INTEGER.bits() | Self::FLOAT32.bits();
    }
}

impl StorageMask {
    #[inline]
    pub fn permits(self, storage: StorageType) -> bool {
        self.contains(storage.mask())
    }
}

/// Attribute modes. The meaning of a mode value depends on the attribute's
/// semantic; zero is always "undefined".
pub mod mode {
    pub const UNDEFINED: u8 = 0;

    /// Generic "a value is present" for strings, colours, reals and sets
    pub const VALUE: u8 = 1;

    pub const ABSOLUTE: u8 = 1;
    pub const FRACTIONAL: u8 = 2;
    pub const AUTO: u8 = 3;
    pub const CONTAIN: u8 = 4;
    pub const COVER: u8 = 5;
    pub const STRETCH: u8 = 6;

    pub const FALSE: u8 = 1;
    pub const TRUE: u8 = 2;

    pub const ALIGN_START: u8 = 1;
    pub const ALIGN_MIDDLE: u8 = 2;
    pub const ALIGN_END: u8 = 3;

    pub const JUSTIFY_LEFT: u8 = 1;
    pub const JUSTIFY_RIGHT: u8 = 2;
    pub const JUSTIFY_CENTER: u8 = 3;
    pub const JUSTIFY_FLUSH: u8 = 4;

    pub const LAYOUT_NONE: u8 = 1;
    pub const LAYOUT_BLOCK: u8 = 2;
    pub const LAYOUT_INLINE: u8 = 3;
    pub const LAYOUT_INLINE_CONTAINER: u8 = 4;

    pub const WHITE_SPACE_NORMAL: u8 = 1;
    pub const WHITE_SPACE_PRESERVE: u8 = 2;

    pub const WRAP_NONE: u8 = 1;
    pub const WRAP_WORD: u8 = 2;
    pub const WRAP_CHARACTER: u8 = 3;

    pub const BACKGROUND_COLOR: u8 = 1;
    pub const BACKGROUND_URL: u8 = 2;
    pub const BACKGROUND_NONE: u8 = 3;

    pub const BOX_BORDER: u8 = 1;
    pub const BOX_PADDING: u8 = 2;
    pub const BOX_CONTENT: u8 = 3;

    pub const CURSOR_DEFAULT: u8 = 1;
    pub const CURSOR_POINTER: u8 = 2;
    pub const CURSOR_TEXT: u8 = 3;
    pub const CURSOR_MOVE: u8 = 4;
    pub const CURSOR_WAIT: u8 = 5;
    pub const CURSOR_RESIZE_HORIZONTAL: u8 = 6;
    pub const CURSOR_RESIZE_VERTICAL: u8 = 7;

    /// Edge modes are bitmasks
    pub const EDGE_NONE: u8 = 1 << 0;
    pub const EDGE_LEFT: u8 = 1 << 1;
    pub const EDGE_RIGHT: u8 = 1 << 2;
    pub const EDGE_TOP: u8 = 1 << 3;
    pub const EDGE_BOTTOM: u8 = 1 << 4;
    pub const EDGE_HORIZONTAL: u8 = EDGE_LEFT | EDGE_RIGHT;
    pub const EDGE_VERTICAL: u8 = EDGE_TOP | EDGE_BOTTOM;
    pub const EDGE_ALL: u8 = EDGE_HORIZONTAL | EDGE_VERTICAL;
}

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub name: AttributeName,
    pub storage: StorageType,
    pub mode: u8,
    pub op: Operator,
    pub folded: bool,
    pub size: u32,
}

impl Header {
    /// Encoded header size in bytes
    pub const SIZE: usize = 8;

    const STORAGE_SHIFT: u32 = 8;
    const MODE_SHIFT: u32 = 11;
    const OP_SHIFT: u32 = 19;
    const FOLDED_BIT: u64 = 1 << 22;
    const SIZE_SHIFT: u32 = 32;

    pub fn new(name: AttributeName, storage: StorageType, mode: u8, op: Operator, size: usize) -> Self {
        Self {
            name,
            storage,
            mode,
            op,
            folded: false,
            size: size as u32,
        }
    }

    /// Pack into the on-buffer representation
    pub fn pack(&self) -> u64 {
        let mut bits = self.name as u64;
        bits |= (self.storage as u64) << Self::STORAGE_SHIFT;
        bits |= (self.mode as u64) << Self::MODE_SHIFT;
        bits |= (self.op as u64) << Self::OP_SHIFT;
        if self.folded {
            bits |= Self::FOLDED_BIT;
        }
        bits | ((self.size as u64) << Self::SIZE_SHIFT)
    }

    /// Unpack, validating every field
    pub fn unpack(bits: u64) -> AttrResult<Self> {
        let name = AttributeName::from_u8((bits & 0xFF) as u8).ok_or(AttrError::Malformed)?;
        let storage =
            StorageType::from_bits(((bits >> Self::STORAGE_SHIFT) & 0x7) as u8).ok_or(AttrError::Malformed)?;
        let mode = ((bits >> Self::MODE_SHIFT) & 0xFF) as u8;
        let op = Operator::from_bits(((bits >> Self::OP_SHIFT) & 0x7) as u8).ok_or(AttrError::Malformed)?;
        let folded = bits & Self::FOLDED_BIT != 0;
        let size = (bits >> Self::SIZE_SHIFT) as u32;
        if let Some(fixed) = storage.fixed_size() {
            if fixed != size as usize {
                return Err(AttrError::Malformed);
            }
        }
        Ok(Self {
            name,
            storage,
            mode,
            op,
            folded,
            size,
        })
    }

    /// Read a header from the start of `bytes`
    pub fn read(bytes: &[u8]) -> AttrResult<Self> {
        let raw: [u8; Self::SIZE] = bytes
            .get(..Self::SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(AttrError::Malformed)?;
        Self::unpack(u64::from_le_bytes(raw))
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.pack().to_le_bytes()
    }

    /// Header plus payload
    #[inline]
    pub fn record_len(&self) -> usize {
        Self::SIZE + self.size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_pack_roundtrip() {
        let mut h = Header::new(AttributeName::Width, StorageType::Int16, mode::FRACTIONAL, Operator::Add, 2);
        h.folded = true;
        let back = Header::unpack(h.pack()).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_header_rejects_bad_fixed_size() {
        let h = Header::new(AttributeName::Width, StorageType::Int32, mode::ABSOLUTE, Operator::Set, 2);
        assert_eq!(Header::unpack(h.pack()), Err(AttrError::Malformed));
    }

    #[test]
    fn test_header_edge_mode_fits() {
        let h = Header::new(AttributeName::Clip, StorageType::None, mode::EDGE_ALL, Operator::Set, 0);
        assert_eq!(Header::unpack(h.pack()).unwrap().mode, mode::EDGE_ALL);
    }

    #[test]
    fn test_storage_mask_bits_follow_discriminants() {
        assert_eq!(StorageType::None.mask(), StorageMask::NONE);
        assert_eq!(StorageType::Float32.mask(), StorageMask::FLOAT32);
        assert!(StorageMask::NUMERIC.permits(StorageType::Int32));
        assert!(!StorageMask::NUMERIC.permits(StorageType::String));
        assert!(!StorageMask::INTEGER.permits(StorageType::Float32));
    }

    #[test]
    fn test_wider_storage() {
        assert_eq!(StorageType::Int16.wider(StorageType::Float32), StorageType::Float32);
        assert_eq!(StorageType::Int32.wider(StorageType::Int16), StorageType::Int32);
    }
}
