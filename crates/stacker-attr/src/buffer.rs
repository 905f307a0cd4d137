//! Attribute Buffer
//!
//! A single growable byte vector holding a stream of variable-length records
//! (header + payload). Records are addressed by byte offset. Folded records,
//! the cached results of attribute folding, always form a contiguous prefix.

use crate::header::{Header, StorageType, mode};
use crate::{AttrError, AttrResult, AttributeName, Operator, ValueSemantic, Variant, fixed, string_set};

/// Read access shared by owned and borrowed records
pub trait AttributeData {
    fn header(&self) -> &Header;
    fn payload(&self) -> &[u8];

    #[inline]
    fn name(&self) -> AttributeName {
        self.header().name
    }

    #[inline]
    fn op(&self) -> Operator {
        self.header().op
    }

    #[inline]
    fn mode(&self) -> u8 {
        self.header().mode
    }

    #[inline]
    fn storage(&self) -> StorageType {
        self.header().storage
    }

    #[inline]
    fn is_folded(&self) -> bool {
        self.header().folded
    }

    /// Raw integer payload. Floats are rounded; non-numeric storage reads as 0.
    fn read_int(&self) -> i32 {
        let p = self.payload();
        match self.storage() {
            StorageType::Int16 => i16::from_le_bytes([p[0], p[1]]) as i32,
            StorageType::Int32 => i32::from_le_bytes([p[0], p[1], p[2], p[3]]),
            StorageType::Float32 => f32::from_le_bytes([p[0], p[1], p[2], p[3]]).round() as i32,
            StorageType::None | StorageType::String => 0,
        }
    }

    /// Numeric payload as float. Fractional values read as a fraction of one.
    fn read_float(&self) -> f32 {
        let p = self.payload();
        let raw = match self.storage() {
            StorageType::Int16 => i16::from_le_bytes([p[0], p[1]]) as f32,
            StorageType::Int32 => i32::from_le_bytes([p[0], p[1], p[2], p[3]]) as f32,
            StorageType::Float32 => return f32::from_le_bytes([p[0], p[1], p[2], p[3]]),
            StorageType::None | StorageType::String => return 0.0,
        };
        if self.mode() == mode::FRACTIONAL && self.name().semantic().is_numeric() {
            raw / self.storage().type_max() as f32
        } else {
            raw
        }
    }

    /// String payload without its terminator. Sets read as their first element.
    fn read_str(&self) -> &str {
        if self.storage() != StorageType::String {
            return "";
        }
        let p = self.payload();
        let end = p.iter().position(|&b| b == 0).unwrap_or(p.len());
        std::str::from_utf8(&p[..end]).unwrap_or("")
    }

    /// Elements of a string-set payload
    fn string_set(&self) -> Vec<&str> {
        if self.storage() != StorageType::String {
            return Vec::new();
        }
        string_set::elements(self.payload()).collect()
    }

    /// String value. String sets are joined with commas.
    fn read_string(&self) -> String {
        match self.name().semantic() {
            crate::AttributeSemantic::StringSet => string_set::join(self.payload(), ","),
            _ => self.read_str().to_string(),
        }
    }

    /// Owned copy of this record
    fn to_attribute(&self) -> Attribute {
        Attribute {
            header: *self.header(),
            payload: self.payload().to_vec(),
        }
    }

    /// Total encoded length
    #[inline]
    fn record_len(&self) -> usize {
        self.header().record_len()
    }
}

/// Owned attribute record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Attribute {
    pub fn new(name: AttributeName, storage: StorageType, mode: u8, op: Operator, payload: Vec<u8>) -> Self {
        Self {
            header: Header::new(name, storage, mode, op, payload.len()),
            payload,
        }
    }

    /// Record with no payload
    pub fn mode_only(name: AttributeName, mode: u8, op: Operator) -> Self {
        Self::new(name, StorageType::None, mode, op, Vec::new())
    }

    pub fn int16(name: AttributeName, mode: u8, op: Operator, value: i16) -> Self {
        Self::new(name, StorageType::Int16, mode, op, value.to_le_bytes().to_vec())
    }

    pub fn int32(name: AttributeName, mode: u8, op: Operator, value: i32) -> Self {
        Self::new(name, StorageType::Int32, mode, op, value.to_le_bytes().to_vec())
    }

    pub fn float32(name: AttributeName, mode: u8, op: Operator, value: f32) -> Self {
        Self::new(name, StorageType::Float32, mode, op, value.to_le_bytes().to_vec())
    }

    /// Null-terminated string record
    pub fn string(name: AttributeName, mode: u8, op: Operator, value: &str) -> Self {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        Self::new(name, StorageType::String, mode, op, payload)
    }

    /// Replace the payload, keeping the header size in step
    pub fn set_payload(&mut self, storage: StorageType, payload: Vec<u8>) {
        self.header.storage = storage;
        self.header.size = payload.len() as u32;
        self.payload = payload;
    }

    pub fn with_folded(mut self, folded: bool) -> Self {
        self.header.folded = folded;
        self
    }

    /// Encoded bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.record_len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

impl AttributeData for Attribute {
    fn header(&self) -> &Header {
        &self.header
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Record borrowed from a buffer
#[derive(Debug, Clone, Copy)]
pub struct AttributeRef<'a> {
    pub offset: usize,
    header: Header,
    payload: &'a [u8],
}

impl AttributeRef<'_> {
    /// Byte offset of the record that follows this one
    pub fn end(&self) -> usize {
        self.offset + self.header.record_len()
    }
}

impl AttributeData for AttributeRef<'_> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn payload(&self) -> &[u8] {
        self.payload
    }
}

/// Forward iterator over a buffer's records
pub struct Iter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = AttributeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = decode_at(self.data, self.offset).ok()?;
        self.offset = record.end();
        Some(record)
    }
}

fn decode_at(data: &[u8], offset: usize) -> AttrResult<AttributeRef<'_>> {
    let header = Header::read(data.get(offset..).ok_or(AttrError::Malformed)?)?;
    let start = offset + Header::SIZE;
    let payload = data
        .get(start..start + header.size as usize)
        .ok_or(AttrError::Malformed)?;
    Ok(AttributeRef {
        offset,
        header,
        payload,
    })
}

/// Compact variable-record attribute store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBuffer {
    data: Vec<u8>,
    count: usize,
}

impl AttributeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            count: 0,
        }
    }

    /// Number of records
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes in use
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.count = 0;
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            data: &self.data,
            offset: 0,
        }
    }

    /// Record at a byte offset
    pub fn get(&self, offset: usize) -> Option<AttributeRef<'_>> {
        decode_at(&self.data, offset).ok()
    }

    /// Append a record, returning its offset
    pub fn append(&mut self, attr: &Attribute) -> usize {
        let offset = self.data.len();
        self.data.extend_from_slice(&attr.to_bytes());
        self.count += 1;
        offset
    }

    /// Insert a record at the front
    pub fn prepend(&mut self, attr: &Attribute) -> usize {
        self.data.splice(0..0, attr.to_bytes());
        self.count += 1;
        0
    }

    /// Replace the record at `offset` with `attr`, resizing in place.
    /// Returns the offset, which does not move.
    pub fn replace(&mut self, offset: usize, attr: &Attribute) -> AttrResult<usize> {
        let old = self.get(offset).ok_or(AttrError::Malformed)?;
        let end = old.end();
        self.data.splice(offset..end, attr.to_bytes());
        Ok(offset)
    }

    /// Grow or shrink the payload of the record at `offset`. New bytes are zero.
    pub fn resize_entry(&mut self, offset: usize, new_size: usize) -> AttrResult<()> {
        let record = self.get(offset).ok_or(AttrError::Malformed)?;
        let mut header = *record.header();
        if header.storage.fixed_size().is_some_and(|fixed| fixed != new_size) {
            return Err(AttrError::TypeMismatch);
        }
        let old_size = header.size as usize;
        let payload_start = offset + Header::SIZE;
        if new_size > old_size {
            let at = payload_start + old_size;
            self.data.splice(at..at, std::iter::repeat_n(0u8, new_size - old_size));
        } else {
            self.data.drain(payload_start + new_size..payload_start + old_size);
        }
        header.size = new_size as u32;
        self.data[offset..payload_start].copy_from_slice(&header.to_bytes());
        Ok(())
    }

    /// Remove the record at `offset`
    pub fn remove_at(&mut self, offset: usize) -> AttrResult<Attribute> {
        let record = self.get(offset).ok_or(AttrError::Malformed)?;
        let owned = record.to_attribute();
        let end = record.end();
        self.data.drain(offset..end);
        self.count -= 1;
        Ok(owned)
    }

    /// Remove every record with the given name. Returns how many went.
    pub fn remove(&mut self, name: AttributeName) -> usize {
        self.remove_where(|r| r.name() == name)
    }

    fn remove_where<F: Fn(&AttributeRef<'_>) -> bool>(&mut self, pred: F) -> usize {
        let offsets: Vec<usize> = self.iter().filter(|r| pred(r)).map(|r| r.offset).collect();
        for offset in offsets.iter().rev() {
            // Offsets are collected front to back, removing back to front keeps them valid
            let _ = self.remove_at(*offset);
        }
        offsets.len()
    }

    /// Splice `src` over the byte range `[start, end)`
    pub fn replace_range(&mut self, start: usize, end: usize, src: &AttributeBuffer) {
        self.data.splice(start..end, src.data.iter().copied());
        self.count = self.iter().count();
    }

    /// Offset just past the folded prefix
    pub fn folded_end(&self) -> usize {
        self.iter()
            .take_while(|r| r.is_folded())
            .last()
            .map(|r| r.end())
            .unwrap_or(0)
    }

    /// Swap the folded prefix for `folded`, whose records are all marked folded
    pub fn replace_folded(&mut self, folded: &AttributeBuffer) {
        let end = self.folded_end();
        self.replace_range(0, end, folded);
    }

    /// First record with a name
    pub fn find(&self, name: AttributeName) -> Option<AttributeRef<'_>> {
        self.iter().find(|r| r.name() == name)
    }

    /// Folded record for a name
    pub fn find_folded(&self, name: AttributeName) -> Option<AttributeRef<'_>> {
        self.iter().take_while(|r| r.is_folded()).find(|r| r.name() == name)
    }

    /// Non-folded records for a name, in buffer order
    pub fn chain(&self, name: AttributeName) -> impl Iterator<Item = AttributeRef<'_>> + '_ {
        self.iter().filter(move |r| !r.is_folded() && r.name() == name)
    }

    /// Non-folded records only
    pub fn unfolded(&self) -> impl Iterator<Item = AttributeRef<'_>> + '_ {
        self.iter().skip_while(|r| r.is_folded())
    }

    /// Replace `a` with the composition "a then b", where both are records
    /// in this buffer. `b` is left in place; `a` keeps its folded bit.
    pub fn fold(&mut self, a: usize, b: usize) -> AttrResult<()> {
        let rhs = self.get(b).ok_or(AttrError::Malformed)?.to_attribute();
        self.fold_into(a, &rhs)
    }

    /// Replace the record at `offset` with "it then `rhs`"
    pub fn fold_into(&mut self, offset: usize, rhs: &Attribute) -> AttrResult<()> {
        let lhs = self.get(offset).ok_or(AttrError::Malformed)?;
        let keep_folded = lhs.is_folded();
        let result = crate::fold::fold(&lhs, rhs)?.with_folded(keep_folded);
        self.replace(offset, &result)?;
        Ok(())
    }

    /// Validate and store a parsed assignment.
    ///
    /// Assignments supersede earlier records for the name. Modifiers are
    /// appended, or folded into the latest record when `fold` is set and the
    /// two compose. Returns whether the buffer changed.
    pub fn set(
        &mut self,
        name: AttributeName,
        value: &Variant,
        semantic: ValueSemantic,
        op: Operator,
        fold: bool,
    ) -> AttrResult<bool> {
        if let Some(shorthand) = name.shorthand() {
            return self.set_shorthand(shorthand, value, semantic, op, fold);
        }
        let attr = crate::validate::encode(name, value, semantic, op)?;
        self.store(attr, fold)
    }

    /// Store an already-encoded record
    pub fn store(&mut self, attr: Attribute, fold: bool) -> AttrResult<bool> {
        let attr = attr.with_folded(false);
        let name = attr.name();

        if !attr.op().is_modifier() {
            let unchanged = {
                let mut chain = self.chain(name);
                let first = chain.next();
                chain.next().is_none()
                    && first.is_some_and(|r| *r.header() == attr.header && r.payload() == attr.payload.as_slice())
            };
            if unchanged {
                return Ok(false);
            }
            self.remove_where(|r| !r.is_folded() && r.name() == name);
            self.append(&attr);
            return Ok(true);
        }

        let last = if fold { self.chain(name).last().map(|r| r.offset) } else { None };
        match last {
            Some(offset) => match self.fold_into(offset, &attr) {
                Ok(()) => Ok(true),
                Err(AttrError::CannotFold) => {
                    tracing::trace!(attribute = %name, "modifier kept as separate record");
                    self.append(&attr);
                    Ok(true)
                }
                Err(e) => Err(e),
            },
            None => {
                self.append(&attr);
                Ok(true)
            }
        }
    }

    fn set_shorthand(
        &mut self,
        shorthand: crate::Shorthand,
        value: &Variant,
        semantic: ValueSemantic,
        op: Operator,
        fold: bool,
    ) -> AttrResult<bool> {
        match shorthand {
            crate::Shorthand::Sides(sides) => {
                let mut changed = false;
                // Earlier sides stay written if a later one fails
                for side in sides {
                    changed |= self.set(side, value, semantic, op, fold)?;
                }
                Ok(changed)
            }
            crate::Shorthand::EdgeFlag(target, bit) => {
                let attr = crate::validate::encode_edge_flag(target, bit, value, semantic, op)?;
                self.store(attr, fold)
            }
        }
    }

    /// Memory used by the record storage
    pub fn memory_usage(&self) -> usize {
        self.data.capacity()
    }
}

impl<'a> IntoIterator for &'a AttributeBuffer {
    type Item = AttributeRef<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Fractional int16 for a percentage, used by callers that build records directly
pub fn fraction_record(name: AttributeName, op: Operator, percent: i32) -> Attribute {
    Attribute::int16(name, mode::FRACTIONAL, op, fixed::percent_to_i16(percent))
}
