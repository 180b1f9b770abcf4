use serde::{Deserialize, Serialize};

use crate::common::*;

/// Append-only storage for compile-time constants. Every entry starts at a
/// multiple of its natural alignment; the padding in between stays zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralPool {
    bytes: Vec<u8>,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns its offset in the pool.
    pub fn push(&mut self, data: &[u8], align: u32) -> u32 {
        let align = align.max(1) as usize;
        let padding = (align - self.bytes.len() % align) % align;
        self.bytes.resize(self.bytes.len() + padding, 0);

        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(data);
        offset
    }

    /// Appends the byte representation of a value of type `ty`.
    pub fn push_typed(&mut self, ty: &Type, data: &[u8]) -> Result<u32, Error> {
        if data.len() != ty.size() as usize {
            return Err(Error::internal(format!(
                "literal of type {} needs {} bytes, got {}", ty, ty.size(), data.len()
            )));
        }
        Ok(self.push(data, ty.alignment()))
    }

    pub fn read(&self, offset: u32, size: u32) -> Option<&[u8]> {
        let start = offset as usize;
        self.bytes.get(start..start + size as usize)
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Hands out frame offsets for the named values of one scope. A nested scope
/// starts counting where its parent currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameAllocator {
    offset: u32,
}

impl FrameAllocator {
    pub fn starting_at(offset: u32) -> Self {
        Self { offset }
    }

    pub fn allocate(&mut self, size: u32) -> u32 {
        let offset = self.offset;
        self.offset += size;
        offset
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}
