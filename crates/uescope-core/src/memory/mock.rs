//! Synthetic address space for tests.
//!
//! `MockMemoryBuilder` assembles a sparse byte map standing in for a target
//! process: a zero-filled main module plus any number of "heap" objects at
//! arbitrary addresses. The resulting reader honors the same contract as
//! the real process handle: reads crossing the edge of mapped memory fail
//! with a short-read error, reads of unmapped memory fail outright.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::memory::reader::ReadMemory;

#[derive(Debug, Default)]
struct MockSpace {
    bytes: BTreeMap<u64, u8>,
}

/// Builder for a [`MockMemoryReader`].
pub struct MockMemoryBuilder {
    base: u64,
    module_size: usize,
    space: MockSpace,
}

impl MockMemoryBuilder {
    /// Create a builder with a zero-filled module at `base`.
    pub fn new(base: u64, module_size: usize) -> Self {
        let mut space = MockSpace::default();
        for offset in 0..module_size as u64 {
            space.bytes.insert(base + offset, 0);
        }
        Self {
            base,
            module_size,
            space,
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> &mut Self {
        for (i, byte) in bytes.iter().enumerate() {
            self.space.bytes.insert(address + i as u64, *byte);
        }
        self
    }

    pub fn write_u8(&mut self, address: u64, value: u8) -> &mut Self {
        self.write_bytes(address, &[value])
    }

    pub fn write_u16(&mut self, address: u64, value: u16) -> &mut Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_i32(&mut self, address: u64, value: i32) -> &mut Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, address: u64, value: u32) -> &mut Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, address: u64, value: u64) -> &mut Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_f32(&mut self, address: u64, value: f32) -> &mut Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            base: self.base,
            module_size: self.module_size,
            space: Arc::new(Mutex::new(self.space)),
        }
    }
}

/// Shared, mutable mock address space implementing [`ReadMemory`].
///
/// Clones share the underlying bytes, so a test can keep one clone to poke
/// values while a session owns another.
#[derive(Clone)]
pub struct MockMemoryReader {
    base: u64,
    module_size: usize,
    space: Arc<Mutex<MockSpace>>,
}

impl MockMemoryReader {
    /// Overwrite a single byte after construction.
    pub fn poke_u8(&self, address: u64, value: u8) {
        let mut space = self
            .space
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        space.bytes.insert(address, value);
    }

    /// Overwrite a pointer-sized value after construction.
    pub fn poke_u64(&self, address: u64, value: u64) {
        let mut space = self
            .space
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            space.bytes.insert(address + i as u64, *byte);
        }
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let space = self
            .space
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut buffer = Vec::with_capacity(size);
        for i in 0..size as u64 {
            match space.bytes.get(&(address + i)) {
                Some(byte) => buffer.push(*byte),
                None if i == 0 => {
                    return Err(Error::MemoryReadFailed {
                        address,
                        message: "address not mapped".to_string(),
                    });
                }
                None => {
                    return Err(Error::ShortRead {
                        address,
                        expected: size,
                        actual: i as usize,
                    });
                }
            }
        }
        Ok(buffer)
    }

    fn base_address(&self) -> u64 {
        self.base
    }

    fn module_size(&self) -> usize {
        self.module_size
    }
}
