//! Interned-name resolution.
//!
//! The target deduplicates every object and class name into a pooled table
//! of chunks. A name is identified by a packed 32-bit index: the high half
//! selects a chunk, the low half the 2-byte-granular offset inside it. The
//! entry starts with a u16 header whose top bits store the byte length of
//! the name that follows.

use crate::error::{Error, Result};
use crate::memory::layout::{names, object};
use crate::memory::{ReadMemory, is_plausible_pointer};

/// Reader for the target's interned-name table.
pub struct NamePool<'a, R: ReadMemory> {
    reader: &'a R,
    /// Absolute address of the chunk table.
    table: u64,
}

impl<'a, R: ReadMemory> NamePool<'a, R> {
    pub fn new(reader: &'a R, table: u64) -> Self {
        Self { reader, table }
    }

    /// Resolve a packed name index to its string.
    ///
    /// Fails with [`Error::NameDecodeFailed`] on a zero index or a length
    /// outside `(0, 1024]`; callers in container walks substitute a
    /// sentinel and continue instead of aborting.
    pub fn read_name(&self, index: u32) -> Result<String> {
        if index == 0 {
            return Err(Error::NameDecodeFailed {
                index,
                reason: "zero name index".to_string(),
            });
        }

        let chunk = (index >> 16) as u64;
        let offset = (index & 0xFFFF) as u64;

        // The first table slots are pool bookkeeping, not chunk pointers.
        let slot = self.table + names::SLOT_SIZE * (chunk + names::HEADER_SLOTS);
        let chunk_ptr = self.reader.read_pointer(slot)?;
        if !is_plausible_pointer(chunk_ptr) {
            return Err(Error::InvalidPointer(chunk_ptr));
        }

        let entry = chunk_ptr + 2 * offset;
        let header = self.reader.read_u16(entry)?;
        let len = (header >> names::LEN_SHIFT) as usize;
        if len == 0 || len > names::MAX_LEN {
            return Err(Error::NameDecodeFailed {
                index,
                reason: format!("decoded length {len} out of range"),
            });
        }

        let bytes = self.reader.read_bytes(entry + 2, len)?;
        let name = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\0')
            .to_string();
        Ok(name)
    }

    /// Resolve the name of a reflected object via the index stored in its
    /// header.
    pub fn read_object_name(&self, object_ptr: u64) -> Result<String> {
        let index = self.reader.read_u32(object_ptr + object::NAME)?;
        self.read_name(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    pub(crate) const TABLE: u64 = 0x1_4000_3000;
    pub(crate) const CHUNK0: u64 = 0x2_1000_0000;

    /// Install a chunk table with one chunk and return a writer closure
    /// target for entries.
    pub(crate) fn install_pool(builder: &mut MockMemoryBuilder) {
        builder.write_u64(TABLE + 8 * 2, CHUNK0);
    }

    /// Write a name entry at `offset` (in 2-byte units) and return its
    /// packed index for chunk 0.
    pub(crate) fn install_name(builder: &mut MockMemoryBuilder, offset: u16, name: &str) -> u32 {
        let entry = CHUNK0 + 2 * offset as u64;
        builder.write_u16(entry, (name.len() as u16) << 6);
        builder.write_bytes(entry + 2, name.as_bytes());
        offset as u32
    }

    fn pool_with(names: &[(u16, &str)]) -> MockMemoryReader {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        for (offset, name) in names {
            install_name(&mut builder, *offset, name);
        }
        builder.build()
    }

    #[test]
    fn test_read_name() {
        let memory = pool_with(&[(0x10, "Actor"), (0x40, "BP_Mon_Wolf")]);
        let pool = NamePool::new(&memory, TABLE);
        assert_eq!(pool.read_name(0x10).unwrap(), "Actor");
        assert_eq!(pool.read_name(0x40).unwrap(), "BP_Mon_Wolf");
    }

    #[test]
    fn test_zero_index_fails() {
        let memory = pool_with(&[(0x10, "Actor")]);
        let pool = NamePool::new(&memory, TABLE);
        assert!(matches!(
            pool.read_name(0),
            Err(Error::NameDecodeFailed { .. })
        ));
    }

    #[test]
    fn test_zero_length_header_fails() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        builder.write_u16(CHUNK0 + 2 * 0x20, 0);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        assert!(matches!(
            pool.read_name(0x20),
            Err(Error::NameDecodeFailed { .. })
        ));
    }

    #[test]
    fn test_truncated_entry_fails() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        // Header claims 500 bytes but only the header itself is mapped.
        builder.write_u16(CHUNK0 + 2 * 0x20, 500 << 6);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let err = pool.read_name(0x20).unwrap_err();
        assert!(err.is_read_failure(), "unexpected error: {err}");
    }

    #[test]
    fn test_unmapped_chunk_fails() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        // Chunk 1 slot was never written (zero pointer).
        assert!(pool.read_name(0x1_0010).is_err());
    }

    #[test]
    fn test_read_object_name() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let index = install_name(&mut builder, 0x30, "Pawn");
        let object_ptr = 0x2_2000_0000;
        builder.write_u32(object_ptr + crate::memory::layout::object::NAME, index);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        assert_eq!(pool.read_object_name(object_ptr).unwrap(), "Pawn");
    }
}
