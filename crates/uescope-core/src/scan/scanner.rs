//! Chunked wildcard scanning over the target's loaded image.

use memchr::memchr_iter;
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::scan::pattern::BytePattern;

/// Chunk size for module scans. Balances syscall overhead against local
/// buffer size; each chunk overlaps the previous by `pattern.len() - 1`
/// bytes so a match straddling a boundary is never missed.
pub const SCAN_CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the target of a RIP-relative operand: the displacement is
/// interpreted relative to the address of the *next* instruction. Pure
/// arithmetic, mirroring the CPU's addressing mode; nothing is executed.
pub fn rip_target(instr_offset: u64, instr_len: usize, disp: i32) -> u64 {
    (instr_offset + instr_len as u64).wrapping_add_signed(disp as i64)
}

/// Scans byte ranges of the target module for wildcard patterns.
pub struct PatternScanner<'a, R: ReadMemory> {
    reader: &'a R,
    chunk_size: usize,
}

impl<'a, R: ReadMemory> PatternScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            chunk_size: SCAN_CHUNK_SIZE,
        }
    }

    /// Override the chunk size. Overlap handling must hold for any size,
    /// so tests exercise small chunks that force boundary straddling.
    pub fn with_chunk_size(reader: &'a R, chunk_size: usize) -> Self {
        Self { reader, chunk_size }
    }

    /// Scan the whole module for `pattern`.
    pub fn scan_module(&self, pattern: &BytePattern) -> Result<Vec<u64>> {
        self.scan(pattern, 0, self.reader.module_size())
    }

    /// Scan `[start, start + size)` (module-relative) for `pattern`.
    ///
    /// Returns every matching offset relative to the module base, in
    /// ascending order. Chunks that fail to read (unmapped or protected
    /// regions) are skipped, not fatal.
    pub fn scan(&self, pattern: &BytePattern, start: u64, size: usize) -> Result<Vec<u64>> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }

        let base = self.reader.base_address();
        let end = start + size as u64;
        let mut results = Vec::new();
        let mut offset = start;
        let mut tail: Vec<u8> = Vec::new();

        while offset < end {
            let read_size = ((end - offset) as usize).min(self.chunk_size);
            let chunk = match self.reader.read_bytes(base + offset, read_size) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("Skipping unreadable chunk at +{:#x}: {}", offset, e);
                    // A match cannot straddle an unreadable region.
                    tail.clear();
                    offset += read_size as u64;
                    continue;
                }
            };

            let mut data = Vec::with_capacity(tail.len() + chunk.len());
            data.extend_from_slice(&tail);
            data.extend_from_slice(&chunk);

            let data_start = offset - tail.len() as u64;
            find_matches(&data, data_start, pattern, &mut results);

            if pattern.len() > 1 {
                let keep = pattern.len() - 1;
                if data.len() >= keep {
                    tail = data[data.len() - keep..].to_vec();
                } else {
                    tail = data;
                }
            } else {
                tail.clear();
            }

            offset += read_size as u64;
        }

        results.sort_unstable();
        results.dedup();
        Ok(results)
    }

    /// Resolve the RIP-relative operand of an instruction at the given
    /// module-relative offset: reads the 4-byte little-endian displacement
    /// at `instr_offset + disp_offset` and returns the module-relative
    /// target offset.
    pub fn resolve_rip(
        &self,
        instr_offset: u64,
        instr_len: usize,
        disp_offset: usize,
    ) -> Result<u64> {
        let base = self.reader.base_address();
        let bytes = self
            .reader
            .read_bytes(base + instr_offset + disp_offset as u64, 4)?;
        let disp = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(rip_target(instr_offset, instr_len, disp))
    }
}

/// Collect all pattern matches within `buffer`, reporting offsets as
/// `buffer_start + position`. The first literal pattern byte is located
/// with `memchr` to skip over non-candidate positions quickly.
fn find_matches(buffer: &[u8], buffer_start: u64, pattern: &BytePattern, out: &mut Vec<u64>) {
    if buffer.len() < pattern.len() {
        return;
    }
    let last = buffer.len() - pattern.len();

    match pattern.first_literal() {
        Some((lit_pos, lit_byte)) => {
            for found in memchr_iter(lit_byte, buffer) {
                let Some(start) = found.checked_sub(lit_pos) else {
                    continue;
                };
                if start > last {
                    break;
                }
                if pattern.matches_at(buffer, start) {
                    out.push(buffer_start + start as u64);
                }
            }
        }
        // All-wildcard pattern: every window matches.
        None => {
            for start in 0..=last {
                out.push(buffer_start + start as u64);
            }
        }
    }
}
