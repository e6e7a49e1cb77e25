//! Foreign container walks.
//!
//! The target keeps its id -> object maps in open-addressed hash
//! containers: a flat array of fixed-size slots, each carrying a key, a
//! value pointer, and a hash-chain index whose sentinel value marks a
//! tombstoned slot. The walk trusts nothing: counts are capped, dead slots
//! skipped, and a slot that fails to read never aborts the rest.

use tracing::debug;

use crate::error::Result;
use crate::memory::layout::{limits, slot};
use crate::memory::{ReadMemory, is_plausible_pointer};

/// Descriptor of a hash container as stored in the target.
#[derive(Debug, Clone, Copy)]
pub struct HashContainer {
    /// Foreign address of the slot array.
    pub data: u64,
    /// Declared element count.
    pub count: i32,
    /// Allocated capacity.
    pub capacity: i32,
}

/// Read a container descriptor at `address`.
pub fn read_container<R: ReadMemory>(reader: &R, address: u64) -> Result<HashContainer> {
    let data = reader.read_pointer(address)?;
    let count = reader.read_i32(address + 8)?;
    let capacity = reader.read_i32(address + 12)?;
    Ok(HashContainer {
        data,
        count,
        capacity,
    })
}

/// Collect `(key, value_ptr)` pairs from every live slot.
///
/// Iterates slot indices `0..min(count, cap)`; `cap` additionally guards
/// against a corrupted count implying an unbounded loop. Slots whose
/// hash-chain index holds the empty sentinel, whose value pointer is not
/// plausible, or which fail to read are skipped.
pub fn live_slots<R: ReadMemory>(
    reader: &R,
    container: &HashContainer,
    cap: usize,
) -> Vec<(i32, u64)> {
    let mut pairs = Vec::new();

    if container.count <= 0 || !is_plausible_pointer(container.data) {
        return pairs;
    }

    let limit = (container.count as usize).min(cap).min(limits::MAX_CONTAINER_SLOTS);
    for i in 0..limit {
        let slot_addr = container.data + i as u64 * slot::SIZE;

        let hash_index = match reader.read_i32(slot_addr + slot::HASH_INDEX) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping slot {i}: {e}");
                continue;
            }
        };
        if hash_index == slot::EMPTY {
            continue;
        }

        let key = match reader.read_i32(slot_addr + slot::KEY) {
            Ok(value) => value,
            Err(_) => continue,
        };
        let value = match reader.read_pointer(slot_addr + slot::VALUE) {
            Ok(value) => value,
            Err(_) => continue,
        };
        if !is_plausible_pointer(value) {
            continue;
        }

        pairs.push((key, value));
    }

    pairs
}

/// Descriptor of a plain (data, num, max) foreign array.
#[derive(Debug, Clone, Copy)]
pub struct ForeignArray {
    pub data: u64,
    pub num: i32,
    pub max: i32,
}

/// Read an array descriptor at `address`.
pub fn read_array<R: ReadMemory>(reader: &R, address: u64) -> Result<ForeignArray> {
    let data = reader.read_pointer(address)?;
    let num = reader.read_i32(address + 8)?;
    let max = reader.read_i32(address + 12)?;
    Ok(ForeignArray { data, num, max })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    pub(crate) const CONTAINER: u64 = 0x2_3000_0000;
    pub(crate) const SLOTS: u64 = 0x2_3100_0000;

    /// Write a container descriptor plus its slot array. `entries` holds
    /// `(key, value, live)` triples.
    pub(crate) fn install_container(
        builder: &mut MockMemoryBuilder,
        address: u64,
        slots_addr: u64,
        entries: &[(i32, u64, bool)],
    ) {
        builder.write_u64(address, slots_addr);
        builder.write_i32(address + 8, entries.len() as i32);
        builder.write_i32(address + 12, entries.len() as i32);

        for (i, (key, value, live)) in entries.iter().enumerate() {
            let slot_addr = slots_addr + i as u64 * slot::SIZE;
            builder.write_i32(slot_addr, *key);
            builder.write_u64(slot_addr + slot::VALUE, *value);
            let hash_index = if *live { i as i32 } else { slot::EMPTY };
            builder.write_i32(slot_addr + slot::HASH_INDEX, hash_index);
        }
    }

    fn build_with(entries: &[(i32, u64, bool)]) -> MockMemoryReader {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x1000);
        install_container(&mut builder, CONTAINER, SLOTS, entries);
        builder.build()
    }

    #[test]
    fn test_live_and_tombstoned_slots_interleaved() {
        let memory = build_with(&[
            (1, 0x2_4000_0000, true),
            (2, 0x2_4000_1000, false),
            (3, 0x2_4000_2000, true),
            (4, 0x2_4000_3000, false),
            (5, 0x2_4000_4000, true),
        ]);

        let container = read_container(&memory, CONTAINER).unwrap();
        assert_eq!(container.count, 5);

        let pairs = live_slots(&memory, &container, limits::MAX_CONTAINER_SLOTS);
        assert_eq!(
            pairs,
            vec![
                (1, 0x2_4000_0000),
                (3, 0x2_4000_2000),
                (5, 0x2_4000_4000)
            ]
        );
    }

    #[test]
    fn test_cap_bounds_walk() {
        let entries: Vec<(i32, u64, bool)> = (0..10)
            .map(|i| (i, 0x2_4000_0000 + i as u64 * 0x100, true))
            .collect();
        let memory = build_with(&entries);

        let container = read_container(&memory, CONTAINER).unwrap();
        let pairs = live_slots(&memory, &container, 4);
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_corrupted_count_is_capped() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x1000);
        install_container(&mut builder, CONTAINER, SLOTS, &[(1, 0x2_4000_0000, true)]);
        // Corrupt the declared count; only mapped slots can produce pairs
        // and the cap keeps the loop finite.
        builder.write_i32(CONTAINER + 8, i32::MAX);
        let memory = builder.build();

        let container = read_container(&memory, CONTAINER).unwrap();
        let pairs = live_slots(&memory, &container, limits::MAX_CONTAINER_SLOTS);
        assert_eq!(pairs, vec![(1, 0x2_4000_0000)]);
    }

    #[test]
    fn test_implausible_value_pointer_skipped() {
        let memory = build_with(&[(1, 0x10, true), (2, 0x2_4000_0000, true)]);
        let container = read_container(&memory, CONTAINER).unwrap();
        let pairs = live_slots(&memory, &container, limits::MAX_CONTAINER_SLOTS);
        assert_eq!(pairs, vec![(2, 0x2_4000_0000)]);
    }

    #[test]
    fn test_null_data_pointer_yields_empty() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x1000);
        builder.write_u64(CONTAINER, 0);
        builder.write_i32(CONTAINER + 8, 5);
        builder.write_i32(CONTAINER + 12, 5);
        let memory = builder.build();

        let container = read_container(&memory, CONTAINER).unwrap();
        assert!(live_slots(&memory, &container, 100).is_empty());
    }

    #[test]
    fn test_read_array() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x1000);
        builder.write_u64(0x2_5000_0000, 0x2_5100_0000);
        builder.write_i32(0x2_5000_0000 + 8, 3);
        builder.write_i32(0x2_5000_0000 + 12, 8);
        let memory = builder.build();

        let array = read_array(&memory, 0x2_5000_0000).unwrap();
        assert_eq!(array.data, 0x2_5100_0000);
        assert_eq!(array.num, 3);
        assert_eq!(array.max, 8);
    }
}
