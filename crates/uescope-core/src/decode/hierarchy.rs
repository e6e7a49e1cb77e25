//! Class hierarchy walks.
//!
//! A class descriptor's superclass pointer is a foreign, unvalidated
//! linked structure: it can be null, dangling, self-referential, or cyclic
//! when the underlying memory is corrupt or mid-update. The walk therefore
//! tracks visited addresses and stops unconditionally at a fixed depth.

use crate::decode::names::NamePool;
use crate::memory::layout::{class, limits};
use crate::memory::{ReadMemory, is_plausible_pointer};

/// Names the root actor class can decode to.
pub const ROOT_ACTOR_NAMES: [&str; 2] = ["Actor", "AActor"];

/// Whether a class name is the root actor class.
pub fn is_root_actor(name: &str) -> bool {
    ROOT_ACTOR_NAMES.contains(&name)
}

/// Whether any class in a hierarchy is the root actor class.
pub fn is_actor_hierarchy(hierarchy: &[String]) -> bool {
    hierarchy.iter().any(|name| is_root_actor(name))
}

/// Walk the superclass chain starting at `class_ptr`.
///
/// Returns names from most-derived to the point enumeration stopped: the
/// root actor class (no information beyond it), a name decode failure, a
/// self-cycle or revisited address, an implausible pointer, or the depth
/// cap. Never fails: a corrupt chain just yields a shorter list.
pub fn class_hierarchy<R: ReadMemory>(
    reader: &R,
    names: &NamePool<'_, R>,
    class_ptr: u64,
) -> Vec<String> {
    let mut hierarchy = Vec::new();
    let mut visited: Vec<u64> = Vec::new();
    let mut current = class_ptr;

    while is_plausible_pointer(current) && hierarchy.len() < limits::MAX_HIERARCHY_DEPTH {
        let name = match names.read_object_name(current) {
            Ok(name) if !name.is_empty() => name,
            _ => break,
        };

        let at_root = is_root_actor(&name);
        hierarchy.push(name);
        if at_root {
            break;
        }

        let superclass = match reader.read_pointer(current + class::SUPER) {
            Ok(pointer) => pointer,
            Err(_) => break,
        };
        if superclass == current || visited.contains(&superclass) {
            break;
        }

        visited.push(current);
        current = superclass;
    }

    hierarchy
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::decode::names::tests::{TABLE, install_name, install_pool};
    use crate::memory::MockMemoryBuilder;
    use crate::memory::layout::object;

    /// Install a class object whose name is `name` and whose superclass
    /// pointer is `superclass` (0 for none).
    pub(crate) fn install_class(
        builder: &mut MockMemoryBuilder,
        address: u64,
        name_offset: u16,
        name: &str,
        superclass: u64,
    ) {
        let index = install_name(builder, name_offset, name);
        builder.write_u32(address + object::NAME, index);
        builder.write_u64(address + class::SUPER, superclass);
    }

    #[test]
    fn test_three_level_chain_ends_at_root() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let monster = 0x2_6000_0000;
        let pawn = 0x2_6000_1000;
        let actor = 0x2_6000_2000;
        install_class(&mut builder, monster, 0x10, "Monster", pawn);
        install_class(&mut builder, pawn, 0x20, "Pawn", actor);
        // The walk must stop at the root even though a bogus superclass
        // pointer follows it.
        install_class(&mut builder, actor, 0x30, "Actor", 0x2_6000_3000);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let hierarchy = class_hierarchy(&memory, &pool, monster);
        assert_eq!(hierarchy, vec!["Monster", "Pawn", "Actor"]);
        assert!(is_actor_hierarchy(&hierarchy));
    }

    #[test]
    fn test_self_cycle_terminates() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let derived = 0x2_6000_0000;
        let looped = 0x2_6000_1000;
        install_class(&mut builder, derived, 0x10, "Derived", looped);
        install_class(&mut builder, looped, 0x20, "Looped", looped);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let hierarchy = class_hierarchy(&memory, &pool, derived);
        assert_eq!(hierarchy, vec!["Derived", "Looped"]);
        assert!(!is_actor_hierarchy(&hierarchy));
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let a = 0x2_6000_0000;
        let b = 0x2_6000_1000;
        install_class(&mut builder, a, 0x10, "A", b);
        install_class(&mut builder, b, 0x20, "B", a);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let hierarchy = class_hierarchy(&memory, &pool, a);
        assert_eq!(hierarchy, vec!["A", "B"]);
    }

    #[test]
    fn test_long_chain_truncated_at_depth_cap() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let bases: Vec<u64> = (0..15).map(|i| 0x2_6000_0000 + i * 0x1000).collect();
        let class_names: Vec<String> = (0..15).map(|i| format!("Class{i}")).collect();
        for i in 0..15 {
            let superclass = if i + 1 < 15 { bases[i + 1] } else { 0 };
            install_class(
                &mut builder,
                bases[i],
                0x10 + i as u16 * 0x10,
                &class_names[i],
                superclass,
            );
        }
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let hierarchy = class_hierarchy(&memory, &pool, bases[0]);
        assert_eq!(hierarchy.len(), limits::MAX_HIERARCHY_DEPTH);
        assert_eq!(hierarchy[0], "Class0");
        assert_eq!(hierarchy[9], "Class9");
    }

    #[test]
    fn test_corrupt_name_stops_walk() {
        let mut builder = MockMemoryBuilder::new(0x1_4000_0000, 0x4000);
        install_pool(&mut builder);
        let derived = 0x2_6000_0000;
        let broken = 0x2_6000_1000;
        install_class(&mut builder, derived, 0x10, "Derived", broken);
        // `broken` has a zero name index: decode fails, walk stops.
        builder.write_u32(broken + object::NAME, 0);
        builder.write_u64(broken + class::SUPER, 0);
        let memory = builder.build();

        let pool = NamePool::new(&memory, TABLE);
        let hierarchy = class_hierarchy(&memory, &pool, derived);
        assert_eq!(hierarchy, vec!["Derived"]);
    }
}
