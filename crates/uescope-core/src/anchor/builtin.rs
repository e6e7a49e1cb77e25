//! Built-in anchor signatures for the current target build.
//!
//! Each list is ordered from most specific (longest, usually unique) to
//! least specific (shorter, more false positives but more resilient to
//! small codegen changes). The world root is referenced from very few call
//! sites, so its acceptable band stays tight; the name table is referenced
//! from every name lookup in the binary, so its voting band is much wider.

use super::signature::{AnchorSignatureEntry, AnchorSignatureSet, CodeSignature};

/// Signature-set version tag; bump when patterns are re-derived.
pub const BUILTIN_VERSION: &str = "2026-06";

pub fn builtin_signatures() -> AnchorSignatureSet {
    AnchorSignatureSet {
        version: BUILTIN_VERSION.to_string(),
        entries: vec![
            world_root_entry(),
            name_table_entry(),
            engine_root_entry(),
        ],
    }
}

/// `mov rbx, [world]; test rbx, rbx; jz ...` as emitted by the engine's
/// frame tick, plus progressively shorter prefixes and register variants.
fn world_root_entry() -> AnchorSignatureEntry {
    AnchorSignatureEntry {
        name: "worldRoot".to_string(),
        ideal_max: 5,
        wide_max: 20,
        signatures: vec![
            CodeSignature::rip_load(
                "48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 41 B0 01 33 D2 48 8B CB E8",
            ),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 41 B0 01 33 D2 48 8B CB"),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 41 B0 01 33 D2"),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 41 B0 01"),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 85 C9 74 ?? 41 B0 01 33 D2 48 8B D1"),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 85 C9 74 ?? 41 B0 01 33 D2"),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 0F 84 ?? ?? ?? ?? 41 B0 01"),
        ],
    }
}

/// `lea r8, [names]` inside the name-formatting helper, then the
/// `mov rax, [names]; movsxd; shr` family from the lookup path.
fn name_table_entry() -> AnchorSignatureEntry {
    AnchorSignatureEntry {
        name: "nameTable".to_string(),
        ideal_max: 5,
        wide_max: 100,
        signatures: vec![
            CodeSignature::rip_load("4C 8D 05 ?? ?? ?? ?? EB ?? 48 8D 0D ?? ?? ?? ?? E8"),
            CodeSignature::rip_load("48 8B 05 ?? ?? ?? ?? 48 63 ?? 48 C1 ?? ?? 48 8D"),
            CodeSignature::rip_load("48 8B 05 ?? ?? ?? ?? 48 63 ?? 48 C1 ?? ?? 48 03"),
            CodeSignature::rip_load("48 8B 05 ?? ?? ?? ?? 48 63 ?? 48 C1 ?? ?? 4C 8B"),
            CodeSignature::rip_load("48 8B 05 ?? ?? ?? ?? 48 85 C0 74 ?? 48 63 ?? 48 C1"),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 85 C9 74 ?? 48 63 ?? 48 C1"),
            CodeSignature::rip_load("48 8B 05 ?? ?? ?? ?? 48 63 ?? 48 C1"),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 63 ?? 48 C1"),
        ],
    }
}

/// The engine root is written once during startup (`mov [engine], rax`
/// after the construction call) and read through null-checked loads.
fn engine_root_entry() -> AnchorSignatureEntry {
    AnchorSignatureEntry {
        name: "engineRoot".to_string(),
        ideal_max: 5,
        wide_max: 100,
        signatures: vec![
            CodeSignature::rip_load_at(
                "48 89 74 24 20 E8 ?? ?? ?? ?? 48 8B 4C 24 ?? 48 89 05 ?? ?? ?? ?? 48 85 C9 74 05 E8",
                15,
            ),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 85 C9 74 ?? 48 8B 01"),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 48 8B 03"),
            CodeSignature::rip_load("48 8B 0D ?? ?? ?? ?? 48 85 C9 74 ?? 48 8B 81"),
            CodeSignature::rip_load("48 8B 1D ?? ?? ?? ?? 48 85 DB 74 ?? 48 8B 83"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorKind;
    use strum::IntoEnumIterator;

    #[test]
    fn test_builtin_covers_every_anchor() {
        let set = builtin_signatures();
        for kind in AnchorKind::iter() {
            let entry = set
                .entry(kind.entry_name())
                .unwrap_or_else(|| panic!("missing entry for {kind}"));
            assert!(!entry.signatures.is_empty());
        }
    }

    #[test]
    fn test_builtin_patterns_are_well_formed() {
        let set = builtin_signatures();
        for entry in &set.entries {
            for sig in &entry.signatures {
                let pattern = sig.parsed_pattern().unwrap();
                // The displacement field must lie inside the instruction,
                // and the instruction must start inside the match.
                assert!(sig.disp_offset + 4 <= sig.instr_len, "{}", sig.pattern);
                assert!(sig.instr_offset < pattern.len(), "{}", sig.pattern);
            }
            // The first signature is the most specific one.
            let first = entry.signatures[0].parsed_pattern().unwrap();
            for sig in &entry.signatures[1..] {
                assert!(sig.parsed_pattern().unwrap().len() <= first.len());
            }
        }
    }
}
