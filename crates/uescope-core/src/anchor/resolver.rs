//! Anchor resolution: ranked signature scanning, reference-frequency
//! voting, and live-pointer validation.
//!
//! The target binary is ASLR-relocated and ships without symbols, so the
//! only way to find the global anchors is to locate the instructions that
//! reference them. For each anchor we try signatures from most to least
//! specific. A small match count is trusted outright; a larger one enters
//! frequency voting: every match resolves through its RIP-relative operand
//! to a target offset, and the true anchor is the target referenced most
//! uniformly across the binary; byte coincidences do not repeat.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::anchor::signature::{AnchorSignatureSet, CodeSignature};
use crate::anchor::{AnchorKind, AnchorSet};
use crate::error::{Error, Result};
use crate::memory::{ReadMemory, is_plausible_pointer};
use crate::scan::PatternScanner;

/// How many of the highest-voted candidates are pointer-validated before
/// falling back to the raw vote winner.
const MAX_VALIDATED_CANDIDATES: usize = 20;

pub struct AnchorResolver<'a, R: ReadMemory> {
    reader: &'a R,
    scanner: PatternScanner<'a, R>,
}

impl<'a, R: ReadMemory> AnchorResolver<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            scanner: PatternScanner::new(reader),
        }
    }

    /// Resolve all three anchors. World root and name table are required;
    /// a missing engine root only degrades camera/player queries.
    pub fn resolve_all(&self, signatures: &AnchorSignatureSet) -> Result<AnchorSet> {
        let world_root = self.resolve(signatures, AnchorKind::WorldRoot)?;
        let name_table = self.resolve(signatures, AnchorKind::NameTable)?;
        let engine_root = match self.resolve(signatures, AnchorKind::EngineRoot) {
            Ok(offset) => Some(offset),
            Err(e) => {
                warn!("Engine root unresolved: {e}; camera and player queries disabled");
                None
            }
        };

        info!(
            "Anchors resolved: worldRoot={:#x}, nameTable={:#x}, engineRoot={}",
            world_root,
            name_table,
            engine_root
                .map(|o| format!("{o:#x}"))
                .unwrap_or_else(|| "unresolved".to_string()),
        );

        Ok(AnchorSet {
            world_root,
            name_table,
            engine_root,
        })
    }

    /// Resolve a single anchor to its module-relative offset.
    pub fn resolve(&self, signatures: &AnchorSignatureSet, kind: AnchorKind) -> Result<u64> {
        let entry = signatures.entry(kind.entry_name()).ok_or_else(|| {
            Error::AnchorUnresolved {
                anchor: kind.to_string(),
                message: format!("no signature entry named '{}'", kind.entry_name()),
            }
        })?;

        let mut tally: HashMap<u64, usize> = HashMap::new();

        for sig in &entry.signatures {
            let pattern = sig.parsed_pattern()?;
            let matches = self.scanner.scan_module(&pattern)?;
            if matches.is_empty() {
                continue;
            }

            if matches.len() <= entry.ideal_max {
                debug!(
                    "{kind}: '{}' matched {} times (ideal band)",
                    pattern,
                    matches.len()
                );
                self.tally_targets(sig, &matches, &mut tally);
                if !tally.is_empty() {
                    break;
                }
            } else if matches.len() <= entry.wide_max {
                debug!(
                    "{kind}: '{}' matched {} times (wide band), collecting votes",
                    pattern,
                    matches.len()
                );
                self.tally_targets(sig, &matches, &mut tally);
            } else {
                debug!(
                    "{kind}: '{}' matched {} times, above wide band; skipping",
                    pattern,
                    matches.len()
                );
            }
        }

        if tally.is_empty() {
            return Err(Error::AnchorUnresolved {
                anchor: kind.to_string(),
                message: "no signature produced a candidate target".to_string(),
            });
        }

        // Highest vote count first; ties broken by lowest offset so the
        // result is deterministic.
        let mut candidates: Vec<(u64, usize)> = tally.into_iter().collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (offset, votes) in candidates.iter().take(MAX_VALIDATED_CANDIDATES) {
            if self.validate_candidate(*offset) {
                debug!("{kind}: selected {:#x} ({} refs, validated)", offset, votes);
                return Ok(*offset);
            }
        }

        let (best, votes) = candidates[0];
        warn!(
            "{kind}: no candidate passed pointer validation; using highest-voted {:#x} ({} refs)",
            best, votes
        );
        Ok(best)
    }

    /// Resolve each match through its RIP-relative operand and count
    /// occurrences per target offset.
    fn tally_targets(
        &self,
        sig: &CodeSignature,
        matches: &[u64],
        tally: &mut HashMap<u64, usize>,
    ) {
        let module_size = self.reader.module_size() as u64;
        for match_offset in matches {
            let instr_offset = match_offset + sig.instr_offset as u64;
            let target = match self
                .scanner
                .resolve_rip(instr_offset, sig.instr_len, sig.disp_offset)
            {
                Ok(target) => target.wrapping_add_signed(sig.addend),
                Err(e) => {
                    debug!("Dropping match at +{:#x}: {}", match_offset, e);
                    continue;
                }
            };

            // A global lives inside the module image.
            if target >= module_size {
                continue;
            }

            *tally.entry(target).or_insert(0) += 1;
        }
    }

    /// Double-dereference sanity check: the candidate slot must hold a
    /// plausible pointer whose own target is readable.
    fn validate_candidate(&self, offset: u64) -> bool {
        let slot = self.reader.base_address() + offset;
        let pointer = match self.reader.read_u64(slot) {
            Ok(value) => value,
            Err(_) => return false,
        };
        if !is_plausible_pointer(pointer) {
            return false;
        }
        self.reader.read_bytes(pointer, 16).is_ok()
    }
}
