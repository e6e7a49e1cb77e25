//! Debug utilities for analyzing target memory and re-deriving anchors.
//!
//! This module provides per-anchor validation reports for CLI tools and
//! offset re-derivation workflows; it is not intended for production use.

use std::fmt;

use crate::anchor::{AnchorKind, AnchorSet};
use crate::memory::{ReadMemory, is_plausible_pointer};

/// Validation outcome for one anchor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStatus {
    /// Slot readable, pointer plausible, target dereferenceable.
    Valid,
    /// Slot readable but the stored pointer is outside the plausible range.
    ImplausiblePointer,
    /// Slot readable, pointer plausible, but the target is unreadable.
    DeadTarget,
    /// The slot itself could not be read.
    Unreadable,
    /// The anchor was never resolved.
    Unresolved,
}

impl fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AnchorStatus::Valid => "valid",
            AnchorStatus::ImplausiblePointer => "implausible pointer",
            AnchorStatus::DeadTarget => "dead target",
            AnchorStatus::Unreadable => "unreadable slot",
            AnchorStatus::Unresolved => "unresolved",
        };
        f.write_str(text)
    }
}

/// Validation report for one anchor.
#[derive(Debug, Clone)]
pub struct AnchorValidation {
    pub kind: AnchorKind,
    pub offset: Option<u64>,
    pub pointer: Option<u64>,
    pub status: AnchorStatus,
}

/// Re-check every resolved anchor against the live target.
///
/// Useful after a suspected game update: a previously-valid anchor whose
/// slot no longer dereferences indicates the signatures must be re-derived.
pub fn validate_anchors<R: ReadMemory>(reader: &R, anchors: &AnchorSet) -> Vec<AnchorValidation> {
    use strum::IntoEnumIterator;

    AnchorKind::iter()
        .map(|kind| match anchors.get(kind) {
            None => AnchorValidation {
                kind,
                offset: None,
                pointer: None,
                status: AnchorStatus::Unresolved,
            },
            Some(offset) => {
                let slot = reader.base_address() + offset;
                match reader.read_u64(slot) {
                    Err(_) => AnchorValidation {
                        kind,
                        offset: Some(offset),
                        pointer: None,
                        status: AnchorStatus::Unreadable,
                    },
                    Ok(pointer) => {
                        let status = if !is_plausible_pointer(pointer) {
                            AnchorStatus::ImplausiblePointer
                        } else if reader.read_bytes(pointer, 16).is_err() {
                            AnchorStatus::DeadTarget
                        } else {
                            AnchorStatus::Valid
                        };
                        AnchorValidation {
                            kind,
                            offset: Some(offset),
                            pointer: Some(pointer),
                            status,
                        }
                    }
                }
            }
        })
        .collect()
}
