//! Code signatures: byte patterns plus the information needed to turn a
//! match into an anchor offset.
//!
//! Signature sets are JSON-serializable so they can be re-derived and
//! shipped separately when the target binary updates; `builtin_signatures`
//! provides the tuned defaults for the current build.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scan::BytePattern;

fn default_instr_len() -> usize {
    7
}

fn default_disp_offset() -> usize {
    3
}

/// One scannable signature. The pattern locates an instruction that
/// references the anchor through a RIP-relative operand; `instr_offset`
/// points at that instruction within the match, `disp_offset` at the
/// 4-byte displacement within the instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSignature {
    pub pattern: String,
    #[serde(default)]
    pub instr_offset: usize,
    #[serde(default = "default_disp_offset")]
    pub disp_offset: usize,
    #[serde(default = "default_instr_len")]
    pub instr_len: usize,
    /// Fixed adjustment applied to the resolved target.
    #[serde(default)]
    pub addend: i64,
}

impl CodeSignature {
    /// A `mov reg, [rip+disp]`-shaped signature: instruction at the match
    /// start, 7 bytes long, displacement at byte 3.
    pub fn rip_load(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            instr_offset: 0,
            disp_offset: default_disp_offset(),
            instr_len: default_instr_len(),
            addend: 0,
        }
    }

    /// Same shape with the instruction at a byte offset inside the match.
    pub fn rip_load_at(pattern: &str, instr_offset: usize) -> Self {
        Self {
            instr_offset,
            ..Self::rip_load(pattern)
        }
    }

    pub fn parsed_pattern(&self) -> Result<BytePattern> {
        BytePattern::parse(&self.pattern)
    }
}

/// Ranked signatures for one anchor, most specific first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorSignatureEntry {
    pub name: String,
    /// A match count in `1..=ideal_max` is trusted immediately.
    #[serde(default = "AnchorSignatureEntry::default_ideal_max")]
    pub ideal_max: usize,
    /// Match counts up to this are still collected for frequency voting;
    /// above it the signature is considered noise and skipped.
    #[serde(default = "AnchorSignatureEntry::default_wide_max")]
    pub wide_max: usize,
    pub signatures: Vec<CodeSignature>,
}

impl AnchorSignatureEntry {
    fn default_ideal_max() -> usize {
        5
    }

    fn default_wide_max() -> usize {
        20
    }
}

/// The full per-binary-version signature schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorSignatureSet {
    pub version: String,
    pub entries: Vec<AnchorSignatureEntry>,
}

impl AnchorSignatureSet {
    pub fn entry(&self, name: &str) -> Option<&AnchorSignatureEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<AnchorSignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &AnchorSignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_defaults() {
        let sig = CodeSignature::rip_load("48 8B 1D ?? ?? ?? ??");
        assert_eq!(sig.instr_offset, 0);
        assert_eq!(sig.disp_offset, 3);
        assert_eq!(sig.instr_len, 7);
        assert_eq!(sig.addend, 0);
        assert_eq!(sig.parsed_pattern().unwrap().len(), 7);
    }

    #[test]
    fn test_json_defaults_fill_in() {
        let json = r#"{
            "version": "1",
            "entries": [
                {
                    "name": "worldRoot",
                    "signatures": [{ "pattern": "48 8B 1D ?? ?? ?? ??" }]
                }
            ]
        }"#;
        let set: AnchorSignatureSet = serde_json::from_str(json).unwrap();
        let entry = set.entry("worldroot").unwrap();
        assert_eq!(entry.ideal_max, 5);
        assert_eq!(entry.wide_max, 20);
        assert_eq!(entry.signatures[0].instr_len, 7);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let set = AnchorSignatureSet {
            version: "test".to_string(),
            entries: vec![AnchorSignatureEntry {
                name: "nameTable".to_string(),
                ideal_max: 5,
                wide_max: 100,
                signatures: vec![CodeSignature::rip_load("4C 8D 05 ?? ?? ?? ?? EB")],
            }],
        };

        let file = tempfile::NamedTempFile::new().unwrap();
        save_signatures(file.path(), &set).unwrap();
        let loaded = load_signatures(file.path()).unwrap();
        assert_eq!(loaded.version, "test");
        assert_eq!(loaded.entry("nameTable").unwrap().wide_max, 100);
    }
}
