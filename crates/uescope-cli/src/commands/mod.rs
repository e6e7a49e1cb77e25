//! CLI command implementations.

pub mod anchors;
pub mod camera;
pub mod entities;
pub mod hexdump;
pub mod npcs;
pub mod points;
pub mod scan;
pub mod watch;

use std::path::Path;

use anyhow::Result;
use uescope_core::{AnchorSignatureSet, ProcessHandle, Session, builtin_signatures};

/// Load the signature schema: a user-provided JSON file or the built-ins.
pub fn load_signature_set(path: Option<&Path>) -> Result<AnchorSignatureSet> {
    match path {
        Some(path) => Ok(uescope_core::load_signatures(path)?),
        None => Ok(builtin_signatures()),
    }
}

/// Attach to the target process with the selected signature set.
pub fn open_session(process: &str, signatures: Option<&Path>) -> Result<Session<ProcessHandle>> {
    let signatures = load_signature_set(signatures)?;
    Ok(Session::attach_with(process, signatures)?)
}

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}
