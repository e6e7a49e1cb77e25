//! Anchors command: resolve and print the global anchor offsets.

use std::path::Path;

use anyhow::Result;
use uescope_core::{AnchorResolver, ProcessHandle, ReadMemory, save_signatures, validate_anchors};

use super::load_signature_set;

pub fn run(process: &str, signatures: Option<&Path>, export: Option<&Path>) -> Result<()> {
    let signature_set = load_signature_set(signatures)?;

    if let Some(path) = export {
        save_signatures(path, &signature_set)?;
        println!("Signature set written to {}", path.display());
    }

    let handle = ProcessHandle::open_by_name(process)?;
    println!(
        "Attached: {} (pid {}), module base 0x{:X}, size 0x{:X}",
        handle.name(),
        handle.pid(),
        handle.base_address(),
        handle.module_size()
    );

    let resolver = AnchorResolver::new(&handle);
    let anchors = resolver.resolve_all(&signature_set)?;

    println!();
    println!("worldRoot:  0x{:X}", anchors.world_root);
    println!("nameTable:  0x{:X}", anchors.name_table);
    match anchors.engine_root {
        Some(offset) => println!("engineRoot: 0x{:X}", offset),
        None => println!("engineRoot: unresolved (camera/player queries disabled)"),
    }

    println!();
    for validation in validate_anchors(&handle, &anchors) {
        let offset = validation
            .offset
            .map(|o| format!("0x{o:X}"))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<11} {:<12} {}", validation.kind, offset, validation.status);
    }

    Ok(())
}
