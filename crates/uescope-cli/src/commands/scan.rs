//! Scan command: raw pattern search over the target module.

use anyhow::Result;
use uescope_core::{BytePattern, PatternScanner, ProcessHandle, ReadMemory};

pub fn run(
    process: &str,
    pattern: &str,
    rip: bool,
    instr_len: usize,
    disp_offset: usize,
) -> Result<()> {
    let pattern = BytePattern::parse(pattern)?;
    let handle = ProcessHandle::open_by_name(process)?;
    println!(
        "Scanning {} (module base 0x{:X}, size 0x{:X}) for: {}",
        handle.name(),
        handle.base_address(),
        handle.module_size(),
        pattern
    );

    let scanner = PatternScanner::new(&handle);
    let matches = scanner.scan_module(&pattern)?;
    println!("{} matches", matches.len());

    for offset in &matches {
        if rip {
            match scanner.resolve_rip(*offset, instr_len, disp_offset) {
                Ok(target) => println!("  +0x{offset:X} -> target +0x{target:X}"),
                Err(e) => println!("  +0x{offset:X} -> unresolvable ({e})"),
            }
        } else {
            println!("  +0x{offset:X}");
        }
    }

    Ok(())
}
