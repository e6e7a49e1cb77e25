//! Hexdump command: display raw foreign memory, useful for verifying
//! structure offsets against a live target.

use anyhow::Result;
use uescope_core::{ProcessHandle, ReadMemory};

use super::parse_hex_address;

pub fn run(process: &str, address: &str, size: usize) -> Result<()> {
    let address = parse_hex_address(address)?;
    let handle = ProcessHandle::open_by_name(process)?;
    let bytes = handle.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();

    for (i, chunk) in bytes.chunks(16).enumerate() {
        print!("0x{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                print!(" ");
            }
            print!("{byte:02X} ");
        }
        for j in chunk.len()..16 {
            if j == 8 {
                print!(" ");
            }
            print!("   ");
        }

        print!(" |");
        for byte in chunk {
            if (0x20..0x7F).contains(byte) {
                print!("{}", *byte as char);
            } else {
                print!(".");
            }
        }
        println!("|");
    }

    Ok(())
}
