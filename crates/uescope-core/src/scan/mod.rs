mod pattern;
mod scanner;

pub use pattern::BytePattern;
pub use scanner::{PatternScanner, SCAN_CHUNK_SIZE, rip_target};
