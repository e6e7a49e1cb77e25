pub mod layout;
mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use process::{ProcessHandle, ProcessInfo, find_process};
pub use reader::{MAX_VALID_ADDRESS, MIN_VALID_ADDRESS, ReadMemory, is_plausible_pointer};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
