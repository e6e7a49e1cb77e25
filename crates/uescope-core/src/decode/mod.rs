mod containers;
mod hierarchy;
mod names;
mod object;

pub use containers::{ForeignArray, HashContainer, live_slots, read_array, read_container};
pub use hierarchy::{ROOT_ACTOR_NAMES, class_hierarchy, is_actor_hierarchy, is_root_actor};
pub use names::NamePool;
pub use object::ObjectDecoder;
