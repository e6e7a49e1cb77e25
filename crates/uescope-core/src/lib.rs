//! # uescope-core
//!
//! Typed entity inspection of a live Unreal Engine game process, without
//! symbols or debug metadata.
//!
//! This crate provides:
//! - Bounds-checked foreign memory reads over an attached process
//! - Chunked wildcard pattern scanning with RIP-relative resolution
//! - Anchor resolution (world root, name table, engine root) via ranked
//!   signatures, reference-frequency voting, and pointer validation
//! - Typed object decoding: interned names, hash-container walks, bounded
//!   class-hierarchy traversal, and conditional state fields
//! - A time-boxed entity snapshot cache with a narrow per-handle refresh
//!
//! ## Feature Flags
//!
//! - `debug-tools`: enables extra introspection helpers for CLI tools and
//!   offset re-derivation; not intended for production use.

pub mod anchor;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod decode;
pub mod entity;
pub mod error;
pub mod memory;
pub mod scan;
pub mod session;
pub mod snapshot;

pub use anchor::{
    AnchorKind, AnchorResolver, AnchorSet, AnchorSignatureEntry, AnchorSignatureSet,
    CodeSignature, builtin_signatures, load_signatures, save_signatures,
};
pub use decode::{
    ForeignArray, HashContainer, NamePool, ObjectDecoder, class_hierarchy, is_actor_hierarchy,
    live_slots, read_array, read_container,
};
pub use entity::{
    ComponentInfo, EntityInfo, EntitySnapshot, NpcPetState, Rotator, UNKNOWN_CLASS, Vector3,
};
pub use error::{Error, Result};
pub use memory::{ProcessHandle, ProcessInfo, ReadMemory, find_process, is_plausible_pointer};
pub use scan::{BytePattern, PatternScanner, rip_target};
pub use session::Session;
pub use snapshot::SnapshotCache;

#[cfg(feature = "debug-tools")]
pub use debug::{AnchorStatus, AnchorValidation, validate_anchors};
