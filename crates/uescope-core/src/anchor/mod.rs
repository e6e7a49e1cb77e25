mod builtin;
mod resolver;
mod signature;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub use builtin::builtin_signatures;
pub use resolver::AnchorResolver;
pub use signature::{
    AnchorSignatureEntry, AnchorSignatureSet, CodeSignature, load_signatures, save_signatures,
};

/// The global addresses recovered from the target binary without symbols.
///
/// Each anchor is a module-relative offset, stable for the lifetime of the
/// target process (the code layout does not change while it runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum AnchorKind {
    /// Pointer to the live world object. Required.
    WorldRoot,
    /// The interned-name chunk table. Required.
    NameTable,
    /// Pointer to the engine root object; only camera/player queries need
    /// it, so resolution failure degrades those instead of aborting.
    EngineRoot,
}

impl AnchorKind {
    /// Whether a session can exist without this anchor.
    pub fn required(&self) -> bool {
        !matches!(self, AnchorKind::EngineRoot)
    }

    /// Name of the matching entry in an [`AnchorSignatureSet`].
    pub fn entry_name(&self) -> &'static str {
        match self {
            AnchorKind::WorldRoot => "worldRoot",
            AnchorKind::NameTable => "nameTable",
            AnchorKind::EngineRoot => "engineRoot",
        }
    }
}

/// Module-relative offsets of the resolved anchors. Immutable once built.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnchorSet {
    pub world_root: u64,
    pub name_table: u64,
    pub engine_root: Option<u64>,
}

impl AnchorSet {
    pub fn get(&self, kind: AnchorKind) -> Option<u64> {
        match kind {
            AnchorKind::WorldRoot => Some(self.world_root),
            AnchorKind::NameTable => Some(self.name_table),
            AnchorKind::EngineRoot => self.engine_root,
        }
    }
}
