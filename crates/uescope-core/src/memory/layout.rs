//! Memory layout constants for the target's engine structures.
//!
//! This module centralizes every structure-field byte offset used when
//! decoding the target process. Together with the anchor signatures these
//! constants are the per-binary-version "schema": when the game updates
//! they must be re-derived with the anchor tooling and updated here.

/// Object header offsets (shared by every reflected object).
pub mod object {
    /// Object -> packed interned-name index (u32).
    pub const NAME: u64 = 0x18;
    /// Object -> class descriptor pointer.
    pub const CLASS: u64 = 0x10;
}

/// Class descriptor offsets.
pub mod class {
    /// Class -> superclass pointer.
    pub const SUPER: u64 = 0x40;
}

/// World object offsets.
pub mod world {
    /// World -> game state pointer.
    pub const GAME_STATE: u64 = 0x130;
}

/// Game state offsets.
pub mod game_state {
    /// GameState -> battle object pointer.
    pub const BATTLE: u64 = 0xE90;
    /// GameState -> NPC map (hash container).
    pub const NPC_MAP: u64 = 0x6B8;
}

/// Battle object offsets.
pub mod battle {
    /// Battle -> entity map (hash container).
    pub const ENTITIES: u64 = 0x380;
    /// Battle -> battle point map (hash container).
    pub const POINTS: u64 = 0x940;
}

/// Open-addressed hash container slot layout.
pub mod slot {
    /// Slot size in bytes (key + padding + value + chain indices).
    pub const SIZE: u64 = 24;
    /// Integer key at the slot start.
    pub const KEY: u64 = 0;
    /// Value pointer.
    pub const VALUE: u64 = 8;
    /// Hash-chain index; the empty sentinel marks a tombstoned slot.
    pub const HASH_INDEX: u64 = 20;
    /// Sentinel stored in `HASH_INDEX` for non-live slots.
    pub const EMPTY: i32 = -1;
}

/// Actor offsets.
pub mod actor {
    /// Actor -> root scene component pointer.
    pub const ROOT_COMPONENT: u64 = 0x160;
    /// Actor -> owned components array.
    pub const OWNED_COMPONENTS: u64 = 0x168;
}

/// Scene component offsets.
pub mod component {
    /// Component -> world transform.
    pub const TO_WORLD: u64 = 0x1C0;
    /// Translation within the transform.
    pub const TRANSLATION: u64 = 0x10;
}

/// Type-conditional state field offsets.
pub mod state {
    /// Pet NPC -> interaction state byte.
    pub const PET_INTERACTIVE: u64 = 0x2224;
    /// Monster/boss -> death flag byte.
    pub const ALREADY_DEAD: u64 = 0x122B;
    /// Combat item -> active flag byte.
    pub const COMBAT_ITEM_ACTIVE: u64 = 0x8C1;
    /// Mechanism -> can-open flag byte.
    pub const MECHANISM_CAN_OPEN: u64 = 0x9D8;
    /// Mechanism -> open-state flag byte (directly after can-open).
    pub const MECHANISM_OPEN_STATE: u64 = 0x9D9;
}

/// Engine root -> camera/player chain offsets.
pub mod engine {
    /// Engine -> game instance pointer.
    pub const GAME_INSTANCE: u64 = 0xE18;
    /// GameInstance -> local players array data pointer.
    pub const LOCAL_PLAYERS: u64 = 0x38;
    /// LocalPlayer -> player controller pointer.
    pub const PLAYER_CONTROLLER: u64 = 0x30;
    /// PlayerController -> acknowledged pawn pointer.
    pub const ACKNOWLEDGED_PAWN: u64 = 0x320;
    /// PlayerController -> camera manager pointer.
    pub const CAMERA_MANAGER: u64 = 0x338;
    /// CameraManager -> cached point-of-view block.
    pub const CAMERA_CACHE: u64 = 0x1C70;
    /// Point-of-view location within the cache block.
    pub const POV: u64 = 0x10;
    /// Rotation follows the location vector.
    pub const POV_ROTATION: u64 = POV + 0xC;
}

/// Interned-name pool layout.
pub mod names {
    /// Fixed header slots at the start of the chunk table.
    pub const HEADER_SLOTS: u64 = 2;
    /// Size of one chunk-table slot (a pointer).
    pub const SLOT_SIZE: u64 = 8;
    /// Entry header: string length is stored in the top bits.
    pub const LEN_SHIFT: u32 = 6;
    /// Longest plausible decoded name.
    pub const MAX_LEN: usize = 1024;
}

/// Hard caps that bound every walk against corrupted counts.
pub mod limits {
    /// Maximum slots visited in one hash-container walk.
    pub const MAX_CONTAINER_SLOTS: usize = 1000;
    /// Maximum battle points decoded per query.
    pub const MAX_BATTLE_POINTS: usize = 100;
    /// Maximum components read per actor.
    pub const MAX_COMPONENTS: usize = 20;
    /// Maximum superclass-chain depth.
    pub const MAX_HIERARCHY_DEPTH: usize = 10;
}

/// Timing constants.
pub mod timing {
    /// Freshness window of the entity snapshot cache (ms).
    pub const SNAPSHOT_CACHE_WINDOW_MS: u64 = 200;
}
