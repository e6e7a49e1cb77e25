//! Decoded entity types.
//!
//! Everything in this module is a plain-data snapshot of what the target
//! process contained at read time. The `address` fields are foreign
//! addresses: the target can free or recycle them at any moment, so they
//! must be treated as stale identifiers, never as live references.

use std::fmt;

use strum::{Display, FromRepr};

/// Placeholder class name used when an object's class pointer cannot be
/// followed or its name cannot be decoded.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// 3-component world-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Camera orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl fmt::Display for Rotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(pitch: {:.2}, yaw: {:.2}, roll: {:.2})",
            self.pitch, self.yaw, self.roll
        )
    }
}

/// Interaction state of a pet NPC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum NpcPetState {
    #[default]
    None = 0,
    Active = 1,
    InteractiveSuccess = 2,
    InteractiveFail = 3,
}

/// One decoded object from a target-process container.
///
/// State flags default to their safe values ("not dead", "still active",
/// "still openable") when the corresponding reads fail; the decoder only
/// populates them for objects whose class matches the known markers.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    /// Container key (entity id).
    pub id: i32,
    /// Foreign address of the object.
    pub address: u64,
    /// Decoded object name.
    pub name: String,
    /// Decoded class name, or [`UNKNOWN_CLASS`].
    pub class_name: String,
    /// Class names from most-derived to where the walk stopped.
    pub parent_classes: Vec<String>,
    /// Whether any entry of `parent_classes` is the root actor class.
    pub is_actor: bool,
    /// World-space position (actors only; zero otherwise).
    pub position: Vector3,
    /// Pet NPC interaction state.
    pub interactive_state: NpcPetState,
    /// Death flag for monster/boss classes.
    pub already_dead: bool,
    /// Active flag for combat-item classes.
    pub is_active: bool,
    /// Mechanism flags.
    pub can_open: bool,
    pub open_state: bool,
}

impl EntityInfo {
    pub fn new(id: i32, address: u64, name: String) -> Self {
        Self {
            id,
            address,
            name,
            class_name: UNKNOWN_CLASS.to_string(),
            parent_classes: Vec::new(),
            is_actor: false,
            position: Vector3::ZERO,
            interactive_state: NpcPetState::None,
            already_dead: false,
            is_active: true,
            can_open: true,
            open_state: true,
        }
    }
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_actor { "[Actor]" } else { "[Entity]" };
        write!(
            f,
            "{} {} ({}) id:{} pos:{}",
            tag, self.name, self.class_name, self.id, self.position
        )?;
        if !self.parent_classes.is_empty() {
            write!(f, " <- {}", self.parent_classes.join(" -> "))?;
        }
        Ok(())
    }
}

/// One component owned by an actor.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub name: String,
    pub class_name: String,
    pub address: u64,
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class_name)
    }
}

/// An immutable, ordered collection of entities read at one instant.
///
/// Snapshots are replaced wholesale on refresh, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    entities: Vec<EntityInfo>,
}

impl EntitySnapshot {
    pub fn new(entities: Vec<EntityInfo>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[EntityInfo] {
        &self.entities
    }

    pub fn actors(&self) -> impl Iterator<Item = &EntityInfo> {
        self.entities.iter().filter(|e| e.is_actor)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_entities(self) -> Vec<EntityInfo> {
        self.entities
    }
}
