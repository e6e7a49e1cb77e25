//! Per-object decoding: identity, classification, and state fields.

use tracing::debug;

use crate::decode::containers::read_array;
use crate::decode::hierarchy::{class_hierarchy, is_actor_hierarchy};
use crate::decode::names::NamePool;
use crate::entity::{ComponentInfo, EntityInfo, NpcPetState, UNKNOWN_CLASS, Vector3};
use crate::error::{Error, Result};
use crate::memory::layout::{actor, component, limits, object, state};
use crate::memory::{ReadMemory, is_plausible_pointer};

/// Class-name prefixes whose instances carry a death flag.
const DEAD_FLAG_PREFIXES: [&str; 2] = ["BP_Mon_", "BP_Boss_"];
/// Hierarchy markers for conditional state reads.
const COMBAT_ITEM_MARKER: &str = "CombatItemBase";
const MECHANISM_MARKER: &str = "MechanismBase";
/// Class-name markers for pet NPCs.
const PET_MARKERS: [&str; 2] = ["PetNPC", "BP_PetNPC_Common"];

fn has_dead_flag(class_name: &str) -> bool {
    DEAD_FLAG_PREFIXES
        .iter()
        .any(|prefix| class_name.starts_with(prefix))
}

fn hierarchy_contains(hierarchy: &[String], marker: &str) -> bool {
    hierarchy.iter().any(|name| name.contains(marker))
}

/// Decodes objects of the target's reflection system into [`EntityInfo`].
pub struct ObjectDecoder<'a, R: ReadMemory> {
    reader: &'a R,
    names: NamePool<'a, R>,
}

impl<'a, R: ReadMemory> ObjectDecoder<'a, R> {
    /// `name_table` is the absolute address of the interned-name chunk
    /// table in the target.
    pub fn new(reader: &'a R, name_table: u64) -> Self {
        Self {
            reader,
            names: NamePool::new(reader, name_table),
        }
    }

    pub fn names(&self) -> &NamePool<'a, R> {
        &self.names
    }

    /// Decode one container entry into an entity.
    ///
    /// Returns `None` when the object's own name cannot be decoded (the
    /// slot is skipped, matching the container-walk policy). Every other
    /// failure degrades to a default: an unreadable class becomes
    /// [`UNKNOWN_CLASS`] with an empty hierarchy, state flags keep their
    /// safe values.
    pub fn decode_entity(&self, key: i32, object_ptr: u64) -> Option<EntityInfo> {
        let name = match self.names.read_object_name(object_ptr) {
            Ok(name) if !name.is_empty() => name,
            _ => return None,
        };

        let mut entity = EntityInfo::new(key, object_ptr, name);

        if let Ok(class_ptr) = self.reader.read_pointer(object_ptr + object::CLASS)
            && is_plausible_pointer(class_ptr)
        {
            entity.class_name = self
                .names
                .read_object_name(class_ptr)
                .unwrap_or_else(|_| UNKNOWN_CLASS.to_string());
            entity.parent_classes = class_hierarchy(self.reader, &self.names, class_ptr);
            entity.is_actor = is_actor_hierarchy(&entity.parent_classes);
        }

        if entity.is_actor {
            entity.position = self.actor_position(object_ptr).unwrap_or(Vector3::ZERO);
            self.read_state_fields(&mut entity);
        }

        Some(entity)
    }

    /// Read an actor's world position through its root component.
    pub fn actor_position(&self, actor_ptr: u64) -> Option<Vector3> {
        let root = self
            .reader
            .read_pointer(actor_ptr + actor::ROOT_COMPONENT)
            .ok()?;
        if !is_plausible_pointer(root) {
            return None;
        }

        let translation = root + component::TO_WORLD + component::TRANSLATION;
        self.read_vector(translation).ok()
    }

    fn read_vector(&self, address: u64) -> Result<Vector3> {
        let bytes = self.reader.read_bytes(address, 12)?;
        Ok(Vector3 {
            x: f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            y: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            z: f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    /// Conditional state reads, gated by class name and hierarchy markers.
    /// Each read is independently fallible and falls back to the safe
    /// default already present on the entity.
    fn read_state_fields(&self, entity: &mut EntityInfo) {
        if has_dead_flag(&entity.class_name) {
            entity.already_dead = self
                .read_flag(entity.address + state::ALREADY_DEAD)
                .unwrap_or(false);
        }

        if hierarchy_contains(&entity.parent_classes, COMBAT_ITEM_MARKER) {
            entity.is_active = self
                .read_flag(entity.address + state::COMBAT_ITEM_ACTIVE)
                .unwrap_or(true);
        }

        if hierarchy_contains(&entity.parent_classes, MECHANISM_MARKER) {
            entity.can_open = self
                .read_flag(entity.address + state::MECHANISM_CAN_OPEN)
                .unwrap_or(true);
            entity.open_state = self
                .read_flag(entity.address + state::MECHANISM_OPEN_STATE)
                .unwrap_or(true);
        }

        if PET_MARKERS
            .iter()
            .any(|marker| entity.class_name.contains(marker))
        {
            entity.interactive_state = self
                .reader
                .read_u8(entity.address + state::PET_INTERACTIVE)
                .ok()
                .and_then(NpcPetState::from_repr)
                .unwrap_or(NpcPetState::None);
        }
    }

    fn read_flag(&self, address: u64) -> Option<bool> {
        self.reader.read_u8(address).ok().map(|byte| byte != 0)
    }

    /// Re-read only the volatile fields of a known entity: position and,
    /// for monster/boss classes, the death flag. Explicit failure lets the
    /// caller distinguish "read failed" from "value unchanged" and retry.
    pub fn refresh_position(&self, entity: &mut EntityInfo) -> Result<()> {
        if !entity.is_actor {
            return Ok(());
        }

        let position = self
            .actor_position(entity.address)
            .ok_or(Error::InvalidPointer(entity.address))?;
        entity.position = position;

        if has_dead_flag(&entity.class_name) {
            entity.already_dead = self
                .read_flag(entity.address + state::ALREADY_DEAD)
                .unwrap_or(false);
        }

        Ok(())
    }

    /// Read an actor's owned components (name and class each), capped at
    /// [`limits::MAX_COMPONENTS`].
    pub fn actor_components(&self, actor_ptr: u64) -> Vec<ComponentInfo> {
        let mut components = Vec::new();

        let array = match read_array(self.reader, actor_ptr + actor::OWNED_COMPONENTS) {
            Ok(array) => array,
            Err(e) => {
                debug!("Component array unreadable for {:#x}: {}", actor_ptr, e);
                return components;
            }
        };
        if array.num <= 0 || !is_plausible_pointer(array.data) {
            return components;
        }

        let count = (array.num as usize).min(limits::MAX_COMPONENTS);
        for i in 0..count {
            let Ok(component_ptr) = self.reader.read_pointer(array.data + i as u64 * 8) else {
                continue;
            };
            if !is_plausible_pointer(component_ptr) {
                continue;
            }

            let Ok(name) = self.names.read_object_name(component_ptr) else {
                continue;
            };
            let class_name = self
                .reader
                .read_pointer(component_ptr + object::CLASS)
                .ok()
                .filter(|ptr| is_plausible_pointer(*ptr))
                .and_then(|ptr| self.names.read_object_name(ptr).ok())
                .unwrap_or_else(|| UNKNOWN_CLASS.to_string());

            components.push(ComponentInfo {
                name,
                class_name,
                address: component_ptr,
            });
        }

        components
    }
}
