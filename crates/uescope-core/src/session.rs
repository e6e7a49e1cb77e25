//! Attached-session orchestration.
//!
//! A [`Session`] owns the process handle and the resolved anchors and is
//! the only public entry point for entity queries. It replaces the usual
//! "resolve-once global offsets" shared state with explicit ownership:
//! anchors are resolved during attach, clones of the session share them by
//! reference, and the double-checked resolution guard ensures the scan
//! runs at most once no matter how many clones race into it.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::anchor::{AnchorResolver, AnchorSet, AnchorSignatureSet, builtin_signatures};
use crate::decode::{ObjectDecoder, live_slots, read_container};
use crate::entity::{ComponentInfo, EntityInfo, EntitySnapshot, Rotator, Vector3};
use crate::error::{Error, Result};
use crate::memory::layout::{battle, engine, game_state, limits, world};
use crate::memory::{ProcessHandle, ReadMemory, is_plausible_pointer};
use crate::snapshot::SnapshotCache;

struct SessionShared<R: ReadMemory> {
    reader: R,
    signatures: AnchorSignatureSet,
    anchors: OnceLock<AnchorSet>,
    resolve_lock: Mutex<()>,
    cache: SnapshotCache,
}

/// An attached inspection session over one target process.
///
/// Cheap to clone; clones share the process handle, the anchors, and the
/// snapshot cache. Every decoded handle is stale data the moment it is
/// returned: the target can recycle any address at any time.
pub struct Session<R: ReadMemory> {
    shared: Arc<SessionShared<R>>,
}

impl<R: ReadMemory> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Session<ProcessHandle> {
    /// Find the target process by name, open it, and resolve anchors with
    /// the built-in signatures.
    pub fn attach(process_name: &str) -> Result<Self> {
        Self::attach_with(process_name, builtin_signatures())
    }

    /// Attach using a caller-provided signature set (e.g. loaded from a
    /// re-derived JSON schema after a game update).
    pub fn attach_with(process_name: &str, signatures: AnchorSignatureSet) -> Result<Self> {
        let process = ProcessHandle::open_by_name(process_name)?;
        Self::from_reader(process, signatures)
    }
}

impl<R: ReadMemory> Session<R> {
    /// Build a session over an arbitrary memory reader. Anchor resolution
    /// runs eagerly; failure of a required anchor fails the attach.
    pub fn from_reader(reader: R, signatures: AnchorSignatureSet) -> Result<Self> {
        let session = Self {
            shared: Arc::new(SessionShared {
                reader,
                signatures,
                anchors: OnceLock::new(),
                resolve_lock: Mutex::new(()),
                cache: SnapshotCache::new(),
            }),
        };
        session.ensure_anchors()?;
        Ok(session)
    }

    /// Resolve-once guard: memo check, lock, re-check, scan, publish.
    /// Every caller observes the same `AnchorSet`; only the first performs
    /// the scan.
    fn ensure_anchors(&self) -> Result<&AnchorSet> {
        if let Some(anchors) = self.shared.anchors.get() {
            return Ok(anchors);
        }

        let _guard = self
            .shared
            .resolve_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(anchors) = self.shared.anchors.get() {
            return Ok(anchors);
        }

        let resolver = AnchorResolver::new(&self.shared.reader);
        let anchors = resolver.resolve_all(&self.shared.signatures)?;
        let _ = self.shared.anchors.set(anchors);
        Ok(self
            .shared
            .anchors
            .get()
            .expect("anchors published under resolve lock"))
    }

    /// The resolved anchors (available from construction on).
    pub fn anchors(&self) -> AnchorSet {
        self.shared
            .anchors
            .get()
            .copied()
            .unwrap_or_default()
    }

    pub fn reader(&self) -> &R {
        &self.shared.reader
    }

    fn decoder(&self) -> ObjectDecoder<'_, R> {
        let base = self.shared.reader.base_address();
        ObjectDecoder::new(&self.shared.reader, base + self.anchors().name_table)
    }

    /// Follow a pointer and keep it only if it stays plausible.
    fn follow(&self, address: u64) -> Option<u64> {
        self.shared
            .reader
            .read_pointer(address)
            .ok()
            .filter(|ptr| is_plausible_pointer(*ptr))
    }

    fn world(&self) -> Option<u64> {
        let base = self.shared.reader.base_address();
        self.follow(base + self.anchors().world_root)
    }

    fn game_state(&self) -> Option<u64> {
        self.world()
            .and_then(|world_ptr| self.follow(world_ptr + world::GAME_STATE))
    }

    fn battle(&self) -> Option<u64> {
        self.game_state()
            .and_then(|gs| self.follow(gs + game_state::BATTLE))
    }

    /// Decode every live entry of the container at `container_addr`.
    fn decode_container(&self, container_addr: u64, cap: usize) -> EntitySnapshot {
        let reader = &self.shared.reader;
        let decoder = self.decoder();

        let container = match read_container(reader, container_addr) {
            Ok(container) => container,
            Err(e) => {
                debug!("Container at {:#x} unreadable: {}", container_addr, e);
                return EntitySnapshot::default();
            }
        };

        let mut entities = Vec::new();
        for (key, ptr) in live_slots(reader, &container, cap) {
            if let Some(entity) = decoder.decode_entity(key, ptr) {
                entities.push(entity);
            }
        }
        EntitySnapshot::new(entities)
    }

    /// Battle entities, memoized for the freshness window (200 ms).
    pub fn entities(&self) -> Result<Arc<EntitySnapshot>> {
        self.shared.cache.get_or_refresh(|| Ok(self.read_entities()))
    }

    fn read_entities(&self) -> EntitySnapshot {
        let Some(battle_ptr) = self.battle() else {
            debug!("Battle object unavailable; returning empty snapshot");
            return EntitySnapshot::default();
        };
        self.decode_container(battle_ptr + battle::ENTITIES, limits::MAX_CONTAINER_SLOTS)
    }

    /// NPC map entities. Uncached: intended for lower-frequency polling.
    pub fn npc_entities(&self) -> Result<EntitySnapshot> {
        let Some(gs) = self.game_state() else {
            debug!("Game state unavailable; returning empty snapshot");
            return Ok(EntitySnapshot::default());
        };
        Ok(self.decode_container(gs + game_state::NPC_MAP, limits::MAX_CONTAINER_SLOTS))
    }

    /// Battle points: the Actor-only subset of the point map, capped at
    /// [`limits::MAX_BATTLE_POINTS`] entries.
    pub fn battle_points(&self) -> Result<EntitySnapshot> {
        let Some(battle_ptr) = self.battle() else {
            debug!("Battle object unavailable; returning empty snapshot");
            return Ok(EntitySnapshot::default());
        };
        let snapshot =
            self.decode_container(battle_ptr + battle::POINTS, limits::MAX_BATTLE_POINTS);
        let actors: Vec<EntityInfo> = snapshot
            .into_entities()
            .into_iter()
            .filter(|e| e.is_actor)
            .collect();
        Ok(EntitySnapshot::new(actors))
    }

    /// Boss-related actors, filtered out of the cached entity snapshot.
    pub fn boss_entities(&self) -> Result<Vec<EntityInfo>> {
        let snapshot = self.entities()?;
        Ok(snapshot
            .entities()
            .iter()
            .filter(|e| {
                e.is_actor
                    && (e.class_name.starts_with("BP_Boss_")
                        || e.name.contains("Boss")
                        || e.parent_classes.iter().any(|c| c.contains("Boss")))
            })
            .cloned()
            .collect())
    }

    /// Re-read position (and, for monsters/bosses, the death flag) of one
    /// known entity without touching the container walk or the cache.
    pub fn refresh_position(&self, entity: &mut EntityInfo) -> Result<()> {
        self.decoder().refresh_position(entity)
    }

    /// Drop the cached snapshot; the next [`Session::entities`] call
    /// performs a full decode.
    pub fn clear_cache(&self) {
        self.shared.cache.invalidate();
    }

    /// Components owned by an actor, on demand.
    pub fn actor_components(&self, entity: &EntityInfo) -> Result<Vec<ComponentInfo>> {
        if !entity.is_actor {
            return Ok(Vec::new());
        }
        Ok(self.decoder().actor_components(entity.address))
    }

    fn player_controller(&self) -> Option<u64> {
        let base = self.shared.reader.base_address();
        let engine_root = self.anchors().engine_root?;
        let engine_ptr = self.follow(base + engine_root)?;
        let game_instance = self.follow(engine_ptr + engine::GAME_INSTANCE)?;
        let players = self.follow(game_instance + engine::LOCAL_PLAYERS)?;
        let first_player = self.follow(players)?;
        self.follow(first_player + engine::PLAYER_CONTROLLER)
    }

    /// Camera position and rotation, if the engine root anchor resolved
    /// and the camera chain is currently intact.
    pub fn camera_pose(&self) -> Result<Option<(Vector3, Rotator)>> {
        let Some(controller) = self.player_controller() else {
            return Ok(None);
        };
        let Some(camera) = self.follow(controller + engine::CAMERA_MANAGER) else {
            return Ok(None);
        };

        let reader = &self.shared.reader;
        let pov = camera + engine::CAMERA_CACHE + engine::POV;
        let position = Vector3 {
            x: reader.read_f32(pov)?,
            y: reader.read_f32(pov + 4)?,
            z: reader.read_f32(pov + 8)?,
        };
        let rot = camera + engine::CAMERA_CACHE + engine::POV_ROTATION;
        let rotation = Rotator {
            pitch: reader.read_f32(rot)?,
            yaw: reader.read_f32(rot + 4)?,
            roll: reader.read_f32(rot + 8)?,
        };
        Ok(Some((position, rotation)))
    }

    /// The local player pawn's position, if reachable.
    pub fn player_position(&self) -> Result<Option<Vector3>> {
        let Some(controller) = self.player_controller() else {
            return Ok(None);
        };
        let Some(pawn) = self.follow(controller + engine::ACKNOWLEDGED_PAWN) else {
            return Ok(None);
        };
        Ok(self.decoder().actor_position(pawn))
    }
}

impl<R: ReadMemory> std::fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("anchors", &self.anchors())
            .finish()
    }
}
