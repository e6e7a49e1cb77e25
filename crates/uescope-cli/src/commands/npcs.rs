//! Npcs command: dump the NPC map.

use std::path::Path;

use anyhow::Result;
use uescope_core::NpcPetState;

use super::entities::print_entity;
use super::open_session;

pub fn run(process: &str, signatures: Option<&Path>) -> Result<()> {
    let session = open_session(process, signatures)?;
    let snapshot = session.npc_entities()?;

    println!("NPC map: {} entries", snapshot.len());
    println!();

    for entity in snapshot.entities() {
        print_entity(entity);
        if entity.interactive_state != NpcPetState::None {
            println!("  pet state: {}", entity.interactive_state);
        }
    }

    Ok(())
}
