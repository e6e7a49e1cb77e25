//! Points command: dump the battle point map (actors only).

use std::path::Path;

use anyhow::Result;

use super::entities::print_entity;
use super::open_session;

pub fn run(process: &str, signatures: Option<&Path>) -> Result<()> {
    let session = open_session(process, signatures)?;
    let snapshot = session.battle_points()?;

    println!("Battle points: {} entries", snapshot.len());
    println!();

    for entity in snapshot.entities() {
        print_entity(entity);
    }

    Ok(())
}
