//! Entities command: dump the battle entity container.

use std::path::Path;

use anyhow::Result;
use uescope_core::EntityInfo;

use super::open_session;

pub fn run(process: &str, signatures: Option<&Path>, all: bool) -> Result<()> {
    let session = open_session(process, signatures)?;
    let snapshot = session.entities()?;

    let actors: Vec<&EntityInfo> = snapshot.actors().collect();
    println!("Battle entities: {} total, {} actors", snapshot.len(), actors.len());
    println!();

    for entity in &actors {
        print_entity(entity);
    }

    if all {
        let others: Vec<&EntityInfo> =
            snapshot.entities().iter().filter(|e| !e.is_actor).collect();
        if !others.is_empty() {
            println!();
            println!("Non-actor entities ({}):", others.len());
            for entity in &others {
                print_entity(entity);
            }
        }
    }

    Ok(())
}

pub fn print_entity(entity: &EntityInfo) {
    println!("[{}] {} ({})", entity.id, entity.name, entity.class_name);
    println!("  address: 0x{:X}", entity.address);
    if entity.is_actor {
        println!("  position: {}", entity.position);
    }
    if !entity.parent_classes.is_empty() {
        println!("  hierarchy: {}", entity.parent_classes.join(" -> "));
    }
    if entity.already_dead {
        println!("  state: dead");
    }
    if !entity.is_active {
        println!("  state: inactive");
    }
    if !entity.can_open || !entity.open_state {
        println!(
            "  mechanism: can_open={}, open_state={}",
            entity.can_open, entity.open_state
        );
    }
}
