//! Watch command: poll entities continuously until interrupted.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use super::open_session;

pub fn run(process: &str, signatures: Option<&Path>, interval_ms: u64) -> Result<()> {
    let session = open_session(process, signatures)?;

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::SeqCst);
    })?;

    println!("Watching entities every {interval_ms} ms (ctrl-c to stop)");

    let mut consecutive_failures = 0u32;
    while running.load(Ordering::SeqCst) {
        match session.entities() {
            Ok(snapshot) => {
                consecutive_failures = 0;
                let dead = snapshot.actors().filter(|e| e.already_dead).count();
                println!(
                    "{} entities, {} actors ({} dead)",
                    snapshot.len(),
                    snapshot.actors().count(),
                    dead
                );
                for entity in snapshot.actors() {
                    println!(
                        "  [{}] {} ({}) {}{}",
                        entity.id,
                        entity.name,
                        entity.class_name,
                        entity.position,
                        if entity.already_dead { " [dead]" } else { "" }
                    );
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!("Entity read failed: {e}");
                if consecutive_failures >= 5 {
                    anyhow::bail!("Target process is no longer readable: {e}");
                }
            }
        }

        thread::sleep(Duration::from_millis(interval_ms));
    }

    println!("Stopped.");
    Ok(())
}
