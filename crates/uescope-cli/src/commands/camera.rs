//! Camera command: print the camera pose and player position.

use std::path::Path;

use anyhow::Result;

use super::open_session;

pub fn run(process: &str, signatures: Option<&Path>) -> Result<()> {
    let session = open_session(process, signatures)?;

    match session.camera_pose()? {
        Some((position, rotation)) => {
            println!("Camera position: {}", position);
            println!("Camera rotation: {}", rotation);
        }
        None => println!("Camera pose unavailable"),
    }

    match session.player_position()? {
        Some(position) => println!("Player position: {}", position),
        None => println!("Player position unavailable"),
    }

    Ok(())
}
