use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "uescope")]
#[command(about = "Typed entity inspector for a live Unreal Engine game process")]
struct Cli {
    /// Target process name (with or without .exe)
    #[arg(
        short,
        long,
        global = true,
        env = "UESCOPE_PROCESS",
        default_value = "Game-Win64-Shipping.exe"
    )]
    process: String,

    /// Anchor signature JSON (defaults to the built-in set)
    #[arg(long, global = true)]
    signatures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the global anchors
    Anchors {
        /// Write the active signature set to a JSON file for re-derivation
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Dump the battle entity container
    Entities {
        /// Include non-actor entities
        #[arg(long)]
        all: bool,
    },
    /// Dump the NPC map
    Npcs,
    /// Dump the battle points (actors only)
    Points,
    /// Print the camera pose and player position
    Camera,
    /// Poll entities continuously
    Watch {
        /// Poll interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Scan the module for a byte pattern, e.g. "48 8B 1D ?? ?? ?? ??"
    Scan {
        pattern: String,
        /// Resolve each match through its RIP-relative operand
        #[arg(long)]
        rip: bool,
        #[arg(long, default_value_t = 7)]
        instr_len: usize,
        #[arg(long, default_value_t = 3)]
        disp_offset: usize,
    },
    /// Dump raw memory at a foreign address
    Hexdump {
        /// Address (hex, with or without 0x)
        address: String,
        #[arg(default_value_t = 256)]
        size: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("uescope_core=info".parse()?)
                .add_directive("uescope_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Anchors { export } => {
            commands::anchors::run(&cli.process, cli.signatures.as_deref(), export.as_deref())
        }
        Commands::Entities { all } => {
            commands::entities::run(&cli.process, cli.signatures.as_deref(), all)
        }
        Commands::Npcs => commands::npcs::run(&cli.process, cli.signatures.as_deref()),
        Commands::Points => commands::points::run(&cli.process, cli.signatures.as_deref()),
        Commands::Camera => commands::camera::run(&cli.process, cli.signatures.as_deref()),
        Commands::Watch { interval_ms } => {
            commands::watch::run(&cli.process, cli.signatures.as_deref(), interval_ms)
        }
        Commands::Scan {
            pattern,
            rip,
            instr_len,
            disp_offset,
        } => commands::scan::run(&cli.process, &pattern, rip, instr_len, disp_offset),
        Commands::Hexdump { address, size } => commands::hexdump::run(&cli.process, &address, size),
    }
}
