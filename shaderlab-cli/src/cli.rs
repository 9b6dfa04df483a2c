use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slcli", about = "ShaderLab developer CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a target (web, native)
    Build {
        /// Target to build; defaults to the project's `default_target`
        target: Option<String>,
    },
    /// Check a scene document and report what it would load
    Validate {
        /// Path to the scene JSON
        scene: PathBuf,
    },
    /// Run a scene headlessly through the native module
    Preview {
        /// Path to the scene JSON
        scene: PathBuf,
        /// Number of frames to simulate
        #[arg(long, default_value_t = 120)]
        frames: u32,
        /// Render two eye passes per frame
        #[arg(long)]
        stereo: bool,
        /// Canvas width in pixels
        #[arg(long, default_value_t = 1280)]
        width: i32,
        /// Canvas height in pixels
        #[arg(long, default_value_t = 720)]
        height: i32,
        /// Viewer options preset (TOML)
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print the default viewer options, or write them to a file
    Options {
        /// Write to this path instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,
    },
}
