//! # Stagegate CLI Module
//!
//! ## Available Commands
//!
//! - `transform` - Preview scale for a camera stream shown in a view
//! - `crop` - Region of a captured image that matches the preview surface
//! - `rotation` - Display rotation to apply to a camera sensor
//! - `prefs` - Inspect and edit the preference store
//! - `simulate` - Replay a capture-screen script against a simulated camera

mod commands;

use clap::{Parser, Subcommand};
use stagegate_core::{CaptureError, Dimensions};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stagegate - stage-ordered capture flow tools
///
/// Geometry calculators, preference inspection, and scripted replays of the
/// capture screen's event sequence.
#[derive(Parser, Debug)]
#[command(name = "stagegate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the preference database
    #[arg(short = 'P', long, global = true, default_value = "stagegate-prefs.redb")]
    pub prefs: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the preview transform
    Transform {
        /// Camera preview size (WxH)
        #[arg(long)]
        preview: Dimensions,

        /// On-screen view size (WxH)
        #[arg(long)]
        view: Dimensions,

        /// Display orientation (portrait, landscape)
        #[arg(short, long, default_value = "portrait")]
        orientation: String,
    },

    /// Compute the capture crop
    Crop {
        /// Captured image size (WxH)
        #[arg(long)]
        image: Dimensions,

        /// Preview surface size (WxH)
        #[arg(long)]
        surface: Dimensions,
    },

    /// Compute the camera display rotation
    Rotation {
        /// Sensor mounting orientation in degrees
        #[arg(long)]
        sensor: u16,

        /// Camera facing (back, front)
        #[arg(short, long, default_value = "back")]
        facing: String,

        /// Screen rotation in degrees (0, 90, 180, 270)
        #[arg(short, long, default_value = "0")]
        screen: u16,
    },

    /// Inspect or edit stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Replay a simulation script
    Simulate {
        /// Path to the TOML script
        #[arg(short, long)]
        script: PathBuf,

        /// Keep preferences in memory instead of the preference database
        #[arg(long)]
        ephemeral: bool,
    },
}

/// Preference store operations.
#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    /// Show one value
    Get { key: String },

    /// Store a value
    Set {
        key: String,
        value: String,

        /// Value kind (bool, int, text)
        #[arg(short, long, default_value = "text")]
        kind: String,
    },

    /// Delete a value
    Remove { key: String },

    /// Show every stored value
    List,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CaptureError> {
    let json_mode = cli.json;

    match cli.command {
        Commands::Transform {
            preview,
            view,
            orientation,
        } => cmd_transform(preview, view, &orientation, json_mode),
        Commands::Crop { image, surface } => cmd_crop(image, surface, json_mode),
        Commands::Rotation {
            sensor,
            facing,
            screen,
        } => cmd_rotation(sensor, &facing, screen, json_mode),
        Commands::Prefs { action } => cmd_prefs(&cli.prefs, action, json_mode),
        Commands::Simulate { script, ephemeral } => {
            cmd_simulate(&cli.prefs, &script, ephemeral, json_mode)
        }
    }
}
