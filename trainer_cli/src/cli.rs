//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "trainer", version, about = "Cable trainer workout CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Workout history file (JSON lines)
    #[arg(long, value_name = "FILE", default_value = "trainer_history.jsonl")]
    pub history: PathBuf,

    /// Print engine events and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single block with a fixed program
    Lift {
        /// Program mode (old-school, pump, tut, tut-beast, eccentric-only)
        #[arg(long, default_value = "old-school")]
        mode: String,
        /// Resistance per cable in kilograms
        #[arg(long, value_name = "KG")]
        kg: f32,
        /// Working reps (ignored with --just-lift)
        #[arg(long, default_value_t = 10)]
        reps: u32,
        /// Warmup reps before working reps count (config default when omitted)
        #[arg(long, value_name = "N")]
        warmup: Option<u32>,
        /// Stop at the top of the final rep instead of the bottom
        #[arg(long, action = ArgAction::SetTrue)]
        stop_at_top: bool,
        /// Open-ended set ended by holding at the bottom
        #[arg(long, action = ArgAction::SetTrue)]
        just_lift: bool,
        /// Exercise name; scopes personal bests
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
    /// Run a single adaptive (echo) block
    Echo {
        /// Echo level (hard, harder, hardest, epic)
        #[arg(long, default_value = "hard")]
        level: String,
        /// Working reps
        #[arg(long, default_value_t = 10)]
        reps: u32,
        /// Eccentric load in percent of concentric
        #[arg(long, value_name = "PCT", default_value_t = 100)]
        eccentric: u32,
        /// Exercise name; scopes personal bests
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
    /// Run a plan file (TOML or JSON)
    Run {
        /// Plan file; the extension selects the format
        #[arg(long, value_name = "FILE")]
        plan: PathBuf,
        /// End every rest as soon as it starts
        #[arg(long, action = ArgAction::SetTrue)]
        skip_rest: bool,
    },
    /// List stored workouts, newest first
    History {
        /// Only records with this identity key (e.g. `set:bench press`)
        #[arg(long, value_name = "KEY")]
        identity: Option<String>,
    },
    /// Write a CSV summary of the history file
    Export {
        /// Output CSV path
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Quick health check (config and simulated machine)
    SelfCheck,
}
