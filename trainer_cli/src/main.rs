#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `trainer` command-line front end for the workout engine.

mod cli;
mod error_fmt;
mod export;
mod history;
mod workout;

use clap::Parser;
use eyre::{Result, WrapErr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use history::JsonlHistory;
use trainer_config::Config;
use trainer_core::{EngineCfg, HistoryStore};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hook: {e}");
    }

    if let Err(e) = run(cli) {
        tracing::debug!(error = ?e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            trainer_config::load_toml(&text)
                .map_err(|e| eyre::eyre!("parse config {}: {e}", p.display()))?
        }
        None => Config::default(),
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Console layer on stderr (RUST_LOG overrides `--log-level`), plus an
/// optional JSON file layer from `[logging]`.
fn init_tracing(json: bool, level: &str, logging: &trainer_config::Logging) -> Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let file_level = logging.level.as_deref().unwrap_or("info");
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let mut engine = EngineCfg::from(&cfg);
    let (items, skip_rest) = match cli.cmd {
        Commands::Lift {
            mode,
            kg,
            reps,
            warmup,
            stop_at_top,
            just_lift,
            name,
        } => {
            if let Some(w) = warmup {
                engine.warmup_reps = w;
            }
            let items = workout::lift_items(
                &mode,
                kg,
                reps,
                stop_at_top || cfg.engine.stop_at_top,
                just_lift,
                name,
            )?;
            (items, false)
        }
        Commands::Echo {
            level,
            reps,
            eccentric,
            name,
        } => {
            let items =
                workout::echo_items(&level, reps, eccentric, cfg.engine.stop_at_top, name)?;
            (items, false)
        }
        Commands::Run { plan, skip_rest } => (workout::plan_file_items(&plan)?, skip_rest),
        Commands::History { identity } => {
            return list_history(&cli.history, identity.as_deref(), cli.json);
        }
        Commands::Export { out } => {
            let history = JsonlHistory::open(&cli.history)?;
            let n = export::export_file(history.all_records(), &out)?;
            if cli.json {
                println!("{}", serde_json::json!({ "exported": n, "out": out }));
            } else {
                println!("Exported {n} record(s) to {}", out.display());
            }
            return Ok(());
        }
        Commands::SelfCheck => {
            workout::self_check(&cfg)?;
            println!("OK");
            return Ok(());
        }
    };

    let history = JsonlHistory::open(&cli.history)?;
    workout::run_items(&cfg, engine, history, items, skip_rest, &stop, cli.json)?;
    Ok(())
}

fn list_history(path: &Path, identity: Option<&str>, json: bool) -> Result<()> {
    let history = JsonlHistory::open(path)?;
    let wanted = identity.map(str::to_lowercase);
    let records = history
        .all_records()
        .iter()
        .filter(|r| wanted.is_none() || r.identity_key() == wanted);
    let mut shown = 0usize;
    for r in records {
        shown += 1;
        let label = r.identity_label.as_deref().unwrap_or(&r.mode);
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "record_id": r.record_id(),
                    "identity": r.identity_key(),
                    "label": label,
                    "mode": r.mode,
                    "weight_kg": r.weight_kg,
                    "warmup_reps": r.warmup_reps,
                    "working_reps": r.working_reps,
                    "target_reps": r.target_reps,
                    "reason": r.reason.as_str(),
                    "peak_kg": r.peak_total_load_kg(),
                })
            );
        } else {
            println!(
                "{}  {label:<20} {:>3}/{:<3} reps  peak {:>6.1} kg  {}",
                r.record_id(),
                r.working_reps,
                r.target_reps,
                r.peak_total_load_kg(),
                r.reason.as_str()
            );
        }
    }
    if shown == 0 && !json {
        println!("No workouts recorded in {}", history.path().display());
    }
    Ok(())
}
