//! SmartHeat: host runner.
//!
//! Drives [`HeatingService`] against a JSON state file standing in for
//! the home-automation platform.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │  FileConfig        StateFileDevice       LogEventSink    │
//! │  (ConfigPort)      (DevicePort)          (EventSink)     │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ──────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │           HeatingService (pure logic)              │  │
//! │  │  FSM · Rule chain · Boost · Gate · Warm water      │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick: reload the state file, forward watched entity changes as
//! commands, advance the scheduler, flush any writes back to the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use smartheat::adapters::config_file::FileConfig;
use smartheat::adapters::log_sink::LogEventSink;
use smartheat::adapters::state_file::StateFileDevice;
use smartheat::app::commands::AppCommand;
use smartheat::app::ports::ConfigPort;
use smartheat::app::service::HeatingService;
use smartheat::config::ControllerConfig;
use smartheat::error::Error;
use smartheat::fsm::StateId;

#[derive(Parser)]
#[command(name = "smartheat")]
#[command(about = "SmartHeat - closed-loop heating offset controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a controller configuration file
    Validate {
        /// Path to the JSON or YAML configuration
        config: PathBuf,
    },
    /// Print a sample configuration
    Sample {
        #[arg(long, value_enum, default_value_t = SampleFormat::Yaml)]
        format: SampleFormat,
    },
    /// Run the controller against a JSON state file
    Run {
        /// Path to the JSON or YAML configuration
        config: PathBuf,
        /// Path to the entity state file
        #[arg(long)]
        state: PathBuf,
        /// Wall-clock milliseconds between ticks
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,
        /// Simulated seconds per tick
        #[arg(long, default_value_t = 1.0)]
        tick_secs: f64,
        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Sample { format } => cmd_sample(format),
        Commands::Run {
            config,
            state,
            tick_ms,
            tick_secs,
            max_ticks,
        } => cmd_run(&config, &state, tick_ms, tick_secs, max_ticks),
    }
}

fn load_config(path: &Path) -> Result<ControllerConfig> {
    FileConfig::new(path)
        .load()
        .with_context(|| format!("loading {}", path.display()))
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let settings = config
        .validate()
        .map_err(Error::from)
        .with_context(|| format!("validating {}", path.display()))?;
    settings.log_summary();
    println!("✓ {} is valid", path.display());
    Ok(())
}

fn cmd_sample(format: SampleFormat) -> Result<()> {
    let sample = ControllerConfig::sample();
    let text = match format {
        SampleFormat::Json => serde_json::to_string_pretty(&sample)?,
        SampleFormat::Yaml => serde_yaml::to_string(&sample)?,
    };
    println!("{text}");
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    state_path: &Path,
    tick_ms: u64,
    tick_secs: f64,
    max_ticks: Option<u64>,
) -> Result<()> {
    if !(tick_secs.is_finite() && tick_secs > 0.0) {
        bail!("--tick-secs must be a positive number, got {tick_secs}");
    }

    let config = load_config(config_path)?;
    let mut app = HeatingService::from_config(&config)
        .map_err(Error::from)
        .with_context(|| format!("validating {}", config_path.display()))?;

    let mut device = StateFileDevice::open(state_path)
        .with_context(|| format!("opening {}", state_path.display()))?;
    let mut sink = LogEventSink::new();

    app.start(&mut device, &mut sink)
        .context("controller initialization failed")?;
    device.flush().context("writing initial state")?;

    let watched: HashSet<String> = app.watched_entities().into_iter().collect();
    let tick = Duration::from_millis(tick_ms);
    let mut ticks = 0u64;
    let mut reported_safe = false;

    info!(
        "Running against {} (tick {}ms = {}s simulated)",
        state_path.display(),
        tick_ms,
        tick_secs
    );

    loop {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        thread::sleep(tick);
        ticks += 1;

        match device.reload() {
            Ok(changes) => {
                for cmd in changes {
                    if let AppCommand::StateChanged { entity, .. } = &cmd {
                        if !watched.contains(entity) {
                            continue;
                        }
                    }
                    app.handle_command(cmd, &mut device, &mut sink);
                }
            }
            Err(e) => warn!("State reload failed: {e}"),
        }

        app.poll(tick_secs, &mut device, &mut sink);

        if let Err(e) = device.flush() {
            warn!("State flush failed: {e}");
        }

        if app.state() == StateId::Safe && !reported_safe {
            reported_safe = true;
            warn!(
                "Controller latched in Safe (faults=0b{:08b}); only pass-through handlers remain",
                app.fault_flags()
            );
        }
    }

    info!(
        "Stopped after {} ticks, {} cycles, state {:?}",
        ticks,
        app.cycle_count(),
        app.state()
    );
    Ok(())
}
