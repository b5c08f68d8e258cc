//! Synheart ECG Bridge CLI
//!
//! Streams ECG (or simulated clicks) and publishes RMSSD over UDP.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use synheart_ecg_bridge::{
    config::Config,
    create_shared_stats,
    source::{BoxedTrigger, DriverSelection, NoopTrigger, TerminalTrigger},
    InputSource, MetricPublisher, Shutdown, SourceError, SourceMode, UdpChannel, SENSOR_BANNER,
    SIMULATION_BANNER, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-ecg")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Streams ECG, derives HRV (RMSSD) and publishes it over UDP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start publishing metrics
    Run {
        /// Where metrics come from
        #[arg(long, value_enum, default_value_t = Mode::Sensor)]
        mode: Mode,

        /// Sensor driver to use in sensor mode
        #[arg(long, value_enum, default_value_t = DriverKind::Synthetic)]
        driver: DriverKind,

        /// Recording played back by the replay driver
        #[arg(long, required_if_eq("driver", "replay"))]
        replay_file: Option<PathBuf>,

        /// Destination host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Destination port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Log pipeline activity at debug level
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// ECG from a sensor driver
    Sensor,
    /// Metric derived from space bar presses
    Sim,
}

impl From<Mode> for SourceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sensor => SourceMode::Sensor,
            Mode::Sim => SourceMode::Simulation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DriverKind {
    Synthetic,
    Replay,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            mode,
            driver,
            replay_file,
            host,
            port,
            verbose,
        } => {
            init_logging(verbose);
            cmd_run(mode, driver, replay_file, host, port)
        }
        Commands::Config { write_default } => cmd_config(write_default),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "synheart_ecg_bridge=debug"
    } else {
        "synheart_ecg_bridge=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_run(
    mode: Mode,
    driver: DriverKind,
    replay_file: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    println!("Synheart ECG Bridge v{VERSION}");
    println!();

    let mut config = Config::load().context("could not load configuration")?;
    if let Some(host) = host {
        config.output.host = host;
    }
    if let Some(port) = port {
        config.output.port = port;
    }

    let stats = create_shared_stats();
    let destination = config.output.destination();
    let channel = UdpChannel::open(&config.output)
        .with_context(|| format!("could not open UDP channel to {destination}"))?;
    println!("  Destination: {}", channel.destination());
    println!("  Session: {}", stats.session_id());
    println!();
    let mut publisher = MetricPublisher::new(channel, stats.clone());

    let shutdown = Shutdown::new();
    shutdown
        .install_ctrlc_handler()
        .context("could not install Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;

    let result = runtime.block_on(async {
        let selection = match driver {
            DriverKind::Synthetic => DriverSelection::Synthetic,
            // clap guarantees the file is present for the replay driver
            DriverKind::Replay => DriverSelection::Replay(replay_file.unwrap_or_default()),
        };
        // Banner goes out before the trigger puts the terminal in raw mode
        let open = || {
            if mode == Mode::Sensor {
                eprintln!("⚠️  Sensor driver unavailable. Switching to click simulation.");
            }
            println!("{SIMULATION_BANNER}");
            open_trigger(&shutdown)
        };
        let mut source = InputSource::select(mode.into(), &selection, &config, &stats, open)?;
        if let InputSource::RealSensor(_) = source {
            println!("{SENSOR_BANNER}");
        }
        tracing::info!(source = source.kind(), "running");
        source.run(&mut publisher, &shutdown).await
    });

    // The terminal trigger, if any, has been dropped and raw mode restored
    println!();
    println!("Stopped.");
    println!();
    println!("{}", stats.summary());

    match result {
        Ok(()) => Ok(()),
        Err(SourceError::NoDevice) => bail!("❌ No sensor found."),
        Err(e) => Err(e).context("input source failed"),
    }
}

fn open_trigger(shutdown: &Shutdown) -> BoxedTrigger {
    if !std::io::stdin().is_terminal() {
        tracing::warn!("stdin is not a terminal; the trigger key cannot be read");
        return Box::new(NoopTrigger);
    }
    match TerminalTrigger::spawn(shutdown.clone()) {
        Ok(trigger) => Box::new(trigger),
        Err(e) => {
            tracing::warn!(error = %e, "could not read the keyboard; clicks are disabled");
            Box::new(NoopTrigger)
        }
    }
}

fn cmd_config(write_default: bool) -> anyhow::Result<()> {
    let path = Config::config_path();

    if write_default {
        Config::default()
            .save()
            .with_context(|| format!("could not write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Config::load().context("could not load configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", path);
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
