//! ECG Monitor CLI
//!
//! Streaming cardiac telemetry monitor and reading simulator.

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use ecg_monitor::{
    alert::{AlertFanout, AudibleAlerts, Beeper, ProgressIndicator, SessionLogger},
    client::{stream_url, MonitorSession, SessionEnd},
    config::{parse_interval, Config},
    core::{Condition, ConditionKind, Reading, Severity},
    stats::{create_shared_stats_with_persistence, StatsSnapshot},
    MONITORING_DISCLAIMER, VERSION,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecg-monitor")]
#[command(version = VERSION)]
#[command(about = "Streaming cardiac telemetry monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reading simulator
    Serve {
        /// Address to listen on
        #[arg(long)]
        addr: Option<String>,

        /// Interval between readings (e.g. 1s, 500ms)
        #[arg(long, value_parser = parse_interval)]
        interval: Option<Duration>,

        /// Simulate irregular heartbeats
        #[arg(long)]
        irregular: Option<bool>,
    },

    /// Monitor a simulator stream and raise alerts
    Monitor {
        /// Simulator address
        #[arg(long)]
        addr: Option<String>,

        /// Directory to store log files
        #[arg(long)]
        logdir: Option<PathBuf>,

        /// Enable beep sounds for alerts
        #[arg(long)]
        beep: Option<bool>,

        /// Log normal readings (not just irregularities)
        #[arg(long)]
        lognormal: Option<bool>,

        /// Enable debug mode for extra logging
        #[arg(long)]
        debug: bool,
    },

    /// Play the alert sounds
    SoundTest {
        #[arg(long, value_enum, default_value = "all")]
        mode: SoundMode,

        #[arg(long, value_enum, default_value = "severe")]
        severity: SeverityArg,
    },

    /// Show the last session's statistics
    Status,

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SoundMode {
    Tachycardia,
    Bradycardia,
    Arrhythmia,
    System,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Mild,
    Moderate,
    Severe,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Mild => Severity::Mild,
            SeverityArg::Moderate => Severity::Moderate,
            SeverityArg::Severe => Severity::Severe,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug = matches!(cli.command, Commands::Monitor { debug: true, .. });
    init_tracing(debug);

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Could not load config, using defaults: {}", e);
            Config::default()
        }
    };

    match cli.command {
        Commands::Serve {
            addr,
            interval,
            irregular,
        } => {
            let mut simulator = config.simulator;
            if let Some(addr) = addr {
                simulator.listen_addr = addr;
            }
            if let Some(interval) = interval {
                simulator.send_interval = interval;
            }
            if let Some(irregular) = irregular {
                simulator.simulate_irregular = irregular;
            }
            cmd_serve(simulator).await
        }
        Commands::Monitor {
            addr,
            logdir,
            beep,
            lognormal,
            debug,
        } => {
            let mut monitor = config.monitor;
            if let Some(addr) = addr {
                monitor.server_addr = addr;
            }
            if let Some(logdir) = logdir {
                monitor.log_dir = logdir;
            }
            if let Some(beep) = beep {
                monitor.beep = beep;
            }
            if let Some(lognormal) = lognormal {
                monitor.log_normal = lognormal;
            }
            monitor.debug |= debug;
            cmd_monitor(monitor).await
        }
        Commands::SoundTest { mode, severity } => cmd_sound_test(mode, severity.into()).await,
        Commands::Status => cmd_status(&config),
        Commands::Config { save } => cmd_config(&config, save),
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_serve(config: ecg_monitor::SimulatorConfig) -> ExitCode {
    let (addr, shutdown_tx) = match ecg_monitor::server::run(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start simulator: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("ECG simulator running on {addr}");
    println!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
    let _ = shutdown_tx.send(());
    // Give connection tasks a moment to finish their close handshakes.
    tokio::time::sleep(Duration::from_millis(200)).await;
    ExitCode::SUCCESS
}

async fn cmd_monitor(config: ecg_monitor::MonitorConfig) -> ExitCode {
    println!("ECG Monitor v{VERSION}");
    println!("{MONITORING_DISCLAIMER}");

    let logger = match SessionLogger::create(&config.log_dir, config.log_normal) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::error!("Failed to set up logging in {:?}: {}", config.log_dir, e);
            return ExitCode::FAILURE;
        }
    };
    let stats = create_shared_stats_with_persistence(&config.log_dir);

    tracing::info!("Logs will be stored in: {:?}", logger.path());
    tracing::info!("Beep alerts enabled: {}", config.beep);
    tracing::info!("Logging normal readings: {}", config.log_normal);

    let mut sinks = AlertFanout::new().with(logger).with(stats.clone());
    if config.beep {
        match AudibleAlerts::spawn(Beeper::new(true)) {
            Ok(alerts) => sinks.push(alerts),
            Err(e) => tracing::warn!("Could not start beeper, continuing without sound: {}", e),
        }
    }
    if !config.debug {
        sinks.push(ProgressIndicator::new());
    }

    let mut session = MonitorSession::new(Box::new(sinks), stats.clone());
    let url = stream_url(&config.server_addr);

    if !config.debug {
        print!("{}", ProgressIndicator::banner());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        println!("\n\nShutting down...");
    };

    let result = session.run(&url, shutdown).await;

    // Stops the beeper worker before the summary is printed. Joining the
    // worker blocks, so keep it off the runtime threads.
    if let Err(e) = tokio::task::spawn_blocking(move || drop(session)).await {
        tracing::warn!("Alert shutdown task failed: {}", e);
    }

    let code = match result {
        Ok(SessionEnd::Shutdown { .. }) | Ok(SessionEnd::PeerClosed) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = stats.save() {
        tracing::warn!("Could not save session statistics: {}", e);
    }
    println!();
    println!("{}", stats.summary());
    code
}

async fn cmd_sound_test(mode: SoundMode, severity: Severity) -> ExitCode {
    tracing::info!("Starting sound test utility");
    let beeper = Beeper::new(true);

    if matches!(mode, SoundMode::All | SoundMode::System) {
        tracing::info!("Testing system sound...");
        match beeper.play_system_sound() {
            Ok(()) => tracing::info!("System sound played successfully"),
            Err(e) => tracing::warn!("System sound failed: {}", e),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let samples = [
        (SoundMode::Tachycardia, ConditionKind::Tachycardia, 120),
        (SoundMode::Bradycardia, ConditionKind::Bradycardia, 45),
        (SoundMode::Arrhythmia, ConditionKind::Arrhythmia, 70),
    ];
    for (sample_mode, kind, heart_rate) in samples {
        if mode != SoundMode::All && mode != sample_mode {
            continue;
        }
        tracing::info!("Testing {} beep ({})...", kind, severity);

        let reading = Reading {
            timestamp: Utc::now(),
            heart_rate,
            rr_interval: 60.0 / heart_rate as f64,
            qt_interval: 0.35,
            pr_interval: 0.15,
            qrs_interval: 0.08,
            signal_quality: 1.0,
        };
        let condition = Condition::new(kind, severity, &reading);

        let player = beeper.clone();
        if let Err(e) =
            tokio::task::spawn_blocking(move || player.beep_for_condition(&condition)).await
        {
            tracing::warn!("Beep task failed: {}", e);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    println!("\nTest completed. Did you hear any sounds?");
    ExitCode::SUCCESS
}

fn cmd_status(config: &Config) -> ExitCode {
    println!("ECG Monitor Status");
    println!("==================");
    println!();
    println!("Log directory: {:?}", config.monitor.log_dir);
    println!();

    match StatsSnapshot::load_last(&config.monitor.log_dir) {
        Ok(snapshot) => {
            println!("Last session started {}", snapshot.session_start.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("{}", snapshot.summary());
        }
        Err(_) => println!("No previous session data found."),
    }
    ExitCode::SUCCESS
}

fn cmd_config(config: &Config, save: bool) -> ExitCode {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );

    if save {
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            return ExitCode::FAILURE;
        }
        println!();
        println!("Saved to {:?}", Config::config_path());
    }
    ExitCode::SUCCESS
}
