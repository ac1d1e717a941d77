//! sockmap - version 0.1.0
//!
//! Socket, memory-map and process snapshot tool with tracing logging.
//! This is the main entry point that resolves configuration, handles
//! subcommands and drives the monitoring loop.

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

use sockmap::cli::{Args, Commands};
use sockmap::commands::{command_check, command_selftest};
use sockmap::config::{
    render_config, resolve_config, validate_effective_config, Config, MonitorSettings,
    ScanSettings, DEFAULT_LOG_LEVEL,
};
use sockmap::monitor::{shutdown_channel, Monitor, ProcfsSource};
use sockmap::startup_checks;

/// Initializes tracing logging on stderr with the configured level.
fn setup_logging(config: &Config) {
    let mut level = config
        .log_level
        .as_deref()
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    if config.verbose.unwrap_or(false) {
        level = level.max(LevelFilter::DEBUG);
    }

    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }
    info!("Logging initialized with level: {}", level);
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Waits for SIGINT or SIGTERM. Handlers are installed by the caller so
/// signals arriving during the first scan are not lost.
async fn shutdown_signal(mut interrupt: Signal, mut terminate: Signal) {
    tokio::select! {
        _ = interrupt.recv() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = exit_code(!e.use_stderr());
            let _ = e.print();
            return code;
        }
    };

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        return ExitCode::FAILURE;
    }

    if args.check_config {
        println!("✅ Configuration is valid");
        return ExitCode::SUCCESS;
    }

    if args.show_config {
        return match render_config(&config, args.config_format) {
            Ok(rendered) => {
                println!("{}", rendered.trim_end());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Failed to render configuration: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    setup_logging(&config);

    if args.test {
        return exit_code(command_selftest());
    }

    if let Some(Commands::Check) = args.command {
        return match command_check(&config) {
            Ok(ok) => exit_code(ok),
            Err(e) => {
                error!("Check failed: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let scan_settings = ScanSettings::from_config(&config);
    if let Err(e) = startup_checks::validate_requirements(&scan_settings.proc_root) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let (interrupt, terminate) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (trigger, mut shutdown) = shutdown_channel();
    tokio::spawn(async move {
        shutdown_signal(interrupt, terminate).await;
        trigger.trigger();
    });

    let monitor_settings = MonitorSettings::from_config(&config);
    info!(
        "Starting monitor: format={:?}, interval={}s, proc_root={}",
        monitor_settings.format,
        monitor_settings.interval.as_secs(),
        scan_settings.proc_root.display()
    );

    let mut monitor = Monitor::new(
        monitor_settings,
        ProcfsSource::new(scan_settings),
        io::stdout(),
    );
    let report = monitor.run(&mut shutdown).await;

    info!(
        "sockmap stopped: {} cycles completed, {} skipped",
        report.cycles_ok, report.cycles_failed
    );
    ExitCode::SUCCESS
}
