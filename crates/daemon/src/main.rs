// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DRender Daemon (drenderd)
//!
//! Background process that owns the driver loop for distributed render
//! projects.
//!
//! Architecture:
//! - Listener task: socket I/O, answers START/STATUS, emits events
//! - Driver loop: main task processing events sequentially
//! - Executor tasks: cloud calls on a bounded pool, reporting back as events

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use drender_daemon::config::Config;
use drender_daemon::lifecycle::{self, LifecycleError, StartupResult};
use drender_daemon::listener::{ListenCtx, Listener};

/// Rotate the log once it outgrows this.
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("drenderd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("drenderd {}", env!("CARGO_PKG_VERSION"));
                println!("DRender daemon - drives distributed render projects");
                println!();
                println!("USAGE:");
                println!("    drenderd");
                println!();
                println!("Listens on a Unix socket under the state directory");
                println!("($DRENDER_STATE_DIR, default ~/.local/state/drender) for");
                println!("project, heartbeat, and frame control messages.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: drenderd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("starting drenderd");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
        event_reader,
        frame_handle,
        frame_feed,
    } = match lifecycle::startup(&config) {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(path)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("drenderd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            eprintln!("  lock: {path}");
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let shutdown = Arc::new(Notify::new());

    // Listener task
    let ctx = Arc::new(ListenCtx {
        runtime: Arc::clone(&daemon.runtime),
        event_bus: daemon.event_bus.clone(),
        frames: frame_handle,
        shutdown: Arc::clone(&shutdown),
    });
    tokio::spawn(Listener::new(unix_listener, ctx).run());

    // Signals route through the same shutdown notify as the socket
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        signal_shutdown.notify_one();
    });

    info!(
        socket = %config.socket_path.display(),
        "daemon ready"
    );
    println!("READY");

    lifecycle::run_driver_loop(
        Arc::clone(&daemon.runtime),
        daemon.event_bus.clone(),
        event_reader,
        frame_feed,
        shutdown,
    )
    .await;

    daemon.shutdown();
    Ok(())
}

/// Move an oversized log aside so the file writer starts fresh.
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return;
    };
    if metadata.len() > MAX_LOG_BYTES {
        let rotated = log_path.with_extension("log.old");
        if let Err(e) = std::fs::rename(log_path, &rotated) {
            eprintln!("warning: failed to rotate log: {e}");
        }
    }
}

/// File logging with env-filter; guard must live for the process.
fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = tracing_subscriber::EnvFilter::try_from_env("DRENDER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
