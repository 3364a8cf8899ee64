//! CLI entry point for the data-plane rule engine's host process (spec
//! section 6): parses `--listen`/`--hitlog-dir`/`--config`/`--version`,
//! wires up the bridge and telemetry recorder, and serves the gRPC
//! surface until terminated.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bridge::bridge::{Bridge, StorageConfig};
use bridge::config::Config;
use bridge::refresh::{RolloutScheduler, SchedulerConfig};
use bridge::telemetry::{HitlogConfig, HitlogWriter, TelemetryConfig, TelemetryRecorder};
use clap::Parser;

/// sysexits.h-style exit codes (spec section 6).
mod sysexits {
    pub const OK: u8 = 0;
    pub const USAGE: u8 = 64;
    pub const UNAVAILABLE: u8 = 69;
    pub const SOFTWARE: u8 = 70;
}

#[derive(Parser, Debug)]
#[command(name = "bridge-server", about = "Data-plane rule engine host process")]
struct Cli {
    /// Address to listen for gRPC connections on, e.g. 0.0.0.0:7070.
    #[arg(long)]
    listen: Option<String>,

    /// Directory the hitlog is written under.
    #[arg(long)]
    hitlog_dir: Option<PathBuf>,

    /// Path to a TOML config file overriding environment-sourced values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the version and exit.
    #[arg(long)]
    version: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("bridge-server {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::from(sysexits::OK);
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {}", e);
            return ExitCode::from(sysexits::USAGE);
        }
    };

    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(hitlog_dir) = cli.hitlog_dir {
        config.hitlog_dir = hitlog_dir;
    }

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    let listen_addr: std::net::SocketAddr = match config.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("invalid listen address '{}': {}", config.listen_addr, e);
            return ExitCode::from(sysexits::USAGE);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {}", e);
            return ExitCode::from(sysexits::SOFTWARE);
        }
    };

    runtime.block_on(async move { run(config, listen_addr).await })
}

async fn run(config: Config, listen_addr: std::net::SocketAddr) -> ExitCode {
    let bridge = match Bridge::new(&config, StorageConfig::default()) {
        Ok(bridge) => Arc::new(bridge),
        Err(e) => {
            eprintln!("failed to initialize bridge: {}", e);
            return ExitCode::from(sysexits::SOFTWARE);
        }
    };

    let writer = match HitlogWriter::new(HitlogConfig {
        dir: config.hitlog_dir.clone(),
        rotation: Default::default(),
    }) {
        Ok(writer) => Arc::new(writer),
        Err(e) => {
            eprintln!("failed to initialize hitlog: {}", e);
            return ExitCode::from(sysexits::UNAVAILABLE);
        }
    };
    let hitlog_path = writer.path().to_path_buf();
    let recorder = Arc::new(TelemetryRecorder::new(writer, TelemetryConfig::default()));

    let scheduler = Arc::new(RolloutScheduler::new(
        bridge.deployment.clone(),
        SchedulerConfig::default(),
    ));
    tokio::spawn(scheduler.start());

    if let Err(e) =
        bridge::grpc_server::start_grpc_server(bridge, recorder, hitlog_path, listen_addr).await
    {
        eprintln!("gRPC server error: {}", e);
        return ExitCode::from(sysexits::UNAVAILABLE);
    }

    ExitCode::from(sysexits::OK)
}
