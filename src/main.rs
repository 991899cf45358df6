//! hostmon - host resource sampler reporting to Seq
//!
//! Runs the sampling loop in the foreground. On Windows, `--install` and
//! `--uninstall` manage the `hostmon-service` background service.

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use hostmon::cli::{init_logging, AgentArgs};
use hostmon::core::config::{format_duration, MonitorConfig};
use hostmon::monitor::run_agent;
use hostmon::platform::service::{install_service, uninstall_service, InstallOutcome, ServiceInstallOptions};
use hostmon::platform::{detect_platform, is_platform_supported};

#[derive(Parser)]
#[command(name = "hostmon")]
#[command(about = "Samples CPU, memory, disk and network usage and sends it to Seq", long_about = None)]
struct Cli {
    #[command(flatten)]
    agent: AgentArgs,

    /// Install as a Windows service
    #[arg(long, conflicts_with = "uninstall")]
    install: bool,

    /// Stop and remove the Windows service
    #[arg(long)]
    uninstall: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.agent.debug) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = match MonitorConfig::resolve(cli.agent.config.as_deref(), &cli.agent.overrides()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.install {
        let options = ServiceInstallOptions {
            service_name: config.service_name.clone(),
            seq_url: config.seq_url.clone(),
            interval: config.interval,
            debug: config.debug,
        };
        match install_service(&options) {
            Ok(InstallOutcome::Installed) => info!("Service {} installed", options.service_name),
            Ok(InstallOutcome::AlreadyInstalled) => {
                info!("Service {} is already installed", options.service_name)
            }
            Err(e) => {
                error!("Failed to install service: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.uninstall {
        if let Err(e) = uninstall_service(&config.service_name) {
            error!("Failed to uninstall service: {}", e);
            std::process::exit(1);
        }
        info!("Service {} uninstalled", config.service_name);
        return;
    }

    let platform = detect_platform();
    info!(
        "Starting hostmon on {} {} ({})",
        platform.os_name,
        platform.os_version.as_deref().unwrap_or("unknown"),
        platform.arch
    );
    if !is_platform_supported() {
        warn!("No CPU accounting backend for this platform, CPU usage will read 0");
    }
    if config.debug {
        info!("Debug mode: printing metrics every {}", format_duration(config.interval));
    } else {
        info!("Sending metrics to {} every {}", config.ingest_url(), format_duration(config.interval));
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_stop().await;
        info!("Shutdown requested");
        let _ = stop_tx.send(true);
    });

    if let Err(e) = run_agent(&config, stop_rx).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
async fn wait_for_stop() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop() {
    let _ = tokio::signal::ctrl_c().await;
}
