//! Beacon service binary.
//!
//! Resolves the advertised address, serves the health endpoint, registers
//! with the discovery backend, and deregisters on SIGTERM or Ctrl-C.

use beacon::logging::{LogConfig, LogFormat, LogLevel};
use beacon::prelude::*;
use beacon::{ShutdownTrigger, shutdown_signal, until_shutdown};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "beacon", version, about = "Self-registering service bootstrap")]
struct Cli {
    /// Configuration file (.json, .toml or .env)
    #[arg(short, long, env = "BEACON_CONFIG")]
    config: Option<PathBuf>,

    /// Seed the environment from this .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = LogConfig::new()
        .level(cli.log_level)
        .format(cli.log_format)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Startup aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BootstrapError> {
    BeaconConfig::load_dotenv(cli.env_file.as_deref())?;
    let config = BeaconConfig::load(cli.config.as_deref())?;

    let bootstrap = ServiceBootstrap::from_config(&config).await?;
    let health = bootstrap.health();

    if let Some(ref url) = config.dependency_url {
        health
            .register(HttpDependencyCheck::new("dependency", url.as_str()))
            .await;
    }
    health
        .register(FnCheck::new("heartbeat", || async {
            tracing::debug!("Additional health check");
            HealthStatus::healthy()
        }))
        .await;

    let ip: IpAddr = config
        .listen_addr
        .parse()
        .map_err(|_| BootstrapError::ListenAddr(config.listen_addr.clone()))?;
    let server = HealthServer::bind(
        SocketAddr::new(ip, config.service_port),
        health,
        config.health_path.as_str(),
    )
    .await?;

    let shutdown = shutdown_signal().map_err(BootstrapError::Signal)?;

    let (stop_server, server_stopped) = oneshot::channel::<()>();
    let mut server_task = tokio::spawn(server.serve(async {
        server_stopped.await.ok();
    }));

    let identity = ServiceIdentity::new(
        config.service_name.as_str(),
        config.service_version.as_str(),
    );
    let handle = match bootstrap.on_start(&identity).await {
        Ok(handle) => handle,
        Err(e) => {
            stop_server.send(()).ok();
            return Err(e);
        }
    };
    info!(id = handle.id(), address = %handle.address(), "Service is live");

    match until_shutdown(shutdown, &mut server_task).await {
        ShutdownTrigger::Signal => {
            info!("Shutdown requested");
            bootstrap.on_stop(handle).await;
            stop_server.send(()).ok();
            if let Ok(Err(e)) = server_task.await {
                error!(error = %e, "Health endpoint failed");
            }
            Ok(())
        }
        ShutdownTrigger::Stopped(exit) => {
            warn!("Health endpoint stopped, withdrawing registration");
            bootstrap.on_stop(handle).await;
            Err(match exit {
                Ok(Err(e)) => e.into(),
                Ok(Ok(())) => BootstrapError::EndpointStopped("exited unexpectedly".into()),
                Err(e) => BootstrapError::EndpointStopped(e.to_string()),
            })
        }
    }
}
