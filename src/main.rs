//! Workspace Storage Operator
//!
//! Composition root: builds the configuration, resolves the claim strategy,
//! wires exactly one cleanup subscriber against the removal event stream,
//! and serves health and metrics endpoints until shutdown.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use workspace_storage_operator::{
    metrics, register_cleanup, ClaimStrategy, ClusterClientFactoryRef, Error, KubeClientFactory,
    RemovalEventBus, Result, StorageSettings,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Workspace Storage Operator - persistent storage lifecycle for development workspaces
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (YAML); flags below are ignored when set
    #[arg(long, env = "STORAGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Disable workspace storage provisioning
    #[arg(long, env = "STORAGE_DISABLED")]
    storage_disabled: bool,

    /// Base claim name
    #[arg(long, env = "STORAGE_CLAIM_NAME", default_value = "claim-workspace")]
    claim_name: String,

    /// Claim size request (Kubernetes quantity)
    #[arg(long, env = "STORAGE_SIZE_REQUEST", default_value = "10Gi")]
    size_request: String,

    /// Claim access mode
    #[arg(long, env = "STORAGE_ACCESS_MODE", default_value = "ReadWriteOnce")]
    access_mode: String,

    /// Mount path inside workspace-agent containers
    #[arg(long, env = "STORAGE_MOUNT_PATH", default_value = "/projects")]
    mount_path: String,

    /// Claim strategy (onePerWorkspace or onePerProject)
    #[arg(long, env = "STORAGE_STRATEGY", default_value = "onePerWorkspace")]
    strategy: String,

    /// Project shared by all workspaces; omit when each workspace gets its own
    #[arg(long, env = "STORAGE_ISOLATED_PROJECT")]
    isolated_project: Option<String>,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn settings(&self) -> Result<StorageSettings> {
        match &self.settings {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                StorageSettings::from_file(path)
            }
            None => Ok(StorageSettings {
                enabled: !self.storage_disabled,
                claim_name: self.claim_name.clone(),
                size_request: self.size_request.clone(),
                access_mode: self.access_mode.clone(),
                mount_path: self.mount_path.clone(),
                strategy: self.strategy.clone(),
                isolated_project: self.isolated_project.clone(),
            }),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Workspace Storage Operator");
    info!("  Version: {}", workspace_storage_operator::VERSION);

    let settings = args.settings()?;
    settings.validate()?;
    let strategy = ClaimStrategy::resolve(&settings.strategy)?;

    info!("  Storage enabled: {}", settings.enabled);
    info!("  Claim strategy: {}", strategy);
    match &settings.isolated_project {
        Some(project) => info!("  Shared project: {}", project),
        None => info!("  Project isolation: one project per workspace"),
    }

    metrics::init();

    // Provisioning runs on the workspace-start path via the library API; the
    // process itself only wires the cleanup side of the lifecycle.
    let bus = Arc::new(RemovalEventBus::new(256));

    if settings.enabled {
        let factory: ClusterClientFactoryRef = Arc::new(KubeClientFactory::try_default().await?);
        register_cleanup(&settings, factory, &bus)?;
    } else {
        info!("Workspace storage disabled, cleanup not wired");
    }

    // Start health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = args.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr).await {
            error!("Metrics server error: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Internal(format!("Failed to listen for shutdown signal: {}", e)))?;

    info!("Operator shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("kube=info".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/healthz" | "/livez" | "/readyz" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid health server address: {}", e)))?;

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};
    use prometheus::{Encoder, TextEncoder};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = prometheus::gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();

                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", encoder.format_type())
                        .body(Body::from(buffer))
                        .unwrap()
                }
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid metrics server address: {}", e)))?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
