// # hostdnsd - hostdns Daemon
//
// Thin integration layer: reads configuration from the environment, builds
// the provider gateway through the registry, and serves the HTTP harness.
// All start/stop and DNS logic lives in hostdns-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Provider
// - `HOSTDNS_PROVIDER_TYPE`: Provider type (aws, memory). Default: aws
// - `HOSTDNS_REGION`: AWS region (optional, falls back to the SDK chain)
// - `HOSTDNS_HOSTED_ZONE_ID`: Route53 hosted zone id (required for aws)
//
// ### Resources
// - `HOSTDNS_RESOURCES`: Comma-separated `name=resource-id` pairs
// - `HOSTDNS_DEFAULT_TARGET`: Target used when a request names none.
//   Default: the first pair in `HOSTDNS_RESOURCES`
// - `HOSTDNS_ELASTIC_IP_ALLOCATION_ID`: Static address to associate on start
//
// ### Record
// - `HOSTDNS_RECORD_NAME`: Hostname to manage
// - `HOSTDNS_RECORD_TTL`: TTL in seconds. Default: 300
//
// ### Polling
// - `HOSTDNS_POLL_MAX_ATTEMPTS`: Describe attempts after a start. Default: 10
// - `HOSTDNS_POLL_INTERVAL_SECS`: Seconds between attempts. Default: 3
//
// ### Daemon
// - `HOSTDNS_BIND_ADDRESS`: Listen address. Default: 0.0.0.0:8080
// - `HOSTDNS_LOG_LEVEL`: trace, debug, info, warn, error. Default: info
//
// ## Example
//
// ```bash
// export HOSTDNS_REGION=eu-west-1
// export HOSTDNS_HOSTED_ZONE_ID=Z0123456789ABC
// export HOSTDNS_RECORD_NAME=game.example.com
// export HOSTDNS_RESOURCES=game=i-0123456789abcdef0,development=i-0fedcba9876543210
//
// hostdnsd
// curl 'http://localhost:8080/?action=start&target=game'
// ```

mod server;

use anyhow::{Context, Result};
use hostdns_core::config::{HostDnsConfig, PollConfig, ProviderConfig, RecordConfig};
use hostdns_core::{LifecycleController, ProviderRegistry};
use std::collections::BTreeMap;
use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HostDnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HostDnsExitCode> for ExitCode {
    fn from(code: HostDnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
#[derive(Debug)]
struct Config {
    core: HostDnsConfig,
    bind_address: SocketAddr,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match var("HOSTDNS_PROVIDER_TYPE").as_deref().unwrap_or("aws") {
            "aws" => ProviderConfig::Aws {
                region: var("HOSTDNS_REGION"),
                hosted_zone_id: var("HOSTDNS_HOSTED_ZONE_ID").context(
                    "HOSTDNS_HOSTED_ZONE_ID is required when HOSTDNS_PROVIDER_TYPE=aws",
                )?,
            },
            "memory" => ProviderConfig::Memory,
            other => anyhow::bail!(
                "HOSTDNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: aws, memory",
                other
            ),
        };

        let pairs = parse_resources(&var("HOSTDNS_RESOURCES").context(
            "HOSTDNS_RESOURCES is required. \
            Set it via: export HOSTDNS_RESOURCES=game=i-0123456789abcdef0",
        )?)?;
        let default_target = match var("HOSTDNS_DEFAULT_TARGET") {
            Some(target) => target,
            None => pairs[0].0.clone(),
        };

        let hostname = var("HOSTDNS_RECORD_NAME").context(
            "HOSTDNS_RECORD_NAME is required. \
            Set it via: export HOSTDNS_RECORD_NAME=game.example.com",
        )?;
        let mut record = RecordConfig::new(hostname);
        if let Some(ttl) = parse_var(&var, "HOSTDNS_RECORD_TTL")? {
            record = record.with_ttl(ttl);
        }

        let mut poll = PollConfig::default();
        if let Some(max_attempts) = parse_var(&var, "HOSTDNS_POLL_MAX_ATTEMPTS")? {
            poll.max_attempts = max_attempts;
        }
        if let Some(interval_secs) = parse_var(&var, "HOSTDNS_POLL_INTERVAL_SECS")? {
            poll.interval_secs = interval_secs;
        }

        let bind_address = match parse_var(&var, "HOSTDNS_BIND_ADDRESS")? {
            Some(address) => address,
            None => DEFAULT_BIND_ADDRESS.parse()?,
        };

        Ok(Self {
            core: HostDnsConfig {
                provider,
                resources: pairs.into_iter().collect::<BTreeMap<_, _>>(),
                default_target,
                record,
                poll,
                elastic_ip_allocation_id: var("HOSTDNS_ELASTIC_IP_ALLOCATION_ID"),
            },
            bind_address,
            log_level: var("HOSTDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.core.validate()?;

        if self.core.poll.interval_secs > 60 {
            anyhow::bail!(
                "HOSTDNS_POLL_INTERVAL_SECS must be at most 60 seconds. Got: {}",
                self.core.poll.interval_secs
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "HOSTDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Parse `name=id,name=id`, keeping the given order
fn parse_resources(raw: &str) -> Result<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, id) = entry
            .split_once('=')
            .with_context(|| format!("HOSTDNS_RESOURCES entry '{}' is not name=id", entry))?;
        let (name, id) = (name.trim(), id.trim());

        if name.is_empty() || id.is_empty() {
            anyhow::bail!("HOSTDNS_RESOURCES entry '{}' has an empty name or id", entry);
        }
        if pairs.iter().any(|(existing, _)| existing == name) {
            anyhow::bail!("HOSTDNS_RESOURCES names '{}' more than once", name);
        }

        pairs.push((name.to_string(), id.to_string()));
    }

    if pairs.is_empty() {
        anyhow::bail!("HOSTDNS_RESOURCES must contain at least one name=id pair");
    }

    Ok(pairs)
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
        })
        .transpose()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return HostDnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return HostDnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HostDnsExitCode::ConfigError.into();
    }

    info!("Starting hostdnsd");
    info!(
        "Configuration loaded: {} target(s), record {}",
        config.core.resources.len(),
        config.core.record.hostname
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HostDnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let controller = match build_controller(config.core).await {
            Ok(controller) => controller,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return HostDnsExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(controller, config.bind_address).await {
            error!("Daemon error: {:#}", e);
            HostDnsExitCode::RuntimeError
        } else {
            HostDnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Register providers and build the controller
async fn build_controller(config: HostDnsConfig) -> Result<Arc<LifecycleController>> {
    let registry = ProviderRegistry::new();

    hostdns_core::providers::memory::register(&registry);

    #[cfg(feature = "aws")]
    {
        info!("Registering AWS provider");
        hostdns_provider_aws::register(&registry);
    }

    info!("Available providers: {}", registry.list_providers().join(", "));

    let gateway = registry.create_gateway(&config).await?;
    info!(
        "Using compute provider {} and DNS provider {}",
        gateway.compute_name(),
        gateway.dns_name()
    );

    Ok(Arc::new(LifecycleController::new(config, gateway)?))
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(controller: Arc<LifecycleController>, bind_address: SocketAddr) -> Result<()> {
    let signal = shutdown_signal()?;
    let shutdown = async move {
        let name = signal.await;
        info!("Received shutdown signal: {}", name);
    };

    server::serve(controller, bind_address, shutdown).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Install handlers for SIGTERM and SIGINT
///
/// Installation happens up front so a failure surfaces before the listener
/// opens. The returned future resolves with the name of the signal.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                "CTRL-C handler failure"
            }
        }
    })
}
