//! TempURL broker server.
//!
//! Authenticates HMAC-signed API calls, evaluates access rules and hands out
//! time-limited, HMAC-SHA1 signed object URLs. Account owners upload the
//! signing keys those URLs are signed with.
//!
//! # Usage
//!
//! ```text
//! STORE_FILE=/etc/tempurl/seed.json OBJECT_HOST=https://blob.example.com tempurl-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `OBJECT_HOST` | `http://localhost:8081` | Blob-store URL prefix |
//! | `DEFAULT_DURATION` | `300` | URL lifetime when a request omits one |
//! | `AUTH_PREFIX` | `TempURL` | `Authorization` scheme |
//! | `FRESHNESS_WINDOW` | `300` | Tolerated clock skew in seconds |
//! | `SWEEP_INTERVAL` | `60` | Cache sweep interval in seconds, 0 disables |
//! | `SIGNING_KEY_TTL` | *(unset)* | Optional signing-key lifetime in seconds |
//! | `STORE_TIMEOUT_MS` | `5000` | Bound on store calls |
//! | `STORE_FILE` | *(unset)* | JSON seed of accounts and access rules |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tempurl_auth::{CachedSecretResolver, HmacAuthenticator};
use tempurl_core::{CacheSweeper, Sweep, TempUrlConfig};
use tempurl_http::{TempUrlHandler, TempUrlHttpConfig, TempUrlHttpService};
use tempurl_signer::{TempUrlBrokerHandler, TempUrlProvider};
use tempurl_store::{MemoryStore, SeedFile, StoreSecretResolver};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version logged at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long a resolved API secret is reused before the store is asked again.
const RESOLVER_CACHE_TTL: Duration = Duration::from_secs(60);

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the account and rule store, seeded from `STORE_FILE` when set.
fn build_store(config: &TempUrlConfig) -> Result<Arc<MemoryStore>> {
    let store = match &config.store_file {
        Some(path) => {
            let seed = SeedFile::load(path)
                .with_context(|| format!("failed to load store file {path}"))?;
            MemoryStore::from_seed(seed)
                .with_context(|| format!("invalid store file {path}"))?
        }
        None => {
            warn!("STORE_FILE not set, starting with an empty store");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}

/// Everything the accept loop and the sweeper need.
struct Broker {
    service: TempUrlHttpService<TempUrlBrokerHandler>,
    sweep_targets: Vec<Arc<dyn Sweep>>,
}

/// Wire the store, authenticator, provider and HTTP service together.
fn build_broker(config: &TempUrlConfig) -> Result<Broker> {
    let store = build_store(config)?;

    let resolver = Arc::new(CachedSecretResolver::new(
        Arc::new(StoreSecretResolver::new(
            store.clone(),
            config.store_timeout(),
        )),
        RESOLVER_CACHE_TTL,
    ));
    let authenticator = Arc::new(HmacAuthenticator::new(
        config.auth_prefix.clone(),
        config.freshness_window(),
        resolver.clone(),
    ));

    let provider = Arc::new(TempUrlProvider::new(config.clone(), store.clone(), store));

    let sweep_targets: Vec<Arc<dyn Sweep>> = vec![
        provider.signing_keys(),
        authenticator.nonce_guard().sweep_target(),
        resolver.cache(),
    ];

    let handler = Arc::new(TempUrlBrokerHandler::new(provider));
    let service = TempUrlHttpService::new(handler, TempUrlHttpConfig { authenticator });

    Ok(Broker {
        service,
        sweep_targets,
    })
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: TempUrlHandler>(
    listener: TcpListener,
    service: TempUrlHttpService<H>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running server.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = TempUrlConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = TempUrlConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        object_host = %config.object_host,
        default_duration = config.default_duration,
        freshness_window_secs = config.freshness_window_secs,
        sweep_interval_secs = config.sweep_interval_secs,
        version = VERSION,
        "starting tempurl broker",
    );

    let broker = build_broker(&config)?;
    let sweeper = CacheSweeper::start(broker.sweep_targets, config.sweep_interval());

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let result = serve(listener, broker.service).await;
    sweeper.stop().await;
    result
}
