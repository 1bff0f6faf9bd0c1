//! booking-realtime command line.
//!
//! ```text
//! booking-realtime relay [--once]   drain the queue table into Redis
//! booking-realtime monitor          diff the bookings table into Redis
//! booking-realtime edge             serve SSE streams and /versions
//! booking-realtime watch ...        follow one calendar view
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use booking_realtime::adapters::postgres::{run_migrations, PostgresBookingReader, PostgresEventQueue};
use booking_realtime::adapters::redis::{RedisBroker, RedisRelay, RedisVersionStore};
use booking_realtime::adapters::{
    edge_router, ChangeRelay, ChannelHub, DiffMonitor, EdgeState, FileKeyValueStore,
    HttpStreamConnector, HttpVersionFetcher, QueueChangeSource, SystemClock,
};
use booking_realtime::application::realtime::{
    LogStatusListener, RealtimeClient, RealtimeOptions, RefreshThrottle,
};
use booking_realtime::config::{
    AppConfig, ConfigError, DatabaseConfig, RedisConfig, RelayMode, SourceKind, ValidationError,
};
use booking_realtime::domain::foundation::{DomainError, SpecialistId, WorkLocationId};
use booking_realtime::logging::init_tracing;
use booking_realtime::ports::{ChangeSource, TransportError};

#[derive(Debug, Parser)]
#[command(name = "booking-realtime", version, about = "Live booking change propagation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Publish queued booking changes.
    Relay {
        /// Drain one batch and exit.
        #[arg(long)]
        once: bool,
    },
    /// Publish changes found by diffing booking snapshots.
    Monitor,
    /// Serve the streaming edge.
    Edge,
    /// Follow a calendar view and log refreshes.
    Watch {
        #[arg(long)]
        specialist: Option<SpecialistId>,

        #[arg(long = "work-location")]
        work_location: Option<WorkLocationId>,

        #[arg(long)]
        supervisor: bool,

        /// Poll the version endpoint only.
        #[arg(long = "no-stream")]
        no_stream: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Timed out connecting to {0}")]
    Timeout(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "booking-realtime exited with error");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server.log_level, config.server.log_format);
    config.validate()?;

    match cli.command {
        Command::Relay { once } => {
            let once = once || config.relay.mode == RelayMode::Batch;
            relay(&config, config.relay.source, once).await
        }
        Command::Monitor => relay(&config, SourceKind::Diff, false).await,
        Command::Edge => edge(&config).await,
        Command::Watch {
            specialist,
            work_location,
            supervisor,
            no_stream,
        } => {
            let mut options = RealtimeOptions::new(config.client.base_url.clone())
                .supervisor(supervisor)
                .with_polling_interval(config.client.polling_min(), config.client.polling_max())
                .with_streaming(config.client.streaming_enabled && !no_stream)
                .with_debug(config.client.debug);
            if let Some(id) = specialist {
                options = options.for_specialist(id);
            }
            if let Some(id) = work_location {
                options = options.for_work_location(id);
            }
            watch_view(&config, options).await
        }
    }
}

async fn relay(config: &AppConfig, source_kind: SourceKind, once: bool) -> Result<(), CliError> {
    let pool = connect_database(config.require_database()?).await?;
    let redis_config = config.require_redis()?;
    let client = redis::Client::open(redis_config.url.as_str())?;
    let conn = connect_redis(&client, redis_config).await?;

    let clock = Arc::new(SystemClock);
    let source: Arc<dyn ChangeSource> = match source_kind {
        SourceKind::Queue => Arc::new(QueueChangeSource::with_retention(
            Arc::new(PostgresEventQueue::new(pool)),
            config.relay.retention(),
        )),
        SourceKind::Diff => Arc::new(DiffMonitor::new(
            Arc::new(PostgresBookingReader::new(pool)),
            clock.clone(),
        )),
    };

    let mut relay_config = config.relay.clone();
    relay_config.source = source_kind;
    let relay = ChangeRelay::new(source, Arc::new(RedisBroker::new(conn.clone())), clock)
        .with_versions(Arc::new(RedisVersionStore::new(conn)))
        .with_config(relay_config.relay_config());

    if once {
        if source_kind == SourceKind::Diff {
            warn!("A single diff pass only primes the snapshot; nothing will be published");
        }
        let report = relay.run_once().await?;
        info!(?report, "Relay batch complete");
        return Ok(());
    }

    let (tx, rx) = watch::channel(false);
    let worker = tokio::spawn(async move { relay.run(rx).await });

    shutdown_signal().await;
    let _ = tx.send(true);
    if let Err(e) = worker.await {
        warn!(error = %e, "Relay task ended abnormally");
    }
    Ok(())
}

async fn edge(config: &AppConfig) -> Result<(), CliError> {
    let redis_config = config.require_redis()?;
    let client = redis::Client::open(redis_config.url.as_str())?;
    let conn = connect_redis(&client, redis_config).await?;

    let hub = Arc::new(ChannelHub::new(config.edge.channel_capacity));
    let state = EdgeState::new(
        hub.clone(),
        Arc::new(RedisVersionStore::new(conn)),
        Arc::new(SystemClock),
    )
    .with_heartbeat_interval(config.edge.heartbeat_interval());

    let (tx, rx) = watch::channel(false);
    let relay = RedisRelay::new(client, hub);
    let forwarder = tokio::spawn(async move { relay.run(rx).await });

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Edge service listening");

    axum::serve(listener, edge_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = tx.send(true);
    if let Err(e) = forwarder.await {
        warn!(error = %e, "Redis relay task ended abnormally");
    }
    Ok(())
}

async fn watch_view(config: &AppConfig, options: RealtimeOptions) -> Result<(), CliError> {
    let store = Arc::new(FileKeyValueStore::new(&config.client.state_file));
    let throttle = Arc::new(RefreshThrottle::new(
        store,
        Arc::new(SystemClock),
        Arc::new(|| info!("Calendar refresh triggered")),
    ));

    match throttle.take_last_change().await {
        Ok(Some(last)) => info!(
            kind = %last.kind,
            client = %last.client_name,
            booking_id = ?last.booking_id,
            "Last change before restart"
        ),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Could not read last change"),
    }

    let client = RealtimeClient::new(
        options,
        Arc::new(HttpStreamConnector::new(config.client.connect_timeout())?),
        Arc::new(HttpVersionFetcher::new(
            config.client.version_url(),
            config.client.connect_timeout(),
        )?),
        throttle.clone(),
        Arc::new(LogStatusListener),
    );

    client.start().await;
    shutdown_signal().await;
    client.stop().await;
    throttle.shutdown();
    Ok(())
}

async fn connect_database(config: &DatabaseConfig) -> Result<PgPool, CliError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min)
        .max_connections(config.pool_max)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await?;

    if config.run_migrations {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }
    Ok(pool)
}

async fn connect_redis(
    client: &redis::Client,
    config: &RedisConfig,
) -> Result<redis::aio::MultiplexedConnection, CliError> {
    let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_async_connection())
        .await
        .map_err(|_| CliError::Timeout("redis"))??;
    Ok(conn)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
