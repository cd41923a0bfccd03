//! Thesis Monitoring Service
//!
//! Serves cached dashboard statistics for the thesis platform.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Thesis Monitoring Service                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │     HTTP     │───▶│  CacheAside  │───▶│   Snapshot   │       │
//! │  │    Server    │    │   (Redis)    │    │   Builder    │       │
//! │  └──────────────┘    └──────────────┘    └──────┬───────┘       │
//! │                                                 │               │
//! │                                   ┌─────────────┴────────────┐  │
//! │                                   │  MySQL        MongoDB    │  │
//! │                                   └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use thesis_monitor::adapters::{MongoGuidanceStore, MySqlSubmissionStore, RedisSnapshotCache};
use thesis_monitor::config::Args;
use thesis_monitor::error::Result;
use thesis_monitor::{server, StatsService};

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    args.validate()?;

    info!("Starting Thesis Monitoring Service");
    info!("  MySQL: {}:{}/{}", args.mysql_host, args.mysql_port, args.mysql_db);
    info!("  Redis: {}:{}", args.redis_host, args.redis_port);
    info!("  Guidance collection: {}", args.guidance_collection);
    info!("  Cache key: {} (TTL {}s)", args.cache_key, args.cache_ttl_seconds);
    info!("  Query timeout: {}s", args.query_timeout_seconds);

    // Store adapters; none of them needs its backend to be up yet
    let submissions = Arc::new(MySqlSubmissionStore::connect_lazy(&args.mysql_config()));
    let guidance = Arc::new(MongoGuidanceStore::connect(&args.mongo_config()).await?);
    let cache = Arc::new(RedisSnapshotCache::new(&args.redis_config())?);

    let service = Arc::new(StatsService::new(
        args.service_config(),
        submissions,
        guidance,
        cache,
    )?);

    // Stop accepting connections on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received");
        signal.cancel();
    });

    server::serve(args.listen_addr()?, service, shutdown).await?;

    info!("Service shutdown complete");
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

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "sqlx=warn", "mongodb=warn", "redis=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

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
