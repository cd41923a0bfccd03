//! Configuration
//!
//! Command-line arguments with environment variable fallbacks. The variable
//! names match the ones the rest of the thesis platform already exports
//! (`MYSQL_HOST`, `MONGODB_URI`, `REDIS_HOST`, ...).

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::adapters::{MongoConfig, MySqlConfig, RedisConfig, DEFAULT_COLLECTION};
use crate::error::{Error, Result};
use crate::stats::{BuilderConfig, ServiceConfig, GLOBAL_STATS_KEY};

/// Thesis Monitoring Service - cached dashboard statistics
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub listen_host: String,

    /// HTTP server port
    #[arg(long, env = "PORT", default_value = "8084")]
    pub port: u16,

    /// MySQL host (submission database)
    #[arg(long, env = "MYSQL_HOST", default_value = "localhost")]
    pub mysql_host: String,

    /// MySQL port
    #[arg(long, env = "MYSQL_PORT", default_value = "3306")]
    pub mysql_port: u16,

    /// MySQL user
    #[arg(long, env = "MYSQL_USER", default_value = "root")]
    pub mysql_user: String,

    /// MySQL password
    #[arg(long, env = "MYSQL_PASSWORD", default_value = "", hide_env_values = true)]
    pub mysql_password: String,

    /// MySQL database name
    #[arg(long, env = "MYSQL_DB", default_value = "submission_db")]
    pub mysql_db: String,

    /// Maximum pooled MySQL connections
    #[arg(long, env = "MYSQL_MAX_CONNECTIONS", default_value = "5")]
    pub mysql_max_connections: u32,

    /// MongoDB connection URI (guidance database)
    #[arg(
        long,
        env = "MONGODB_URI",
        default_value = "mongodb://localhost:27017/guidance_db"
    )]
    pub mongodb_uri: String,

    /// MongoDB database name; defaults to the database in the URI
    #[arg(long, env = "MONGODB_DATABASE")]
    pub mongodb_database: Option<String>,

    /// Collection holding guidance messages
    #[arg(long, env = "GUIDANCE_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub guidance_collection: String,

    /// Redis host (snapshot cache)
    #[arg(long, env = "REDIS_HOST", default_value = "redis")]
    pub redis_host: String,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value = "6379")]
    pub redis_port: u16,

    /// Cache key for the global statistics snapshot
    #[arg(long, env = "STATS_CACHE_KEY", default_value = GLOBAL_STATS_KEY)]
    pub cache_key: String,

    /// Snapshot cache TTL in seconds
    #[arg(long, env = "STATS_CACHE_TTL_SECONDS", default_value = "60")]
    pub cache_ttl_seconds: u64,

    /// Bound on each cache read or write, in milliseconds
    #[arg(long, env = "CACHE_TIMEOUT_MS", default_value = "1000")]
    pub cache_timeout_ms: u64,

    /// Bound on each database query, in seconds
    #[arg(long, env = "QUERY_TIMEOUT_SECONDS", default_value = "5")]
    pub query_timeout_seconds: u64,

    /// Submission status counted as graduated
    #[arg(long, env = "GRADUATED_STATUS", default_value = "lulus")]
    pub graduated_status: String,

    /// Milestone status counted as approved
    #[arg(long, env = "APPROVED_MILESTONE_STATUS", default_value = "acc")]
    pub approved_milestone_status: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// Reject settings that would make the service misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_seconds == 0 {
            return Err(Error::Config("cache TTL must be at least 1 second".into()));
        }
        if self.query_timeout_seconds == 0 {
            return Err(Error::Config("query timeout must be at least 1 second".into()));
        }
        if self.cache_timeout_ms == 0 {
            return Err(Error::Config("cache timeout must be positive".into()));
        }
        if self.graduated_status.is_empty() || self.approved_milestone_status.is_empty() {
            return Err(Error::Config("status literals must not be empty".into()));
        }
        if self.mysql_max_connections == 0 {
            return Err(Error::Config("MySQL pool needs at least one connection".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.listen_host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            cache_key: self.cache_key.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            cache_timeout: Duration::from_millis(self.cache_timeout_ms),
            builder: BuilderConfig {
                graduated_status: self.graduated_status.clone(),
                approved_milestone_status: self.approved_milestone_status.clone(),
                query_timeout: self.query_timeout(),
            },
        }
    }

    pub fn mysql_config(&self) -> MySqlConfig {
        MySqlConfig {
            host: self.mysql_host.clone(),
            port: self.mysql_port,
            user: self.mysql_user.clone(),
            password: self.mysql_password.clone(),
            database: self.mysql_db.clone(),
            max_connections: self.mysql_max_connections,
            acquire_timeout: self.query_timeout(),
        }
    }

    pub fn mongo_config(&self) -> MongoConfig {
        MongoConfig {
            uri: self.mongodb_uri.clone(),
            database: self.mongodb_database.clone(),
            collection: self.guidance_collection.clone(),
        }
    }

    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            connect_timeout: Duration::from_millis(self.cache_timeout_ms),
        }
    }
}
