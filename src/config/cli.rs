use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the tripwise binary.
#[derive(Debug, Parser)]
#[command(name = "tripwise", version, about = "Tripwise travel-planning server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TRIPWISE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    #[command(name = "migrate")]
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the catalog API base URL.
    #[arg(long = "catalog-base-url", value_name = "URL")]
    pub catalog_base_url: Option<String>,

    /// Override the per-request catalog timeout.
    #[arg(long = "catalog-timeout-ms", value_name = "MILLIS")]
    pub catalog_timeout_ms: Option<u64>,

    /// Toggle the catalog lookup cache.
    #[arg(
        long = "catalog-cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub catalog_cache_enabled: Option<bool>,

    /// Override the catalog cache entry lifetime.
    #[arg(long = "catalog-cache-ttl-seconds", value_name = "SECONDS")]
    pub catalog_cache_ttl_seconds: Option<u64>,

    /// Override the catalog cache capacity.
    #[arg(long = "catalog-cache-max-entries", value_name = "COUNT")]
    pub catalog_cache_max_entries: Option<usize>,

    /// Override the minimum number of places a new project starts with.
    #[arg(long = "projects-min-places", value_name = "COUNT")]
    pub projects_min_places: Option<u32>,

    /// Override the maximum number of places per project.
    #[arg(long = "projects-max-places", value_name = "COUNT")]
    pub projects_max_places: Option<u32>,
}
