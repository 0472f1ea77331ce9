use clap::{ArgAction, Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_INFO_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// YouTube search, metadata and download proxy
#[derive(Parser, Debug)]
#[command(name = "yt_fetch_server")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Seconds a cached search or video entry stays valid
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Maximum entries per cache namespace, 0 for unbounded
    #[arg(long, env = "CACHE_CAPACITY", default_value_t = 0)]
    pub cache_capacity: usize,

    /// Upper bound on a single metadata extraction
    #[arg(long, env = "INFO_TIMEOUT_SECS", default_value_t = 30)]
    pub info_timeout_secs: u64,

    /// Maximum number of search results returned
    #[arg(long, env = "SEARCH_LIMIT", default_value_t = 20)]
    pub search_limit: usize,

    /// Serve demo metadata when extraction fails or times out
    #[arg(long, env = "DEMO_FALLBACK", default_value_t = true, action = ArgAction::Set)]
    pub demo_fallback: bool,

    /// Development attaches upstream error text to error responses
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", env = "YT_DLP_PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Runtime settings shared by the services and the HTTP layer.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub info_timeout: Duration,
    pub search_limit: usize,
    pub demo_fallback: bool,
    pub environment: Environment,
    pub yt_dlp: PathBuf,
}

impl Config {
    pub fn expose_error_details(&self) -> bool {
        self.environment != Environment::Production
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: 0,
            info_timeout: DEFAULT_INFO_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            demo_fallback: true,
            environment: Environment::Production,
            yt_dlp: PathBuf::from("yt-dlp"),
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            listen: args.listen,
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
            cache_capacity: args.cache_capacity,
            info_timeout: Duration::from_secs(args.info_timeout_secs),
            search_limit: args.search_limit,
            demo_fallback: args.demo_fallback,
            environment: args.environment,
            yt_dlp: args.yt_dlp.clone(),
        }
    }
}
