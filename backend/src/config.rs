//! Application configuration
//!
//! Server-level configuration (bind address, storage locations, interpreter
//! bridge). Values come from CLI flags or their environment variables, with
//! defaults computed here.
//!
//! For the assistant settings edited in the browser, see `state::settings`.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Default bridge command line
pub const DEFAULT_BRIDGE_COMMAND: &str = "interpreter-bridge";

/// Default per-chunk bridge timeout (in seconds)
pub const DEFAULT_BRIDGE_TIMEOUT_SECS: u64 = 120;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Interpreter bridge configuration
    pub bridge: BridgeConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding saved conversations
    pub history_dir: PathBuf,
    /// Optional settings file read at startup and rewritten on save
    pub settings_file: Option<PathBuf>,
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
}

/// Interpreter bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Command line of the bridge process (program followed by arguments)
    pub command: String,
    /// Maximum wait for each output line (in seconds)
    pub timeout_secs: u64,
}

impl BridgeConfig {
    /// Split the command line into program and arguments
    pub fn program_and_args(&self) -> (String, Vec<String>) {
        let mut parts = self.command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .unwrap_or_else(|| DEFAULT_BRIDGE_COMMAND.to_string());
        (program, parts.collect())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_BRIDGE_COMMAND.to_string(),
            timeout_secs: DEFAULT_BRIDGE_TIMEOUT_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
            },
            storage: StorageConfig {
                history_dir: Self::default_data_dir().join("conversations"),
                settings_file: None,
                upload_dir: env::temp_dir(),
            },
            bridge: BridgeConfig::default(),
        }
    }
}

impl Config {
    /// Base directory for conversation data
    ///
    /// `~/.interpreter-web-gui`, or a relative directory when `HOME` is unset.
    pub fn default_data_dir() -> PathBuf {
        if let Some(home) = env::var_os("HOME") {
            let mut path = PathBuf::from(home);
            path.push(".interpreter-web-gui");
            path
        } else {
            PathBuf::from(".interpreter-web-gui")
        }
    }

    /// Get the server address as a `host:port` string
    ///
    /// IPv6 literals are bracketed; host names are left for the resolver.
    pub fn server_addr(&self) -> String {
        let host = self.server.host.trim_start_matches('[').trim_end_matches(']');
        match host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.server.port).to_string(),
            Err(_) => format!("{}:{}", host, self.server.port),
        }
    }
}
