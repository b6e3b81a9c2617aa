//! Command-line interface
//!
//! Flags set the server configuration and seed the initial assistant
//! settings. Each server flag also reads an environment variable.

use crate::config::{Config, DEFAULT_BRIDGE_COMMAND, DEFAULT_BRIDGE_TIMEOUT_SECS};
use crate::state::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Browser control panel and chat relay for a code-executing assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "interpreter-web-gui", version, about)]
pub struct Cli {
    /// Host address to bind to
    #[arg(long, env = "INTERPRETER_GUI_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "INTERPRETER_GUI_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Model the assistant should use
    #[arg(long)]
    pub model: Option<String>,

    /// API key passed to the assistant
    #[arg(long, env = "INTERPRETER_GUI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Run generated code without asking for confirmation
    #[arg(long)]
    pub auto_run: bool,

    /// Verbose assistant output and debug-level logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Assistant debug mode and trace-level logs
    #[arg(long)]
    pub debug: bool,

    /// Directory for saved conversations
    #[arg(long, env = "INTERPRETER_GUI_HISTORY_DIR")]
    pub history_dir: Option<PathBuf>,

    /// Settings file loaded at startup and rewritten on save
    #[arg(long, env = "INTERPRETER_GUI_SETTINGS_FILE")]
    pub settings_file: Option<PathBuf>,

    /// Directory uploaded files are written to
    #[arg(long, env = "INTERPRETER_GUI_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Command line of the interpreter bridge process
    #[arg(long, env = "INTERPRETER_GUI_BRIDGE_COMMAND", default_value = DEFAULT_BRIDGE_COMMAND)]
    pub bridge_command: String,

    /// Seconds to wait for each line of bridge output
    #[arg(long, env = "INTERPRETER_GUI_BRIDGE_TIMEOUT", default_value_t = DEFAULT_BRIDGE_TIMEOUT_SECS)]
    pub bridge_timeout: u64,
}

impl Cli {
    /// Server configuration described by these flags
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.server.host = self.host.clone();
        config.server.port = self.port;
        if let Some(dir) = &self.history_dir {
            config.storage.history_dir = dir.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.storage.upload_dir = dir.clone();
        }
        config.storage.settings_file = self.settings_file.clone();
        config.bridge.command = self.bridge_command.clone();
        config.bridge.timeout_secs = self.bridge_timeout;
        config
    }

    /// Apply the settings flags on top of `settings`
    ///
    /// Only flags that were given change anything; boolean flags can only
    /// switch a setting on.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        if self.auto_run {
            settings.auto_run = true;
        }
        if self.verbose {
            settings.verbose = true;
        }
        if self.debug {
            settings.debug = true;
        }
    }

    /// Default log filter for this invocation (`RUST_LOG` takes precedence)
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "info,interpreter_web_gui=trace"
        } else if self.verbose {
            "info,interpreter_web_gui=debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        let cli = Cli::parse_from(["interpreter-web-gui"]);
        let config = cli.config();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.bridge.command, DEFAULT_BRIDGE_COMMAND);
        assert!(config.storage.settings_file.is_none());
        assert_eq!(cli.log_filter(), "info");

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn test_settings_flags_seed_settings() {
        let cli = Cli::parse_from([
            "interpreter-web-gui",
            "--model",
            "claude-3-5-sonnet",
            "--api-key",
            "sk-test",
            "--auto-run",
            "--verbose",
        ]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.model, "claude-3-5-sonnet");
        assert_eq!(settings.api_key, "sk-test");
        assert!(settings.auto_run);
        assert!(settings.verbose);
        assert!(!settings.debug);
        assert_eq!(cli.log_filter(), "info,interpreter_web_gui=debug");
    }

    #[test]
    #[serial]
    fn test_server_flags() {
        let cli = Cli::parse_from([
            "interpreter-web-gui",
            "--host",
            "127.0.0.1",
            "-p",
            "9100",
            "--history-dir",
            "/tmp/convos",
            "--bridge-command",
            "python3 -m bridge",
            "--bridge-timeout",
            "30",
            "--debug",
        ]);
        let config = cli.config();
        assert_eq!(config.server_addr(), "127.0.0.1:9100");
        assert_eq!(config.storage.history_dir, PathBuf::from("/tmp/convos"));
        assert_eq!(config.bridge.timeout_secs, 30);
        assert_eq!(config.bridge.program_and_args().0, "python3");
        assert_eq!(cli.log_filter(), "info,interpreter_web_gui=trace");
    }

    #[test]
    #[serial]
    fn test_env_vars() {
        std::env::set_var("INTERPRETER_GUI_PORT", "8123");
        std::env::set_var("INTERPRETER_GUI_UPLOAD_DIR", "/tmp/gui-uploads");
        let cli = Cli::parse_from(["interpreter-web-gui"]);
        std::env::remove_var("INTERPRETER_GUI_PORT");
        std::env::remove_var("INTERPRETER_GUI_UPLOAD_DIR");

        let config = cli.config();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.storage.upload_dir, PathBuf::from("/tmp/gui-uploads"));
    }
}
