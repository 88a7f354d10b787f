// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::cli::Cli;

// Re-export public types
pub use state::AppState;
pub use types::{Config, PerformanceConfig};

/// Config file consulted when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "json-devserver.toml";

impl Config {
    /// Load configuration: defaults, then the config file, then `JSONDEV_*`
    /// environment variables, then command line flags.
    ///
    /// The default config file is optional; one named with `--config` must exist.
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let (config_path, required) = match cli.config.as_deref() {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_FILE, false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(required))
            .add_source(
                config::Environment::with_prefix("JSONDEV")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.host", cli.host.clone())?
            .set_override_option("server.root", cli.root.clone())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
