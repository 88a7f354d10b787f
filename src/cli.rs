//! Command line interface

use clap::Parser;

/// Serve a directory over HTTP and persist JSON documents posted to it
#[derive(Debug, Parser, Default)]
#[command(name = "json-devserver", version)]
pub struct Cli {
    /// Port to listen on (default 8000)
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Directory to serve and store documents in
    #[arg(long)]
    pub root: Option<String>,

    /// Configuration file; `json-devserver.toml` is used when present
    #[arg(short, long)]
    pub config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_port() {
        let cli = Cli::parse_from(["json-devserver", "9001"]);
        assert_eq!(cli.port, Some(9001));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "json-devserver",
            "--host",
            "127.0.0.1",
            "--root",
            "public",
            "-c",
            "dev.toml",
        ]);
        assert_eq!(cli.port, None);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.root.as_deref(), Some("public"));
        assert_eq!(cli.config.as_deref(), Some("dev.toml"));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["json-devserver", "99999"]).is_err());
    }
}
