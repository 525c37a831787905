//! Command-line interface for shiritori_server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shiritori - word-chaining game against an LLM opponent
#[derive(Parser, Debug)]
#[command(name = "shiritori_server")]
#[command(about = "Shiritori game server with an LLM opponent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults are used if it is missing)
    #[arg(short, long, global = true, default_value = "shiritori.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Play in the terminal
    Play,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["shiritori_server", "serve"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("shiritori.toml"));
        match cli.command {
            Command::Serve { port, host } => {
                assert_eq!(port, 8000);
                assert_eq!(host, "127.0.0.1");
            }
            Command::Play => panic!("expected serve"),
        }
    }

    #[test]
    fn test_play_with_config() {
        let cli =
            Cli::try_parse_from(["shiritori_server", "play", "--config", "game.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Play));
        assert_eq!(cli.config, PathBuf::from("game.toml"));
    }
}
