//! luc: LUC relay client CLI.
//!
//! Joins a LUC relay under a chosen identity to chat interactively, send a
//! one-off message or file, or listen for incoming payloads.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::Target;
use std::path::PathBuf;
use tracing::error;

/// luc: LUC relay client
#[derive(Parser, Debug)]
#[command(name = "luc", version, about = "LUC relay client: direct messages and file transfer")]
struct Cli {
    /// Relay host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Relay port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Identity to declare to the relay
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Config file path (default: ~/.luc/client.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat
    Chat {
        /// Directory incoming files are saved to
        #[arg(long, default_value = "downloads")]
        download_dir: PathBuf,
    },

    /// Send one text message
    Send {
        /// Recipient identity
        to: String,
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Send one file
    SendFile {
        /// Recipient identity
        to: String,
        /// File to send
        path: PathBuf,
    },

    /// Print incoming messages and save incoming files
    Listen {
        /// Directory incoming files are saved to
        #[arg(long, default_value = "downloads")]
        download_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("luc=debug,luc_cli=debug,luc_client=debug,luc_core=debug")
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("luc=warn,luc_cli=warn,luc_client=warn")
            .with_target(false)
            .init();
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("luc: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config file; CLI flags override it.
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = config::Config::load(&config_path)?;
    let target = Target {
        host: cli.host.clone().unwrap_or(cfg.default.host.clone()),
        port: cli.port.unwrap_or(cfg.default.port),
        user: config::resolve_user(cli.user.as_deref(), &cfg.default)?,
    };

    match cli.command {
        Command::Chat { download_dir } => commands::chat::run(&target, &download_dir).await,
        Command::Send { to, message } => {
            commands::send::run_text(&target, &to, &message.join(" ")).await
        }
        Command::SendFile { to, path } => commands::send::run_file(&target, &to, &path).await,
        Command::Listen { download_dir } => commands::listen::run(&target, &download_dir).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn send_joins_words() {
        let cli = Cli::try_parse_from(["luc", "--user", "alice", "send", "bob", "hello", "there"])
            .unwrap();
        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Command::Send { to, message } => {
                assert_eq!(to, "bob");
                assert_eq!(message.join(" "), "hello there");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["luc", "send-file", "bob", "a.txt", "-p", "9000"]).unwrap();
        assert_eq!(cli.port, Some(9000));
        assert!(matches!(cli.command, Command::SendFile { .. }));
    }

    #[test]
    fn downloads_default_to_downloads_dir() {
        let cli = Cli::try_parse_from(["luc", "listen"]).unwrap();
        match cli.command {
            Command::Listen { download_dir } => {
                assert_eq!(download_dir, PathBuf::from("downloads"))
            }
            other => panic!("unexpected command {other:?}"),
        }
        let cli = Cli::try_parse_from(["luc", "chat", "--download-dir", "/tmp/in"]).unwrap();
        match cli.command {
            Command::Chat { download_dir } => assert_eq!(download_dir, PathBuf::from("/tmp/in")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn send_requires_a_message() {
        assert!(Cli::try_parse_from(["luc", "send", "bob"]).is_err());
    }
}
