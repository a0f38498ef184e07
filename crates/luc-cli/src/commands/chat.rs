//! `luc chat`: interactive session.
//!
//! Reads commands from stdin while a background task prints whatever the
//! relay delivers:
//!
//! - `@<user> <message>` sends a text message
//! - `/file <user> <path>` sends a file
//! - `/quit` disconnects

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::{announced_name, connect, handle_incoming, Target};

const HELP: &str = "commands: @<user> <message> | /file <user> <path> | /quit";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Text { to: String, body: String },
    File { to: String, path: PathBuf },
    Quit,
    Help,
    Empty,
    Invalid(&'static str),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if let Some(rest) = line.strip_prefix('@') {
        return match rest.split_once(char::is_whitespace) {
            Some((to, body)) if !to.is_empty() && !body.trim().is_empty() => Input::Text {
                to: to.to_string(),
                body: body.trim_start().to_string(),
            },
            _ => Input::Invalid("usage: @<user> <message>"),
        };
    }
    if let Some(rest) = line
        .strip_prefix("/file")
        .filter(|r| r.is_empty() || r.starts_with(char::is_whitespace))
    {
        let rest = rest.trim_start();
        return match rest.split_once(char::is_whitespace) {
            Some((to, path)) if !to.is_empty() && !path.trim().is_empty() => Input::File {
                to: to.to_string(),
                path: PathBuf::from(path.trim()),
            },
            _ => Input::Invalid("usage: /file <user> <path>"),
        };
    }
    match line {
        "/quit" | "/exit" => Input::Quit,
        "/help" => Input::Help,
        _ => Input::Invalid(HELP),
    }
}

/// Run the interactive loop until `/quit`, stdin EOF, or the relay hangs up.
pub async fn run(target: &Target, download_dir: &Path) -> Result<()> {
    let client = connect(target).await?;
    let (mut sender, mut receiver) = client.into_split();
    eprintln!("connected as '{}'. {HELP}", target.user);

    let download_dir = download_dir.to_path_buf();
    let mut inbound = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(Some(incoming)) => {
                    if let Err(e) = handle_incoming(incoming, &download_dir) {
                        eprintln!("luc: {e:#}");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "receive failed");
                    break;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = stdin.next_line() => line.context("failed to read stdin")?,
            _ = &mut inbound => {
                eprintln!("relay closed the connection");
                return Ok(());
            }
        };
        let Some(line) = line else { break };

        match parse_input(&line) {
            Input::Text { to, body } => {
                if let Err(e) = sender.send_text(&to, &body).await {
                    eprintln!("luc: {e}");
                }
            }
            Input::File { to, path } => {
                let sent = async {
                    let data = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let name = announced_name(&path)?;
                    sender.send_file(&to, &name, &data).await?;
                    anyhow::Ok(data.len())
                }
                .await;
                match sent {
                    Ok(bytes) => debug!(to = %to, bytes, "file sent"),
                    Err(e) => eprintln!("luc: {e:#}"),
                }
            }
            Input::Quit => break,
            Input::Help => eprintln!("{HELP}"),
            Input::Empty => {}
            Input::Invalid(usage) => eprintln!("{usage}"),
        }
    }

    sender.close().await?;
    inbound.abort();
    Ok(())
}
