//! CLI subcommand implementations and the helpers they share.

pub mod chat;
pub mod listen;
pub mod send;

use anyhow::{Context, Result};
use luc_client::{ConnectConfig, Incoming, RelayClient};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where to connect and who to be.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: String,
}

/// Connect to the relay, reporting admission waits on stderr.
pub async fn connect(target: &Target) -> Result<RelayClient> {
    let addr = format!("{}:{}", target.host, target.port);
    info!(addr = %addr, user = %target.user, "connecting");

    RelayClient::connect(addr.as_str(), ConnectConfig::new(&target.user), |secs| {
        eprintln!("waiting for a free slot ({secs}s)");
    })
    .await
    .with_context(|| format!("failed to join relay at {addr} as '{}'", target.user))
}

/// Print an incoming payload, saving files into `download_dir`.
pub fn handle_incoming(incoming: Incoming, download_dir: &Path) -> Result<()> {
    match incoming {
        Incoming::Text { from, body } => {
            println!("{from}: {body}");
        }
        Incoming::File {
            from,
            filename,
            data,
        } => {
            let path = save_file(download_dir, &filename, &data)?;
            println!("{from} sent {} ({} bytes)", path.display(), data.len());
        }
    }
    Ok(())
}

/// Write `data` under `dir`, keeping only the last path component of the
/// sender-supplied `filename`.
pub fn save_file(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf> {
    let name = sanitize_filename(filename);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match last {
        "" | "." | ".." => "received.bin".to_string(),
        name => name.to_string(),
    }
}

/// File name to announce for a local path.
pub fn announced_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\x\\a.txt"), "a.txt");
        assert_eq!(sanitize_filename(".."), "received.bin");
        assert_eq!(sanitize_filename("dir/"), "received.bin");
    }

    #[test]
    fn save_file_writes_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_file(dir.path(), "../escape.txt", b"data").unwrap();
        assert_eq!(path, dir.path().join("escape.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn announced_name_is_file_name() {
        assert_eq!(
            announced_name(Path::new("/tmp/notes.txt")).unwrap(),
            "notes.txt"
        );
        assert!(announced_name(Path::new("/")).is_err());
    }
}
