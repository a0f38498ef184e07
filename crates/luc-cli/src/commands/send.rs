//! `luc send` and `luc send-file`: one-off delivery.
//!
//! The relay never confirms delivery; a recipient that is offline simply
//! never sees the message.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::{announced_name, connect, Target};

/// Send one text message and disconnect.
pub async fn run_text(target: &Target, to: &str, message: &str) -> Result<()> {
    let mut client = connect(target).await?;
    client
        .send_text(to, message)
        .await
        .with_context(|| format!("failed to send message to '{to}'"))?;
    info!(to = %to, bytes = message.len(), "message sent");
    client.disconnect().await?;
    Ok(())
}

/// Send one file and disconnect.
pub async fn run_file(target: &Target, to: &str, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = announced_name(path)?;

    let mut client = connect(target).await?;
    client
        .send_file(to, &filename, &data)
        .await
        .with_context(|| format!("failed to send {filename} to '{to}'"))?;
    info!(to = %to, filename = %filename, bytes = data.len(), "file sent");
    client.disconnect().await?;
    Ok(())
}
