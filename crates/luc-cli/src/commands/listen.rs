//! `luc listen`: print incoming messages and save incoming files.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use super::{connect, handle_incoming, Target};

/// Receive until the relay closes the connection.
pub async fn run(target: &Target, download_dir: &Path) -> Result<()> {
    let mut client = connect(target).await?;
    eprintln!("listening as '{}'", target.user);

    while let Some(incoming) = client.recv().await? {
        if let Err(e) = handle_incoming(incoming, download_dir) {
            warn!(error = %e, "failed to handle incoming payload");
            eprintln!("luc: {e:#}");
        }
    }

    info!("relay closed the connection");
    Ok(())
}
