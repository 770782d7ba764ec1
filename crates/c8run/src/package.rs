//! Assembles the distributable bundle: fetch and unpack the service
//! distributions, then archive the base directory contents.

use c8run_core::{Artifact, LauncherConfig, LauncherError, PlatformLauncher, ToolCommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub struct Packager {
    platform: Arc<dyn PlatformLauncher>,
    config: LauncherConfig,
    client: reqwest::Client,
}

impl Packager {
    pub fn new(platform: Arc<dyn PlatformLauncher>, config: LauncherConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            platform,
            config,
            client,
        })
    }

    /// Build the bundle and return the archive path
    pub async fn package(&self) -> Result<PathBuf, LauncherError> {
        for artifact in self.platform.package_artifacts(&self.config) {
            self.fetch(&artifact).await?;
        }

        let bundle = self.platform.bundle(&self.config);
        info!(archive = %bundle.archive.display(), "Creating bundle");
        run_tool(&bundle.command).await?;
        Ok(bundle.archive)
    }

    async fn fetch(&self, artifact: &Artifact) -> Result<(), LauncherError> {
        let base = &self.config.base_dir;
        let present = base.join(artifact.unpacked_dir.as_deref().unwrap_or(&artifact.file_name));
        if tokio::fs::try_exists(&present).await.unwrap_or(false) {
            info!(path = %present.display(), "Already present, skipping download");
            return Ok(());
        }

        let archive = base.join(&artifact.file_name);
        info!(url = %artifact.url, "Downloading {}", artifact.file_name);
        let bytes = download(&self.client, &artifact.url, &archive).await?;
        debug!(bytes, path = %archive.display(), "Download complete");

        if artifact.unpacked_dir.is_some() {
            run_tool(&self.platform.extract_command(&archive, base)).await?;
        }
        Ok(())
    }
}

/// Stream `url` into `dest`; a non-2xx answer is an error and leaves no file behind
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, LauncherError> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LauncherError::Package(format!("GET {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::Package(format!("GET {url} returned {status}")));
    }

    let file_error = |source: std::io::Error| LauncherError::FileOpen {
        path: dest.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(dest).await.map_err(file_error)?;

    let mut written = 0u64;
    let result: Result<(), LauncherError> = async {
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LauncherError::Package(format!("GET {url} interrupted: {e}")))?
        {
            file.write_all(&chunk).await.map_err(file_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(file_error)
    }
    .await;

    if let Err(e) = result {
        drop(file);
        let _ = tokio::fs::remove_file(dest).await;
        return Err(e);
    }
    Ok(written)
}

/// Run an archive tool to completion; a non-zero exit is a `Package` error
pub async fn run_tool(command: &ToolCommand) -> Result<(), LauncherError> {
    debug!(program = %command.program, args = ?command.args, "Running tool");
    let status = command
        .to_command()
        .status()
        .await
        .map_err(|e| LauncherError::Package(format!("failed to run {}: {e}", command.program)))?;

    if !status.success() {
        return Err(LauncherError::Package(format!(
            "{} exited with {status}",
            command.program
        )));
    }
    Ok(())
}
