//! Local launcher for Elasticsearch, Connectors and Camunda.

pub mod cli;
pub mod factory;
pub mod health;
pub mod lifecycle;
pub mod package;

pub use cli::{Cli, Command};
pub use factory::PlatformLauncherFactory;
pub use health::{HealthGate, HealthProbe, HttpProbe};
pub use lifecycle::Launcher;
pub use package::Packager;

// Re-export core functionality
pub use c8run_core::*;

use tracing::info;

/// Run the selected subcommand against the current working directory
pub async fn run(cli: Cli) -> Result<(), LauncherError> {
    let base_dir = std::env::current_dir()
        .map_err(|e| anyhow::Error::new(e).context("Failed to resolve the working directory"))?;
    let config = LauncherConfig::from_env(base_dir);
    let platform = PlatformLauncherFactory::create_launcher();
    info!(platform = platform.platform_name(), "Using {} launcher", PlatformLauncherFactory::platform_name());

    match cli.command {
        Command::Start => {
            let launcher = Launcher::new(platform, HttpProbe::new()?, config, cli.settings());
            launcher.start().await?;
            if launcher.settings().detached {
                return Ok(());
            }

            info!("Press Ctrl+C to stop all services");
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| anyhow::Error::new(e).context("Failed to listen for Ctrl+C"))?;
            launcher.stop().await
        }
        Command::Stop => {
            Launcher::new(platform, HttpProbe::new()?, config, cli.settings())
                .stop()
                .await
        }
        Command::Package => {
            let archive = Packager::new(platform, config)?.package().await?;
            info!("Bundle written to {}", archive.display());
            Ok(())
        }
    }
}
