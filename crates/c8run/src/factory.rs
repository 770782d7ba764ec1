use c8run_core::PlatformLauncher;
use std::sync::Arc;
use tracing::info;

/// Platform-agnostic factory that selects the launcher implementation at compile time
pub struct PlatformLauncherFactory;

impl PlatformLauncherFactory {
    pub fn create_launcher() -> Arc<dyn PlatformLauncher> {
        #[cfg(unix)]
        {
            info!("Creating Unix launcher");
            Arc::new(c8run_unix::UnixLauncherFactory::create_launcher())
        }

        #[cfg(windows)]
        {
            info!("Creating Windows launcher");
            Arc::new(c8run_windows::WindowsLauncherFactory::create_launcher())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("Unsupported platform: only Unix and Windows are currently supported");
        }
    }

    pub fn platform_name() -> &'static str {
        #[cfg(unix)]
        {
            c8run_unix::UnixLauncherFactory::platform_name()
        }

        #[cfg(windows)]
        {
            c8run_windows::WindowsLauncherFactory::platform_name()
        }

        #[cfg(not(any(unix, windows)))]
        {
            "Unknown"
        }
    }
}
