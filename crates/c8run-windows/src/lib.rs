//! Windows-specific launcher implementation

mod windows_launcher;

pub use windows_launcher::WindowsLauncher;

pub struct WindowsLauncherFactory;

impl WindowsLauncherFactory {
    pub fn create_launcher() -> WindowsLauncher {
        WindowsLauncher::new()
    }

    pub fn platform_name() -> &'static str {
        "Windows"
    }
}
