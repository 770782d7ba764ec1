//! Unix-specific launcher implementation

mod unix_launcher;

pub use unix_launcher::UnixLauncher;

pub struct UnixLauncherFactory;

impl UnixLauncherFactory {
    pub fn create_launcher() -> UnixLauncher {
        UnixLauncher::new()
    }

    pub fn platform_name() -> &'static str {
        "Unix"
    }
}
