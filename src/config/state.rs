// Application state module
// Runtime values derived once from the configuration at startup

use std::io;
use std::path::PathBuf;

use super::types::Config;

/// Application state shared by every connection task
pub struct AppState {
    pub config: Config,
    /// Canonical document root; every served path must stay below it
    pub root: PathBuf,
}

impl AppState {
    /// Resolve the document root and build the shared state.
    ///
    /// Fails when the configured root does not exist or cannot be resolved.
    pub fn new(config: Config) -> io::Result<Self> {
        let root = std::fs::canonicalize(&config.server.root)?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Document root is not a directory: {}", root.display()),
            ));
        }
        Ok(Self { config, root })
    }

    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
