//! Browser launching via the operating system's URL handler

use bridge_traits::ui::BrowserLauncher;
use tracing::{info, warn};

/// Opens URLs with the platform default browser (`xdg-open`, `open`, `start`)
#[derive(Debug, Default, Clone)]
pub struct SystemBrowserLauncher;

impl SystemBrowserLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl BrowserLauncher for SystemBrowserLauncher {
    fn open(&self, url: &str) {
        info!(url = url, "Opening browser");
        if let Err(e) = open::that_detached(url) {
            warn!(error = %e, url = url, "Failed to open browser");
        }
    }
}
