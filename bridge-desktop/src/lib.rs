//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! the account core needs, using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using SQLite-backed key-value store
//! - `BrowserLauncher` using the `open` crate
//! - `TextPrompt` reading a line from the terminal
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, SystemBrowserLauncher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await.unwrap();
//!     let browser = SystemBrowserLauncher;
//!
//!     // Use in core configuration
//! }
//! ```

mod browser;
mod http;
mod prompt;
mod settings;

pub use browser::SystemBrowserLauncher;
pub use http::{ReqwestHttpClient, DEFAULT_USER_AGENT};
pub use prompt::StdinPrompt;
pub use settings::SqliteSettingsStore;
