//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the account core and the host
//! application. Each trait represents a capability that the core requires but
//! that the host provides: the settings store the credential lives in, the
//! HTTP stack that talks to the identity service, and the two UI collaborators
//! the login flow needs (a browser launcher and a text prompt).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Typed key-value settings with transactions
//!
//! ### User Interface
//! - [`BrowserLauncher`](ui::BrowserLauncher) - Open a URL in the user's browser
//! - [`TextPrompt`](ui::TextPrompt) - Modal, cancelable text input
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Never include secret values in error messages
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so the core can share them
//! across async tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;
pub mod ui;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{SettingsStore, SettingsTransaction};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use ui::{BrowserLauncher, PromptResponse, TextPrompt};
