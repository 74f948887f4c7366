//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the MusicBrainz account core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that `core-auth` depends on. It
//! establishes the logging conventions, the configuration builder that wires
//! host bridges together, and the event broadcasting used to announce login
//! state changes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
