//! Workspace facade crate.
//!
//! Re-exports the account core and its runtime so host applications can depend
//! on `mbaccount-workspace` and enable the documented features without wiring
//! each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_auth as auth;

#[cfg(feature = "desktop-shims")]
pub use core_runtime as runtime;
