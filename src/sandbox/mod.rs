//! Sandboxed staging of artifact bytes.
//!
//! Scanner processes only ever see files inside one sandbox directory:
//! [`Sandbox::stage`] creates them and [`PathGuard::validate`] refuses
//! anything that resolves elsewhere.

mod guard;
mod staging;

pub use guard::PathGuard;
pub use staging::{staging_prefix, unstage, Sandbox, StagedFile};
