//! Action catalog for Deskpilot.
//!
//! Defines the closed set of action kinds, the static metadata registry that
//! classifies them, and the adapters that carry actions out on the host.

pub mod adapter;
pub mod error;
pub mod registry;
pub mod types;

pub use adapter::{CommandAdapter, DryRunAdapter, Platform, SystemAdapter};
pub use error::ActionError;
pub use types::{
    Action, ActionKind, ActionMetadata, ActionResult, ActionStatus, PermissionTier,
};
