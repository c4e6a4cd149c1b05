//! The Graft patch engine.
//!
//! Diffs two live instances of a reflected class into a serializable
//! [`DataPatch`] and applies a patch back over a source instance,
//! producing a fresh result without mutating the input. Differences are
//! keyed by structural addresses, so patches survive reordering of keyed
//! container elements, class versioning, and field renames (via a
//! [`PatchUpgrader`]).
//!
//! Hard failures are reserved for patches that cannot be anchored at all;
//! a single bad entry degrades its own field and leaves the rest of the
//! result intact.
//!
//! # Key Types
//!
//! - [`DataPatch`] — the patch artifact and its `create` / `apply` entry
//!   points
//! - [`DataTree`] — the addressable mirror built over a live instance
//! - [`PatchUpgrader`] / [`NoopUpgrader`] — version-aware entry rewriting
//! - [`migrate_legacy_patch`] — conversion from the old numeric-address
//!   patch format
//! - [`PatchError`] — hard failures of create and apply

mod apply;
mod compare;
mod error;
pub mod node;
mod patch;
mod upgrade;

#[cfg(test)]
mod testutil;

pub use error::{PatchError, PatchResult};
pub use node::{DataNode, DataTree, NodeIndex};
pub use patch::DataPatch;
pub use upgrade::{migrate_legacy_patch, NoopUpgrader, PatchUpgrader};
