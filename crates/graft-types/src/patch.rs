//! Patch map payloads and the derived child-address index.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::value::Instance;

/// A type-erased value captured into a patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CapturedValue {
    /// Removal marker: the node at this address must not be materialized.
    Empty,
    /// A typed snapshot of the target's value at this address.
    Value(Instance),
    /// Raw serialized bytes from a pre-migration patch, carried until the
    /// destination type is known at apply time. The original bytes are
    /// preserved so a failed typed load can be retried or inspected.
    LegacyStream { version: u32, bytes: Vec<u8> },
}

impl CapturedValue {
    /// Returns `true` for the removal marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, CapturedValue::Empty)
    }

    /// The captured runtime class, when one is known.
    pub fn class_id(&self) -> Option<Uuid> {
        match self {
            CapturedValue::Value(instance) => Some(instance.class_id),
            _ => None,
        }
    }
}

/// Address → captured value. Ordered so patch serialization and the
/// per-entry upgrade pass are deterministic.
pub type PatchMap = BTreeMap<Address, CapturedValue>;

/// Parent address → patch addresses exactly one element longer. Used
/// during application to discover patch-born elements with no source
/// counterpart.
pub type ChildPatchMap = HashMap<Address, Vec<Address>>;

/// Group every patch key under its parent address. Root-level entries
/// (empty addresses) have no parent and are skipped.
pub fn build_child_patch_map(patch: &PatchMap) -> ChildPatchMap {
    let mut children = ChildPatchMap::new();
    for address in patch.keys() {
        if let Some(parent) = address.parent() {
            children.entry(parent).or_default().push(address.clone());
        }
    }
    children
}
