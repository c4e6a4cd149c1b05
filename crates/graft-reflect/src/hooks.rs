//! Lifecycle event hooks a class may register to observe the engine.

use graft_types::{Address, ChildPatchMap, Instance, PatchMap};

/// Read-only view of the pending patch state, handed to patch hooks so
/// implementations can introspect what is about to be applied below the
/// current address.
pub struct PatchLookup<'a> {
    pub patch: &'a PatchMap,
    pub children: &'a ChildPatchMap,
}

/// Optional per-class lifecycle callbacks.
///
/// Read hooks fire while an instance is walked into a tree; write and
/// patch hooks bracket the reconstruction of each node during apply. All
/// methods default to no-ops so implementations override only what they
/// observe.
pub trait EventHandler: Send + Sync {
    fn on_read_begin(&self, _value: &Instance) {}

    fn on_read_end(&self, _value: &Instance) {}

    fn on_write_begin(&self, _address: &Address) {}

    fn on_write_end(&self, _address: &Address) {}

    fn on_patch_begin(&self, _address: &Address, _pending: &PatchLookup<'_>) {}

    fn on_patch_end(&self, _address: &Address, _pending: &PatchLookup<'_>) {}
}
