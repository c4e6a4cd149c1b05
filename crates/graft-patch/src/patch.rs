//! The patch artifact and its `create` / `apply` entry points.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use graft_reflect::ReflectContext;
use graft_types::{build_child_patch_map, CapturedValue, FlagsMap, Instance, PatchMap};

use crate::apply::{apply_tree, load_patch_value, ApplyContext};
use crate::compare::{compare_trees, CompareContext};
use crate::error::{PatchError, PatchResult};
use crate::node::DataTree;
use crate::upgrade::PatchUpgrader;

/// A serializable structural diff between two instances of a reflected
/// class.
///
/// A patch records the target's class and version alongside its entries,
/// so upgraders can tell which era a stored patch was captured in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPatch {
    pub target_class_id: Uuid,
    pub target_class_version: u32,
    pub patch: PatchMap,
}

impl DataPatch {
    /// An empty patch applies as "clone the source".
    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.patch.len()
    }

    /// Diff `target` against `source`.
    ///
    /// Both roots must be registered classes. Instances of different root
    /// classes produce a whole-object-replacement patch: a single entry at
    /// the root address holding the entire target.
    pub fn create(
        registry: &ReflectContext,
        source: &Instance,
        target: &Instance,
        source_flags: &FlagsMap,
        target_flags: &FlagsMap,
    ) -> PatchResult<DataPatch> {
        let target_class = registry
            .find_class(&target.class_id)
            .ok_or(PatchError::UnregisteredClass(target.class_id))?;
        if registry.find_class(&source.class_id).is_none() {
            return Err(PatchError::UnregisteredClass(source.class_id));
        }

        let source_tree = DataTree::build(registry, Some(source));
        let target_tree = DataTree::build(registry, Some(target));
        let ctx = CompareContext {
            registry,
            source_flags,
            target_flags,
        };
        let mut patch = PatchMap::new();
        compare_trees(&ctx, &source_tree, &target_tree, &mut patch);

        Ok(DataPatch {
            target_class_id: target_class.type_id,
            target_class_version: target_class.version,
            patch,
        })
    }

    /// Apply this patch over `source`, producing a fresh instance. The
    /// source is never mutated.
    ///
    /// `Ok(None)` means the patch deletes the object outright (a removal
    /// marker at the root). Entries that cannot be anchored to any tree
    /// position are a hard error and nothing is produced; entries that
    /// anchor but mismatch their destination type degrade one field each,
    /// leaving that field unset in the result.
    pub fn apply(
        &self,
        registry: &ReflectContext,
        source: &Instance,
        source_flags: &FlagsMap,
        target_flags: &FlagsMap,
        upgrader: Option<&dyn PatchUpgrader>,
    ) -> PatchResult<Option<Instance>> {
        if self.patch.is_empty() {
            return Ok(Some(registry.clone_instance(source)));
        }

        // The upgrade pass sees every entry, in entry order, before any
        // address is validated or anchored.
        let patch = match upgrader {
            Some(upgrader) => {
                let mut upgraded = PatchMap::new();
                for (address, value) in &self.patch {
                    let mut address = address.clone();
                    let mut value = value.clone();
                    upgrader.upgrade_entry(
                        self.target_class_id,
                        self.target_class_version,
                        &mut address,
                        &mut value,
                    );
                    upgraded.insert(address, value);
                }
                upgraded
            }
            None => self.patch.clone(),
        };

        // A lone entry at the root address replaces (or deletes) the whole
        // object without consulting the source's structure.
        if patch.len() == 1 {
            if let Some((address, entry)) = patch.iter().next() {
                if address.is_empty() && address.is_valid() {
                    return Ok(load_patch_value(registry, entry, source.class_id, address, true));
                }
            }
        }

        for address in patch.keys() {
            if address.is_empty() || !address.is_valid() {
                return Err(PatchError::UnanchoredEntry(address.to_text()));
            }
        }

        if registry.find_class(&source.class_id).is_none() {
            return Err(PatchError::UnregisteredClass(source.class_id));
        }

        let children = build_child_patch_map(&patch);
        let tree = DataTree::build(registry, Some(source));
        let ctx = ApplyContext {
            registry,
            patch: &patch,
            children: &children,
            source_flags,
            target_flags,
        };
        Ok(apply_tree(&ctx, &tree))
    }

    /// A root-deletion patch: applying it yields `Ok(None)`.
    pub fn deletion(target_class_id: Uuid, target_class_version: u32) -> DataPatch {
        let mut patch = PatchMap::new();
        patch.insert(graft_types::Address::new(), CapturedValue::Empty);
        DataPatch {
            target_class_id,
            target_class_version,
            patch,
        }
    }
}
