//! The tree applier: rebuilds a fresh instance from a source tree and a
//! patch map.
//!
//! The source is never mutated. Each node either takes its value from a
//! patch entry anchored at its address or is copied from the source, with
//! leaves copied through their serializer so canonicalizing encodings are
//! re-applied. A mismatching patch entry degrades exactly one field,
//! leaving it unset; its siblings are unaffected.

use tracing::warn;
use uuid::Uuid;

use graft_reflect::{ClassDescriptor, PatchLookup, ReflectContext};
use graft_types::{
    calculate_flags_at_address, Address, AddressElement, AddressScope, CapturedValue,
    ChildPatchMap, FlagsMap, Instance, PatchFlags, PatchMap,
};

use crate::node::{DataTree, NodeIndex};

pub(crate) struct ApplyContext<'a> {
    pub registry: &'a ReflectContext,
    pub patch: &'a PatchMap,
    pub children: &'a ChildPatchMap,
    pub source_flags: &'a FlagsMap,
    pub target_flags: &'a FlagsMap,
}

/// Apply the context's patch over a built source tree, producing the
/// patched instance. `None` for an empty tree.
pub(crate) fn apply_tree(ctx: &ApplyContext<'_>, tree: &DataTree<'_>) -> Option<Instance> {
    let root = tree.root()?;
    let mut address = Address::new();
    let declared = tree.node(root).value.class_id;
    apply_node(ctx, tree, root, &mut address, PatchFlags::NONE, declared)
}

fn apply_node(
    ctx: &ApplyContext<'_>,
    tree: &DataTree<'_>,
    index: NodeIndex,
    address: &mut Address,
    parent_flags: PatchFlags,
    declared_type: Uuid,
) -> Option<Instance> {
    let flags =
        calculate_flags_at_address(ctx.source_flags, ctx.target_flags, parent_flags, address);
    let node = tree.node(index);

    if !flags.prevents_override() {
        if let Some(entry) = ctx.patch.get(address) {
            // Removal markers and degraded entries both leave the node
            // unset; the source value is never substituted for a patch
            // entry that failed to load.
            return load_patch_value(
                ctx.registry,
                entry,
                declared_type,
                address,
                node.parent.is_none(),
            );
        }
    }

    // No entry anchored here (or overriding is prevented): rebuild from
    // the source, bracketed by the class's write/patch hooks.
    let lookup = PatchLookup {
        patch: ctx.patch,
        children: ctx.children,
    };
    if let Some(events) = node.class.events.as_ref() {
        events.on_write_begin(address);
        events.on_patch_begin(address, &lookup);
    }

    let result = if node.class.is_container() {
        apply_container(ctx, tree, index, address, flags)
    } else if node.class.is_leaf() {
        Some(apply_leaf(&node.class, node.value))
    } else {
        Some(apply_struct(ctx, tree, index, address, flags))
    };

    if let Some(events) = node.class.events.as_ref() {
        events.on_patch_end(address, &lookup);
        events.on_write_end(address);
    }
    result
}

/// Materialize one patch entry where a value of `declared_type` is
/// expected. `None` means "nothing to place here": a removal marker, or a
/// degraded entry that failed its type check or decode.
pub(crate) fn load_patch_value(
    registry: &ReflectContext,
    entry: &CapturedValue,
    declared_type: Uuid,
    address: &Address,
    is_root: bool,
) -> Option<Instance> {
    match entry {
        CapturedValue::Empty => None,
        CapturedValue::LegacyStream { version, bytes } => {
            let Some(class) = registry.find_class(&declared_type) else {
                warn!(address = %address, type_id = %declared_type,
                    "legacy entry targets an unregistered class, field left unset");
                return None;
            };
            let Some(serializer) = class.serializer.as_ref() else {
                warn!(address = %address, class = %class.name,
                    "legacy entry targets a non-leaf class, field left unset");
                return None;
            };
            match serializer.load(bytes, *version) {
                Some(leaf) => Some(Instance::leaf(declared_type, leaf)),
                None => {
                    warn!(address = %address, class = %class.name,
                        "legacy entry failed to decode, field left unset");
                    None
                }
            }
        }
        CapturedValue::Value(instance) => {
            if is_root {
                // Whole-object replacement: the captured root stands on its
                // own and only warns when the class changed under it.
                if instance.class_id != declared_type {
                    warn!(captured = %instance.class_id, source = %declared_type,
                        "root replacement changes the object's class");
                }
                return Some(registry.clone_instance(instance));
            }
            if registry.is_type_compatible(&instance.class_id, &declared_type) {
                Some(registry.clone_instance(instance))
            } else {
                let deprecated = registry
                    .find_class(&instance.class_id)
                    .is_some_and(|class| class.deprecated);
                if !deprecated {
                    warn!(address = %address, captured = %instance.class_id, declared = %declared_type,
                        "captured value is incompatible with the declared type, field left unset");
                }
                None
            }
        }
    }
}

/// Copy a leaf by round-tripping it through its serializer, so values
/// with canonicalizing encodings come out normalized. Falls back to a
/// plain clone when the round trip fails.
fn apply_leaf(class: &ClassDescriptor, value: &Instance) -> Instance {
    if let (Some(serializer), Some(leaf)) = (class.serializer.as_ref(), value.as_leaf()) {
        let mut bytes = Vec::new();
        if serializer.save(leaf, &mut bytes) {
            if let Some(loaded) = serializer.load(&bytes, class.version) {
                return Instance::leaf(value.class_id, loaded);
            }
        }
        warn!(class = %class.name, "leaf round trip failed, copying the value directly");
    }
    value.clone()
}

fn apply_struct(
    ctx: &ApplyContext<'_>,
    tree: &DataTree<'_>,
    index: NodeIndex,
    address: &mut Address,
    flags: PatchFlags,
) -> Instance {
    let node = tree.node(index);
    let class = &node.class;
    let mut out = Instance::with_fields(node.value.class_id, Vec::new());

    for declared in &class.fields {
        let element =
            AddressElement::class(&class.name, class.type_id, &declared.name, class.version);
        let mut scope = AddressScope::push(address, element);

        let source_child = node.children.iter().copied().find(|&child| {
            tree.node(child)
                .field
                .as_ref()
                .is_some_and(|f| f.name_hash == declared.name_hash)
        });
        let produced = match source_child {
            Some(child) => apply_node(ctx, tree, child, scope.address(), flags, declared.type_id),
            // No source value: the field exists only if the patch creates it.
            None => patch_only_field(ctx, scope.address(), flags, declared.type_id),
        };
        if let Some(value) = produced {
            out.set_field(declared.name_hash, value);
        }
    }

    // Entries anchored under this struct that name no declared field have
    // nowhere to land; diagnose and move on.
    if let Some(pending) = ctx.children.get(address) {
        for child_address in pending {
            let Some(last) = child_address.last() else {
                continue;
            };
            if class.field_by_hash(last.id()).is_none() {
                warn!(address = %child_address, class = %class.name,
                    "patch entry addresses an unknown field, skipping");
            }
        }
    }

    out
}

fn patch_only_field(
    ctx: &ApplyContext<'_>,
    address: &Address,
    parent_flags: PatchFlags,
    declared_type: Uuid,
) -> Option<Instance> {
    let entry = ctx.patch.get(address)?;
    let flags =
        calculate_flags_at_address(ctx.source_flags, ctx.target_flags, parent_flags, address);
    if flags.prevents_override() {
        return None;
    }
    load_patch_value(ctx.registry, entry, declared_type, address, false)
}

fn apply_container(
    ctx: &ApplyContext<'_>,
    tree: &DataTree<'_>,
    index: NodeIndex,
    address: &mut Address,
    flags: PatchFlags,
) -> Option<Instance> {
    let node = tree.node(index);
    let class = &node.class;
    let container = class.container.as_ref()?;
    let persistent_id = class.persistent_id;

    let mut out = Instance::container(node.value.class_id, Vec::new());
    let mut source_identities = Vec::with_capacity(node.children.len());

    // Source elements first, in source order. A removal marker or a
    // degraded entry contributes no slot.
    for (position, &child) in node.children.iter().enumerate() {
        let identity = match persistent_id {
            Some(id_of) => id_of(tree.node(child).value),
            None => position as u64,
        };
        source_identities.push(identity);
        let element = AddressElement::index(&class.name, class.type_id, identity, class.version);
        let mut scope = AddressScope::push(address, element);
        if let Some(value) =
            apply_node(ctx, tree, child, scope.address(), flags, container.element_type_id())
        {
            let _ = container.reserve_element(&mut out, value);
        }
    }

    // Then patch-born elements: identities anchored under this container
    // that no source element carries, appended in ascending identity order
    // so application is deterministic.
    if !flags.prevents_override() {
        if let Some(pending) = ctx.children.get(address) {
            let mut fresh: Vec<(u64, &Address, &CapturedValue)> = pending
                .iter()
                .filter_map(|child_address| {
                    let identity = child_address.last()?.id();
                    if source_identities.contains(&identity) {
                        return None;
                    }
                    let entry = ctx.patch.get(child_address)?;
                    if entry.is_empty() {
                        return None;
                    }
                    Some((identity, child_address, entry))
                })
                .collect();
            fresh.sort_by_key(|(identity, _, _)| *identity);

            for (_, child_address, entry) in fresh {
                let child_flags = calculate_flags_at_address(
                    ctx.source_flags,
                    ctx.target_flags,
                    flags,
                    child_address,
                );
                if child_flags.prevents_override() {
                    continue;
                }
                if let Some(value) = load_patch_value(
                    ctx.registry,
                    entry,
                    container.element_type_id(),
                    child_address,
                    false,
                ) {
                    let _ = container.reserve_element(&mut out, value);
                }
            }
        }
    }

    Some(out)
}
