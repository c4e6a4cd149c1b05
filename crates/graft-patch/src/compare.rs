//! The tree comparator: walks two built trees in lockstep and records
//! every difference into a patch map.
//!
//! Entries are keyed by the address of the differing node. A captured
//! value is a deep snapshot of the target side; a removal marker means
//! the source node has no target counterpart.

use graft_reflect::ReflectContext;
use graft_types::{
    calculate_flags_at_address, Address, AddressElement, AddressScope, CapturedValue, FlagsMap,
    Instance, PatchFlags, PatchMap,
};

use crate::node::{DataNode, DataTree, NodeIndex};

pub(crate) struct CompareContext<'a> {
    pub registry: &'a ReflectContext,
    pub source_flags: &'a FlagsMap,
    pub target_flags: &'a FlagsMap,
}

/// Diff `target` against `source`, appending entries to `patch`. Empty
/// trees compare as "nothing to record".
pub(crate) fn compare_trees(
    ctx: &CompareContext<'_>,
    source: &DataTree<'_>,
    target: &DataTree<'_>,
    patch: &mut PatchMap,
) {
    let (Some(source_root), Some(target_root)) = (source.root(), target.root()) else {
        return;
    };
    let mut address = Address::new();
    compare_nodes(
        ctx,
        source,
        source_root,
        target,
        target_root,
        &mut address,
        PatchFlags::NONE,
        patch,
    );
}

#[allow(clippy::too_many_arguments)]
fn compare_nodes(
    ctx: &CompareContext<'_>,
    source: &DataTree<'_>,
    source_index: NodeIndex,
    target: &DataTree<'_>,
    target_index: NodeIndex,
    address: &mut Address,
    parent_flags: PatchFlags,
    patch: &mut PatchMap,
) {
    let flags =
        calculate_flags_at_address(ctx.source_flags, ctx.target_flags, parent_flags, address);
    if flags.prevents_override() {
        return;
    }

    let source_node = source.node(source_index);
    let target_node = target.node(target_index);

    // Different runtime types cannot be compared member-wise; the whole
    // target value replaces the source node.
    if source_node.value.class_id != target_node.value.class_id {
        capture(ctx, patch, address, target_node.value);
        return;
    }

    let class = &target_node.class;
    if class.is_container() {
        compare_containers(ctx, source, source_node, target, target_node, address, flags, patch);
    } else if class.is_leaf() {
        let equal = leaf_equal(source_node, target_node);
        if flags.forces_override() || !equal {
            capture(ctx, patch, address, target_node.value);
        }
    } else {
        compare_structs(ctx, source, source_node, target, target_node, address, flags, patch);
    }
}

fn leaf_equal(source_node: &DataNode<'_>, target_node: &DataNode<'_>) -> bool {
    match (
        target_node.class.serializer.as_ref(),
        source_node.value.as_leaf(),
        target_node.value.as_leaf(),
    ) {
        (Some(serializer), Some(a), Some(b)) => serializer.compare(a, b),
        _ => source_node.value == target_node.value,
    }
}

fn capture(ctx: &CompareContext<'_>, patch: &mut PatchMap, address: &Address, value: &Instance) {
    patch.insert(
        address.clone(),
        CapturedValue::Value(ctx.registry.clone_instance(value)),
    );
}

/// Record an entry for a node present on only one side, unless overriding
/// is prevented at its address.
fn record_one_sided(
    ctx: &CompareContext<'_>,
    patch: &mut PatchMap,
    address: &Address,
    parent_flags: PatchFlags,
    target_value: Option<&Instance>,
) {
    let flags =
        calculate_flags_at_address(ctx.source_flags, ctx.target_flags, parent_flags, address);
    if flags.prevents_override() {
        return;
    }
    match target_value {
        Some(value) => capture(ctx, patch, address, value),
        None => {
            patch.insert(address.clone(), CapturedValue::Empty);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn compare_structs(
    ctx: &CompareContext<'_>,
    source: &DataTree<'_>,
    source_node: &DataNode<'_>,
    target: &DataTree<'_>,
    target_node: &DataNode<'_>,
    address: &mut Address,
    flags: PatchFlags,
    patch: &mut PatchMap,
) {
    let class = &target_node.class;

    // Target children drive the scan; fields present on both sides recurse,
    // target-only fields are captured whole.
    for &target_child in &target_node.children {
        let Some(field) = target.node(target_child).field.clone() else {
            continue;
        };
        let element = AddressElement::class(&class.name, class.type_id, &field.name, class.version);
        let mut scope = AddressScope::push(address, element);
        let matching = source_node.children.iter().copied().find(|&child| {
            source
                .node(child)
                .field
                .as_ref()
                .is_some_and(|f| f.name_hash == field.name_hash)
        });
        match matching {
            Some(source_child) => compare_nodes(
                ctx,
                source,
                source_child,
                target,
                target_child,
                scope.address(),
                flags,
                patch,
            ),
            None => record_one_sided(
                ctx,
                patch,
                scope.address(),
                flags,
                Some(target.node(target_child).value),
            ),
        }
    }

    // Source-only fields become removal markers.
    for &source_child in &source_node.children {
        let Some(field) = source.node(source_child).field.clone() else {
            continue;
        };
        let survives = target_node.children.iter().any(|&child| {
            target
                .node(child)
                .field
                .as_ref()
                .is_some_and(|f| f.name_hash == field.name_hash)
        });
        if survives {
            continue;
        }
        let element = AddressElement::class(&class.name, class.type_id, &field.name, class.version);
        let mut scope = AddressScope::push(address, element);
        record_one_sided(ctx, patch, scope.address(), flags, None);
    }
}

#[allow(clippy::too_many_arguments)]
fn compare_containers(
    ctx: &CompareContext<'_>,
    source: &DataTree<'_>,
    source_node: &DataNode<'_>,
    target: &DataTree<'_>,
    target_node: &DataNode<'_>,
    address: &mut Address,
    flags: PatchFlags,
    patch: &mut PatchMap,
) {
    let class = &target_node.class;
    let persistent_id = class.persistent_id;

    // Candidate source elements, tagged with the identity they are matched
    // under: a persistent id when the container declares one, else the
    // element's position.
    let mut candidates: Vec<(u64, NodeIndex, bool)> = source_node
        .children
        .iter()
        .enumerate()
        .map(|(position, &child)| {
            let identity = match persistent_id {
                Some(id_of) => id_of(source.node(child).value),
                None => position as u64,
            };
            (identity, child, false)
        })
        .collect();

    for (position, &target_child) in target_node.children.iter().enumerate() {
        let identity = match persistent_id {
            Some(id_of) => id_of(target.node(target_child).value),
            None => position as u64,
        };
        let element = AddressElement::index(&class.name, class.type_id, identity, class.version);
        let mut scope = AddressScope::push(address, element);

        let matching = candidates
            .iter_mut()
            .find(|(candidate, _, matched)| !*matched && *candidate == identity);
        match matching {
            Some(entry) => {
                entry.2 = true;
                let source_child = entry.1;
                compare_nodes(
                    ctx,
                    source,
                    source_child,
                    target,
                    target_child,
                    scope.address(),
                    flags,
                    patch,
                );
            }
            None => record_one_sided(
                ctx,
                patch,
                scope.address(),
                flags,
                Some(target.node(target_child).value),
            ),
        }
    }

    // Anything left unmatched on the source side was removed.
    for (identity, _, matched) in candidates {
        if matched {
            continue;
        }
        let element = AddressElement::index(&class.name, class.type_id, identity, class.version);
        let mut scope = AddressScope::push(address, element);
        record_one_sided(ctx, patch, scope.address(), flags, None);
    }
}
