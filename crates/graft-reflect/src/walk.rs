//! The generic instance walk: depth-first enumeration of a live object
//! graph with enter/exit callbacks.

use std::sync::Arc;

use tracing::error;

use graft_types::{Instance, InstanceData};

use crate::class::{ClassDescriptor, FieldDescriptor};
use crate::registry::ReflectContext;

/// Callbacks invoked around every descended node.
///
/// The lifetime parameter ties handed-out value references to the walked
/// instance, so visitors may retain them for as long as the instance
/// lives (the tree builder does exactly that).
pub trait InstanceVisitor<'a> {
    /// Entering a node. `field` is the descriptor that placed this value
    /// in its parent (`None` for the root); it is only guaranteed valid
    /// for the duration of this call. Return `false` to stop the walk.
    fn on_enter(
        &mut self,
        value: &'a Instance,
        class: &Arc<ClassDescriptor>,
        field: Option<&FieldDescriptor>,
    ) -> bool;

    /// Leaving the node most recently entered. Return `false` to stop.
    fn on_exit(&mut self) -> bool;
}

/// Walk `value` depth-first. Struct children are visited in declared
/// field order, container children in element order. Returns `false` if
/// the visitor stopped the walk early.
pub fn enumerate_instance<'a>(
    registry: &ReflectContext,
    value: &'a Instance,
    visitor: &mut dyn InstanceVisitor<'a>,
) -> bool {
    descend(registry, value, None, visitor)
}

fn descend<'a>(
    registry: &ReflectContext,
    value: &'a Instance,
    field: Option<&FieldDescriptor>,
    visitor: &mut dyn InstanceVisitor<'a>,
) -> bool {
    let Some(class) = registry.find_class(&value.class_id) else {
        // Registration bug in the host; skip the subtree but keep walking
        // siblings so the caller still gets a best-effort result.
        error!(type_id = %value.class_id, "instance class not registered, skipping subtree");
        return true;
    };

    if !visitor.on_enter(value, &class, field) {
        return false;
    }

    let descended = match &value.data {
        InstanceData::Leaf(_) => true,
        InstanceData::Container(elements) => {
            let element_field = class
                .container
                .as_ref()
                .map(|container| FieldDescriptor::element(container.element_type_id()));
            elements
                .iter()
                .all(|element| descend(registry, element, element_field.as_ref(), visitor))
        }
        InstanceData::Struct(_) => class.fields.iter().all(|declared| {
            match value.field(declared.name_hash) {
                Some(child) => descend(registry, child, Some(declared), visitor),
                // A null polymorphic member is simply not materialized.
                None => true,
            }
        }),
    };
    if !descended {
        return false;
    }

    visitor.on_exit()
}
