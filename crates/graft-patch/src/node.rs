//! Building an addressable tree over a live instance.
//!
//! A [`DataTree`] mirrors one instance's structure for the duration of a
//! diff or apply: nodes borrow the live values, hold their reflection
//! descriptors, and link to parent and children by arena index so the
//! tree can be moved without invalidating anything.

use std::sync::Arc;

use graft_reflect::{enumerate_instance, ClassDescriptor, FieldDescriptor, InstanceVisitor, ReflectContext};
use graft_types::Instance;

/// Index of a node within its owning [`DataTree`] arena.
pub type NodeIndex = usize;

/// One node of a built tree.
pub struct DataNode<'a> {
    /// The live value this node mirrors. Pointer fields are dereferenced
    /// at build time, so this is always the value itself.
    pub value: &'a Instance,
    pub class: Arc<ClassDescriptor>,
    /// The descriptor that placed this value in its parent; `None` for
    /// the root. Owned, because dynamic-field descriptors are only valid
    /// for the duration of one walk callback.
    pub field: Option<FieldDescriptor>,
    pub parent: Option<NodeIndex>,
    /// Children in visit order (declared field order / element order).
    pub children: Vec<NodeIndex>,
}

/// An arena-backed mirror of one live instance.
pub struct DataTree<'a> {
    nodes: Vec<DataNode<'a>>,
}

impl<'a> DataTree<'a> {
    /// Build a tree over `instance`. A missing instance or an
    /// unregistered root class yields an empty tree — "nothing to diff or
    /// apply" — not an error.
    pub fn build(registry: &ReflectContext, instance: Option<&'a Instance>) -> DataTree<'a> {
        let mut nodes = Vec::new();
        if let Some(instance) = instance {
            let mut builder = TreeBuilder {
                nodes: &mut nodes,
                cursor: None,
            };
            enumerate_instance(registry, instance, &mut builder);
        }
        DataTree { nodes }
    }

    pub fn root(&self) -> Option<NodeIndex> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, index: NodeIndex) -> &DataNode<'a> {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct TreeBuilder<'t, 'a> {
    nodes: &'t mut Vec<DataNode<'a>>,
    cursor: Option<NodeIndex>,
}

impl<'t, 'a> InstanceVisitor<'a> for TreeBuilder<'t, 'a> {
    fn on_enter(
        &mut self,
        value: &'a Instance,
        class: &Arc<ClassDescriptor>,
        field: Option<&FieldDescriptor>,
    ) -> bool {
        let index = self.nodes.len();
        self.nodes.push(DataNode {
            value,
            class: Arc::clone(class),
            field: field.cloned(),
            parent: self.cursor,
            children: Vec::new(),
        });
        if let Some(parent) = self.cursor {
            self.nodes[parent].children.push(index);
        }
        self.cursor = Some(index);

        if let Some(events) = class.events.clone() {
            events.on_read_begin(value);
        }
        true
    }

    fn on_exit(&mut self) -> bool {
        if let Some(index) = self.cursor {
            let node = &self.nodes[index];
            if let Some(events) = node.class.events.clone() {
                events.on_read_end(node.value);
            }
            self.cursor = node.parent;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture_registry, level, sprite, uid, CountingEvents, SPRITE};
    use graft_types::field_name_hash;

    #[test]
    fn missing_instance_builds_an_empty_tree() {
        let registry = fixture_registry();
        let tree = DataTree::build(&registry, None);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn unregistered_root_builds_an_empty_tree() {
        let registry = fixture_registry();
        let stray = graft_types::Instance::leaf(uid(0xdead), graft_types::LeafValue::Bool(true));
        let tree = DataTree::build(&registry, Some(&stray));
        assert!(tree.is_empty());
    }

    #[test]
    fn tree_mirrors_structure_and_order() {
        let registry = fixture_registry();
        let instance = level("demo", &[sprite(1, 0.0, 0.0, "a"), sprite(2, 1.0, 1.0, "b")], &[]);
        let tree = DataTree::build(&registry, Some(&instance));

        let root = tree.node(tree.root().unwrap());
        assert!(root.parent.is_none());
        assert!(root.field.is_none());
        // Level declares title, sprites, tags; the tags container is empty
        // in this instance but still materialized as a child.
        assert_eq!(root.children.len(), 3);

        let title = tree.node(root.children[0]);
        assert_eq!(title.field.as_ref().unwrap().name, "title");
        assert_eq!(title.parent, Some(0));

        let sprites = tree.node(root.children[1]);
        assert_eq!(sprites.children.len(), 2);
        let first = tree.node(sprites.children[0]);
        assert_eq!(first.class.type_id, SPRITE);
        // Container elements carry the anonymous element descriptor.
        assert!(first.field.as_ref().unwrap().name.is_empty());
        // Sprite fields in declared order: id, x, y, name.
        let names: Vec<u64> = first
            .children
            .iter()
            .map(|&c| tree.node(c).field.as_ref().unwrap().name_hash)
            .collect();
        assert_eq!(
            names,
            vec![
                field_name_hash("id"),
                field_name_hash("x"),
                field_name_hash("y"),
                field_name_hash("name"),
            ]
        );
    }

    #[test]
    fn read_hooks_fire_balanced() {
        let (registry, events) = CountingEvents::instrument(fixture_registry());
        let instance = level("demo", &[sprite(1, 0.0, 0.0, "a")], &[]);
        let tree = DataTree::build(&registry, Some(&instance));
        assert!(tree.len() > 1);
        // One sprite node entered and exited once.
        assert_eq!(events.read_begins(), 1);
        assert_eq!(events.read_ends(), 1);
    }
}
