//! The container capability: how the engine reads and mutates a reflected
//! collection without knowing its concrete layout.

use uuid::Uuid;

use graft_types::{Instance, InstanceData};

/// Container operations over a reflected collection value.
///
/// Invariants all implementations must satisfy:
/// - Element order is observable and preserved; `reserve_element` appends.
/// - Indices are positions in the current element order, not persistent
///   identities.
/// - Mutating calls on a non-container instance are no-ops that report
///   failure; they never panic.
pub trait ContainerInterface: Send + Sync {
    /// The declared element type of this container class.
    fn element_type_id(&self) -> Uuid;

    /// Whether elements can be fetched by position.
    fn can_access_by_index(&self) -> bool {
        true
    }

    fn size(&self, value: &Instance) -> usize;

    fn element<'a>(&self, value: &'a Instance, index: usize) -> Option<&'a Instance>;

    /// Append a slot holding `element`, returning its position, or `None`
    /// if `value` is not a container.
    fn reserve_element(&self, value: &mut Instance, element: Instance) -> Option<usize>;

    /// Overwrite the slot at `index`. Returns `false` if out of range.
    fn store_element(&self, value: &mut Instance, index: usize, element: Instance) -> bool;

    /// Remove the slot at `index`. Returns `false` if out of range.
    fn remove_element(&self, value: &mut Instance, index: usize) -> bool;
}

/// The standard ordered container over [`InstanceData::Container`].
pub struct VecContainer {
    element_type: Uuid,
}

impl VecContainer {
    pub fn new(element_type: Uuid) -> Self {
        Self { element_type }
    }
}

impl ContainerInterface for VecContainer {
    fn element_type_id(&self) -> Uuid {
        self.element_type
    }

    fn size(&self, value: &Instance) -> usize {
        value.elements().map_or(0, <[Instance]>::len)
    }

    fn element<'a>(&self, value: &'a Instance, index: usize) -> Option<&'a Instance> {
        value.elements()?.get(index)
    }

    fn reserve_element(&self, value: &mut Instance, element: Instance) -> Option<usize> {
        match &mut value.data {
            InstanceData::Container(elements) => {
                elements.push(element);
                Some(elements.len() - 1)
            }
            _ => None,
        }
    }

    fn store_element(&self, value: &mut Instance, index: usize, element: Instance) -> bool {
        match &mut value.data {
            InstanceData::Container(elements) => match elements.get_mut(index) {
                Some(slot) => {
                    *slot = element;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn remove_element(&self, value: &mut Instance, index: usize) -> bool {
        match &mut value.data {
            InstanceData::Container(elements) => {
                if index < elements.len() {
                    elements.remove(index);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_types::LeafValue;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn int(n: i64) -> Instance {
        Instance::leaf(uid(1), LeafValue::I64(n))
    }

    fn list(values: &[i64]) -> Instance {
        Instance::container(uid(2), values.iter().copied().map(int).collect())
    }

    #[test]
    fn size_and_element_access() {
        let container = VecContainer::new(uid(1));
        let value = list(&[10, 20]);
        assert_eq!(container.size(&value), 2);
        assert!(container.can_access_by_index());
        assert_eq!(container.element(&value, 1), Some(&int(20)));
        assert!(container.element(&value, 2).is_none());
    }

    #[test]
    fn reserve_appends_in_order() {
        let container = VecContainer::new(uid(1));
        let mut value = list(&[]);
        assert_eq!(container.reserve_element(&mut value, int(1)), Some(0));
        assert_eq!(container.reserve_element(&mut value, int(2)), Some(1));
        assert_eq!(value.elements().unwrap(), &[int(1), int(2)]);
    }

    #[test]
    fn store_overwrites_and_checks_range() {
        let container = VecContainer::new(uid(1));
        let mut value = list(&[1, 2]);
        assert!(container.store_element(&mut value, 0, int(9)));
        assert!(!container.store_element(&mut value, 5, int(9)));
        assert_eq!(container.element(&value, 0), Some(&int(9)));
    }

    #[test]
    fn remove_shifts_later_elements() {
        let container = VecContainer::new(uid(1));
        let mut value = list(&[1, 2, 3]);
        assert!(container.remove_element(&mut value, 0));
        assert_eq!(value.elements().unwrap(), &[int(2), int(3)]);
        assert!(!container.remove_element(&mut value, 2));
    }

    #[test]
    fn non_container_values_fail_gracefully() {
        let container = VecContainer::new(uid(1));
        let mut value = int(5);
        assert_eq!(container.size(&value), 0);
        assert!(container.element(&value, 0).is_none());
        assert!(container.reserve_element(&mut value, int(1)).is_none());
        assert!(!container.store_element(&mut value, 0, int(1)));
        assert!(!container.remove_element(&mut value, 0));
    }
}
