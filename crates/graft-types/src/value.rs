//! The dynamic object model the patch engine operates on.
//!
//! A live object graph is a tree of [`Instance`]s: leaves carry primitive
//! [`LeafValue`] payloads, structs carry named fields, containers carry
//! ordered elements. Every instance records its *runtime* class id, so a
//! polymorphic member stores its pointee directly and the declared base
//! type lives only in the owning class's field descriptor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A primitive leaf payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LeafValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// One node of a live object graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// The runtime class of this value.
    pub class_id: Uuid,
    pub data: InstanceData,
}

/// The payload of an [`Instance`], shaped by its class's capabilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InstanceData {
    /// A primitive value handled by the class's serializer.
    Leaf(LeafValue),
    /// Struct fields as `(field name hash, value)` pairs in declared
    /// order. A null polymorphic member is simply absent.
    Struct(Vec<(u64, Instance)>),
    /// Ordered container elements.
    Container(Vec<Instance>),
}

impl Instance {
    pub fn leaf(class_id: Uuid, value: LeafValue) -> Self {
        Self {
            class_id,
            data: InstanceData::Leaf(value),
        }
    }

    pub fn with_fields(class_id: Uuid, fields: Vec<(u64, Instance)>) -> Self {
        Self {
            class_id,
            data: InstanceData::Struct(fields),
        }
    }

    pub fn container(class_id: Uuid, elements: Vec<Instance>) -> Self {
        Self {
            class_id,
            data: InstanceData::Container(elements),
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafValue> {
        match &self.data {
            InstanceData::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a struct field by its name hash.
    pub fn field(&self, name_hash: u64) -> Option<&Instance> {
        match &self.data {
            InstanceData::Struct(fields) => fields
                .iter()
                .find(|(hash, _)| *hash == name_hash)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Replace a struct field, or append it if absent. No-op on non-struct
    /// instances.
    pub fn set_field(&mut self, name_hash: u64, value: Instance) {
        if let InstanceData::Struct(fields) = &mut self.data {
            match fields.iter_mut().find(|(hash, _)| *hash == name_hash) {
                Some(slot) => slot.1 = value,
                None => fields.push((name_hash, value)),
            }
        }
    }

    /// Remove a struct field, returning its previous value.
    pub fn remove_field(&mut self, name_hash: u64) -> Option<Instance> {
        if let InstanceData::Struct(fields) = &mut self.data {
            let position = fields.iter().position(|(hash, _)| *hash == name_hash)?;
            return Some(fields.remove(position).1);
        }
        None
    }

    /// Container elements, or `None` for non-container instances.
    pub fn elements(&self) -> Option<&[Instance]> {
        match &self.data {
            InstanceData::Container(elements) => Some(elements),
            _ => None,
        }
    }
}
