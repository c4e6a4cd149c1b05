//! Reflection collaborator for Graft.
//!
//! The patch engine never touches concrete types directly; everything it
//! knows about an object comes through this crate: class and field
//! descriptors, capability traits for containers, leaf serializers, and
//! lifecycle hooks, and the generic depth-first instance walk. Standard
//! implementations (`VecContainer`, `BincodeSerializer`) cover the common
//! cases; hosts register their own for anything exotic.
//!
//! # Key Types
//!
//! - [`ClassDescriptor`] / [`FieldDescriptor`] — reflection metadata per
//!   registered class
//! - [`ReflectContext`] — the registry: lookups, type compatibility,
//!   instance creation
//! - [`ContainerInterface`] / [`VecContainer`] — collection capability
//! - [`ValueSerializer`] / [`BincodeSerializer`] — leaf save/load/compare
//! - [`EventHandler`] — optional per-class lifecycle hooks
//! - [`enumerate_instance`] / [`InstanceVisitor`] — the generic walk

pub mod class;
pub mod container;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod serializer;
pub mod walk;

pub use class::{ClassDescriptor, FieldDescriptor, InstanceFactory, PersistentIdFn};
pub use container::{ContainerInterface, VecContainer};
pub use error::{ReflectError, ReflectResult};
pub use hooks::{EventHandler, PatchLookup};
pub use registry::ReflectContext;
pub use serializer::{BincodeSerializer, ValueSerializer};
pub use walk::{enumerate_instance, InstanceVisitor};
