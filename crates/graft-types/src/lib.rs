//! Foundation types for Graft.
//!
//! This crate provides the addressing, annotation, and object-model types
//! used throughout the Graft patch engine. Every other Graft crate depends
//! on `graft-types`.
//!
//! # Key Types
//!
//! - [`Address`] / [`AddressElement`] — ordered path identifying one node
//!   of an object tree, with a stable text form and legacy decoding
//! - [`PatchFlags`] / [`FlagsMap`] — per-address override-control
//!   annotations and their inheritance rules
//! - [`Instance`] / [`LeafValue`] — the dynamic reflected object model
//! - [`CapturedValue`] / [`PatchMap`] — type-erased patch payloads keyed
//!   by address, plus the derived child-address index

pub mod address;
pub mod error;
pub mod flags;
pub mod ids;
pub mod patch;
pub mod value;

pub use address::{
    Address, AddressElement, AddressScope, ElementKind, PATH_DELIMITER, VERSION_DELIMITER,
};
pub use error::TypeError;
pub use flags::{calculate_flags_at_address, FlagsMap, PatchFlags};
pub use ids::{field_name_hash, UNKNOWN_VERSION};
pub use patch::{build_child_patch_map, CapturedValue, ChildPatchMap, PatchMap};
pub use value::{Instance, InstanceData, LeafValue};
