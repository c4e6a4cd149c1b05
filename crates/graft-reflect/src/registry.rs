//! The class registry: type-id lookups, compatibility queries, and
//! instance creation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use graft_types::Instance;

use crate::class::{ClassDescriptor, FieldDescriptor};
use crate::error::{ReflectError, ReflectResult};

/// The registered class universe one engine invocation operates in.
///
/// Registration happens up front; afterwards every query takes `&self`,
/// so a context shared behind an `Arc` is safe for concurrent readers
/// (independent create/apply calls on different threads).
pub struct ReflectContext {
    classes: HashMap<Uuid, Arc<ClassDescriptor>>,
}

impl ReflectContext {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    /// Register a class descriptor, replacing any previous registration
    /// for the same type id.
    pub fn register(&mut self, class: ClassDescriptor) -> Arc<ClassDescriptor> {
        let class = Arc::new(class);
        if let Some(previous) = self.classes.insert(class.type_id, Arc::clone(&class)) {
            warn!(
                type_id = %class.type_id,
                previous = %previous.name,
                replacement = %class.name,
                "class descriptor re-registered"
            );
        }
        class
    }

    pub fn find_class(&self, type_id: &Uuid) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(type_id).cloned()
    }

    /// Resolve a declared field of `parent` by name hash, together with
    /// the descriptor of the field's declared class. `None` when either
    /// half cannot be resolved.
    pub fn find_class_field(
        &self,
        parent: &ClassDescriptor,
        name_hash: u64,
    ) -> Option<(FieldDescriptor, Arc<ClassDescriptor>)> {
        let field = parent.field_by_hash(name_hash)?.clone();
        let class = self.find_class(&field.type_id)?;
        Some((field, class))
    }

    /// The primitive type a class matches against for patch purposes:
    /// its declared underlying type, or its own id.
    pub fn underlying_type_id(&self, type_id: &Uuid) -> Uuid {
        self.find_class(type_id)
            .and_then(|class| class.underlying_type)
            .unwrap_or(*type_id)
    }

    /// Whether a value of runtime type `actual` may be stored where
    /// `declared` is expected: exact match, underlying-type match, or
    /// `actual` deriving (transitively) from `declared`.
    pub fn is_type_compatible(&self, actual: &Uuid, declared: &Uuid) -> bool {
        if actual == declared {
            return true;
        }
        if self.underlying_type_id(actual) == self.underlying_type_id(declared) {
            return true;
        }
        let mut pending = vec![*actual];
        let mut seen = HashSet::new();
        while let Some(type_id) = pending.pop() {
            if !seen.insert(type_id) {
                continue;
            }
            if let Some(class) = self.find_class(&type_id) {
                for base in &class.base_classes {
                    if base == declared {
                        return true;
                    }
                    pending.push(*base);
                }
            }
        }
        false
    }

    /// Create a default-initialized instance of a registered class via
    /// its factory.
    pub fn create_value(&self, type_id: &Uuid) -> ReflectResult<Instance> {
        let class = self
            .find_class(type_id)
            .ok_or(ReflectError::ClassNotFound(*type_id))?;
        let factory = class.factory.ok_or(ReflectError::FactoryMissing(*type_id))?;
        Ok(factory())
    }

    /// Deep copy of a live instance. The official clone entry point; the
    /// engine never copies instances any other way.
    pub fn clone_instance(&self, value: &Instance) -> Instance {
        value.clone()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ReflectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReflectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectContext")
            .field("class_count", &self.len())
            .finish()
    }
}
