//! Class and field descriptors: the reflection metadata the patch engine
//! consumes.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use graft_types::{field_name_hash, Instance};

use crate::container::ContainerInterface;
use crate::hooks::EventHandler;
use crate::serializer::ValueSerializer;

/// Maps a container element's value to a stable identity used for
/// matching elements across two instances instead of their positions.
pub type PersistentIdFn = fn(&Instance) -> u64;

/// Creates a default-initialized instance of a class.
pub type InstanceFactory = fn() -> Instance;

/// One declared field of a reflected struct.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    /// Stable hash of `name`; the field's identity inside addresses.
    pub name_hash: u64,
    /// The field's declared type. For pointer fields this is the base
    /// class; the stored value's own class id is the runtime type.
    pub type_id: Uuid,
    pub is_pointer: bool,
    /// The field's type is resolved at runtime; descriptors for such
    /// fields are only guaranteed valid for one walk callback and must be
    /// copied by anyone who keeps them.
    pub is_dynamic: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, type_id: Uuid) -> Self {
        Self {
            name: name.to_string(),
            name_hash: field_name_hash(name),
            type_id,
            is_pointer: false,
            is_dynamic: false,
        }
    }

    pub fn pointer(name: &str, type_id: Uuid) -> Self {
        Self {
            is_pointer: true,
            ..Self::new(name, type_id)
        }
    }

    pub fn dynamic(name: &str, type_id: Uuid) -> Self {
        Self {
            is_dynamic: true,
            ..Self::new(name, type_id)
        }
    }

    /// The anonymous descriptor a container's elements are walked under.
    pub fn element(type_id: Uuid) -> Self {
        Self {
            name: String::new(),
            name_hash: 0,
            type_id,
            is_pointer: false,
            is_dynamic: false,
        }
    }
}

/// Everything the engine knows about one registered class.
///
/// Exactly one of three shapes applies, checked in a fixed order: a class
/// with a container capability is a container, else a class with a
/// serializer is a leaf, else it is a plain struct with declared fields.
pub struct ClassDescriptor {
    pub name: String,
    pub type_id: Uuid,
    pub version: u32,
    pub fields: Vec<FieldDescriptor>,
    pub container: Option<Arc<dyn ContainerInterface>>,
    pub serializer: Option<Arc<dyn ValueSerializer>>,
    pub events: Option<Arc<dyn EventHandler>>,
    pub persistent_id: Option<PersistentIdFn>,
    pub factory: Option<InstanceFactory>,
    /// Direct base classes, for runtime compatibility of polymorphic
    /// targets.
    pub base_classes: Vec<Uuid>,
    /// For enums and typedefs: the primitive type patches may match
    /// against instead of this class's own id.
    pub underlying_type: Option<Uuid>,
    /// Deprecated without a converter: mismatching patch entries against
    /// this class are dropped silently instead of diagnosed.
    pub deprecated: bool,
}

impl ClassDescriptor {
    pub fn new(name: &str, type_id: Uuid, version: u32) -> Self {
        Self {
            name: name.to_string(),
            type_id,
            version,
            fields: Vec::new(),
            container: None,
            serializer: None,
            events: None,
            persistent_id: None,
            factory: None,
            base_classes: Vec::new(),
            underlying_type: None,
            deprecated: false,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_container(mut self, container: Arc<dyn ContainerInterface>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn ValueSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventHandler>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_persistent_id(mut self, persistent_id: PersistentIdFn) -> Self {
        self.persistent_id = Some(persistent_id);
        self
    }

    pub fn with_factory(mut self, factory: InstanceFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_base(mut self, base: Uuid) -> Self {
        self.base_classes.push(base);
        self
    }

    pub fn with_underlying_type(mut self, underlying: Uuid) -> Self {
        self.underlying_type = Some(underlying);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    /// A leaf has a direct value serializer and no container capability.
    pub fn is_leaf(&self) -> bool {
        self.container.is_none() && self.serializer.is_some()
    }

    pub fn field_by_hash(&self, name_hash: u64) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name_hash == name_hash)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("type_id", &self.type_id)
            .field("version", &self.version)
            .field("fields", &self.fields.len())
            .field("container", &self.container.is_some())
            .field("serializer", &self.serializer.is_some())
            .finish()
    }
}
