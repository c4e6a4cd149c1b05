//! Shared test fixtures: a small game-flavored class universe and
//! instance builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use uuid::Uuid;

use graft_reflect::{
    BincodeSerializer, ClassDescriptor, EventHandler, FieldDescriptor, PatchLookup,
    ReflectContext, VecContainer,
};
use graft_types::{field_name_hash, Address, Instance, LeafValue};

pub const FLOAT: Uuid = Uuid::from_u128(0x01);
pub const INT: Uuid = Uuid::from_u128(0x02);
pub const NAME: Uuid = Uuid::from_u128(0x03);
pub const MATERIAL: Uuid = Uuid::from_u128(0x10);
pub const GLOSSY: Uuid = Uuid::from_u128(0x11);
pub const SPRITE: Uuid = Uuid::from_u128(0x20);
pub const SPRITE_LIST: Uuid = Uuid::from_u128(0x30);
pub const INT_LIST: Uuid = Uuid::from_u128(0x31);
pub const LEVEL: Uuid = Uuid::from_u128(0x40);
pub const MODE: Uuid = Uuid::from_u128(0x50);
pub const RELIC: Uuid = Uuid::from_u128(0x60);

pub fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Route engine diagnostics to the test harness, once per process. Handy
/// when a degradation test misbehaves and the warnings say why.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn float(v: f64) -> Instance {
    Instance::leaf(FLOAT, LeafValue::F64(v))
}

pub fn int(n: i64) -> Instance {
    Instance::leaf(INT, LeafValue::I64(n))
}

pub fn name(s: &str) -> Instance {
    Instance::leaf(NAME, LeafValue::Str(s.to_string()))
}

pub fn material(shine: f64) -> Instance {
    Instance::with_fields(MATERIAL, vec![(field_name_hash("shine"), float(shine))])
}

pub fn glossy(shine: f64, gloss: f64) -> Instance {
    Instance::with_fields(
        GLOSSY,
        vec![
            (field_name_hash("shine"), float(shine)),
            (field_name_hash("gloss"), float(gloss)),
        ],
    )
}

pub fn sprite(id: i64, x: f64, y: f64, label: &str) -> Instance {
    Instance::with_fields(
        SPRITE,
        vec![
            (field_name_hash("id"), int(id)),
            (field_name_hash("x"), float(x)),
            (field_name_hash("y"), float(y)),
            (field_name_hash("name"), name(label)),
        ],
    )
}

pub fn sprite_with_material(
    id: i64,
    x: f64,
    y: f64,
    label: &str,
    material: Instance,
) -> Instance {
    let mut instance = sprite(id, x, y, label);
    instance.set_field(field_name_hash("material"), material);
    instance
}

pub fn sprite_list(sprites: Vec<Instance>) -> Instance {
    Instance::container(SPRITE_LIST, sprites)
}

pub fn int_list(values: &[i64]) -> Instance {
    Instance::container(INT_LIST, values.iter().copied().map(int).collect())
}

pub fn level(title: &str, sprites: &[Instance], tags: &[i64]) -> Instance {
    Instance::with_fields(
        LEVEL,
        vec![
            (field_name_hash("title"), name(title)),
            (field_name_hash("sprites"), sprite_list(sprites.to_vec())),
            (field_name_hash("tags"), int_list(tags)),
        ],
    )
}

fn sprite_persistent_id(instance: &Instance) -> u64 {
    match instance.field(field_name_hash("id")).and_then(Instance::as_leaf) {
        Some(LeafValue::I64(id)) => *id as u64,
        _ => 0,
    }
}

fn make_float() -> Instance {
    float(0.0)
}

fn sprite_class() -> ClassDescriptor {
    ClassDescriptor::new("Sprite", SPRITE, 2).with_fields(vec![
        FieldDescriptor::new("id", INT),
        FieldDescriptor::new("x", FLOAT),
        FieldDescriptor::new("y", FLOAT),
        FieldDescriptor::new("name", NAME),
        FieldDescriptor::pointer("material", MATERIAL),
    ])
}

pub fn fixture_registry() -> ReflectContext {
    let mut registry = ReflectContext::new();
    registry.register(
        ClassDescriptor::new("Float", FLOAT, 1)
            .with_serializer(Arc::new(BincodeSerializer))
            .with_factory(make_float),
    );
    registry.register(
        ClassDescriptor::new("Int", INT, 1).with_serializer(Arc::new(BincodeSerializer)),
    );
    registry.register(
        ClassDescriptor::new("Name", NAME, 1).with_serializer(Arc::new(BincodeSerializer)),
    );
    registry.register(
        ClassDescriptor::new("Material", MATERIAL, 1)
            .with_fields(vec![FieldDescriptor::new("shine", FLOAT)]),
    );
    registry.register(
        ClassDescriptor::new("GlossyMaterial", GLOSSY, 1)
            .with_base(MATERIAL)
            .with_fields(vec![
                FieldDescriptor::new("shine", FLOAT),
                FieldDescriptor::new("gloss", FLOAT),
            ]),
    );
    registry.register(sprite_class());
    registry.register(
        ClassDescriptor::new("SpriteList", SPRITE_LIST, 1)
            .with_container(Arc::new(VecContainer::new(SPRITE)))
            .with_persistent_id(sprite_persistent_id),
    );
    registry.register(
        ClassDescriptor::new("IntList", INT_LIST, 1)
            .with_container(Arc::new(VecContainer::new(INT))),
    );
    registry.register(ClassDescriptor::new("Level", LEVEL, 3).with_fields(vec![
        FieldDescriptor::new("title", NAME),
        FieldDescriptor::new("sprites", SPRITE_LIST),
        FieldDescriptor::new("tags", INT_LIST),
    ]));
    registry.register(
        ClassDescriptor::new("Mode", MODE, 1)
            .with_serializer(Arc::new(BincodeSerializer))
            .with_underlying_type(INT),
    );
    registry.register(
        ClassDescriptor::new("Relic", RELIC, 1)
            .with_serializer(Arc::new(BincodeSerializer))
            .deprecated(),
    );
    registry
}

/// Event handler that counts hook invocations, attached to the Sprite
/// class by [`CountingEvents::instrument`].
#[derive(Default)]
pub struct CountingEvents {
    read_begins: AtomicUsize,
    read_ends: AtomicUsize,
    write_begins: AtomicUsize,
    write_ends: AtomicUsize,
    patch_begins: AtomicUsize,
    patch_ends: AtomicUsize,
}

impl CountingEvents {
    pub fn instrument(mut registry: ReflectContext) -> (ReflectContext, Arc<CountingEvents>) {
        let events = Arc::new(CountingEvents::default());
        registry.register(sprite_class().with_events(Arc::clone(&events) as Arc<dyn EventHandler>));
        (registry, events)
    }

    pub fn read_begins(&self) -> usize {
        self.read_begins.load(Ordering::Relaxed)
    }

    pub fn read_ends(&self) -> usize {
        self.read_ends.load(Ordering::Relaxed)
    }

    pub fn write_begins(&self) -> usize {
        self.write_begins.load(Ordering::Relaxed)
    }

    pub fn write_ends(&self) -> usize {
        self.write_ends.load(Ordering::Relaxed)
    }

    pub fn patch_begins(&self) -> usize {
        self.patch_begins.load(Ordering::Relaxed)
    }

    pub fn patch_ends(&self) -> usize {
        self.patch_ends.load(Ordering::Relaxed)
    }
}

impl EventHandler for CountingEvents {
    fn on_read_begin(&self, _value: &Instance) {
        self.read_begins.fetch_add(1, Ordering::Relaxed);
    }

    fn on_read_end(&self, _value: &Instance) {
        self.read_ends.fetch_add(1, Ordering::Relaxed);
    }

    fn on_write_begin(&self, _address: &Address) {
        self.write_begins.fetch_add(1, Ordering::Relaxed);
    }

    fn on_write_end(&self, _address: &Address) {
        self.write_ends.fetch_add(1, Ordering::Relaxed);
    }

    fn on_patch_begin(&self, _address: &Address, _pending: &PatchLookup<'_>) {
        self.patch_begins.fetch_add(1, Ordering::Relaxed);
    }

    fn on_patch_end(&self, _address: &Address, _pending: &PatchLookup<'_>) {
        self.patch_ends.fetch_add(1, Ordering::Relaxed);
    }
}
