//! Patch addresses: ordered paths identifying one node in an object tree.
//!
//! An [`Address`] is the key type of a patch map. Identity is carried by
//! the numeric ids of its elements alone; class names, type ids, and
//! versions ride along to support the stable text form and versioned
//! upgrades, but never participate in equality, ordering, or hashing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::TypeError;
use crate::ids::{field_name_hash, UNKNOWN_VERSION};

/// Separator between two address elements in the text form.
pub const PATH_DELIMITER: char = '/';

/// Separator between an element's name part and its version in the text
/// form. Field names must not contain this character.
pub const VERSION_DELIMITER: char = '|';

/// How an element's numeric id was derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// A struct field; the id is the hash of the field name.
    Class,
    /// A container slot; the id is a persistent identity or a position.
    Index,
    /// Decoded from the legacy purely-numeric encoding; kind unknown.
    None,
}

/// One step of an [`Address`].
#[derive(Clone, Debug)]
pub struct AddressElement {
    id: u64,
    class_id: Uuid,
    version: u32,
    kind: ElementKind,
    class_name: String,
    field_name: String,
}

impl AddressElement {
    /// A struct-field element. The numeric id is derived from the field
    /// name; `class_name`/`class_id`/`version` describe the owning class.
    pub fn class(class_name: &str, class_id: Uuid, field_name: &str, version: u32) -> Self {
        Self {
            id: field_name_hash(field_name),
            class_id,
            version,
            kind: ElementKind::Class,
            class_name: class_name.to_string(),
            field_name: field_name.to_string(),
        }
    }

    /// A container-slot element. `index` is a persistent identity when the
    /// owning container declares one, else a position.
    pub fn index(class_name: &str, class_id: Uuid, index: u64, version: u32) -> Self {
        Self {
            id: index,
            class_id,
            version,
            kind: ElementKind::Index,
            class_name: class_name.to_string(),
            field_name: String::new(),
        }
    }

    /// An element decoded from the legacy numeric-only encoding.
    pub fn legacy(id: u64) -> Self {
        Self {
            id,
            class_id: Uuid::nil(),
            version: UNKNOWN_VERSION,
            kind: ElementKind::None,
            class_name: String::new(),
            field_name: String::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn class_id(&self) -> Uuid {
        self.class_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    fn write_text(&self, out: &mut String) {
        use fmt::Write;
        match self.kind {
            ElementKind::Class => {
                let _ = write!(
                    out,
                    "{}({})::{}{}{}{}",
                    self.class_name,
                    self.class_id,
                    self.field_name,
                    VERSION_DELIMITER,
                    self.version,
                    PATH_DELIMITER
                );
            }
            ElementKind::Index => {
                let _ = write!(
                    out,
                    "{}({})#{}{}{}{}",
                    self.class_name,
                    self.class_id,
                    self.id,
                    VERSION_DELIMITER,
                    self.version,
                    PATH_DELIMITER
                );
            }
            ElementKind::None => {
                let _ = write!(out, "{}{}", self.id, PATH_DELIMITER);
            }
        }
    }

    /// Parse one delimiter-stripped text segment. Returns `None` on any
    /// malformed input.
    fn parse_segment(segment: &str) -> Option<Self> {
        if segment.is_empty() {
            return None;
        }
        // Legacy elements are a bare numeric id.
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            return segment.parse::<u64>().ok().map(Self::legacy);
        }

        let open = segment.find('(')?;
        let close = segment[open..].find(')')? + open;
        let class_name = &segment[..open];
        let class_id = Uuid::parse_str(&segment[open + 1..close]).ok()?;
        let rest = &segment[close + 1..];

        if let Some(field_part) = rest.strip_prefix("::") {
            let pipe = field_part.rfind(VERSION_DELIMITER)?;
            let field_name = &field_part[..pipe];
            if field_name.is_empty() {
                return None;
            }
            let version = field_part[pipe + 1..].parse::<u32>().ok()?;
            Some(Self::class(class_name, class_id, field_name, version))
        } else if let Some(index_part) = rest.strip_prefix('#') {
            let pipe = index_part.rfind(VERSION_DELIMITER)?;
            let index = index_part[..pipe].parse::<u64>().ok()?;
            let version = index_part[pipe + 1..].parse::<u32>().ok()?;
            Some(Self::index(class_name, class_id, index, version))
        } else {
            None
        }
    }
}

// Identity is the numeric id alone; the remaining fields are metadata for
// the text form and versioned upgrades.
impl PartialEq for AddressElement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AddressElement {}

impl Hash for AddressElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An ordered path addressing one node of an object tree.
///
/// The root object is the empty sequence, which is still a *valid*
/// address (it keys whole-object-replacement patch entries).
#[derive(Clone, Debug)]
pub struct Address {
    elements: Vec<AddressElement>,
    valid: bool,
    legacy: bool,
}

impl Address {
    /// An empty, valid address (the tree root).
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            valid: true,
            legacy: false,
        }
    }

    /// Convert the old fixed-width binary encoding (a flat run of numeric
    /// ids) into an address of `None`-kind elements.
    pub fn from_legacy_ids(ids: &[u64]) -> Self {
        Self {
            elements: ids.iter().copied().map(AddressElement::legacy).collect(),
            valid: true,
            legacy: true,
        }
    }

    /// Parse the stable text form. Never fails: malformed input yields an
    /// address with the validity flag cleared. Trailing text that does not
    /// form a whole delimited element counts as corruption.
    pub fn from_text(text: &str) -> Self {
        let mut address = Address::new();
        if text.is_empty() {
            return address;
        }
        // Every element ends with the path delimiter; anything left over
        // means the input was truncated mid-element.
        if !text.ends_with(PATH_DELIMITER) {
            address.valid = false;
            return address;
        }
        for segment in text[..text.len() - PATH_DELIMITER.len_utf8()].split(PATH_DELIMITER) {
            match AddressElement::parse_segment(segment) {
                Some(element) => {
                    if element.kind == ElementKind::None {
                        address.legacy = true;
                    }
                    address.elements.push(element);
                }
                None => {
                    address.valid = false;
                    return address;
                }
            }
        }
        address
    }

    /// The stable text form; the empty address renders as the empty string.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            element.write_text(&mut out);
        }
        out
    }

    pub fn push(&mut self, element: AddressElement) {
        self.elements.push(element);
    }

    pub fn pop(&mut self) -> Option<AddressElement> {
        self.elements.pop()
    }

    pub fn elements(&self) -> &[AddressElement] {
        &self.elements
    }

    pub fn last(&self) -> Option<&AddressElement> {
        self.elements.last()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// The address one element shorter, or `None` for the root.
    pub fn parent(&self) -> Option<Address> {
        if self.elements.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.pop();
        Some(parent)
    }

    fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.elements.iter().map(|e| e.id)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

// Equality, ordering, and hashing compare the numeric id sequences only.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.ids().eq(other.ids())
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for id in self.ids() {
            id.hash(state);
        }
        self.elements.len().hash(state);
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids().cmp(other.ids())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address::from_text(s);
        if address.is_valid() {
            Ok(address)
        } else {
            Err(TypeError::MalformedAddress(s.to_string()))
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Address::from_text(&text))
    }
}

/// Scoped push/pop over a shared address stack.
///
/// The comparator and applier thread one mutable [`Address`] through their
/// whole recursion; this guard guarantees the matching pop on every return
/// path, including early returns on error.
pub struct AddressScope<'a> {
    address: &'a mut Address,
}

impl<'a> AddressScope<'a> {
    pub fn push(address: &'a mut Address, element: AddressElement) -> Self {
        address.push(element);
        Self { address }
    }

    pub fn address(&mut self) -> &mut Address {
        self.address
    }
}

impl Drop for AddressScope<'_> {
    fn drop(&mut self) {
        self.address.pop();
    }
}
