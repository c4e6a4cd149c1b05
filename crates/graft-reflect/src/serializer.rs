//! The leaf serializer capability: binary round-trip and comparison of
//! primitive values.

use graft_types::LeafValue;

/// Save/load/compare for a leaf class's values.
///
/// The engine copies leaves by round-tripping them through `save`/`load`
/// rather than cloning, so serializers with canonicalizing semantics
/// (clamping, normalization) see their rules applied on every copy.
pub trait ValueSerializer: Send + Sync {
    /// Append the serialized form of `value` to `out`. Returns `false` if
    /// the value cannot be represented by this serializer.
    fn save(&self, value: &LeafValue, out: &mut Vec<u8>) -> bool;

    /// Decode a value previously produced by `save`. `version` is the
    /// class version the bytes were written under; implementations that
    /// changed encodings branch on it.
    fn load(&self, data: &[u8], version: u32) -> Option<LeafValue>;

    /// Whether two raw values count as equal for diffing purposes. The
    /// default compares serialized bytes.
    fn compare(&self, a: &LeafValue, b: &LeafValue) -> bool {
        let mut bytes_a = Vec::new();
        let mut bytes_b = Vec::new();
        self.save(a, &mut bytes_a) && self.save(b, &mut bytes_b) && bytes_a == bytes_b
    }
}

/// The standard serializer: bincode encoding, byte-equality comparison.
pub struct BincodeSerializer;

impl ValueSerializer for BincodeSerializer {
    fn save(&self, value: &LeafValue, out: &mut Vec<u8>) -> bool {
        match bincode::serialize(value) {
            Ok(bytes) => {
                out.extend_from_slice(&bytes);
                true
            }
            Err(_) => false,
        }
    }

    fn load(&self, data: &[u8], _version: u32) -> Option<LeafValue> {
        bincode::deserialize(data).ok()
    }
}
