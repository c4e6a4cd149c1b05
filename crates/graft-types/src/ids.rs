//! Identity helpers shared across the workspace.

/// Sentinel class version meaning "unknown / not versioned".
pub const UNKNOWN_VERSION: u32 = u32::MAX;

/// Stable hash of a field name, used as the numeric identity of struct
/// fields inside patch addresses.
///
/// CRC32 is deliberately narrow: the hash only has to be stable across
/// builds and unique within one class's field list, and patches persisted
/// with it must keep resolving forever.
pub fn field_name_hash(name: &str) -> u64 {
    u64::from(crc32fast::hash(name.as_bytes()))
}
