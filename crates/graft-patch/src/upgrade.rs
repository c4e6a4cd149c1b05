//! Versioned patch upgrading and migration of the legacy patch format.

use uuid::Uuid;

use graft_types::{Address, CapturedValue, PatchMap, UNKNOWN_VERSION};

/// Rewrites patch entries recorded under older class versions before they
/// are anchored to the current tree.
///
/// The applier runs every stored entry through the upgrader, in entry
/// order, before validating addresses. Implementations may rewrite the
/// address (renamed fields, re-keyed elements), the value, or both; an
/// entry left untouched passes through unchanged.
pub trait PatchUpgrader {
    fn upgrade_entry(
        &self,
        target_class_id: Uuid,
        target_class_version: u32,
        address: &mut Address,
        value: &mut CapturedValue,
    );
}

/// The identity upgrader: every entry passes through unchanged.
pub struct NoopUpgrader;

impl PatchUpgrader for NoopUpgrader {
    fn upgrade_entry(
        &self,
        _target_class_id: Uuid,
        _target_class_version: u32,
        _address: &mut Address,
        _value: &mut CapturedValue,
    ) {
    }
}

/// Convert entries from the old patch format, where addresses were flat
/// runs of numeric ids and values were raw serialized blobs.
///
/// An empty blob was the old removal marker. Non-empty blobs become
/// legacy streams tagged with the unknown version; decoding them needs a
/// destination type and happens at apply time, where a failure degrades
/// that one entry instead of the migration.
pub fn migrate_legacy_patch(entries: &[(Vec<u64>, Vec<u8>)]) -> PatchMap {
    let mut patch = PatchMap::new();
    for (ids, bytes) in entries {
        let address = Address::from_legacy_ids(ids);
        let value = if bytes.is_empty() {
            CapturedValue::Empty
        } else {
            CapturedValue::LegacyStream {
                version: UNKNOWN_VERSION,
                bytes: bytes.clone(),
            }
        };
        patch.insert(address, value);
    }
    patch
}
