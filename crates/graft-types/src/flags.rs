//! Per-address override-control annotations and their inheritance rules.
//!
//! Flags come in `SET_*` / `EFFECT_*` pairs: a Set bit is declared
//! directly against an address, an Effect bit is active at that address
//! and everything below it. Two independent [`FlagsMap`]s exist per diff —
//! one anchored to the source instance, one to the target — because
//! overrides may be declared on either side.

use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A bitset of per-address patch annotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchFlags(u8);

impl PatchFlags {
    pub const NONE: Self = Self(0);

    /// Differences at or below this address must never be captured.
    pub const SET_PREVENT_OVERRIDE: Self = Self(1);
    /// Values at or below this address are captured even when equal.
    pub const SET_FORCE_OVERRIDE: Self = Self(1 << 1);
    /// This address should be hidden from presentation layers.
    pub const SET_HIDE_PROPERTY: Self = Self(1 << 2);

    pub const EFFECT_PREVENT_OVERRIDE: Self = Self(1 << 4);
    pub const EFFECT_FORCE_OVERRIDE: Self = Self(1 << 5);
    pub const EFFECT_HIDE_PROPERTY: Self = Self(1 << 6);

    const EFFECT_MASK: Self = Self(0b0111_0000);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Only the inherited half of the bitset.
    pub fn effect_only(self) -> Self {
        Self(self.0 & Self::EFFECT_MASK.0)
    }

    pub fn prevents_override(self) -> bool {
        self.contains(Self::EFFECT_PREVENT_OVERRIDE)
    }

    pub fn forces_override(self) -> bool {
        self.contains(Self::EFFECT_FORCE_OVERRIDE)
    }

    pub fn hides_property(self) -> bool {
        self.contains(Self::EFFECT_HIDE_PROPERTY)
    }
}

impl BitOr for PatchFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PatchFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Explicit annotations recorded against one instance, keyed by address.
pub type FlagsMap = HashMap<Address, PatchFlags>;

/// Effective flags at `address`, given the flags computed for its parent.
///
/// Inheritance is monotonic: effect bits of the parent always carry down.
/// PreventOverride and HideProperty take effect at the address they are
/// set on (from the source-side map), and a target-side ForceOverride Set
/// derives a ForceOverride Effect active at-and-below this address. Raw
/// target-side bits are kept alongside the derived effects.
pub fn calculate_flags_at_address(
    source_map: &FlagsMap,
    target_map: &FlagsMap,
    parent_flags: PatchFlags,
    address: &Address,
) -> PatchFlags {
    let mut flags = parent_flags.effect_only();

    if let Some(&source) = source_map.get(address) {
        if source.contains(PatchFlags::SET_PREVENT_OVERRIDE)
            || source.contains(PatchFlags::EFFECT_PREVENT_OVERRIDE)
        {
            flags |= PatchFlags::EFFECT_PREVENT_OVERRIDE;
        }
        if source.contains(PatchFlags::SET_HIDE_PROPERTY)
            || source.contains(PatchFlags::EFFECT_HIDE_PROPERTY)
        {
            flags |= PatchFlags::EFFECT_HIDE_PROPERTY;
        }
    }

    if let Some(&target) = target_map.get(address) {
        flags |= target;
        if target.contains(PatchFlags::SET_FORCE_OVERRIDE) {
            flags |= PatchFlags::EFFECT_FORCE_OVERRIDE;
        }
    }

    flags
}
