//! Error types for the patch engine.

use uuid::Uuid;

use graft_reflect::ReflectError;

/// Hard failures of patch creation or application. Per-field problems
/// (type mismatches, undecodable legacy entries) are diagnostics, not
/// errors: the affected field degrades and siblings continue.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The root instance's class has no descriptor, so no tree can be
    /// built over it.
    #[error("class not registered: {0}")]
    UnregisteredClass(Uuid),

    /// A stored patch entry's address is empty or invalid after the
    /// upgrade pass; it cannot be anchored to any tree position and the
    /// whole patch is rejected without touching the source.
    #[error("patch entry cannot be anchored: address {0:?} is empty or invalid")]
    UnanchoredEntry(String),

    /// Reflection collaborator failure.
    #[error("reflection error: {0}")]
    Reflect(#[from] ReflectError),
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
