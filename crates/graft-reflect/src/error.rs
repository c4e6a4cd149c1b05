use thiserror::Error;
use uuid::Uuid;

/// Errors produced by reflection queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReflectError {
    /// No class descriptor is registered for the given type id. Usually a
    /// registration bug in the host, not a data problem.
    #[error("class not registered: {0}")]
    ClassNotFound(Uuid),

    /// The class is registered but declares no factory, so instances of it
    /// cannot be created from a type id alone.
    #[error("class {0} has no factory")]
    FactoryMissing(Uuid),
}

/// Convenience alias for reflection results.
pub type ReflectResult<T> = Result<T, ReflectError>;
