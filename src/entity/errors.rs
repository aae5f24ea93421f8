use thiserror::Error;

/// Errors that can arise while mutating or persisting a player entity.
#[derive(Debug, Error)]
pub enum EntityError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around JSON export/import errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// No active effect is registered under this name.
    #[error("effect not found: {0}")]
    UnknownEffect(String),

    /// Skill identifier is not part of the catalog.
    #[error("skill not found: {0}")]
    UnknownSkill(String),

    /// Feat identifier is not part of the catalog.
    #[error("feat not found: {0}")]
    UnknownFeat(String),

    /// Item uuid is not carried by the entity.
    #[error("item not carried: {0}")]
    ItemNotFound(uuid::Uuid),

    /// Password hashing or hash parsing failed.
    #[error("password error: {0}")]
    Password(String),
}
