use crate::{error::LoadError, record::Credential};

/// Result of a single load, with what the load did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome<T> {
    /// Record with every sensitive field decrypted.
    pub record: T,
    /// Fields that were plaintext on disk before this load.
    pub sealed_fields: usize,
    /// Whether the file was rewritten. Never true when `sealed_fields` is zero.
    pub rewritten: bool,
}

/// Loads a record whose sensitive fields are encrypted at rest.
pub trait RecordLoader<T> {
    /// Load, migrating plaintext sensitive fields on disk first if any are found.
    fn load_outcome(&self) -> Result<LoadOutcome<T>, LoadError>;

    fn load(&self) -> Result<T, LoadError> {
        self.load_outcome().map(|outcome| outcome.record)
    }
}

/// Access to a credential stored with an encrypted password.
pub trait CredentialLoader {
    fn load(&self) -> Result<Credential, LoadError>;
}
