//! Field-level stages of the loading pipeline.
//!
//! Both stages take the record by value and hand back a new one, so the raw,
//! migrated and opened records never alias.

use tracing::trace;

use crate::{
    error::LoadError,
    options::ProtectionMarker,
    protector::Protector,
    record::SensitiveFields,
};

/// A record after the seal stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed<T> {
    pub record: T,
    /// Fields that held plaintext and now hold `marker + ciphertext`.
    pub sealed_fields: usize,
}

impl<T> Sealed<T> {
    /// True when the record differs from what was parsed and must be persisted.
    pub fn changed(&self) -> bool {
        self.sealed_fields > 0
    }
}

/// Protect every sensitive field that does not already carry the marker.
///
/// Absent fields and marked fields are left untouched and never reach the protector.
pub fn seal_record<T, P>(
    mut record: T,
    marker: &ProtectionMarker,
    protector: &P,
) -> Result<Sealed<T>, LoadError>
where
    T: SensitiveFields,
    P: Protector + ?Sized,
{
    let mut sealed_fields = 0;
    for field in T::sensitive_fields() {
        let protected = match field.read(&record) {
            None => {
                trace!(field = field.name, "absent; skipped");
                continue;
            }
            Some(value) if marker.is_marked(value) => continue,
            Some(value) => protector
                .protect(value)
                .map_err(|source| LoadError::Crypto {
                    field: field.name,
                    source,
                })?,
        };
        record = field.write(record, marker.apply(&protected));
        sealed_fields += 1;
        trace!(field = field.name, "sealed");
    }
    Ok(Sealed {
        record,
        sealed_fields,
    })
}

/// Replace every marked sensitive field with its plaintext.
///
/// A value equal to the bare marker is still treated as protected, so the
/// protector sees an empty payload and rejects it.
pub fn open_record<T, P>(
    mut record: T,
    marker: &ProtectionMarker,
    protector: &P,
) -> Result<T, LoadError>
where
    T: SensitiveFields,
    P: Protector + ?Sized,
{
    for field in T::sensitive_fields() {
        let plaintext = match field.read(&record).and_then(|value| marker.strip(value)) {
            Some(ciphertext) => protector
                .unprotect(ciphertext)
                .map_err(|source| LoadError::Crypto {
                    field: field.name,
                    source,
                })?,
            None => continue,
        };
        record = field.write(record, plaintext);
    }
    Ok(record)
}
