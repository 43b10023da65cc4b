use std::{fs, io::Write, marker::PhantomData, path::Path};

use credseal_core::{
    error::{LoadError, ParseStage},
    loader::{LoadOutcome, RecordLoader},
    options::{ProtectionMarker, ProviderOptions},
    protector::{ProtectionProvider, Protector},
    record::SensitiveFields,
    sealing::{open_record, seal_record},
};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// JSON file whose sensitive fields are kept encrypted at rest.
///
/// Each load reads the file, protects any plaintext sensitive value, rewrites the
/// file once if something was protected, and returns the record decrypted. The
/// returned record is always parsed from the canonical text that is (or, when
/// nothing changed, would be) on disk.
///
/// A rewrite follows symlinks and keeps the file's permissions. Concurrent loads
/// of the same path are not coordinated; load once per path.
pub struct EncryptedJsonFile<T, P: Protector> {
    options: ProviderOptions,
    marker: ProtectionMarker,
    protector: P,
    _record: PhantomData<fn() -> T>,
}

impl<T, P: Protector> EncryptedJsonFile<T, P> {
    /// Validate the options and create a protector for their purpose.
    pub fn new<R>(options: ProviderOptions, provider: &R) -> Result<Self, LoadError>
    where
        R: ProtectionProvider<Protector = P>,
    {
        options.validate()?;
        let protector = provider
            .create_protector(&options.purpose)
            .map_err(|source| LoadError::Protector {
                purpose: options.purpose.clone(),
                source,
            })?;
        Self::with_protector(options, protector)
    }

    /// Use an already scoped protector. It must have been created for `options.purpose`.
    pub fn with_protector(options: ProviderOptions, protector: P) -> Result<Self, LoadError> {
        options.validate()?;
        let marker = options.marker();
        Ok(Self {
            options,
            marker,
            protector,
            _record: PhantomData,
        })
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    pub fn marker(&self) -> &ProtectionMarker {
        &self.marker
    }
}

impl<T, P> RecordLoader<T> for EncryptedJsonFile<T, P>
where
    T: SensitiveFields + Serialize + DeserializeOwned,
    P: Protector,
{
    #[instrument(skip_all, fields(path = %self.options.file_path.display()))]
    fn load_outcome(&self) -> Result<LoadOutcome<T>, LoadError> {
        let path = self.options.file_path.as_path();

        let contents = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        // Editors on Windows save UTF-8 with a byte-order mark.
        let raw_text = contents.strip_prefix('\u{feff}').unwrap_or(&contents);
        let raw: T = parse(raw_text, ParseStage::Raw)?;
        debug!(fields = ?T::sensitive_field_names(), "parsed raw record");

        let sealed = seal_record(raw, &self.marker, &self.protector)?;
        let canonical = serde_json::to_string_pretty(&sealed.record).map_err(|source| {
            LoadError::Format {
                stage: ParseStage::Final,
                source,
            }
        })?;

        let rewritten = if sealed.changed() {
            write_atomic(path, &canonical)?;
            info!(
                sealed_fields = sealed.sealed_fields,
                "protected plaintext fields and rewrote file"
            );
            true
        } else {
            debug!("all sensitive fields already protected; file untouched");
            false
        };

        let final_record: T = parse(&canonical, ParseStage::Final)?;
        let record = open_record(final_record, &self.marker, &self.protector)?;
        debug!("opened sensitive fields");

        Ok(LoadOutcome {
            record,
            sealed_fields: sealed.sealed_fields,
            rewritten,
        })
    }
}

fn parse<T: DeserializeOwned>(text: &str, stage: ParseStage) -> Result<T, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Format { stage, source })
}

/// Replace the file behind `path` through a temp file next to it, so readers see
/// either the old or the new content. Symlinks are followed and the target keeps
/// its permissions.
fn write_atomic(path: &Path, contents: &str) -> Result<(), LoadError> {
    let io_err = |e| LoadError::io(path, e);
    let target = fs::canonicalize(path).map_err(io_err)?;
    let permissions = fs::metadata(&target).map_err(io_err)?.permissions();
    let parent = target.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&target).map_err(|e| LoadError::io(path, e.error))?;
    Ok(())
}
