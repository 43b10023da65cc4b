use credseal_core::{
    error::LoadError,
    loader::{CredentialLoader, RecordLoader},
    options::ProviderOptions,
    protector::{ProtectionProvider, Protector},
    record::Credential,
};

use crate::json_file::EncryptedJsonFile;

/// Credential facade over any record loader for [`Credential`].
pub struct CredentialFile<L> {
    inner: L,
}

impl<L: RecordLoader<Credential>> CredentialFile<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<P: Protector> CredentialFile<EncryptedJsonFile<Credential, P>> {
    /// Credential stored in an encrypted JSON file described by `options`.
    pub fn open<R>(options: ProviderOptions, provider: &R) -> Result<Self, LoadError>
    where
        R: ProtectionProvider<Protector = P>,
    {
        EncryptedJsonFile::new(options, provider).map(Self::new)
    }
}

impl<L: RecordLoader<Credential>> CredentialLoader for CredentialFile<L> {
    fn load(&self) -> Result<Credential, LoadError> {
        self.inner.load()
    }
}
