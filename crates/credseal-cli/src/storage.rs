use crate::config::Config;
use credseal_storage::{aead_protector::AesGcmProtectionProvider, key_provider::KeyringProvider};
use tracing::debug;

/// Build an AES-GCM protection provider keyed from the OS keychain.
pub fn provider_from_config(config: &Config) -> AesGcmProtectionProvider<KeyringProvider> {
    let service = config.keyring_service();
    let account = config.keyring_account();
    debug!(service, account, "initializing keyring-backed protector");
    AesGcmProtectionProvider::new(KeyringProvider::new(service, account))
}

/// Helper for tests: a real AES-GCM provider with an in-memory key.
#[cfg(test)]
pub fn test_provider(
) -> AesGcmProtectionProvider<credseal_storage::key_provider::InMemoryKeyProvider> {
    AesGcmProtectionProvider::new(credseal_storage::key_provider::InMemoryKeyProvider::default())
}
