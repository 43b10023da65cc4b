//! Concrete loaders and protectors for encrypted JSON files.
//! Uses AES-GCM with keys sourced from the OS keyring (or test doubles).

pub mod aead_protector;
pub mod credential;
pub mod json_file;
pub mod key_provider;
