//! Core contracts for Credseal: sensitive-field records, the protector capability,
//! provider options and the pure seal/open stages of the loading pipeline.
//! This crate does no file I/O and carries no real cryptography.

pub mod error;
pub mod loader;
pub mod options;
pub mod protector;
pub mod record;
pub mod sealing;
