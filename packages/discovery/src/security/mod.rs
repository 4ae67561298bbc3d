//! Credential handling.

pub mod credentials;

pub use credentials::{ReasonerCredentials, SecretString};
