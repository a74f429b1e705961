//! Service layer for credential issuance.
//! - Keeps auth business rules out of the HTTP layer.
//! - Reuses validation and entity definitions from the `models` crate.
//! - Exposes the credential store as a trait so storage can be swapped.

pub mod auth;
