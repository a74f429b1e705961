//! Auth module: domain types, credential store contract, password hashing,
//! token issuing and the `AuthService` that ties them together.
//!
//! Web framework concerns live in the server crate; everything here is
//! usable from tests, benches and other binaries directly.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use service::AuthService;
