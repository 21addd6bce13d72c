//! Authentication system.
//!
//! Clients authenticate with a JWT carried in `Authorization: Bearer <token>`.
//! Tokens are minted on register/login, expire after an hour, and identify the
//! user by id; every protected handler receives the resolved account through
//! the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor resolving the bearer token to a user
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Token creation and verification

pub mod current_user;
pub mod password;
pub mod session;
