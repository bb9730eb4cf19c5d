//! Authentication for partner accounts
//!
//! Provides:
//! - Password hashing with Argon2
//! - JWT session tokens issued at login

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
