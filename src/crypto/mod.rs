//! Credential and session-token primitives.

pub mod password;
pub mod token;

pub use password::{CredentialCodec, CredentialError};
pub use token::{Claims, TokenCodec, TokenError};
