//! Authentication module
//!
//! `token` verifies bearer credentials against the shared secret;
//! `gate` decides per request whether the caller may proceed and with
//! what identity.

pub mod gate;
pub mod token;

pub use gate::AuthContext;
pub use token::{Identity, TokenVerifier, VerificationError};
