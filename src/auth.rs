//! Credential sources: the OAuth 2.0 client-credentials provider, static header providers, and
//! the redacting secret wrapper they share.

pub mod client_credentials;
pub mod secret;
pub mod token_header;

pub use client_credentials::*;
pub use secret::*;
pub use token_header::*;
