//! Authorization header factories, the OAuth 2.0 client-credentials token cache, and the registry of
//! authentication methods.

pub mod client_credentials;
pub mod header;
pub mod methods;
pub mod secret;
pub mod token;

pub use client_credentials::*;
pub use header::*;
pub use methods::*;
pub use secret::*;
pub use token::*;
