//! Client credentials for the print broker trust handshake
//!
//! The broker asks for our certificate, then for a signature over a
//! challenge it picked. The private key never leaves this crate: callers
//! only get [`TrustProvider::sign`].

mod credential;
mod crypto;
mod error;
mod trust;

pub use credential::Credential;
pub use crypto::{import_private_key, public_key_pem, sign_sha512, verify_sha512};
pub use error::{CertError, Result};
pub use trust::{SoftwareTrustProvider, TrustProvider};
