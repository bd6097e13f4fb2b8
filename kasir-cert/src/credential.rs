//! Client credential for the broker trust handshake.
//!
//! A certificate the broker pins plus the private key that proves we own
//! it. Credentials are provisioned per install (files or secret storage);
//! nothing is bundled with the client.

use crate::error::{CertError, Result};
use std::fmt;
use std::path::Path;

#[derive(Clone)]
pub struct Credential {
    certificate: String,
    private_key: String,
}

impl Credential {
    /// Creates a credential from in-memory PEM text.
    pub fn new(certificate: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    /// Loads the certificate and private key PEM files.
    ///
    /// The key is only read here, not parsed; a malformed key surfaces when
    /// the broker first asks for a signature.
    pub fn from_files(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let certificate = read_pem(cert_path.as_ref())?;
        let private_key = read_pem(key_path.as_ref())?;

        if certificate.trim().is_empty() {
            return Err(CertError::MissingCredential(format!(
                "certificate file is empty: {}",
                cert_path.as_ref().display()
            )));
        }
        if private_key.trim().is_empty() {
            return Err(CertError::MissingCredential(format!(
                "private key file is empty: {}",
                key_path.as_ref().display()
            )));
        }

        Ok(Self::new(certificate, private_key))
    }

    /// Returns the certificate PEM text.
    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CertError::Read {
        path: path.to_path_buf(),
        source,
    })
}
