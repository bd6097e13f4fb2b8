use crate::credential::Credential;
use crate::crypto;
use crate::error::Result;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

/// Answers the broker's trust requests
///
/// Callers never see the private key; they can only ask for the certificate
/// or for a signature over a challenge.
#[async_trait]
pub trait TrustProvider: Send + Sync {
    /// Certificate presented to the broker (PEM text)
    async fn certificate(&self) -> String;

    /// Sign the UTF-8 bytes of `challenge`, returning the signature base64-encoded
    async fn sign(&self, challenge: &str) -> Result<String>;
}

/// Signs with an RSA key held in process memory
///
/// The key is imported on every signature, so a bad key fails the handshake
/// that needed it rather than construction.
pub struct SoftwareTrustProvider {
    credential: Credential,
}

impl SoftwareTrustProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl TrustProvider for SoftwareTrustProvider {
    async fn certificate(&self) -> String {
        self.credential.certificate().to_string()
    }

    async fn sign(&self, challenge: &str) -> Result<String> {
        let sig = crypto::sign_sha512(self.credential.private_key(), challenge.as_bytes())
            .inspect_err(|e| warn!(target: "security", error = %e, "challenge signing failed"))?;
        debug!(challenge_len = challenge.len(), "challenge signed");
        Ok(STANDARD.encode(sig))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CertError;
    use rsa::RsaPrivateKey;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    #[tokio::test]
    async fn test_sign_returns_verifiable_base64() {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
        let public = crypto::public_key_pem(&pem).unwrap();

        let provider = SoftwareTrustProvider::new(Credential::new("CERT", pem));
        assert_eq!(provider.certificate().await, "CERT");

        let sig_b64 = provider.sign("hello broker").await.unwrap();
        let sig = STANDARD.decode(sig_b64).unwrap();
        crypto::verify_sha512(&public, "hello broker".as_bytes(), &sig).unwrap();
    }

    #[tokio::test]
    async fn test_bad_key_fails_at_sign_time() {
        let provider = SoftwareTrustProvider::new(Credential::new("CERT", "garbage"));
        assert_eq!(provider.certificate().await, "CERT");
        assert!(matches!(
            provider.sign("x").await,
            Err(CertError::InvalidKey(_))
        ));
    }
}
