//! Bridge configuration

use crate::error::{BridgeError, BridgeResult};
use shared::PaperWidth;
use std::path::PathBuf;
use std::time::Duration;

/// Print bridge configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | KASIR_BROKER_ADDR | 127.0.0.1:8182 | broker TCP address |
/// | KASIR_BROKER_CERT | - | certificate PEM path |
/// | KASIR_BROKER_KEY | - | private key PEM path |
/// | KASIR_CONNECT_TIMEOUT_MS | 10000 | connect bound, 0 disables |
/// | KASIR_REQUEST_TIMEOUT_MS | 15000 | per-request bound |
/// | KASIR_PAPER_WIDTH | 80 | default paper width (58 / 80) |
/// | LOG_LEVEL | info | log level |
/// | LOG_JSON | false | JSON log output |
/// | KASIR_LOG_DIR | - | directory for rolling log files |
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub broker_addr: String,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// `None` waits for the broker indefinitely
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub paper_width: PaperWidth,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

pub const DEFAULT_BROKER_ADDR: &str = "127.0.0.1:8182";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

impl BridgeConfig {
    /// Load from the environment, falling back to defaults
    ///
    /// Unparseable numbers fall back to their defaults; an invalid paper
    /// width is an error.
    pub fn from_env() -> BridgeResult<Self> {
        let connect_timeout_ms = std::env::var("KASIR_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);
        let request_timeout_ms = std::env::var("KASIR_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let paper_width = match std::env::var("KASIR_PAPER_WIDTH") {
            Ok(v) => v
                .parse::<PaperWidth>()
                .map_err(|e| BridgeError::Config(format!("KASIR_PAPER_WIDTH: {}", e)))?,
            Err(_) => PaperWidth::default(),
        };

        Ok(Self {
            broker_addr: std::env::var("KASIR_BROKER_ADDR")
                .unwrap_or_else(|_| DEFAULT_BROKER_ADDR.into()),
            cert_path: std::env::var_os("KASIR_BROKER_CERT").map(PathBuf::from),
            key_path: std::env::var_os("KASIR_BROKER_KEY").map(PathBuf::from),
            connect_timeout: timeout_from_ms(connect_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            paper_width,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var_os("KASIR_LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn with_broker_addr(mut self, addr: impl Into<String>) -> Self {
        self.broker_addr = addr.into();
        self
    }

    /// Certificate and private key PEM files for the trust handshake
    pub fn with_credential_files(
        mut self,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.cert_path = Some(cert_path.into());
        self.key_path = Some(key_path.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_paper_width(mut self, paper_width: PaperWidth) -> Self {
        self.paper_width = paper_width;
        self
    }

    /// Both credential paths, or neither
    pub fn credential_paths(&self) -> BridgeResult<Option<(&PathBuf, &PathBuf)>> {
        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => Ok(Some((cert, key))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(BridgeError::Config(
                "KASIR_BROKER_CERT is set but KASIR_BROKER_KEY is missing".into(),
            )),
            (None, Some(_)) => Err(BridgeError::Config(
                "KASIR_BROKER_KEY is set but KASIR_BROKER_CERT is missing".into(),
            )),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            broker_addr: DEFAULT_BROKER_ADDR.into(),
            cert_path: None,
            key_path: None,
            connect_timeout: timeout_from_ms(DEFAULT_CONNECT_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            paper_width: PaperWidth::default(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }
}

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.broker_addr, "127.0.0.1:8182");
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.paper_width, PaperWidth::Mm80);
        assert!(config.credential_paths().unwrap().is_none());
    }

    #[test]
    fn test_zero_timeout_disables() {
        assert_eq!(timeout_from_ms(0), None);
        assert_eq!(timeout_from_ms(250), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_half_credential_is_error() {
        let mut config = BridgeConfig::default();
        config.cert_path = Some("cert.pem".into());
        assert!(matches!(
            config.credential_paths(),
            Err(BridgeError::Config(_))
        ));

        let config = config.with_credential_files("cert.pem", "key.pem");
        assert!(config.credential_paths().unwrap().is_some());
    }

    #[test]
    fn test_builder() {
        let config = BridgeConfig::default()
            .with_broker_addr("10.0.0.5:9000")
            .with_connect_timeout(None)
            .with_paper_width(PaperWidth::Mm58);
        assert_eq!(config.broker_addr, "10.0.0.5:9000");
        assert!(config.connect_timeout.is_none());
        assert_eq!(config.paper_width, PaperWidth::Mm58);
    }
}
