//! Client configuration.
//!
//! A [`ClientConfig`] names the endpoint, where the credential bundle is read
//! from, and the deadlines applied to the channel. It is built from defaults,
//! optionally a JSON file named by `IMAGESTORE_CONFIG`, and then environment
//! overrides.

use crate::credentials::CredentialPaths;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 50055;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Settings needed to reach one ImageStore endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Server name checked against the server certificate. Defaults to `host`.
    pub tls_domain: Option<String>,
    pub credentials: CredentialPaths,
    /// Deadline applied to every RPC.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Plaintext channel without client certificates. Development only.
    pub dev_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls_domain: None,
            credentials: CredentialPaths::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            dev_mode: false,
        }
    }
}

impl ClientConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Build the config from `IMAGESTORE_CONFIG` (if set) and the process environment.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var_os("IMAGESTORE_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("IMAGESTORE_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("IMAGESTORE_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Configuration(format!("invalid IMAGESTORE_PORT: {port}")))?;
        }
        if let Some(domain) = lookup("IMAGESTORE_TLS_DOMAIN") {
            self.tls_domain = Some(domain);
        }
        if let Some(path) = lookup("IMAGESTORE_CA_CERT") {
            self.credentials.root_ca = PathBuf::from(path);
        }
        if let Some(path) = lookup("IMAGESTORE_CLIENT_CERT") {
            self.credentials.client_cert = PathBuf::from(path);
        }
        if let Some(path) = lookup("IMAGESTORE_CLIENT_KEY") {
            self.credentials.client_key = PathBuf::from(path);
        }
        if let Some(ms) = lookup("IMAGESTORE_TIMEOUT_MS") {
            self.request_timeout_ms = parse_millis("IMAGESTORE_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("IMAGESTORE_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = parse_millis("IMAGESTORE_CONNECT_TIMEOUT_MS", &ms)?;
        }
        if let Some(mode) = lookup("DEV_MODE") {
            self.dev_mode = parse_bool(&mode)
                .ok_or_else(|| Error::Configuration(format!("invalid DEV_MODE: {mode}")))?;
        }
        Ok(self)
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URI handed to the transport; `https` unless in dev mode.
    pub fn endpoint_uri(&self) -> String {
        let scheme = if self.dev_mode { "http" } else { "https" };
        format!("{}://{}", scheme, self.address())
    }

    pub fn tls_domain(&self) -> &str {
        self.tls_domain.as_deref().unwrap_or(&self.host)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn parse_millis(name: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(Error::Configuration(format!("invalid {name}: {value}"))),
    }
}

// Accepts the same spellings as Go's strconv.ParseBool.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.address(), "localhost:50055");
        assert_eq!(config.endpoint_uri(), "https://localhost:50055");
        assert_eq!(config.tls_domain(), "localhost");
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default()
            .with_overrides(lookup_from(&[
                ("IMAGESTORE_HOST", "imagestore"),
                ("IMAGESTORE_PORT", "6000"),
                ("IMAGESTORE_TLS_DOMAIN", "ia_imagestore"),
                ("IMAGESTORE_CA_CERT", "/tmp/ca.pem"),
                ("IMAGESTORE_TIMEOUT_MS", "250"),
            ]))
            .unwrap();

        assert_eq!(config.endpoint_uri(), "https://imagestore:6000");
        assert_eq!(config.tls_domain(), "ia_imagestore");
        assert_eq!(config.credentials.root_ca, PathBuf::from("/tmp/ca.pem"));
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_dev_mode_uses_plaintext_scheme() {
        let config = ClientConfig::default()
            .with_overrides(lookup_from(&[("DEV_MODE", "true")]))
            .unwrap();
        assert!(config.dev_mode);
        assert_eq!(config.endpoint_uri(), "http://localhost:50055");
    }

    #[test]
    fn test_invalid_overrides() {
        let err = ClientConfig::default()
            .with_overrides(lookup_from(&[("IMAGESTORE_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ClientConfig::default()
            .with_overrides(lookup_from(&[("DEV_MODE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ClientConfig::default()
            .with_overrides(lookup_from(&[("IMAGESTORE_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "10.0.0.7", "credentials": {{"client_key": "/keys/client.pem"}}}}"#)
            .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.credentials.client_key, PathBuf::from("/keys/client.pem"));
        assert_eq!(config.credentials.root_ca, CredentialPaths::default().root_ca);
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(Error::Serialization(_))
        ));
    }
}
