//! Client-certificate credentials for the mutually authenticated channel.

use crate::error::{Error, Result};
use rustls_pemfile::Item;
use serde::{Deserialize, Serialize};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_ROOT_CA: &str = "/etc/ssl/ca/ca_certificate.pem";
pub const DEFAULT_CLIENT_CERT: &str = "/etc/ssl/imagestore/imagestore_client_certificate.pem";
pub const DEFAULT_CLIENT_KEY: &str = "/etc/ssl/imagestore/imagestore_client_key.pem";

/// Where the three PEM files of a [`CredentialBundle`] live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPaths {
    pub root_ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self {
            root_ca: PathBuf::from(DEFAULT_ROOT_CA),
            client_cert: PathBuf::from(DEFAULT_CLIENT_CERT),
            client_key: PathBuf::from(DEFAULT_CLIENT_KEY),
        }
    }
}

/// Root CA, client certificate and client private key, PEM encoded.
///
/// The bundle is only needed while the channel is being set up; the
/// transport keeps its own parsed copy afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    root_ca: Vec<u8>,
    client_cert: Vec<u8>,
    client_key: Vec<u8>,
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("root_ca", &format_args!("{} bytes", self.root_ca.len()))
            .field("client_cert", &format_args!("{} bytes", self.client_cert.len()))
            .field("client_key", &"<redacted>")
            .finish()
    }
}

impl CredentialBundle {
    /// Build a bundle from material already in memory.
    pub fn from_pem(
        root_ca: impl Into<Vec<u8>>,
        client_cert: impl Into<Vec<u8>>,
        client_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            root_ca: root_ca.into(),
            client_cert: client_cert.into(),
            client_key: client_key.into(),
        }
    }

    /// Read all three files. The first unreadable or empty file aborts the load.
    pub fn load(paths: &CredentialPaths) -> Result<Self> {
        Ok(Self {
            root_ca: read_credential(&paths.root_ca)?,
            client_cert: read_credential(&paths.client_cert)?,
            client_key: read_credential(&paths.client_key)?,
        })
    }

    /// Check that each buffer holds the PEM items the TLS transport needs.
    pub fn validate(&self) -> Result<()> {
        let ca_certs = count_items(&self.root_ca, "root CA", |item| {
            matches!(item, Item::X509Certificate(_))
        })?;
        if ca_certs == 0 {
            return Err(Error::TransportSetup(
                "root CA contains no PEM certificate".to_string(),
            ));
        }

        let client_certs = count_items(&self.client_cert, "client certificate", |item| {
            matches!(item, Item::X509Certificate(_))
        })?;
        if client_certs == 0 {
            return Err(Error::TransportSetup(
                "client certificate contains no PEM certificate".to_string(),
            ));
        }

        let keys = count_items(&self.client_key, "client key", |item| {
            matches!(item, Item::RSAKey(_) | Item::PKCS8Key(_) | Item::ECKey(_))
        })?;
        if keys == 0 {
            return Err(Error::TransportSetup(
                "client key contains no PEM private key".to_string(),
            ));
        }

        Ok(())
    }

    pub fn root_ca(&self) -> &[u8] {
        &self.root_ca
    }

    pub fn client_cert(&self) -> &[u8] {
        &self.client_cert
    }

    pub fn client_key(&self) -> &[u8] {
        &self.client_key
    }
}

fn read_credential(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path).map_err(|source| Error::CredentialLoad {
        path: path.to_path_buf(),
        source,
    })?;
    if data.is_empty() {
        return Err(Error::CredentialLoad {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "file is empty"),
        });
    }
    debug!(path = %path.display(), bytes = data.len(), "loaded credential");
    Ok(data)
}

fn count_items<F>(pem: &[u8], what: &str, wanted: F) -> Result<usize>
where
    F: Fn(&Item) -> bool,
{
    let mut reader = BufReader::new(pem);
    let items = rustls_pemfile::read_all(&mut reader)
        .map_err(|e| Error::TransportSetup(format!("malformed {what}: {e}")))?;
    Ok(items.iter().filter(|item| wanted(item)).count())
}
