//! Blocking facade over an [`ImageStore`].
//!
//! [`SecureObjectClient`] owns one connection and a private current-thread
//! runtime. Every call blocks the calling thread until the store answers or
//! the request deadline passes. It must not be used from inside another
//! tokio runtime.

use crate::client::{ChannelProvider, GrpcChannelProvider, ImageStore};
use crate::config::ClientConfig;
use crate::credentials::CredentialBundle;
use crate::error::{Error, Result};
use crate::grpc_client::GrpcImageStoreClient;
use crate::types::MemoryType;
use bytes::Bytes;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

/// A single authenticated connection to an ImageStore, used synchronously.
pub struct SecureObjectClient<S = GrpcImageStoreClient> {
    store: S,
    runtime: Runtime,
}

impl SecureObjectClient<GrpcImageStoreClient> {
    /// Load credentials per `config` and prepare a gRPC channel.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        Self::connect_with(config, &GrpcChannelProvider)
    }
}

impl<S: ImageStore> SecureObjectClient<S> {
    /// Load and validate credentials, then hand them to `provider`.
    ///
    /// Credential failures return before `provider` is invoked.
    pub fn connect_with<P>(config: &ClientConfig, provider: &P) -> Result<Self>
    where
        P: ChannelProvider<Store = S>,
    {
        let credentials = if config.dev_mode {
            warn!("DEV_MODE set, skipping client certificate authentication");
            None
        } else {
            let bundle = CredentialBundle::load(&config.credentials)?;
            bundle.validate()?;
            Some(bundle)
        };

        let runtime = new_runtime()?;
        let store = runtime.block_on(provider.connect(config, credentials.as_ref()))?;
        debug!(addr = %config.address(), "connected");

        Ok(Self { store, runtime })
    }

    /// Wrap an already connected store.
    pub fn from_store(store: S) -> Result<Self> {
        Ok(Self {
            store,
            runtime: new_runtime()?,
        })
    }

    pub fn read(&self, key: &str) -> Result<Bytes> {
        self.runtime.block_on(self.store.read(key))
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.runtime.block_on(self.store.remove(key))
    }

    pub fn store(&self, data: impl Into<Bytes>, memory_type: MemoryType) -> Result<String> {
        self.runtime
            .block_on(self.store.store(data.into(), memory_type))
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

fn new_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::TransportSetup(format!("failed to start runtime: {e}")))
}
