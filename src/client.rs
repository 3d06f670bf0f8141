use crate::config::ClientConfig;
use crate::credentials::CredentialBundle;
use crate::error::Result;
use crate::grpc_client::GrpcImageStoreClient;
use crate::types::MemoryType;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for ImageStore operations
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Read the object stored under `key`
    async fn read(&self, key: &str) -> Result<Bytes>;

    /// Store `data` and return the key the store assigned to it
    async fn store(&self, data: Bytes, memory_type: MemoryType) -> Result<String>;

    /// Remove the object stored under `key`
    async fn remove(&self, key: &str) -> Result<bool>;
}

#[async_trait]
impl<S: ImageStore + ?Sized> ImageStore for Box<S> {
    async fn read(&self, key: &str) -> Result<Bytes> {
        (**self).read(key).await
    }

    async fn store(&self, data: Bytes, memory_type: MemoryType) -> Result<String> {
        (**self).store(data, memory_type).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key).await
    }
}

/// Produces a connected [`ImageStore`] for an endpoint.
///
/// `credentials` is `None` only in dev mode.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    type Store: ImageStore;

    async fn connect(
        &self,
        config: &ClientConfig,
        credentials: Option<&CredentialBundle>,
    ) -> Result<Self::Store>;
}

/// Connects over tonic, with mutual TLS unless dev mode is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcChannelProvider;

#[async_trait]
impl ChannelProvider for GrpcChannelProvider {
    type Store = GrpcImageStoreClient;

    async fn connect(
        &self,
        config: &ClientConfig,
        credentials: Option<&CredentialBundle>,
    ) -> Result<GrpcImageStoreClient> {
        match credentials {
            Some(credentials) => GrpcImageStoreClient::connect(config, credentials).await,
            None => GrpcImageStoreClient::connect_insecure(config).await,
        }
    }
}
