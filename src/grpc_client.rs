use crate::client::ImageStore;
use crate::config::ClientConfig;
use crate::credentials::CredentialBundle;
use crate::error::{Error, Result};
use crate::types::{check_key, MemoryType, CHUNK_SIZE};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::{info, instrument, warn};

// Include the generated protobuf code
pub mod pb {
    include!("proto/ImageStore.rs");
}

use pb::is_client::IsClient;

/// gRPC client for the ImageStore `is` service
#[derive(Clone)]
pub struct GrpcImageStoreClient {
    client: IsClient<Channel>,
    request_timeout: Duration,
}

impl GrpcImageStoreClient {
    /// Prepare a mutually authenticated channel.
    ///
    /// The TLS handshake is deferred to the first RPC, so this succeeds
    /// without the server being reachable. The channel's worker task is
    /// spawned on the calling tokio runtime.
    pub async fn connect(config: &ClientConfig, credentials: &CredentialBundle) -> Result<Self> {
        let tls = ClientTlsConfig::new()
            .domain_name(config.tls_domain())
            .ca_certificate(Certificate::from_pem(credentials.root_ca()))
            .identity(Identity::from_pem(
                credentials.client_cert(),
                credentials.client_key(),
            ));

        let endpoint = endpoint(config)?.tls_config(tls)?;
        info!(addr = %config.address(), domain = config.tls_domain(), "prepared mTLS channel");

        Ok(Self::from_channel(
            endpoint.connect_lazy(),
            config.request_timeout(),
        ))
    }

    /// Prepare a plaintext channel without client certificates.
    pub async fn connect_insecure(config: &ClientConfig) -> Result<Self> {
        let endpoint = endpoint(config)?;
        warn!(addr = %config.address(), "dev mode: using an unsecured channel");

        Ok(Self::from_channel(
            endpoint.connect_lazy(),
            config.request_timeout(),
        ))
    }

    /// Wrap an existing channel.
    pub fn from_channel(channel: Channel, request_timeout: Duration) -> Self {
        Self {
            client: IsClient::new(channel),
            request_timeout,
        }
    }

    /// Read an object, concatenating the streamed chunks in arrival order
    #[instrument(skip(self), err)]
    pub async fn read(&self, key: &str) -> Result<Bytes> {
        check_key(key)?;
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(pb::ReadReq {
            read_keyname: key.to_string(),
        });
        request.set_timeout(self.request_timeout);

        self.with_deadline(async move {
            let mut stream = client.read(request).await?.into_inner();

            let mut data = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                data.extend_from_slice(&chunk.chunk);
            }
            Ok::<_, Error>(data.freeze())
        })
        .await
    }

    /// Store an object, streamed in chunks of at most [`CHUNK_SIZE`] bytes
    #[instrument(skip(self, data), fields(size = data.len()), err)]
    pub async fn store(&self, data: Bytes, memory_type: MemoryType) -> Result<String> {
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(futures::stream::iter(store_requests(
            &data,
            memory_type,
        )));
        request.set_timeout(self.request_timeout);

        let response = self
            .with_deadline(async move { Ok::<_, Error>(client.store(request).await?.into_inner()) })
            .await?;

        if response.store_keyname.is_empty() {
            return Err(Error::InvalidResponse(
                "store returned an empty key".to_string(),
            ));
        }
        Ok(response.store_keyname)
    }

    /// Remove an object
    #[instrument(skip(self), err)]
    pub async fn remove(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(pb::RemoveReq {
            rem_keyname: key.to_string(),
        });
        request.set_timeout(self.request_timeout);

        self.with_deadline(async move {
            client.remove(request).await?;
            Ok::<_, Error>(true)
        })
        .await
    }

    // Bounds the whole call, including the body of streamed responses.
    async fn with_deadline<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(tonic::Status::deadline_exceeded(format!(
                "no response within {:?}",
                self.request_timeout
            )))),
        }
    }
}

#[async_trait]
impl ImageStore for GrpcImageStoreClient {
    async fn read(&self, key: &str) -> Result<Bytes> {
        GrpcImageStoreClient::read(self, key).await
    }

    async fn store(&self, data: Bytes, memory_type: MemoryType) -> Result<String> {
        GrpcImageStoreClient::store(self, data, memory_type).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        GrpcImageStoreClient::remove(self, key).await
    }
}

fn endpoint(config: &ClientConfig) -> Result<Endpoint> {
    let endpoint = Channel::from_shared(config.endpoint_uri())
        .map_err(|e| Error::TransportSetup(format!("invalid endpoint {}: {e}", config.address())))?
        .connect_timeout(config.connect_timeout());
    Ok(endpoint)
}

// Every message carries the memory type; an empty payload still sends one
// message so the server learns it.
fn store_requests(data: &Bytes, memory_type: MemoryType) -> Vec<pb::StoreReq> {
    if data.is_empty() {
        return vec![pb::StoreReq {
            chunk: Vec::new(),
            memory_type: memory_type.to_string(),
        }];
    }

    data.chunks(CHUNK_SIZE)
        .map(|chunk| pb::StoreReq {
            chunk: chunk.to_vec(),
            memory_type: memory_type.to_string(),
        })
        .collect()
}
