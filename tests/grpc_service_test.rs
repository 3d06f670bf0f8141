//! Drives `GrpcImageStoreClient` against an in-memory `ImageStore.is`
//! server over a duplex pipe, so every call crosses real gRPC framing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use imagestore_client::grpc_client::pb::{
    self,
    is_server::{Is, IsServer},
};
use imagestore_client::{
    driver::{self, Invocation},
    ChannelProvider, ClientConfig, CredentialBundle, Error, GrpcImageStoreClient, MemoryType,
    SecureObjectClient, CHUNK_SIZE,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::transport::{Endpoint, Server, Uri};
use tonic::{Request, Response, Status, Streaming};

// Server-side chunk size for Read responses, small so short payloads span
// several messages.
const READ_CHUNK: usize = 4;

#[derive(Default)]
struct MemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    // Memory type of every StoreReq message received, in order.
    store_messages: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl MemoryImageStore {
    fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl Is for MemoryImageStore {
    type ReadStream = BoxStream<'static, Result<pb::ReadResp, Status>>;

    async fn read(&self, request: Request<pb::ReadReq>) -> Result<Response<Self::ReadStream>, Status> {
        let key = request.into_inner().read_keyname;
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("{key} does not exist")))?;

        let chunks: Vec<Result<pb::ReadResp, Status>> = data
            .chunks(READ_CHUNK)
            .map(|chunk| {
                Ok(pb::ReadResp {
                    chunk: chunk.to_vec(),
                })
            })
            .collect();
        let responses: Self::ReadStream = Box::pin(stream::iter(chunks));
        Ok(Response::new(responses))
    }

    async fn store(
        &self,
        request: Request<Streaming<pb::StoreReq>>,
    ) -> Result<Response<pb::StoreResp>, Status> {
        let mut messages = request.into_inner();
        let mut data = Vec::new();
        let mut memory_type = String::new();

        while let Some(message) = messages.message().await? {
            data.extend_from_slice(&message.chunk);
            self.store_messages
                .lock()
                .unwrap()
                .push(message.memory_type.clone());
            memory_type = message.memory_type;
        }

        let prefix = match memory_type.as_str() {
            "inmemory" => "inmem",
            "persistent" => "persist",
            other => return Err(Status::invalid_argument(format!("bad memory type {other}"))),
        };
        let key = format!("{prefix}_{:08x}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.insert(&key, &data);

        Ok(Response::new(pb::StoreResp { store_keyname: key }))
    }

    async fn remove(&self, request: Request<pb::RemoveReq>) -> Result<Response<pb::RemoveResp>, Status> {
        let key = request.into_inner().rem_keyname;
        match self.objects.lock().unwrap().remove(&key) {
            Some(_) => Ok(Response::new(pb::RemoveResp {})),
            None => Err(Status::not_found(format!("{key} does not exist"))),
        }
    }
}

/// Serves `store` on one end of a duplex pipe and returns a client on the other.
async fn connect_in_process(store: Arc<MemoryImageStore>) -> GrpcImageStoreClient {
    let (left, right) = tokio::io::duplex(64 * 1024);

    // The server accepts exactly one connection: the left side.
    tokio::spawn(async move {
        Server::builder()
            .add_service(IsServer::from_arc(store))
            .serve_with_incoming(tokio_stream::once(Ok::<_, std::io::Error>(left)))
            .await
    });

    // The URI is unused.
    let mut maybe_right = Some(right);
    let channel = Endpoint::try_from("http://[::]:50051")
        .unwrap()
        .connect_with_connector(tower::service_fn(move |_: Uri| {
            let right = maybe_right.take();
            async move {
                right.ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "duplex already taken")
                })
            }
        }))
        .await
        .unwrap();

    GrpcImageStoreClient::from_channel(channel, Duration::from_secs(10))
}

#[tokio::test]
async fn test_read_concatenates_streamed_chunks() {
    let store = Arc::new(MemoryImageStore::default());
    store.insert("inmem_335afcab", b"a frame spanning several chunks");
    let client = connect_in_process(store).await;

    let data = client.read("inmem_335afcab").await.unwrap();
    assert_eq!(data, Bytes::from_static(b"a frame spanning several chunks"));
}

#[tokio::test]
async fn test_read_missing_key_is_object_not_found() {
    let client = connect_in_process(Arc::default()).await;

    let result = client.read("inmem_00000000").await;
    match result {
        Err(Error::ObjectNotFound(message)) => assert!(message.contains("inmem_00000000")),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_sends_memory_type_with_every_chunk() {
    let store = Arc::new(MemoryImageStore::default());
    let client = connect_in_process(store.clone()).await;

    let data: Bytes = (0..CHUNK_SIZE * 2 + 5)
        .map(|i| (i % 251) as u8)
        .collect::<Vec<u8>>()
        .into();
    let key = client.store(data.clone(), MemoryType::Persistent).await.unwrap();

    assert!(key.starts_with("persist_"), "unexpected key {key}");
    assert_eq!(
        *store.store_messages.lock().unwrap(),
        vec!["persistent".to_string(); 3]
    );
    assert_eq!(client.read(&key).await.unwrap(), data);
}

#[tokio::test]
async fn test_store_empty_payload() {
    let store = Arc::new(MemoryImageStore::default());
    let client = connect_in_process(store.clone()).await;

    let key = client.store(Bytes::new(), MemoryType::InMemory).await.unwrap();

    assert!(key.starts_with("inmem_"), "unexpected key {key}");
    assert_eq!(*store.store_messages.lock().unwrap(), vec!["inmemory".to_string()]);
    assert!(client.read(&key).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_returns_true_then_not_found() {
    let store = Arc::new(MemoryImageStore::default());
    store.insert("inmem_335afcab", b"frame");
    let client = connect_in_process(store.clone()).await;

    assert!(client.remove("inmem_335afcab").await.unwrap());
    assert!(!store.contains("inmem_335afcab"));

    let result = client.remove("inmem_335afcab").await;
    assert!(matches!(result, Err(Error::ObjectNotFound(_))), "{result:?}");
    let result = client.read("inmem_335afcab").await;
    assert!(matches!(result, Err(Error::ObjectNotFound(_))), "{result:?}");
}

// Hands out in-process clients, standing in for the TLS provider.
struct InProcessProvider {
    store: Arc<MemoryImageStore>,
}

#[async_trait]
impl ChannelProvider for InProcessProvider {
    type Store = GrpcImageStoreClient;

    async fn connect(
        &self,
        _config: &ClientConfig,
        _credentials: Option<&CredentialBundle>,
    ) -> imagestore_client::Result<GrpcImageStoreClient> {
        Ok(connect_in_process(self.store.clone()).await)
    }
}

#[test]
fn test_driver_reads_writes_and_removes_over_grpc() {
    let store = Arc::new(MemoryImageStore::default());
    store.insert("inmem_335afcab", b"jpeg bytes");
    let config = ClientConfig {
        dev_mode: true,
        ..Default::default()
    };
    let provider = InProcessProvider {
        store: store.clone(),
    };
    let client = SecureObjectClient::connect_with(&config, &provider).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("frame.jpg");
    let invocation = Invocation::from_args(["inmem_335afcab".into(), output.clone().into_os_string()])
        .unwrap();

    let mut out = Vec::new();
    let removed = driver::run(&client, &invocation, &mut out).unwrap();

    assert!(removed);
    assert_eq!(std::fs::read(&output).unwrap(), b"jpeg bytes");
    assert!(!store.contains("inmem_335afcab"));
    assert!(String::from_utf8(out)
        .unwrap()
        .ends_with("inmem_335afcab\nRemove status :1\n"));
}
