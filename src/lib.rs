//! # imagestore-client
//!
//! A client for the ImageStore service, reached over a mutually
//! authenticated gRPC channel (`ImageStore.is`).
//!
//! ## Features
//!
//! - **Mutual TLS**: root CA plus client certificate and key, validated before use
//! - **Blocking facade**: [`SecureObjectClient`] with `read`, `remove` and `store`
//! - **Async core**: the [`ImageStore`] trait, implemented by [`GrpcImageStoreClient`]
//! - **Explicit deadlines**: every RPC is bounded by the configured request timeout
//!
//! ## Quick Start
//!
//! ```no_run
//! use imagestore_client::{ClientConfig, SecureObjectClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Defaults: localhost:50055 and the certificates under /etc/ssl
//!     let config = ClientConfig::from_env()?;
//!     let client = SecureObjectClient::connect(&config)?;
//!
//!     let frame = client.read("inmem_335afcab")?;
//!     std::fs::write("frame.jpg", &frame)?;
//!
//!     let removed = client.remove("inmem_335afcab")?;
//!     println!("Remove status :{}", u8::from(removed));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use imagestore_client::{ChannelProvider, ClientConfig, CredentialBundle, GrpcChannelProvider, ImageStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let credentials = CredentialBundle::load(&config.credentials)?;
//! credentials.validate()?;
//!
//! let client = GrpcChannelProvider.connect(&config, Some(&credentials)).await?;
//! let data = client.read("inmem_335afcab").await?;
//! println!("Retrieved {} bytes", data.len());
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod grpc_client;
pub mod types;

// Re-export main types for convenience
pub use blocking::SecureObjectClient;
pub use client::{ChannelProvider, GrpcChannelProvider, ImageStore};
pub use config::ClientConfig;
pub use credentials::{CredentialBundle, CredentialPaths};
pub use error::{Error, Result};
pub use grpc_client::GrpcImageStoreClient;
pub use types::*;
