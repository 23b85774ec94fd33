//! Durable blob storage for request attachments

mod minio;

use async_trait::async_trait;

use crate::core::error::Result;

pub use minio::MinioStorage;

/// Blob store port. Keys are namespaced by the caller (request identifier
/// plus original filename); the adapter decides the final object layout and
/// the shape of the public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a binary and return the public URL it is served from
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Public URL for an already-uploaded key
    fn public_url(&self, key: &str) -> String;
}
