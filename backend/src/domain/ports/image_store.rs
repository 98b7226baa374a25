//! Port for listing image objects.
//!
//! Objects are addressed by a relative key such as
//! `listings/<listing id>/<object id>.jpg` and served from a public URL that
//! the store derives from the key.

use async_trait::async_trait;
use url::Url;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } => "image store unavailable: {message}",
        /// The key is not a valid relative object path.
        InvalidKey { key: String } => "invalid object key: {key}",
        /// Reading or writing the object failed.
        Io { key: String, message: String } => "image store I/O failed for {key}: {message}",
    }
}

/// Object bytes read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write an object and return its public URL.
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Url, ImageStoreError>;

    /// Read an object; `None` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredImage>, ImageStoreError>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), ImageStoreError>;
}

/// File extension used for objects of `content_type`.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/avif" => "avif",
        _ => "img",
    }
}

/// Content type for an object key, inferred from its extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
