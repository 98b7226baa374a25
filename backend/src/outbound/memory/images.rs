//! In-memory image store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use crate::domain::ports::{ImageStore, ImageStoreError, StoredImage};

/// Object store holding image bytes in a hash map.
///
/// Public URLs are `base_url` joined with the object key, mirroring the
/// filesystem store.
#[derive(Debug)]
pub struct InMemoryImageStore {
    base_url: Url,
    objects: RwLock<HashMap<String, StoredImage>>,
}

impl InMemoryImageStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Url, ImageStoreError> {
        let url = self
            .base_url
            .join(key)
            .map_err(|_| ImageStoreError::invalid_key(key))?;
        self.objects.write().await.insert(
            key.to_owned(),
            StoredImage {
                content_type: content_type.to_owned(),
                bytes,
            },
        );
        Ok(url)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredImage>, ImageStoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), ImageStoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
