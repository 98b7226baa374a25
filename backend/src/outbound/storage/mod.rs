//! Filesystem-backed image store.
//!
//! Objects live under a media root opened once as a capability
//! (`cap_std::fs::Dir`), so keys can never reach outside it. Writes go to a
//! temporary sibling first and are renamed into place, which keeps readers
//! from seeing half-written images. Public URLs are the configured base URL
//! joined with the key; the HTTP layer serves them from `/media/{key}`.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{ImageStore, ImageStoreError, StoredImage, content_type_for};

/// Image store writing objects below a media root directory.
#[derive(Clone)]
pub struct FilesystemImageStore {
    root: Arc<Dir>,
    base_url: Url,
}

impl FilesystemImageStore {
    /// Open (creating when needed) the media root.
    ///
    /// # Errors
    ///
    /// Returns [`ImageStoreError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(root: &Path, base_url: Url) -> Result<Self, ImageStoreError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|err| {
            ImageStoreError::unavailable(format!("create {}: {err}", root.display()))
        })?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| {
            ImageStoreError::unavailable(format!("open {}: {err}", root.display()))
        })?;
        Ok(Self {
            root: Arc::new(dir),
            base_url,
        })
    }

    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T, ImageStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        let owned_key = key.to_owned();
        tokio::task::spawn_blocking(move || op(&root))
            .await
            .map_err(|err| ImageStoreError::unavailable(format!("storage task failed: {err}")))?
            .map_err(|err| ImageStoreError::io(owned_key, err.to_string()))
    }
}

/// Keys are relative paths of non-empty segments drawn from
/// `[A-Za-z0-9._-]`, never `.` or `..`.
fn validate_key(key: &str) -> Result<(), ImageStoreError> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        });
    if valid {
        Ok(())
    } else {
        Err(ImageStoreError::invalid_key(key))
    }
}

fn write_object(root: &Dir, key: &str, bytes: &[u8]) -> io::Result<()> {
    if let Some((parent, _)) = key.rsplit_once('/') {
        root.create_dir_all(parent)?;
    }
    let staging = format!("{key}.{}.partial", Uuid::new_v4().simple());
    root.write(&staging, bytes)?;
    root.rename(&staging, root, key).inspect_err(|_| {
        // Best effort: the rename error is what the caller needs to see.
        let _ = root.remove_file(&staging);
    })
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn put(
        &self,
        key: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Url, ImageStoreError> {
        validate_key(key)?;
        let url = self
            .base_url
            .join(key)
            .map_err(|_| ImageStoreError::invalid_key(key))?;
        let object_key = key.to_owned();
        self.blocking(key, move |root| write_object(root, &object_key, &bytes))
            .await?;
        Ok(url)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredImage>, ImageStoreError> {
        validate_key(key)?;
        let object_key = key.to_owned();
        let bytes = self
            .blocking(key, move |root| match root.read(&object_key) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err),
            })
            .await?;
        Ok(bytes.map(|bytes| StoredImage {
            content_type: content_type_for(key).to_owned(),
            bytes,
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), ImageStoreError> {
        validate_key(key)?;
        let object_key = key.to_owned();
        self.blocking(key, move |root| match root.remove_file(&object_key) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
    }
}
