use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use futures::Stream;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::{fs, io::AsyncWriteExt as _, task::spawn_blocking};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use super::{
    StoreInfo, ValidPath,
    error::{StoreError, StoreResult},
};

#[inline]
fn hex(bytes: &[u8]) -> String {
    base16ct::lower::encode_string(bytes)
}

struct FileStoreInner {
    root: PathBuf,
}

/// Blob storage rooted at one directory. Callers hand in a [`ValidPath`];
/// files are written to a temp file first and persisted atomically.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileStoreInner { root: root.into() }),
        }
    }

    pub fn local_path(&self, path: &ValidPath) -> PathBuf {
        self.inner.root.join(path.as_ref())
    }

    async fn prepare_parent(&self, full_path: &Path) -> StoreResult<()> {
        if let Some(parent) = full_path.parent() {
            match fs::metadata(parent).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    error!("Parent is not a directory: {parent:?}");
                    return Err(StoreError::InvalidPath);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    fs::create_dir_all(parent).await?;
                }
                Err(e) => {
                    error!("Failed to stat parent: {parent:?}: {e}");
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    pub async fn store_data(&self, path: &ValidPath, data: &[u8]) -> StoreResult<StoreInfo> {
        let final_path = self.local_path(path);
        if fs::try_exists(&final_path).await? {
            return Err(StoreError::PathConflict);
        }
        self.prepare_parent(&final_path).await?;

        let root = self.inner.root.clone();
        let tmp = spawn_blocking(move || NamedTempFile::new_in(root)).await??;

        let tmp_path = tmp.path().to_path_buf();
        let mut out = fs::OpenOptions::new().write(true).open(&tmp_path).await?;
        out.write_all(data).await?;
        out.sync_all().await?;
        drop(out);

        let hash = hex(&Sha256::digest(data));
        let size = data.len() as u64;

        let dst = final_path.clone();
        spawn_blocking(move || tmp.persist(dst).map(|_| ()))
            .await?
            .map_err(|e| StoreError::IoError(std::io::Error::other(e.error)))?;

        debug!("Stored {size} bytes at {final_path:?}");
        Ok(StoreInfo {
            final_path: PathBuf::from(path.as_ref()),
            size,
            hash,
        })
    }

    pub async fn load_data(
        &self,
        path: &ValidPath,
    ) -> StoreResult<impl Stream<Item = Result<Bytes, std::io::Error>> + 'static> {
        let full_path = self.local_path(path);
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.as_ref().to_string())
            } else {
                e.into()
            }
        })?;
        Ok(ReaderStream::new(file))
    }

    pub async fn size(&self, path: &ValidPath) -> StoreResult<u64> {
        let meta = fs::metadata(self.local_path(path)).await?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt as _;
    use tracing_test::traced_test;

    use super::*;

    #[tokio::test]
    #[traced_test]
    async fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let path = ValidPath::new("images/test.bin").unwrap();
        let data = rand::random::<[u8; 32]>();
        let info = store.store_data(&path, &data).await.unwrap();
        assert_eq!(info.size, 32);
        assert_eq!(info.hash.len(), 64);

        let stream = store.load_data(&path).await.unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        let loaded: Vec<u8> = chunks.concat();
        assert_eq!(loaded, data);

        assert_eq!(store.size(&path).await.unwrap(), 32);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_store_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let path = ValidPath::new("a.bin").unwrap();
        store.store_data(&path, b"one").await.unwrap();
        let err = store.store_data(&path, b"two").await.unwrap_err();
        assert!(matches!(err, StoreError::PathConflict));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let path = ValidPath::new("missing.bin").unwrap();
        let Err(err) = store.load_data(&path).await else {
            panic!("expected loading a missing file to fail");
        };
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
