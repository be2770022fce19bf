//! Device-resident bitmap persistence.
//!
//! The device keeps at most one saved drawing. A store either fully
//! replaces it or leaves the previous one untouched — there is no
//! partial-write recovery to do, because [`FileStore`] writes to a
//! temporary file and renames it into place.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::bitmap::{BITMAP_SIZE, PackedBitmap};
use crate::error::SketchError;

// ── BitmapStore ──────────────────────────────────────────────────

/// Persistence backend for the single saved bitmap.
#[async_trait]
pub trait BitmapStore: Send + Sync + 'static {
    /// Atomically replace the saved bitmap.
    async fn save(&self, bitmap: &PackedBitmap) -> Result<(), SketchError>;

    /// Fetch the saved bitmap; `None` if nothing was ever stored.
    async fn load(&self) -> Result<Option<PackedBitmap>, SketchError>;
}

// ── FileStore ────────────────────────────────────────────────────

/// Stores the bitmap as a raw 1024-byte file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

#[async_trait]
impl BitmapStore for FileStore {
    async fn save(&self, bitmap: &PackedBitmap) -> Result<(), SketchError> {
        // Write-then-rename so a failed write never clobbers the
        // previous drawing.
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, bitmap.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<PackedBitmap>, SketchError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() != BITMAP_SIZE {
            return Err(SketchError::InvalidBitmapLength {
                expected: BITMAP_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Some(PackedBitmap::from_bytes(&bytes)?))
    }
}

// ── MemoryStore ──────────────────────────────────────────────────

/// In-memory store for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<PackedBitmap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BitmapStore for MemoryStore {
    async fn save(&self, bitmap: &PackedBitmap) -> Result<(), SketchError> {
        *self.slot.lock().await = Some(bitmap.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PackedBitmap>, SketchError> {
        Ok(self.slot.lock().await.clone())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            assert!(store.load().await.unwrap().is_none());

            let bitmap = PackedBitmap::blank();
            store.save(&bitmap).await.unwrap();
            assert_eq!(store.load().await.unwrap().unwrap(), bitmap);
        });
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("saved_draw.bin"));

        assert!(store.load().await.unwrap().is_none());

        let bitmap = PackedBitmap::from_bytes(&[0xA5u8; BITMAP_SIZE]).unwrap();
        store.save(&bitmap).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap(), bitmap);
    }

    #[tokio::test]
    async fn file_store_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("saved_draw.bin"));

        store.save(&PackedBitmap::blank()).await.unwrap();
        let second = PackedBitmap::from_bytes(&[0xFFu8; BITMAP_SIZE]).unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap(), second);
    }

    #[tokio::test]
    async fn file_store_rejects_wrong_length_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_draw.bin");
        tokio::fs::write(&path, b"short").await.unwrap();

        let store = FileStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, SketchError::InvalidBitmapLength { .. }));
    }
}
