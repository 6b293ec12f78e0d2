//! Title blob loading (C5).

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::BlobError;

pub const TITLE_DELIM: u8 = 0x0A;
pub const RECORD_DELIM: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Mmap,
    Ram,
}

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// The loaded title blob: an immutable byte buffer, either memory-mapped or
/// heap-resident. Cheap to clone: the bytes are reference counted, so every
/// lookup/search call can take its own owned handle without copying.
#[derive(Clone)]
pub struct TitleBlob(Arc<Backing>);

impl TitleBlob {
    /// Loads `path` per `cache_type`. `Mmap` falls back to a full read if
    /// mapping fails (e.g. the filesystem doesn't support it), since a
    /// working-but-slower blob beats refusing to start.
    pub fn load(path: impl AsRef<Path>, cache_type: CacheType) -> Result<Self, BlobError> {
        let path = path.as_ref();
        match cache_type {
            CacheType::Mmap => Self::try_mmap(path).or_else(|_| Self::load_ram(path)),
            CacheType::Ram => Self::load_ram(path),
        }
    }

    fn try_mmap(path: &Path) -> Result<Self, BlobError> {
        let file = File::open(path).map_err(|e| BlobError::Open(path.to_path_buf(), e))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| BlobError::Mmap(path.to_path_buf(), e))?;
        Ok(Self(Arc::new(Backing::Mapped(mmap))))
    }

    fn load_ram(path: &Path) -> Result<Self, BlobError> {
        let bytes = std::fs::read(path).map_err(|e| BlobError::Read(path.to_path_buf(), e))?;
        Ok(Self(Arc::new(Backing::Owned(bytes))))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self.0.as_ref() {
            Backing::Mapped(m) => &m[..],
            Backing::Owned(v) => &v[..],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_via_ram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titles.dat");
        std::fs::write(&path, b"\nApple\x021").unwrap();
        let blob = TitleBlob::load(&path, CacheType::Ram).unwrap();
        assert_eq!(blob.as_bytes(), b"\nApple\x021");
    }

    #[test]
    fn loads_via_mmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titles.dat");
        std::fs::write(&path, b"\nApple\x021").unwrap();
        let blob = TitleBlob::load(&path, CacheType::Mmap).unwrap();
        assert_eq!(blob.as_bytes(), b"\nApple\x021");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dat");
        assert!(TitleBlob::load(&path, CacheType::Ram).is_err());
    }
}
