//! Names and locates the numbered bzip2 chunk files a dump is split into.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A dump split into `rec<NNNNN><dbname>` files under a single directory.
#[derive(Debug, Clone)]
pub struct ChunkSet {
    dir: PathBuf,
    dbname: String,
}

impl ChunkSet {
    pub fn new(dir: impl Into<PathBuf>, dbname: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            dbname: dbname.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    /// `rec<NNNNN><dbname>`, zero-padded to 5 digits, 1-based.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("rec{:05}{}", index, self.dbname))
    }

    pub fn exists(&self, index: u64) -> bool {
        self.path_for(index).is_file()
    }

    /// Opens the chunk at `index`. A missing chunk is not an error: it is
    /// how a segmented reader learns it has reached the last chunk.
    pub fn open(&self, index: u64) -> io::Result<Option<File>> {
        match File::open(self.path_for(index)) {
            Ok(f) => Ok(Some(f)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All `rec*<dbname>` files currently on disk, used by the cache
    /// coordinator to clear a stale chunk set before a rebuild.
    pub fn existing_chunks(&self) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("rec") || !name.ends_with(self.dbname.as_str()) {
                continue;
            }
            if name.len() <= 3 + self.dbname.len() {
                continue;
            }
            let digits = &name[3..name.len() - self.dbname.len()];
            if digits.len() == 5 && digits.bytes().all(|b| b.is_ascii_digit()) {
                found.push(entry.path());
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_for_pads_to_five_digits() {
        let cs = ChunkSet::new("/data", "enwiki.xml.bz2");
        assert_eq!(
            cs.path_for(1),
            PathBuf::from("/data/rec00001enwiki.xml.bz2")
        );
        assert_eq!(
            cs.path_for(42),
            PathBuf::from("/data/rec00042enwiki.xml.bz2")
        );
    }

    #[test]
    fn missing_chunk_opens_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cs = ChunkSet::new(dir.path(), "db.bz2");
        assert!(cs.open(1).unwrap().is_none());
        assert!(!cs.exists(1));
    }

    #[test]
    fn existing_chunks_filters_by_name_shape() {
        let dir = tempfile::tempdir().unwrap();
        let cs = ChunkSet::new(dir.path(), "db.bz2");
        std::fs::write(cs.path_for(1), b"a").unwrap();
        std::fs::write(cs.path_for(2), b"b").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), b"c").unwrap();
        let mut found = cs.existing_chunks().unwrap();
        found.sort();
        assert_eq!(found, vec![cs.path_for(1), cs.path_for(2)]);
    }
}
