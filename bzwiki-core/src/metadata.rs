//! Metadata file (C3): a small `key:value` file recording what the title
//! blob was built from and how, so the cache coordinator (C9) can tell
//! whether it is stale without re-scanning the dump.
//!
//! Grammar matches the dump's own config format: one `key:value` pair per
//! line, `#`-prefixed lines and lines without a colon are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::MetadataError;

/// Bumped whenever the blob format or index-building rules change in a way
/// that invalidates blobs built by an older version of this crate.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub version: u32,
    pub dbname: String,
    pub rcount: u64,
    pub cache_ignore_redirects: bool,
    pub cache_ignore_rx: String,
}

impl Metadata {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| MetadataError::Open(path.to_path_buf(), e))?;
        let map = parse_kv(&text);

        let version = map
            .get("version")
            .and_then(|v| v.parse().ok())
            .ok_or(MetadataError::MissingKey("version"))?;
        let dbname = map
            .get("dbname")
            .cloned()
            .ok_or(MetadataError::MissingKey("dbname"))?;
        let rcount = map
            .get("rcount")
            .and_then(|v| v.parse().ok())
            .ok_or(MetadataError::MissingKey("rcount"))?;
        let cache_ignore_redirects = map
            .get("cache_ignore_redirects")
            .map(|v| v == "true")
            .unwrap_or(false);
        let cache_ignore_rx = map.get("cache_ignore_rx").cloned().unwrap_or_default();

        Ok(Self {
            version,
            dbname,
            rcount,
            cache_ignore_redirects,
            cache_ignore_rx,
        })
    }

    /// Writes to `<path>.new` then renames into place, so a reader never
    /// observes a half-written metadata file.
    pub fn write_atomic(&self, path: impl AsRef<Path>) -> Result<(), MetadataError> {
        let path = path.as_ref();
        let tmp = tmp_path(path);
        {
            let mut f = fs::File::create(&tmp).map_err(|e| MetadataError::Write(tmp.clone(), e))?;
            writeln!(f, "version:{}", self.version).map_err(|e| MetadataError::Write(tmp.clone(), e))?;
            writeln!(f, "dbname:{}", self.dbname).map_err(|e| MetadataError::Write(tmp.clone(), e))?;
            writeln!(f, "rcount:{}", self.rcount).map_err(|e| MetadataError::Write(tmp.clone(), e))?;
            writeln!(f, "cache_ignore_redirects:{}", self.cache_ignore_redirects)
                .map_err(|e| MetadataError::Write(tmp.clone(), e))?;
            writeln!(f, "cache_ignore_rx:{}", self.cache_ignore_rx)
                .map_err(|e| MetadataError::Write(tmp.clone(), e))?;
        }
        fs::rename(&tmp, path).map_err(|e| MetadataError::Write(path.to_path_buf(), e))
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".new");
    PathBuf::from(s)
}

fn parse_kv(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        let Some(colon) = line.find(':') else { continue };
        let key = line[..colon].trim();
        let value = line[colon + 1..].trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), value.to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.dat");
        let meta = Metadata {
            version: CACHE_VERSION,
            dbname: "enwiki-20260101.xml.bz2".to_string(),
            rcount: 12345,
            cache_ignore_redirects: true,
            cache_ignore_rx: "^List of".to_string(),
        };
        meta.write_atomic(&path).unwrap();
        let loaded = Metadata::load(&path).unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn ignores_comments_and_colonless_lines() {
        let mut map = parse_kv("# a comment\nversion:1\nno colon here\ndbname:x\nrcount:1\n");
        map.remove("cache_ignore_rx");
        assert_eq!(map.get("version").unwrap(), "1");
        assert_eq!(map.get("dbname").unwrap(), "x");
        assert!(!map.contains_key("no colon here"));
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.dat");
        fs::write(&path, "version:1\n").unwrap();
        assert!(matches!(
            Metadata::load(&path),
            Err(MetadataError::MissingKey("dbname"))
        ));
    }
}
