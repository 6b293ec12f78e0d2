//! Cache coordinator (C9): decides whether the on-disk title cache is
//! stale relative to the newest dump sitting in the drop directory, and
//! drives a rebuild when it is. Splitting the dump into chunk files is
//! delegated to a `Splitter`, so the external `bzip2recover` invocation
//! stays a swappable collaborator rather than baked into this logic.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::chunkset::ChunkSet;
use crate::error::CacheError;
use crate::index_builder::{self, IndexerOptions};
use crate::metadata::{tmp_path, Metadata, CACHE_VERSION};
use crate::reader::SegmentedReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Existing cache already matches the newest dump and current options.
    NoOp,
    /// Dump is unchanged but indexing options or the blob format changed.
    RebuildIndexOnly,
    /// No cache, or a newer dump has appeared: split and rebuild from
    /// scratch.
    SplitAndRebuild,
}

/// Invokes whatever splits an `.xml.bz2` dump into `rec*` chunk files.
pub trait Splitter {
    fn split(&self, dump_path: &Path) -> Result<(), CacheError>;
}

/// Shells out to `bzip2recover` on `PATH`, the default production splitter.
pub struct ExternalSplitter {
    pub binary: PathBuf,
}

impl Default for ExternalSplitter {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("bzip2recover"),
        }
    }
}

impl Splitter for ExternalSplitter {
    fn split(&self, dump_path: &Path) -> Result<(), CacheError> {
        let status = std::process::Command::new(&self.binary)
            .arg(dump_path)
            .status()
            .map_err(|e| CacheError::Splitter(format!("failed to launch {}: {e}", self.binary.display())))?;
        if !status.success() {
            return Err(CacheError::Splitter(format!(
                "{} exited with {:?}",
                self.binary.display(),
                status.code()
            )));
        }
        Ok(())
    }
}

pub fn determine_action(
    current: Option<&Metadata>,
    recent_dbname: &str,
    desired_ignore_redirects: bool,
    desired_ignore_rx: &str,
) -> CacheAction {
    let Some(meta) = current else {
        return CacheAction::SplitAndRebuild;
    };
    if meta.dbname != recent_dbname {
        return CacheAction::SplitAndRebuild;
    }
    if meta.version != CACHE_VERSION {
        return CacheAction::RebuildIndexOnly;
    }
    if meta.cache_ignore_redirects != desired_ignore_redirects || meta.cache_ignore_rx != desired_ignore_rx {
        return CacheAction::RebuildIndexOnly;
    }
    CacheAction::NoOp
}

/// Picks the dump with the newest `YYYYMMDD`-shaped timestamp in its
/// filename, matching the naming convention of dated dump drops.
pub fn newest_dump(drop_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(drop_dir).ok()?;
    let mut best: Option<(i64, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("bz2") {
            continue;
        }
        let ts = dump_timestamp(&path);
        match &best {
            None => best = Some((ts, path)),
            Some((best_ts, _)) if ts > *best_ts => best = Some((ts, path)),
            _ => {}
        }
    }
    best.map(|(_, p)| p)
}

fn dump_timestamp(path: &Path) -> i64 {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let rx = Regex::new(r"(20[0-9]{2})([0-9]{2})[^0-9]*([0-9]{2})").unwrap();
    match rx.captures(name) {
        Some(c) => {
            let y: i64 = c[1].parse().unwrap_or(0);
            let m: i64 = c[2].parse().unwrap_or(0);
            let d: i64 = c[3].parse().unwrap_or(0);
            y * 10000 + m * 100 + d
        }
        None => -1,
    }
}

fn clean_stale(chunks: &ChunkSet, title_file: &Path, dat_file: &Path) -> Result<(), CacheError> {
    for p in chunks.existing_chunks()? {
        let _ = std::fs::remove_file(p);
    }
    let _ = std::fs::remove_file(title_file);
    let _ = std::fs::remove_file(dat_file);
    Ok(())
}

/// Moves `dump_path` into the chunk directory, runs the splitter, then
/// moves it back, mirroring the original tool's move-split-restore
/// sequence so the drop directory never permanently loses the dump.
pub fn rebuild_chunks(splitter: &dyn Splitter, chunks: &ChunkSet, dump_path: &Path) -> Result<(), CacheError> {
    let file_name = dump_path
        .file_name()
        .expect("dump path must have a file name");
    let dest = chunks.dir().join(file_name);

    std::fs::rename(dump_path, &dest).map_err(|e| CacheError::Rename {
        from: dump_path.to_path_buf(),
        to: dest.clone(),
        source: e,
    })?;

    let split_result = splitter.split(&dest);
    let rename_back = std::fs::rename(&dest, dump_path).map_err(|e| CacheError::Rename {
        from: dest.clone(),
        to: dump_path.to_path_buf(),
        source: e,
    });

    split_result?;
    rename_back
}

pub struct RebuildReport {
    pub action: CacheAction,
    pub record_count: usize,
}

/// Full C9 orchestration: find the newest dump, decide what's needed,
/// optionally split and always rebuild the index when anything changed,
/// and publish the new blob and metadata atomically.
pub fn ensure_fresh_index(
    drop_dir: &Path,
    chunks: &ChunkSet,
    dat_file: &Path,
    title_file: &Path,
    opts: &IndexerOptions,
    splitter: &dyn Splitter,
    mut progress: impl FnMut(u64),
) -> Result<RebuildReport, CacheError> {
    let recent = newest_dump(drop_dir).ok_or_else(|| CacheError::NoDumpAvailable(drop_dir.to_path_buf()))?;
    let recent_name = recent.file_name().unwrap().to_string_lossy().to_string();

    let current = Metadata::load(dat_file).ok();
    let ignore_rx_src = opts
        .ignore_rx
        .as_ref()
        .map(|r| r.as_str().to_string())
        .unwrap_or_default();
    let action = determine_action(current.as_ref(), &recent_name, opts.ignore_redirects, &ignore_rx_src);

    if action == CacheAction::NoOp {
        return Ok(RebuildReport {
            action,
            record_count: current.map(|m| m.rcount as usize).unwrap_or(0),
        });
    }

    if action == CacheAction::SplitAndRebuild {
        clean_stale(chunks, title_file, dat_file)?;
        rebuild_chunks(splitter, chunks, &recent)?;
    }

    let mut reader = SegmentedReader::open(chunks.clone(), 1);
    let records = index_builder::build_index(&mut reader, opts, &mut progress)?;

    let blob_tmp = tmp_path(title_file);
    {
        let mut f = std::fs::File::create(&blob_tmp)?;
        index_builder::write_blob(&records, &mut f)?;
    }
    std::fs::rename(&blob_tmp, title_file)?;

    let meta = Metadata {
        version: CACHE_VERSION,
        dbname: recent_name,
        rcount: records.len() as u64,
        cache_ignore_redirects: opts.ignore_redirects,
        cache_ignore_rx: ignore_rx_src,
    };
    meta.write_atomic(dat_file)?;

    Ok(RebuildReport {
        action,
        record_count: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_metadata_means_split_and_rebuild() {
        let action = determine_action(None, "db.xml.bz2", false, "");
        assert_eq!(action, CacheAction::SplitAndRebuild);
    }

    #[test]
    fn newer_dump_means_split_and_rebuild() {
        let meta = Metadata {
            version: CACHE_VERSION,
            dbname: "enwiki-20250101.xml.bz2".to_string(),
            rcount: 10,
            cache_ignore_redirects: false,
            cache_ignore_rx: String::new(),
        };
        let action = determine_action(Some(&meta), "enwiki-20260101.xml.bz2", false, "");
        assert_eq!(action, CacheAction::SplitAndRebuild);
    }

    #[test]
    fn stale_version_means_rebuild_index_only() {
        let meta = Metadata {
            version: CACHE_VERSION + 1,
            dbname: "enwiki-20260101.xml.bz2".to_string(),
            rcount: 10,
            cache_ignore_redirects: false,
            cache_ignore_rx: String::new(),
        };
        let action = determine_action(Some(&meta), "enwiki-20260101.xml.bz2", false, "");
        assert_eq!(action, CacheAction::RebuildIndexOnly);
    }

    #[test]
    fn changed_options_mean_rebuild_index_only() {
        let meta = Metadata {
            version: CACHE_VERSION,
            dbname: "enwiki-20260101.xml.bz2".to_string(),
            rcount: 10,
            cache_ignore_redirects: false,
            cache_ignore_rx: String::new(),
        };
        let action = determine_action(Some(&meta), "enwiki-20260101.xml.bz2", true, "");
        assert_eq!(action, CacheAction::RebuildIndexOnly);
    }

    #[test]
    fn matching_metadata_is_a_noop() {
        let meta = Metadata {
            version: CACHE_VERSION,
            dbname: "enwiki-20260101.xml.bz2".to_string(),
            rcount: 10,
            cache_ignore_redirects: false,
            cache_ignore_rx: String::new(),
        };
        let action = determine_action(Some(&meta), "enwiki-20260101.xml.bz2", false, "");
        assert_eq!(action, CacheAction::NoOp);
    }

    #[test]
    fn newest_dump_picks_the_latest_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enwiki-20240101.xml.bz2"), b"").unwrap();
        std::fs::write(dir.path().join("enwiki-20260315.xml.bz2"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        let picked = newest_dump(dir.path()).unwrap();
        assert_eq!(picked.file_name().unwrap(), "enwiki-20260315.xml.bz2");
    }

    struct FakeSplitter {
        chunk_names: Vec<&'static str>,
    }

    impl Splitter for FakeSplitter {
        fn split(&self, dump_path: &Path) -> Result<(), CacheError> {
            let dir = dump_path.parent().unwrap();
            for name in &self.chunk_names {
                std::fs::write(dir.join(name), b"chunk").unwrap();
            }
            Ok(())
        }
    }

    #[test]
    fn rebuild_chunks_restores_the_dump_after_splitting() {
        let dir = tempfile::tempdir().unwrap();
        let drop_dir = dir.path().join("drop");
        std::fs::create_dir(&drop_dir).unwrap();
        let dump = drop_dir.join("enwiki-20260101.xml.bz2");
        std::fs::write(&dump, b"dump contents").unwrap();

        let chunks = ChunkSet::new(drop_dir.clone(), ".xml.bz2");
        let splitter = FakeSplitter { chunk_names: vec!["rec00001.xml.bz2"] };
        rebuild_chunks(&splitter, &chunks, &dump).unwrap();

        assert!(dump.exists());
        assert!(drop_dir.join("rec00001.xml.bz2").exists());
    }
}
