//! Per-module error types.
//!
//! Each component gets its own `thiserror` enum rather than one crate-wide
//! error, so callers can match on exactly the failure modes a given
//! operation can produce instead of unwrapping a kitchen-sink variant.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("I/O error reading chunk: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("chunk {index}: line contains <title> but no closing </title> on the same line")]
    MissingTitleClose { index: u64 },
    #[error("chunk {index}: title contains a forbidden delimiter byte (0x02 or 0x0A)")]
    ForbiddenDelimiter { index: u64 },
    #[error("I/O error writing title blob: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid cache_ignore_rx pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("failed to open title blob {0}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("failed to map title blob {0}: {1}")]
    Mmap(PathBuf, std::io::Error),
    #[error("failed to read title blob {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

/// Errors from C6 exact lookup. A plain miss is not an error: `find`
/// returns `Ok(None)` for that, these variants are reserved for blobs that
/// cannot be searched at all.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("title blob record is not valid UTF-8 at the probed offset")]
    CorruptRecord,
    #[error("exceeded the 100-probe defensive search budget")]
    ProbeBudgetExhausted,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search_ignore_rx pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("title not found while scanning from chunk {0}")]
    TitleNotFound(u64),
    #[error("no <text> tag found before end of stream")]
    MissingTextOpen,
    #[error("no </text> closing tag found before end of stream")]
    MissingTextClose,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to open metadata file {0}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("failed to write metadata file {0}: {1}")]
    Write(PathBuf, std::io::Error),
    #[error("metadata key '{0}' missing or unparsable")]
    MissingKey(&'static str),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("no .bz2 dump found in drop directory {0}")]
    NoDumpAvailable(PathBuf),
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("splitter failed: {0}")]
    Splitter(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
