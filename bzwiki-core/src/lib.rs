//! Core library for an offline, read-only wiki dump server: a segmented
//! bzip2 reader over `bzip2recover`-split chunk files, a sorted title index
//! with exact and sharded substring lookup, and article retrieval by
//! re-decompression.
//!
//! Nine small components, each with a narrow job:
//!
//! - [`reader`]: sequential logical lines across chunk files (C1)
//! - [`chunkset`]: chunk file naming and location (C2)
//! - [`metadata`]: the small key:value cache-metadata file (C3)
//! - [`index_builder`]: one-shot scan producing the sorted title blob (C4)
//! - [`blob`]: mmap-or-heap loading of that blob (C5)
//! - [`lookup`]: exact binary search over the blob (C6)
//! - [`search`]: sharded, concurrent, punctuation-insensitive substring search (C7)
//! - [`extractor`]: re-decompress and pull `<text>` for one article (C8)
//! - [`cache`]: detects staleness and drives a rebuild (C9)

pub mod blob;
pub mod cache;
pub mod chunkset;
pub mod error;
pub mod extractor;
pub mod index_builder;
pub mod lookup;
pub mod metadata;
pub mod reader;
pub mod search;

pub use blob::{CacheType, TitleBlob};
pub use cache::{CacheAction, ExternalSplitter, RebuildReport, Splitter};
pub use chunkset::ChunkSet;
pub use error::{BlobError, CacheError, ExtractError, IndexError, LookupError, MetadataError, ReaderError, SearchError};
pub use index_builder::{IndexerOptions, TitleRecord};
pub use metadata::{Metadata, CACHE_VERSION};
pub use reader::{LineSource, ReadOutcome, SegmentedReader};
pub use search::{SearchOptions, SearchOutcome};
