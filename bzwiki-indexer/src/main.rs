//! CLI front end for `bzwiki-core`: drives the offline title-index build
//! (C4/C9) and exposes the three read paths (C6 exact lookup, C7 substring
//! search, C8 article extraction) for inspection without standing up the
//! HTTP server that is out of scope for this repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bzwiki_core::{
    cache, CacheType, ChunkSet, ExternalSplitter, IndexerOptions, SearchOptions, TitleBlob,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use regex::Regex;

/// Offline indexer and inspection CLI for a bzwiki-core title cache.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory newly dropped `*.xml.bz2` dumps are picked up from.
    #[arg(long, global = true, default_value = "drop")]
    drop_dir: PathBuf,

    /// Directory holding `rec<NNNNN><dbname>` chunk files.
    #[arg(long, global = true, default_value = "pdata")]
    data_dir: PathBuf,

    /// Path to the sorted title blob (C5/C6/C7).
    #[arg(long, global = true, default_value = "pdata/titlecache.dat")]
    title_file: PathBuf,

    /// Path to the cache metadata file (C3).
    #[arg(long, global = true, default_value = "pdata/bzwikipedia.dat")]
    dat_file: PathBuf,

    /// How the title blob is loaded for reads: `mmap` or `ram`.
    #[arg(long, global = true, default_value = "mmap")]
    cache_type: CliCacheType,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliCacheType {
    Mmap,
    Ram,
}

impl From<CliCacheType> for CacheType {
    fn from(c: CliCacheType) -> Self {
        match c {
            CliCacheType::Mmap => CacheType::Mmap,
            CliCacheType::Ram => CacheType::Ram,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the title index if the drop directory's newest dump is newer
    /// or the indexing options changed; a no-op otherwise (C9).
    Build {
        /// Skip titles reachable only through a `<redirect>`.
        #[arg(long)]
        cache_ignore_redirects: bool,

        /// Drop any title matching this regex at index time.
        #[arg(long)]
        cache_ignore_rx: Option<String>,

        /// Base filename suffix of the dump (used to name `rec<NNNNN><dbname>`
        /// chunk files). Defaults to the newest drop-dir dump's filename.
        #[arg(long)]
        dbname_suffix: Option<String>,
    },
    /// Exact-match a title against the blob (C6).
    Lookup {
        title: String,
    },
    /// Case- and punctuation-insensitive substring search across the blob,
    /// sharded across `search_routines` workers (C7).
    Search {
        query: String,

        /// Zero-based result page to return.
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Number of shards to search concurrently (1-64).
        #[arg(long, default_value_t = 4)]
        search_routines: usize,

        /// Drop any result matching this regex.
        #[arg(long)]
        search_ignore_rx: Option<String>,

        /// Results per page.
        #[arg(long, default_value_t = 20)]
        search_max_results: usize,
    },
    /// Look up a title then decompress and print its `<text>` body (C8).
    Extract {
        title: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Command::Build {
            cache_ignore_redirects,
            cache_ignore_rx,
            dbname_suffix,
        } => run_build(&args, *cache_ignore_redirects, cache_ignore_rx.as_deref(), dbname_suffix.as_deref()),
        Command::Lookup { title } => run_lookup(&args, title),
        Command::Search {
            query,
            page,
            search_routines,
            search_ignore_rx,
            search_max_results,
        } => run_search(&args, query, *page, *search_routines, search_ignore_rx.as_deref(), *search_max_results),
        Command::Extract { title } => run_extract(&args, title),
    }
}

fn run_build(
    args: &Args,
    cache_ignore_redirects: bool,
    cache_ignore_rx: Option<&str>,
    dbname_suffix: Option<&str>,
) -> Result<()> {
    let dbname_suffix = match dbname_suffix {
        Some(s) => s.to_string(),
        None => {
            let newest = cache::newest_dump(&args.drop_dir)
                .with_context(|| format!("no dump found in {}", args.drop_dir.display()))?;
            newest
                .file_name()
                .context("dump path has no file name")?
                .to_string_lossy()
                .to_string()
        }
    };

    let ignore_rx = cache_ignore_rx
        .map(Regex::new)
        .transpose()
        .context("invalid cache_ignore_rx pattern")?;
    let opts = IndexerOptions {
        ignore_redirects: cache_ignore_redirects,
        ignore_rx,
    };

    let chunks = ChunkSet::new(args.data_dir.clone(), dbname_suffix);
    let splitter = ExternalSplitter::default();

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] scanning chunk {msg}")
            .unwrap(),
    );

    let report = cache::ensure_fresh_index(
        &args.drop_dir,
        &chunks,
        &args.dat_file,
        &args.title_file,
        &opts,
        &splitter,
        |chunk_idx| pb.set_message(chunk_idx.to_string()),
    )
    .context("failed to build title index")?;

    pb.finish_and_clear();
    println!(
        "{:?}: {} titles indexed ({})",
        report.action,
        report.record_count,
        args.title_file.display()
    );
    Ok(())
}

fn run_lookup(args: &Args, title: &str) -> Result<()> {
    let blob = TitleBlob::load(&args.title_file, args.cache_type.into())
        .with_context(|| format!("failed to load {}", args.title_file.display()))?;
    match bzwiki_core::lookup::find(blob.as_bytes(), title)? {
        Some((found, index)) => println!("{found}\tchunk {index}"),
        None => {
            println!("not found: {title}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_search(
    args: &Args,
    query: &str,
    page: usize,
    search_routines: usize,
    search_ignore_rx: Option<&str>,
    search_max_results: usize,
) -> Result<()> {
    let blob = TitleBlob::load(&args.title_file, args.cache_type.into())
        .with_context(|| format!("failed to load {}", args.title_file.display()))?;
    let opts = SearchOptions::new(search_routines, search_ignore_rx, search_max_results)
        .context("invalid search_ignore_rx pattern")?;
    let outcome = bzwiki_core::search::search(blob.as_bytes(), query, page, &opts);
    for title in &outcome.page {
        println!("{title}");
    }
    eprintln!("{} of {} results", outcome.page.len(), outcome.total);
    Ok(())
}

fn run_extract(args: &Args, title: &str) -> Result<()> {
    let blob = TitleBlob::load(&args.title_file, args.cache_type.into())
        .with_context(|| format!("failed to load {}", args.title_file.display()))?;
    let (found, index) = bzwiki_core::lookup::find(blob.as_bytes(), title)?
        .with_context(|| format!("title not found: {title}"))?;

    let chunks = ChunkSet::new(args.data_dir.clone(), dbname_from_metadata(&args.dat_file)?);
    let mut reader = bzwiki_core::SegmentedReader::open(chunks, index);
    let body = bzwiki_core::extractor::extract_article(&mut reader, &found)
        .with_context(|| format!("failed to extract article body for {found}"))?;
    println!("{body}");
    Ok(())
}

fn dbname_from_metadata(dat_file: &std::path::Path) -> Result<String> {
    let meta = bzwiki_core::Metadata::load(dat_file)
        .with_context(|| format!("failed to load {}", dat_file.display()))?;
    Ok(meta.dbname)
}
