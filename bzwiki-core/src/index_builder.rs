//! Title-index builder (C4): one forward pass over a segmented reader,
//! extracting `<title>...</title>` lines, applying redirect/ignore
//! filtering, and producing the sorted records that get serialized into the
//! title blob.

use regex::Regex;

use crate::blob::{RECORD_DELIM, TITLE_DELIM};
use crate::error::IndexError;
use crate::reader::{LineSource, ReadOutcome};

#[derive(Debug, Clone, Default)]
pub struct IndexerOptions {
    pub ignore_redirects: bool,
    pub ignore_rx: Option<Regex>,
}

pub struct TitleRecord {
    pub title: String,
    pub index: u64,
}

struct Pending {
    title: String,
    index: u64,
}

/// Scans `source` from wherever it's positioned (the caller opens it at
/// chunk 1) and returns the kept titles, sorted bytewise for binary search.
///
/// `progress` is called with the current chunk index periodically, so a
/// caller can drive a progress bar over a multi-gigabyte dump.
pub fn build_index<R: LineSource>(
    source: &mut R,
    opts: &IndexerOptions,
    mut progress: impl FnMut(u64),
) -> Result<Vec<TitleRecord>, IndexError> {
    let mut pending: Option<Pending> = None;
    let mut titles: Vec<TitleRecord> = Vec::new();
    let mut next_report = 0u64;

    loop {
        let cur_index = source.current_index();
        if cur_index >= next_report {
            progress(cur_index);
            next_report = cur_index + 1000;
        }

        let (line, at_eof) = match source.read_line()? {
            ReadOutcome::Line(l) => (l, false),
            ReadOutcome::Eof(l) => (l, true),
        };

        if !line.is_empty() {
            process_line(&line, cur_index, opts, &mut pending, &mut titles)?;
        }

        if at_eof {
            break;
        }
    }

    if let Some(p) = pending.take() {
        titles.push(TitleRecord {
            title: p.title,
            index: p.index,
        });
    }

    titles.sort_by(|a, b| a.title.as_bytes().cmp(b.title.as_bytes()));
    Ok(titles)
}

/// Pulls the `<title>...</title>` payload out of one logical line, if
/// present. Pure and panic-free on arbitrary input, so it can be exercised
/// directly by a fuzz target as well as by `process_line`.
///
/// Returns `None` when the line has no `<title>` tag at all, `Some(Err(_))`
/// when one opens but `</title>` is missing on the same line or the title
/// contains a blob delimiter byte, `Some(Ok(title))` otherwise.
pub fn extract_title_tag(text: &str, cur_index: u64) -> Option<Result<&str, IndexError>> {
    let start = text.find("<title>")?;
    let after = start + "<title>".len();
    let Some(close) = text[after..].find("</title>") else {
        return Some(Err(IndexError::MissingTitleClose { index: cur_index }));
    };
    let title = &text[after..after + close];
    if title.as_bytes().contains(&TITLE_DELIM) || title.as_bytes().contains(&RECORD_DELIM) {
        return Some(Err(IndexError::ForbiddenDelimiter { index: cur_index }));
    }
    Some(Ok(title))
}

fn process_line(
    line: &[u8],
    cur_index: u64,
    opts: &IndexerOptions,
    pending: &mut Option<Pending>,
    titles: &mut Vec<TitleRecord>,
) -> Result<(), IndexError> {
    let text = String::from_utf8_lossy(line);

    match extract_title_tag(&text, cur_index) {
        Some(Ok(title)) => {
            if let Some(prev) = pending.take() {
                titles.push(TitleRecord {
                    title: prev.title,
                    index: prev.index,
                });
            }

            let keep = match &opts.ignore_rx {
                Some(rx) => !rx.is_match(title),
                None => true,
            };

            *pending = if keep {
                Some(Pending {
                    title: title.to_string(),
                    index: cur_index,
                })
            } else {
                None
            };
        }
        Some(Err(e)) => return Err(e),
        None => {
            if opts.ignore_redirects && text.contains("<redirect") {
                *pending = None;
            }
        }
    }

    Ok(())
}

/// Serializes `records` as `(TITLE_DELIM title RECORD_DELIM ascii_index)*`,
/// assuming `records` is already sorted.
pub fn write_blob<W: std::io::Write>(records: &[TitleRecord], mut out: W) -> std::io::Result<()> {
    for r in records {
        out.write_all(&[TITLE_DELIM])?;
        out.write_all(r.title.as_bytes())?;
        out.write_all(&[RECORD_DELIM])?;
        write!(out, "{}", r.index)?;
    }
    Ok(())
}
