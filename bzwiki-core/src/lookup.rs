//! Exact title lookup (C6): binary search directly over the mmap'd blob
//! bytes, no parsing pass up front. Because records are variable length,
//! a naive midpoint almost never lands on a delimiter; the search walks
//! backward from the midpoint to find one, and if that runs off the left
//! edge of the current search window, walks forward instead.

use crate::blob::{RECORD_DELIM, TITLE_DELIM};
use crate::error::LookupError;

/// A defensive cap on probe count: with backward/forward realignment a
/// well-formed blob converges in `O(log n)` probes, but a malformed blob
/// (e.g. a corrupted delimiter run) could otherwise loop indefinitely.
const MAX_PROBES: u32 = 100;

/// Looks up `needle` by exact, byte-for-byte title match. Returns the
/// matched title (as stored in the blob) and its 1-based chunk index.
pub fn find(blob: &[u8], needle: &str) -> Result<Option<(String, u64)>, LookupError> {
    let needle = needle.as_bytes();
    let blob_len = blob.len() as i64;
    let mut min: i64 = -1;
    let mut max: i64 = blob_len;
    let mut probes = 0;

    loop {
        if probes >= MAX_PROBES {
            return Err(LookupError::ProbeBudgetExhausted);
        }
        probes += 1;

        if max - min <= 1 {
            return Ok(None);
        }

        let orig_cur = min + (max - min) / 2;

        let delim_pos = match scan_backward(blob, orig_cur, min) {
            Some(p) => p,
            None => match scan_forward(blob, orig_cur, max) {
                Some(p) => p,
                None => return Ok(None),
            },
        };

        let record_start = (delim_pos + 1) as usize;
        if record_start as i64 >= max {
            return Ok(None);
        }

        let mut title_end = record_start;
        while title_end < blob.len() && blob[title_end] != RECORD_DELIM {
            title_end += 1;
        }
        if title_end >= blob.len() {
            return Ok(None);
        }
        let title_bytes = &blob[record_start..title_end];

        let mut index_end = title_end + 1;
        while index_end < blob.len() && blob[index_end] != TITLE_DELIM {
            index_end += 1;
        }
        let index_bytes = &blob[title_end + 1..index_end];

        match title_bytes.cmp(needle) {
            std::cmp::Ordering::Equal => {
                let index_str = std::str::from_utf8(index_bytes).map_err(|_| LookupError::CorruptRecord)?;
                let index = index_str.parse().map_err(|_| LookupError::CorruptRecord)?;
                let title = std::str::from_utf8(title_bytes)
                    .map_err(|_| LookupError::CorruptRecord)?
                    .to_string();
                return Ok(Some((title, index)));
            }
            std::cmp::Ordering::Less => min = delim_pos,
            std::cmp::Ordering::Greater => max = delim_pos,
        }
    }
}

fn scan_backward(blob: &[u8], from: i64, min: i64) -> Option<i64> {
    let mut cur = from;
    while cur > min {
        if blob[cur as usize] == TITLE_DELIM {
            return Some(cur);
        }
        cur -= 1;
    }
    None
}

fn scan_forward(blob: &[u8], from: i64, max: i64) -> Option<i64> {
    let mut cur = from + 1;
    while cur < max {
        if blob[cur as usize] == TITLE_DELIM {
            return Some(cur);
        }
        cur += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blob() -> Vec<u8> {
        let mut v = Vec::new();
        for (title, idx) in [("Apple", 1), ("Banana", 3), ("Cherry", 7), ("Date", 9)] {
            v.push(TITLE_DELIM);
            v.extend_from_slice(title.as_bytes());
            v.push(RECORD_DELIM);
            v.extend_from_slice(idx.to_string().as_bytes());
        }
        v
    }

    #[test]
    fn finds_each_record() {
        let blob = sample_blob();
        assert_eq!(find(&blob, "Apple").unwrap(), Some(("Apple".to_string(), 1)));
        assert_eq!(find(&blob, "Banana").unwrap(), Some(("Banana".to_string(), 3)));
        assert_eq!(find(&blob, "Cherry").unwrap(), Some(("Cherry".to_string(), 7)));
        assert_eq!(find(&blob, "Date").unwrap(), Some(("Date".to_string(), 9)));
    }

    #[test]
    fn miss_is_none_not_error() {
        let blob = sample_blob();
        assert_eq!(find(&blob, "banana").unwrap(), None);
        assert_eq!(find(&blob, "Apricot").unwrap(), None);
        assert_eq!(find(&blob, "Zebra").unwrap(), None);
    }

    #[test]
    fn empty_blob_is_always_a_miss() {
        assert_eq!(find(&[], "Apple").unwrap(), None);
    }

    #[test]
    fn single_record_blob() {
        let mut v = Vec::new();
        v.push(TITLE_DELIM);
        v.extend_from_slice(b"Solo");
        v.push(RECORD_DELIM);
        v.extend_from_slice(b"4");
        assert_eq!(find(&v, "Solo").unwrap(), Some(("Solo".to_string(), 4)));
        assert_eq!(find(&v, "Other").unwrap(), None);
    }

    #[test]
    fn first_and_last_records_are_reachable() {
        // Regression check for the boundary realignment: needles that sort
        // at either extreme of the blob must still converge within budget.
        let mut titles: Vec<String> = (0..200).map(|i| format!("Title{:04}", i)).collect();
        titles.sort();
        let mut blob = Vec::new();
        for (i, t) in titles.iter().enumerate() {
            blob.push(TITLE_DELIM);
            blob.extend_from_slice(t.as_bytes());
            blob.push(RECORD_DELIM);
            blob.extend_from_slice((i as u64 + 1).to_string().as_bytes());
        }
        assert_eq!(
            find(&blob, &titles[0]).unwrap(),
            Some((titles[0].clone(), 1))
        );
        assert_eq!(
            find(&blob, titles.last().unwrap()).unwrap(),
            Some((titles.last().unwrap().clone(), titles.len() as u64))
        );
    }
}
