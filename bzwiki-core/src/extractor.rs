//! Article extraction (C8): given an entry chunk index from a lookup or
//! search hit, re-open a segmented reader there and scan forward for the
//! matching `<title>`, then the `<text>...</text>` body.

use crate::error::ExtractError;
use crate::reader::{LineSource, ReadOutcome};

/// Returns the raw wiki-markup body between `<text ...>` and `</text>`.
pub fn extract_article<R: LineSource>(source: &mut R, title: &str) -> Result<String, ExtractError> {
    let start_index = source.current_index();
    let open_tag = format!("<title>{}</title>", title);

    if read_until_contains(source, &open_tag)?.is_none() {
        return Err(ExtractError::TitleNotFound(start_index));
    }

    let text_line = read_until_contains(source, "<text")?.ok_or(ExtractError::MissingTextOpen)?;
    let text_str = String::from_utf8_lossy(&text_line);

    let open_pos = text_str.find("<text").expect("read_until_contains matched <text");
    let tag_close = text_str[open_pos..]
        .find('>')
        .map(|p| open_pos + p + 1)
        .ok_or(ExtractError::MissingTextOpen)?;

    if let Some(close_rel) = text_str[tag_close..].find("</text>") {
        return Ok(text_str[tag_close..tag_close + close_rel].to_string());
    }

    let mut body = String::new();
    body.push_str(&text_str[tag_close..]);

    loop {
        let (line, at_eof) = match source.read_line()? {
            ReadOutcome::Line(l) => (l, false),
            ReadOutcome::Eof(l) => (l, true),
        };
        if line.is_empty() {
            return Err(ExtractError::MissingTextClose);
        }
        let s = String::from_utf8_lossy(&line);
        if let Some(close_rel) = s.find("</text>") {
            body.push_str(&s[..close_rel]);
            return Ok(body);
        }
        body.push_str(&s);
        if at_eof {
            return Err(ExtractError::MissingTextClose);
        }
    }
}

fn read_until_contains<R: LineSource>(source: &mut R, needle: &str) -> Result<Option<Vec<u8>>, ExtractError> {
    loop {
        let (line, at_eof) = match source.read_line()? {
            ReadOutcome::Line(l) => (l, false),
            ReadOutcome::Eof(l) => (l, true),
        };
        if contains_str(&line, needle) {
            return Ok(Some(line));
        }
        if at_eof {
            return Ok(None);
        }
    }
}

fn contains_str(haystack: &[u8], needle: &str) -> bool {
    String::from_utf8_lossy(haystack).contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;

    struct FixedLines {
        lines: Vec<&'static str>,
        pos: usize,
        index: u64,
    }

    impl FixedLines {
        fn new(lines: Vec<&'static str>) -> Self {
            Self { lines, pos: 0, index: 1 }
        }
    }

    impl LineSource for FixedLines {
        fn current_index(&self) -> u64 {
            self.index
        }

        fn read_line(&mut self) -> Result<ReadOutcome, ReaderError> {
            if self.pos >= self.lines.len() {
                return Ok(ReadOutcome::Eof(Vec::new()));
            }
            let line = self.lines[self.pos];
            self.pos += 1;
            self.index += 1;
            let bytes = line.as_bytes().to_vec();
            if self.pos >= self.lines.len() {
                Ok(ReadOutcome::Eof(bytes))
            } else {
                Ok(ReadOutcome::Line(bytes))
            }
        }
    }

    #[test]
    fn extracts_single_line_text() {
        let mut src = FixedLines::new(vec![
            "<page><title>Apple</title>\n",
            "<revision><text xml:space=\"preserve\">Apples are fruit.</text></revision>\n",
        ]);
        let body = extract_article(&mut src, "Apple").unwrap();
        assert_eq!(body, "Apples are fruit.");
    }

    #[test]
    fn extracts_multi_line_text() {
        let mut src = FixedLines::new(vec![
            "<title>Banana</title>\n",
            "<text xml:space=\"preserve\">Line one.\n",
            "Line two.\n",
            "</text>\n",
        ]);
        let body = extract_article(&mut src, "Banana").unwrap();
        assert_eq!(body, "Line one.\nLine two.\n");
    }

    #[test]
    fn missing_title_is_an_error() {
        let mut src = FixedLines::new(vec!["<title>Other</title>\n"]);
        assert!(matches!(
            extract_article(&mut src, "Missing"),
            Err(ExtractError::TitleNotFound(_))
        ));
    }

    #[test]
    fn unterminated_text_is_an_error() {
        let mut src = FixedLines::new(vec![
            "<title>Cherry</title>\n",
            "<text xml:space=\"preserve\">no closing tag\n",
        ]);
        assert!(matches!(
            extract_article(&mut src, "Cherry"),
            Err(ExtractError::MissingTextClose)
        ));
    }
}
