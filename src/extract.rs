//! Text extraction for supported document types.
//!
//! Extraction never fails the pipeline: any error yields an empty string and
//! a debug log, and the caller drops the file with a warning.

use std::path::Path;
use tracing::debug;

/// PDF extraction reads at most this many pages.
const PDF_PAGE_LIMIT: usize = 10;

/// Snippet preview length in characters.
const SNIPPET_LEN: usize = 200;

/// Extract clean text from a PDF or text file.
/// Returns an empty string on any failure.
pub fn extract_text(path: &Path) -> String {
    let ext = path
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase();

    let result = match ext.as_str() {
        "pdf" => extract_pdf(path),
        "txt" => extract_txt(path),
        _ => return String::new(),
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            debug!("Extraction failed for {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn extract_pdf(path: &Path) -> anyhow::Result<String> {
    let doc = lopdf::Document::load(path)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().take(PDF_PAGE_LIMIT).copied().collect();
    if page_numbers.is_empty() {
        return Ok(String::new());
    }
    let raw = doc.extract_text(&page_numbers)?;

    // Collapse the per-line layout noise PDF extraction produces.
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Ok(lines.join(" "))
}

fn extract_txt(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read(path)?;

    // Detect encoding so non-UTF-8 documents still yield usable text.
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&raw, true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(&raw);
    Ok(text.into_owned())
}

/// Short preview snippet, cut at a word boundary.
pub fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(SNIPPET_LEN).collect();
    let cut = head.rfind(' ').unwrap_or(head.len());
    format!("{}...", &head[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extracts_plain_text() {
        let mut f = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        write!(f, "hello semantic world").unwrap();
        let text = extract_text(f.path());
        assert_eq!(text, "hello semantic world");
    }

    #[test]
    fn decodes_latin1() {
        let mut f = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        f.write_all(&[0x63, 0x61, 0x66, 0xE9]).unwrap(); // "café" in Latin-1
        let text = extract_text(f.path());
        assert_eq!(text, "café");
    }

    #[test]
    fn missing_file_yields_empty() {
        assert_eq!(extract_text(Path::new("/nonexistent/file.txt")), "");
    }

    #[test]
    fn unsupported_extension_yields_empty() {
        let mut f = tempfile::NamedTempFile::with_suffix(".md").unwrap();
        write!(f, "content").unwrap();
        assert_eq!(extract_text(f.path()), "");
    }

    #[test]
    fn snippet_cuts_at_word_boundary() {
        let short = "tiny text";
        assert_eq!(snippet(short), short);

        let long = "word ".repeat(100);
        let s = snippet(&long);
        assert!(s.len() <= SNIPPET_LEN + 3);
        assert!(s.ends_with("..."));
        assert!(!s.trim_end_matches("...").ends_with("wor"));
    }
}
