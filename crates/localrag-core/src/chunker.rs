//! Sliding-window chunking for prose and one-chunk-per-row for tables.
//!
//! Lengths are counted in characters (Unicode scalar values), so a window
//! never splits a multi-byte code point.

use crate::config::validate_chunking;
use crate::error::Result;
use crate::types::{Chunk, Document, DocumentKind};

/// Split `text` into windows of `chunk_size` characters, each sharing
/// `overlap` characters with the previous one.
///
/// Text no longer than `chunk_size` comes back as a single chunk. The last
/// window ends exactly at the end of the text; no empty tail is emitted.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate_chunking(chunk_size, overlap)?;
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;
    if len <= chunk_size {
        return Ok(vec![text.to_string()]);
    }
    let mut windows = Vec::with_capacity(len / (chunk_size - overlap) + 1);
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        windows.push(text[bounds[start]..bounds[end]].to_string());
        if end == len {
            break;
        }
        start = end - overlap;
    }
    Ok(windows)
}

/// One chunk per row; row semantics would be destroyed by windowing.
pub fn rows_to_chunks(rows: &[Document]) -> Vec<Chunk> {
    rows.iter()
        .map(|row| Chunk { source: row.source.clone(), chunk_id: 0, text: row.text.clone() })
        .collect()
}

/// Turn scanned documents into chunks in document order.
///
/// Windows holding only whitespace are dropped; chunk ids stay contiguous
/// over the windows that remain.
pub fn chunk_documents(docs: &[Document], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    validate_chunking(chunk_size, overlap)?;
    let mut chunks = Vec::new();
    for doc in docs {
        if doc.kind == DocumentKind::CsvRow {
            chunks.extend(rows_to_chunks(std::slice::from_ref(doc)));
            continue;
        }
        let parts = chunk(&doc.text, chunk_size, overlap)?;
        let kept = parts.into_iter().filter(|p| !p.trim().is_empty());
        chunks.extend(kept.enumerate().map(|(chunk_id, text)| Chunk {
            source: doc.source.clone(),
            chunk_id,
            text,
        }));
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn reconstruct(parts: &[String], overlap: usize) -> String {
        let mut out = parts[0].clone();
        for p in &parts[1..] {
            out.extend(p.chars().skip(overlap));
        }
        out
    }

    #[test]
    fn short_text_is_single_chunk() {
        for t in ["", "a", "abcd", "héllo"] {
            assert_eq!(chunk(t, 5, 2).expect("chunk"), vec![t.to_string()]);
        }
    }

    #[test]
    fn abcdefghij_size_four_overlap_one() {
        let parts = chunk("ABCDEFGHIJ", 4, 1).expect("chunk");
        assert_eq!(parts, vec!["ABCD", "DEFG", "GHIJ"]);
    }

    #[test]
    fn overlap_is_exact_and_text_reconstructs() {
        let text: String = (0..257).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for (size, overlap) in [(10, 0), (10, 3), (16, 15), (100, 20), (256, 1)] {
            let parts = chunk(&text, size, overlap).expect("chunk");
            for pair in parts.windows(2) {
                let tail: String = pair[0].chars().skip(size - overlap).collect();
                let head: String = pair[1].chars().take(overlap).collect();
                assert_eq!(tail, head, "size={size} overlap={overlap}");
            }
            for p in &parts[..parts.len() - 1] {
                assert_eq!(p.chars().count(), size);
            }
            assert_eq!(reconstruct(&parts, overlap), text, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let parts = chunk("ääääää", 4, 2).expect("chunk");
        assert_eq!(parts, vec!["ääää", "ääää"]);
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        assert!(matches!(chunk("abc", 3, 3), Err(Error::InvalidConfig(_))));
        assert!(matches!(chunk("abc", 0, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn csv_rows_bypass_windowing() {
        let docs = vec![
            Document { source: "notes.txt".into(), text: "ABCDEFGHIJ".into(), kind: DocumentKind::Text },
            Document {
                source: "orders.csv#row1".into(),
                text: "name:Ada; total:12345678901".into(),
                kind: DocumentKind::CsvRow,
            },
        ];
        let chunks = chunk_documents(&docs, 4, 1).expect("chunks");
        let ids: Vec<(&str, usize)> = chunks.iter().map(|c| (c.source.as_str(), c.chunk_id)).collect();
        assert_eq!(
            ids,
            vec![("notes.txt", 0), ("notes.txt", 1), ("notes.txt", 2), ("orders.csv#row1", 0)]
        );
        assert_eq!(chunks[3].text, "name:Ada; total:12345678901");
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let text = format!("ABCD{}EFGH", " ".repeat(12));
        let docs = vec![Document { source: "gap.txt".into(), text, kind: DocumentKind::Text }];
        let chunks = chunk_documents(&docs, 4, 0).expect("chunks");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["ABCD", "EFGH"]);
        let ids: Vec<usize> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
