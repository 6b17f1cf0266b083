//! Case-insensitive literal substring search over normalized text.

use serde::Serialize;
use std::ops::Range;
use std::time::Instant;

/// One occurrence of the query: a half-open byte range into the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Match {
    pub start: usize,
    pub len: usize,
}

impl Match {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Matches for one `(text, query)` pair, ascending and non-overlapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    matches: Vec<Match>,
}

impl MatchSet {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Match> {
        self.matches.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Find every occurrence of `query` in `text`, ignoring case.
///
/// The query is a literal: characters such as `.` or `(` match themselves.
/// A blank query disables search and yields no matches. Scanning resumes
/// after each match, so matches never overlap.
pub fn search(text: &str, query: &str) -> MatchSet {
    if query.trim().is_empty() {
        return MatchSet::default();
    }

    let start = Instant::now();
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        match match_len_at(&text[pos..], &needle) {
            Some(len) => {
                matches.push(Match { start: pos, len });
                pos += len;
            }
            None => pos += c.len_utf8(),
        }
    }

    tracing::debug!(
        query,
        matches = matches.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "searched document"
    );
    MatchSet { matches }
}

/// Byte length of the prefix of `haystack` that equals `needle` once
/// lowercased, if there is one.
fn match_len_at(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut remaining = needle;
    for (offset, c) in haystack.char_indices() {
        if remaining.is_empty() {
            return Some(offset);
        }
        for lower in c.to_lowercase() {
            match remaining.split_first() {
                Some((first, rest)) if *first == lower => remaining = rest,
                _ => return None,
            }
        }
    }
    remaining.is_empty().then_some(haystack.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(set: &MatchSet) -> Vec<usize> {
        set.iter().map(|m| m.start).collect()
    }

    #[test]
    fn test_case_insensitive() {
        let set = search("Hello world hello", "HELLO");
        assert_eq!(
            set.as_slice(),
            &[Match { start: 0, len: 5 }, Match { start: 12, len: 5 }]
        );
    }

    #[test]
    fn test_blank_query_disables_search() {
        assert!(search("some text", "").is_empty());
        assert!(search("some text", "   ").is_empty());
        assert!(search("some text", "\t\n").is_empty());
    }

    #[test]
    fn test_matches_ascending_and_disjoint() {
        let set = search("aaaaa", "aa");
        assert_eq!(starts(&set), vec![0, 2]);
        for pair in set.as_slice().windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].end() <= pair[1].start);
        }
    }

    #[test]
    fn test_query_is_literal() {
        assert!(search("abc", "a.c").is_empty());
        assert_eq!(starts(&search("x A.C y", "a.c")), vec![2]);
        assert_eq!(starts(&search("f(x) = (y", "(")), vec![1, 7]);
        assert_eq!(starts(&search("cost $5 [draft]", "[draft]")), vec![8]);
    }

    #[test]
    fn test_non_ascii_offsets_are_byte_offsets() {
        let text = "ÄPFEL und äpfel";
        let set = search(text, "äpfel");
        assert_eq!(starts(&set), vec![0, 11]);
        for m in &set {
            assert_eq!(text[m.range()].to_lowercase(), "äpfel");
        }
    }

    #[test]
    fn test_markers_are_searchable() {
        let text = "\n--- Page 1 ---\nAlpha\n\n\n--- Page 2 ---\nBeta\n\n";
        assert_eq!(search(text, "--- page").len(), 2);
    }

    #[test]
    fn test_query_longer_than_text() {
        assert!(search("hi", "high").is_empty());
        assert!(search("", "x").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "one two One tWo ONE";
        assert_eq!(search(text, "one"), search(text, "one"));
        assert_eq!(search(text, "one").len(), 3);
    }

    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_query_not_logged_at_info() {
        let buf = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || Captured(sink.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(search("private words here", "private").len(), 1);
        });
        let logged = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(!logged.contains("private"));
    }
}
