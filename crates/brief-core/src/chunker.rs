use crate::SummarizeError;
use std::collections::VecDeque;
use std::ops::Range;

pub const MAX_CHUNK_SIZE: usize = 4_000;
pub const CHUNK_OVERLAP: usize = 200;
/// Coarsest to finest; the empty separator cuts between characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Size limits and boundary preferences for splitting text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPolicy {
    pub max_chunk_size: usize,
    pub overlap: usize,
    pub separators: Vec<String>,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            overlap: CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkPolicy {
    pub fn validate(&self) -> Result<(), SummarizeError> {
        if self.max_chunk_size == 0 {
            return Err(SummarizeError::Policy(
                "max_chunk_size must be greater than 0".into(),
            ));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(SummarizeError::Policy(
                "overlap must be smaller than max_chunk_size".into(),
            ));
        }
        Ok(())
    }
}

/// A contiguous slice of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    /// Byte offset of `text` in the source.
    pub start: usize,
    pub text: &'a str,
}

impl Chunk<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into overlapping chunks, preferring the coarsest separator that
/// keeps each chunk under `max_chunk_size` characters.
#[derive(Debug, Clone)]
pub struct TextChunker {
    policy: ChunkPolicy,
}

impl TextChunker {
    pub fn new(policy: ChunkPolicy) -> Result<Self, SummarizeError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ChunkPolicy {
        &self.policy
    }

    /// Chunks of `text` in source order. Calling again restarts from the top.
    /// Empty or whitespace-only text yields nothing.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        let mut spans = Vec::new();
        if !text.trim().is_empty() {
            self.split_span(text, 0..text.len(), &self.policy.separators, &mut spans);
        }
        Chunks {
            source: text,
            spans: spans.into_iter().enumerate(),
        }
    }

    fn split_span(
        &self,
        text: &str,
        span: Range<usize>,
        separators: &[String],
        out: &mut Vec<Range<usize>>,
    ) {
        let piece = &text[span.clone()];
        let (separator, finer) = pick_separator(piece, separators);
        let splits = split_keeping_separator(piece, span.start, separator);

        let mut good: Vec<(Range<usize>, usize)> = Vec::new();
        for split in splits {
            let len = text[split.clone()].chars().count();
            if len < self.policy.max_chunk_size {
                good.push((split, len));
                continue;
            }
            if !good.is_empty() {
                self.merge(text, &good, out);
                good.clear();
            }
            if finer.is_empty() {
                // No finer boundary left; keep the oversized piece whole.
                push_span(text, split, out);
            } else {
                self.split_span(text, split, finer, out);
            }
        }
        if !good.is_empty() {
            self.merge(text, &good, out);
        }
    }

    /// Greedily join adjacent splits up to the size limit, carrying trailing
    /// splits of at most `overlap` characters into the next chunk.
    fn merge(&self, text: &str, splits: &[(Range<usize>, usize)], out: &mut Vec<Range<usize>>) {
        let max = self.policy.max_chunk_size;
        let overlap = self.policy.overlap;
        let mut current: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for (split, len) in splits {
            if total + len > max && !current.is_empty() {
                push_span(text, joined(&current), out);
                while total > overlap || (total + len > max && total > 0) {
                    match current.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            current.push_back((split.clone(), *len));
            total += len;
        }
        if !current.is_empty() {
            push_span(text, joined(&current), out);
        }
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            policy: ChunkPolicy::default(),
        }
    }
}

/// Iterator over the chunks of one source text.
pub struct Chunks<'a> {
    source: &'a str,
    spans: std::iter::Enumerate<std::vec::IntoIter<Range<usize>>>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, span) = self.spans.next()?;
        Some(Chunk {
            index,
            start: span.start,
            text: &self.source[span],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.spans.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

fn pick_separator<'s>(piece: &str, separators: &'s [String]) -> (&'s str, &'s [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if piece.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    match separators.last() {
        Some(last) => (last.as_str(), &[]),
        None => ("", &[]),
    }
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. Returned ranges are absolute (offset by `base`).
fn split_keeping_separator(piece: &str, base: usize, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return piece
            .char_indices()
            .map(|(idx, ch)| base + idx..base + idx + ch.len_utf8())
            .collect();
    }
    let mut ranges = Vec::new();
    let mut start = 0;
    for (idx, _) in piece.match_indices(separator) {
        if idx > start {
            ranges.push(base + start..base + idx);
        }
        start = idx;
    }
    if piece.len() > start {
        ranges.push(base + start..base + piece.len());
    }
    ranges
}

fn joined(current: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    match (current.front(), current.back()) {
        (Some((first, _)), Some((last, _))) => first.start..last.end,
        _ => 0..0,
    }
}

fn push_span(text: &str, span: Range<usize>, out: &mut Vec<Range<usize>>) {
    if !text[span.clone()].trim().is_empty() {
        out.push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: &str = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do ";

    /// Word-separated filler of exactly `len` characters with no newlines.
    fn paragraph(len: usize) -> String {
        let mut text: String = WORDS.chars().cycle().take(len).collect();
        if text.ends_with(' ') {
            text.pop();
            text.push('x');
        }
        text
    }

    fn collect(text: &str) -> Vec<Chunk<'_>> {
        TextChunker::default().chunks(text).collect()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(collect("").is_empty());
        assert!(collect(" \n\n \t").is_empty());
    }

    #[test]
    fn short_input_is_a_single_identical_chunk() {
        let long = paragraph(3_999);
        for text in ["0123456789", "a", "two\n\nparagraphs\nhere", long.as_str()] {
            let chunks = collect(text);
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].text, text);
            assert_eq!(chunks[0].start, 0);
        }
    }

    #[test]
    fn exactly_max_size_is_one_chunk() {
        let text = paragraph(MAX_CHUNK_SIZE);
        assert_eq!(collect(&text).len(), 1);
    }

    #[test]
    fn three_paragraphs_make_three_chunks() {
        let text = format!(
            "{}\n\n{}\n\n{}",
            paragraph(4_000),
            paragraph(3_998),
            paragraph(3_998)
        );
        assert_eq!(text.chars().count(), 12_000);

        let chunks = collect(&text);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.char_len() <= MAX_CHUNK_SIZE);
        }
        // Paragraph cuts carry no overlap, so plain concatenation restores the text.
        let rebuilt: String = chunks.iter().map(|chunk| chunk.text).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn unbroken_text_falls_back_to_character_cuts_with_overlap() {
        let text = "a".repeat(12_000);
        let chunks = collect(&text);
        let starts: Vec<usize> = chunks.iter().map(|chunk| chunk.start).collect();
        assert_eq!(starts, vec![0, 3_800, 7_600, 11_400]);
        for pair in chunks.windows(2) {
            assert!(pair[0].char_len() <= MAX_CHUNK_SIZE);
            let shared = pair[0].end() - pair[1].start;
            assert!(shared <= CHUNK_OVERLAP);
        }
    }

    #[test]
    fn word_text_overlaps_at_word_boundaries() {
        let text = paragraph(9_000);
        let chunks = collect(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            assert!(left.char_len() <= MAX_CHUNK_SIZE);
            assert!(right.start < left.end(), "adjacent chunks should overlap");
            let shared = &text[right.start..left.end()];
            assert!(shared.chars().count() <= CHUNK_OVERLAP);
            assert!(left.text.ends_with(shared));
            assert!(right.text.starts_with(shared));
            // Cuts land on the space separator.
            assert!(right.text.starts_with(' '));
        }
        assert_eq!(chunks.last().map(|chunk| chunk.end()), Some(text.len()));
    }

    #[test]
    fn chunks_cover_source_in_order() {
        let text = format!("{}\n{}\n\n{}", paragraph(2_500), paragraph(2_500), paragraph(5_000));
        let chunks = collect(&text);
        assert_eq!(chunks[0].start, 0);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(&text[chunk.start..chunk.end()], chunk.text);
        }
        for pair in chunks.windows(2) {
            // Either overlapping or separated only by dropped whitespace.
            assert!(pair[1].start > pair[0].start);
            if pair[1].start > pair[0].end() {
                assert!(text[pair[0].end()..pair[1].start].trim().is_empty());
            }
        }
        assert_eq!(chunks.last().map(|chunk| chunk.end()), Some(text.len()));
    }

    #[test]
    fn multibyte_text_is_measured_in_characters() {
        let text = "é".repeat(4_500);
        let chunks = collect(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_len(), MAX_CHUNK_SIZE);
        assert_eq!(chunks[1].char_len(), 700);
    }

    #[test]
    fn chunks_are_restartable() {
        let text = paragraph(10_000);
        let chunker = TextChunker::default();
        let first: Vec<_> = chunker.chunks(&text).collect();
        let second: Vec<_> = chunker.chunks(&text).collect();
        assert_eq!(first, second);
        assert_eq!(chunker.chunks(&text).len(), first.len());
    }

    #[test]
    fn small_policy_prefers_coarse_boundaries() {
        let chunker = TextChunker::new(ChunkPolicy {
            max_chunk_size: 14,
            overlap: 0,
            ..ChunkPolicy::default()
        })
        .unwrap();
        let text = "alpha beta\n\ngamma delta";
        let chunks: Vec<&str> = chunker.chunks(text).map(|chunk| chunk.text).collect();
        assert_eq!(chunks, vec!["alpha beta", "\n\ngamma delta"]);
    }

    #[test]
    fn policy_rejects_overlap_not_below_size() {
        let err = TextChunker::new(ChunkPolicy {
            max_chunk_size: 100,
            overlap: 100,
            ..ChunkPolicy::default()
        })
        .unwrap_err();
        assert!(matches!(err, SummarizeError::Policy(_)));
        assert!(
            TextChunker::new(ChunkPolicy {
                max_chunk_size: 0,
                overlap: 0,
                ..ChunkPolicy::default()
            })
            .is_err()
        );
    }
}
