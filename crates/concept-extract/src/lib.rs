//! Word-granular concept extraction.
//!
//! A large set of literal phrases ("concepts") is indexed once, then located
//! inside arbitrary ASCII text case-insensitively and punctuation-tolerant.
//! The matcher is a word-level variant of multi-pattern search: instead of a
//! per-character automaton or a scan per concept, the dictionary is a hash
//! table keyed by lowercase words.
//!
//! - the keys are lowercased concepts, or the first word of concepts;
//! - the values pair the concept in its original casing with an ordered set
//!   of word counts. Count `1` means the key itself is a concept; a count
//!   `m > 1` means some registered concept of `m` words starts with that key.
//!
//! A query lowercases and strips punctuation from the input, segments it into
//! zero-copy word views, and walks word by word: whenever a word is present
//! in the table, each candidate length is probed with a single O(1) span
//! reconstruction and one more lookup. Average time is linear in the input
//! word count plus the total length of matched concepts, on top of one
//! linear normalization pass; only pathological hash collisions degrade it.
//!
//! This beats an Aho-Corasick automaton in practice here because it jumps
//! from word to word rather than from character to character, at the price
//! of a worst case that leans on hash quality.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use concept_store::{ByteBuf, OrderedSet, TextValue};
use concept_table::ChainedTable;

/// Longest accepted concept line, in bytes. Longer lines are rejected at
/// load time rather than truncated.
pub const MAX_CONCEPT_LEN: usize = 1024;

/// Word separators: space, or the NUL terminator of terminated text.
#[inline]
pub fn is_separator(byte: u8) -> bool {
    byte == b' ' || byte == 0
}

/// Punctuation removed by [`normalize`].
#[inline]
pub fn is_punctuation(byte: u8) -> bool {
    matches!(byte, b',' | b';' | b'.' | b'!' | b'?')
}

/// Lowercase ASCII letters in place; other bytes are untouched.
pub fn lower_case(text: &mut ByteBuf) {
    for byte in text.as_mut_slice() {
        byte.make_ascii_lowercase();
    }
}

/// Normalize ASCII text in place: lowercase, drop punctuation, and drop every
/// separator that is redundant — adjacent to the text start or end, to
/// another separator, or to a punctuation character.
///
/// One left-to-right compaction pass: kept bytes shift down by the running
/// count of dropped bytes, and the buffer is truncated by that count at the
/// end. This collapses separator runs to single spaces and trims both edges,
/// so normalizing an already-normalized string returns it unchanged.
pub fn normalize(text: &mut ByteBuf) {
    lower_case(text);

    let len = text.len();
    let bytes = text.as_mut_slice();
    let mut dropped = 0;
    for i in 0..len {
        // Reads look ahead into not-yet-compacted bytes; writes land at or
        // before the cursor, so the lookahead is always original content.
        let byte = bytes[i];
        let redundant_separator = is_separator(byte)
            && (i == 0
                || i + 1 == len
                || is_separator(bytes[i + 1])
                || is_punctuation(bytes[i + 1]));
        if is_punctuation(byte) || redundant_separator {
            dropped += 1;
            continue;
        }
        bytes[i - dropped] = byte;
    }
    text.truncate(len - dropped);
}

fn scan_spans(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = None;
    for (i, &byte) in bytes.iter().enumerate() {
        if is_separator(byte) {
            if let Some(from) = start.take() {
                spans.push(from..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(from) = start {
        spans.push(from..bytes.len());
    }
    spans
}

enum Storage<'a> {
    /// Zero-copy views into the source text.
    Overlay { text: &'a str, spans: Vec<Range<usize>> },
    /// Owned copies, independent of the source.
    Copy { words: Vec<String> },
}

/// Ordered sequence of word spans over one text, split on separators.
///
/// The mode — owned copies or zero-copy overlay — is fixed for the whole
/// sequence at construction. Overlay spans borrow the source text, so the
/// borrow checker keeps them from outliving the buffer they view.
pub struct Words<'a> {
    storage: Storage<'a>,
}

impl<'a> Words<'a> {
    /// Segment `text` into borrowed word views. No allocation per word.
    pub fn overlay(text: &'a str) -> Self {
        Self {
            storage: Storage::Overlay {
                text,
                spans: scan_spans(text),
            },
        }
    }

    /// Segment `text` into owned word copies.
    pub fn copied(text: &str) -> Words<'static> {
        let spans = scan_spans(text);
        Words {
            storage: Storage::Copy {
                words: spans.into_iter().map(|span| text[span].to_string()).collect(),
            },
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Overlay { spans, .. } => spans.len(),
            Storage::Copy { words } => words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The word at `index`, if any.
    pub fn word(&self, index: usize) -> Option<&str> {
        match &self.storage {
            Storage::Overlay { text, spans } => spans.get(index).map(|span| &text[span.clone()]),
            Storage::Copy { words } => words.get(index).map(String::as_str),
        }
    }

    /// Reconstruct the contiguous phrase covering `count` words starting at
    /// word `first`, or `None` if the range runs past the end.
    ///
    /// Overlay mode is O(1): the source words are contiguous in the
    /// normalized buffer, so the phrase is one borrowed slice from the first
    /// word's start to the last word's end. Copy mode allocates and joins
    /// the words with single spaces.
    pub fn get(&self, first: usize, count: usize) -> Option<Cow<'a, str>> {
        if count == 0 || first + count > self.len() {
            return None;
        }
        match &self.storage {
            Storage::Overlay { text, spans } => {
                let source: &'a str = *text;
                let from = spans[first].start;
                let to = spans[first + count - 1].end;
                Some(Cow::Borrowed(&source[from..to]))
            }
            Storage::Copy { words } => Some(Cow::Owned(words[first..first + count].join(" "))),
        }
    }

    /// Words in input order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        (0..self.len()).filter_map(|i| self.word(i))
    }
}

/// Dictionary value: the concept in its original casing plus the ordered set
/// of word counts applicable to this key.
#[derive(Clone, Debug, Default)]
struct ConceptEntry {
    phrase: TextValue,
    lengths: OrderedSet<usize>,
}

#[derive(Debug, Error)]
pub enum ConceptListError {
    #[error("failed to read concept list: {0}")]
    Io(#[from] std::io::Error),
}

/// The concept dictionary and matcher.
///
/// Registration mutates the dictionary through `&mut self`; queries take
/// `&self` and never reorganize the table, so sharing an extractor across
/// readers is safe once registration is done.
pub struct ConceptExtractor {
    concepts: ChainedTable<ConceptEntry>,
}

impl ConceptExtractor {
    pub fn new() -> Self {
        Self {
            concepts: ChainedTable::new(),
        }
    }

    /// Build a dictionary from literal phrases.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extractor = Self::new();
        for phrase in phrases {
            extractor.add_concept(phrase.as_ref());
        }
        extractor
    }

    /// Build a dictionary from a newline-delimited concept file, one phrase
    /// per line.
    ///
    /// Blank lines are skipped. Lines longer than [`MAX_CONCEPT_LEN`] bytes
    /// or containing non-ASCII text are rejected with a warning and skipped;
    /// nothing is silently truncated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConceptListError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut extractor = Self::new();
        let mut registered = 0usize;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let phrase = line.trim_end_matches('\r');
            if phrase.trim().is_empty() {
                continue;
            }
            if phrase.len() > MAX_CONCEPT_LEN {
                warn!(
                    "{}:{} skipped concept longer than {} bytes",
                    path.display(),
                    lineno + 1,
                    MAX_CONCEPT_LEN
                );
                continue;
            }
            if !phrase.is_ascii() {
                warn!("{}:{} skipped non-ascii concept", path.display(), lineno + 1);
                continue;
            }
            extractor.add_concept(phrase);
            registered += 1;
        }
        info!("registered {registered} concepts from {}", path.display());
        Ok(extractor)
    }

    /// Register one concept. The phrase is indexed under its full lowercase
    /// form and under its lowercase first word; a phrase with no words is
    /// ignored.
    pub fn add_concept(&mut self, phrase: &str) {
        let mut key = ByteBuf::from_slice(phrase.as_bytes());
        lower_case(&mut key);
        let key_str =
            std::str::from_utf8(key.as_slice()).expect("ascii lowering preserves utf8");
        let words = Words::overlay(key_str);
        let Some(first_word) = words.word(0) else {
            return;
        };
        let word_count = words.len();

        // Full lowercase phrase: remember the original casing and that the
        // key itself is a concept.
        {
            let entry = self.concepts.entry_mut(key.as_slice());
            entry.phrase.assign(phrase);
            entry.lengths.insert_unique(1);
        }

        // First word: record how many words a concept starting here can
        // span. For a one-word phrase this re-targets the same entry and
        // the unique insert is a no-op.
        let entry = self.concepts.entry_mut(first_word.as_bytes());
        entry.lengths.insert_unique(word_count);
    }

    /// Extract every registered concept occurring in `input`, in original
    /// casing, ordered by the input position of the starting word; concepts
    /// sharing a start word come shortest first. Overlaps and duplicates are
    /// all reported. Never fails: any input yields a (possibly empty) list.
    pub fn get(&self, input: &str) -> Vec<String> {
        let mut buffer = ByteBuf::from_slice(input.as_bytes());
        normalize(&mut buffer);
        let normalized =
            std::str::from_utf8(buffer.as_slice()).expect("normalization preserves utf8");
        let words = Words::overlay(normalized);

        let mut found = Vec::new();
        for i in 0..words.len() {
            let Some(word) = words.word(i) else { continue };
            // Move on unless some concept starts with this word.
            let Some(entry) = self.concepts.get(word.as_bytes()) else {
                continue;
            };
            for &count in &entry.lengths {
                // Lengths ascend, so the first one that cannot fit ends
                // the scan for this start word.
                if i + count > words.len() {
                    break;
                }
                if count == 1 {
                    found.push(entry.phrase.as_str().to_string());
                    continue;
                }
                let Some(key) = words.get(i, count) else { continue };
                // A first-word hit without an actual phrase of this length
                // is skipped silently.
                if let Some(concept) = self.concepts.get(key.as_bytes()) {
                    found.push(concept.phrase.as_str().to_string());
                }
            }
        }
        found
    }

    /// Number of dictionary entries, counting first-word index entries.
    pub fn entry_count(&self) -> usize {
        self.concepts.len()
    }
}

impl Default for ConceptExtractor {
    fn default() -> Self {
        Self::new()
    }
}
