//! Bounded, lazy rendering of matched chunks into readable excerpts.

use std::iter::Peekable;
use std::slice::Iter;

use crate::chunking::{TextChunk, estimate_tokens};

/// A rendered excerpt with its token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Excerpt text, truncated to the configured length.
    pub text: String,
    /// Token count of the rendered text.
    pub token_count: usize,
}

/// Lazy, finite iterator of rendered sections.
///
/// Each call to [`Iterator::next`] consumes one or more chunks; the sequence
/// cannot be restarted once advanced.
pub struct SectionIter<'chunks> {
    /// Remaining chunks to render.
    chunks: Peekable<Iter<'chunks, TextChunk>>,
    /// Character budget per section.
    max_section_length: usize,
    /// Sections left to emit.
    remaining: usize,
    /// Whether adjacent chunks are merged into one section.
    combine_adjacent: bool,
}

impl<'chunks> SectionIter<'chunks> {
    /// Creates an iterator over `chunks` with the given bounds.
    pub(crate) fn new(
        chunks: &'chunks [TextChunk],
        max_section_length: usize,
        max_sections: usize,
        combine_adjacent: bool,
    ) -> Self {
        Self {
            chunks: chunks.iter().peekable(),
            max_section_length,
            remaining: max_sections,
            combine_adjacent,
        }
    }
}

impl Iterator for SectionIter<'_> {
    type Item = Section;

    fn next(&mut self) -> Option<Section> {
        if self.remaining == 0 {
            return None;
        }

        let first = self.chunks.next()?;
        let mut text = truncate_chars(&first.text, self.max_section_length);
        let mut token_count = if text.len() == first.text.len() {
            first.token_count
        } else {
            estimate_tokens(&text)
        };

        if self.combine_adjacent {
            while let Some(next) = self.chunks.peek() {
                let combined = text.chars().count() + 1 + next.text.chars().count();
                if combined > self.max_section_length {
                    break;
                }
                text.push('\n');
                text.push_str(&next.text);
                token_count += next.token_count;
                self.chunks.next();
            }
        }

        self.remaining -= 1;
        Some(Section { text, token_count })
    }
}

/// Truncates text to `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        text.chars().take(max_chars).collect()
    }
}
