//! Append-only styled transcript of a script run.
//!
//! The execution thread appends chunks; the UI thread reads them with
//! [`OutputSink::snapshot`] or incrementally with [`OutputSink::drain_since`].
//! Appends are atomic at chunk granularity and the sink never reorders,
//! merges, or drops anything — windowing/eviction is the display layer's
//! policy, not this module's.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::Regex;

/// Style class of one output chunk. Maps to the standard/error output
/// colors of the console's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Standard,
    Error,
}

/// One atomically-appended unit of styled text.
///
/// `links` holds byte ranges into `text` for every URL-shaped substring
/// found at append time (empty when link detection is off). The underlying
/// text is never altered — the display layer decides how a linked span is
/// rendered and what tapping it does.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub style: OutputStyle,
    pub links: Vec<Range<usize>>,
}

/// Trailing characters that are punctuation in prose more often than part
/// of a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"', '>'];

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:https?://|www\.)[^\s<>"]+"#).expect("valid URL regex")
    })
}

/// Find URL-shaped substrings in `text`, returning byte ranges.
pub fn detect_links(text: &str) -> Vec<Range<usize>> {
    url_regex()
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if trimmed.is_empty() {
                return None;
            }
            Some(m.start()..m.start() + trimmed.len())
        })
        .collect()
}

/// Ordered, append-only sequence of styled chunks for one run.
///
/// Thread-safe: the execution thread appends while the UI thread reads.
/// Readers never observe a partially-written chunk.
#[derive(Debug)]
pub struct OutputSink {
    chunks: Mutex<Vec<Chunk>>,
    linkify: AtomicBool,
}

impl OutputSink {
    pub fn new(link_detection: bool) -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            linkify: AtomicBool::new(link_detection),
        }
    }

    /// Append one chunk. Empty text is a no-op — there is nothing to show
    /// and no ordering to preserve for it.
    pub fn append(&self, text: &str, style: OutputStyle) {
        if text.is_empty() {
            return;
        }
        let links = if self.linkify.load(Ordering::Relaxed) {
            detect_links(text)
        } else {
            Vec::new()
        };
        self.chunks.lock().push(Chunk {
            text: text.to_string(),
            style,
            links,
        });
    }

    /// Toggle URL detection for subsequently appended chunks. Already
    /// appended chunks keep the spans they were recorded with.
    pub fn set_link_detection(&self, enabled: bool) {
        self.linkify.store(enabled, Ordering::Relaxed);
    }

    pub fn link_detection_enabled(&self) -> bool {
        self.linkify.load(Ordering::Relaxed)
    }

    /// Copy of the full transcript so far.
    pub fn snapshot(&self) -> Vec<Chunk> {
        self.chunks.lock().clone()
    }

    /// Chunks appended since `cursor`, plus the cursor to pass next time.
    /// `drain_since(0)` returns everything. Non-destructive — the sink keeps
    /// the full transcript.
    pub fn drain_since(&self, cursor: usize) -> (Vec<Chunk>, usize) {
        let chunks = self.chunks.lock();
        let new = chunks.get(cursor..).unwrap_or_default().to_vec();
        (new, chunks.len())
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "output_sink_tests.rs"]
mod tests;
