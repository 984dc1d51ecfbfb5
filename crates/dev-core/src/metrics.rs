use crate::assemble::SkippedModule;
use crate::error::Result;
use crate::module::ModuleStore;
use serde::{Deserialize, Serialize};
use std::ops::Add;

// ---------------------------------------------------------------------------
// ContentMetrics
// ---------------------------------------------------------------------------

/// Size of a piece of text as reported after a copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub characters: usize,
    pub lines: usize,
    pub words: usize,
    pub approx_tokens: usize,
}

impl ContentMetrics {
    pub fn measure(text: &str) -> Self {
        let characters = text.chars().count();
        Self {
            characters,
            lines: text.lines().count(),
            words: text.split_whitespace().count(),
            approx_tokens: approx_tokens_for(characters),
        }
    }
}

/// Rough token count: one token per four characters, rounded up.
pub fn approx_tokens_for(characters: usize) -> usize {
    characters.div_ceil(4)
}

impl Add for ContentMetrics {
    type Output = ContentMetrics;

    fn add(self, rhs: Self) -> Self {
        Self {
            characters: self.characters + rhs.characters,
            lines: self.lines + rhs.lines,
            words: self.words + rhs.words,
            approx_tokens: self.approx_tokens + rhs.approx_tokens,
        }
    }
}

impl std::iter::Sum for ContentMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

// ---------------------------------------------------------------------------
// ClipboardSink
// ---------------------------------------------------------------------------

/// Where assembled context goes, and where analyzed text comes from.
pub trait ClipboardSink {
    fn write(&self, text: &str) -> Result<ContentMetrics>;
    fn read(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Per-module statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStats {
    pub identifier: String,
    #[serde(flatten)]
    pub metrics: ContentMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsReport {
    pub modules: Vec<ModuleStats>,
    pub total: ContentMetrics,
    pub skipped: Vec<SkippedModule>,
}

/// Measure each module in order; unresolvable identifiers are reported in
/// `skipped` and excluded from the total.
pub fn module_stats<I, S>(store: &dyn ModuleStore, identifiers: I) -> StatsReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = StatsReport::default();
    for id in identifiers {
        let id = id.as_ref();
        match store.resolve(id) {
            Ok(text) => report.modules.push(ModuleStats {
                identifier: id.to_string(),
                metrics: ContentMetrics::measure(&text),
            }),
            Err(e) => report.skipped.push(SkippedModule {
                identifier: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
    report.total = report.modules.iter().map(|m| m.metrics).sum();
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MemoryModuleStore;
    use std::cell::RefCell;

    #[test]
    fn measure_counts_chars_lines_and_tokens() {
        let m = ContentMetrics::measure("hello world\nsecond line\n");
        assert_eq!(m.characters, 24);
        assert_eq!(m.lines, 2);
        assert_eq!(m.words, 4);
        assert_eq!(m.approx_tokens, 6);
    }

    #[test]
    fn measure_empty_text() {
        assert_eq!(ContentMetrics::measure(""), ContentMetrics::default());
    }

    #[test]
    fn characters_are_unicode_scalars() {
        let m = ContentMetrics::measure("héllo");
        assert_eq!(m.characters, 5);
        assert_eq!(m.approx_tokens, 2);
    }

    #[test]
    fn stats_total_sums_resolved_modules() {
        let store: MemoryModuleStore =
            [("a", "one two\n"), ("b", "three\n")].into_iter().collect();
        let report = module_stats(&store, ["a", "missing", "b"]);
        assert_eq!(report.modules.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].identifier, "missing");
        assert_eq!(report.total.words, 3);
        assert_eq!(report.total.lines, 2);
    }

    struct MemoryClipboard {
        content: RefCell<String>,
    }

    impl ClipboardSink for MemoryClipboard {
        fn write(&self, text: &str) -> Result<ContentMetrics> {
            *self.content.borrow_mut() = text.to_string();
            Ok(ContentMetrics::measure(text))
        }

        fn read(&self) -> Result<String> {
            Ok(self.content.borrow().clone())
        }
    }

    #[test]
    fn sink_roundtrips_text_and_reports_metrics() {
        let sink = MemoryClipboard {
            content: RefCell::new(String::new()),
        };
        let metrics = sink.write("abc\ndef").unwrap();
        assert_eq!(metrics.lines, 2);
        assert_eq!(sink.read().unwrap(), "abc\ndef");
    }
}
