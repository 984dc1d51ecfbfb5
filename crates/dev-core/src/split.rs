//! Split one large module into numbered per-section modules.

use crate::metrics::ContentMetrics;
use crate::module::split_front_matter;
use serde::Serialize;

/// Token budget above which a section is flagged for a manual split.
pub const DEFAULT_MAX_TOKENS: usize = 3500;

const PREAMBLE_TITLE: &str = "Overview";
const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub text: String,
    /// Text that came before the first heading.
    pub is_preamble: bool,
}

/// One child module produced by a split.
#[derive(Debug, Clone, Serialize)]
pub struct SplitChunk {
    pub identifier: String,
    pub title: String,
    #[serde(skip)]
    pub text: String,
    pub metrics: ContentMetrics,
    pub over_budget: bool,
    #[serde(skip)]
    pub is_preamble: bool,
}

fn heading_title(line: &str, level: usize) -> Option<&str> {
    let rest = line.strip_prefix(&"#".repeat(level))?;
    let title = rest.strip_prefix(' ')?.trim();
    (!title.is_empty()).then_some(title)
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

fn finish(
    title: String,
    heading: Option<&str>,
    body: &[&str],
    is_preamble: bool,
) -> Option<Section> {
    let body = body.join("\n");
    let body = body.trim();
    let text = match heading {
        Some(h) if body.is_empty() => format!("{h}\n"),
        Some(h) => format!("{h}\n{body}\n"),
        None if body.is_empty() => return None,
        None => format!("{body}\n"),
    };
    Some(Section {
        title,
        text,
        is_preamble,
    })
}

/// Split on headings of exactly `level` (`1` for `# `). Front matter is
/// dropped, headings inside fenced code blocks are ignored, and a non-blank
/// preamble becomes a leading "Overview" section.
pub fn split_by_heading(text: &str, level: usize) -> Vec<Section> {
    let level = level.max(1);
    let (_, body) = split_front_matter(text);

    let mut sections = Vec::new();
    let mut title = PREAMBLE_TITLE.to_string();
    let mut heading: Option<&str> = None;
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        let next = if in_fence {
            None
        } else {
            heading_title(line, level)
        };
        match next {
            Some(next_title) => {
                sections.extend(finish(title, heading, &lines, heading.is_none()));
                title = next_title.to_string();
                heading = Some(line.trim_end());
                lines.clear();
            }
            None => lines.push(line),
        }
    }
    sections.extend(finish(title, heading, &lines, heading.is_none()));
    sections
}

/// `Core Principles!` -> `core-principles`, at most 50 characters.
pub fn section_slug(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let mut slug: String = slug.trim_end_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Children of `parent` are named `parent/NN-slug`, numbered from 1.
pub fn plan_split(parent: &str, text: &str, level: usize, max_tokens: usize) -> Vec<SplitChunk> {
    split_by_heading(text, level)
        .into_iter()
        .enumerate()
        .map(|(i, section)| {
            let metrics = ContentMetrics::measure(&section.text);
            SplitChunk {
                identifier: format!("{parent}/{:02}-{}", i + 1, section_slug(&section.title)),
                title: section.title,
                over_budget: metrics.approx_tokens > max_tokens,
                metrics,
                text: section.text,
                is_preamble: section.is_preamble,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ntitle: Guide\n---\nIntro line.\n\n# Core Principles\nBe clear.\n\n## Detail\nStill core.\n\n# Anti-Patterns\n```sh\n# not a heading\n```\nAvoid noise.\n";

    #[test]
    fn splits_on_top_level_headings_only() {
        let sections = split_by_heading(DOC, 1);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Overview", "Core Principles", "Anti-Patterns"]);
        assert!(sections[0].is_preamble);
        assert_eq!(sections[0].text, "Intro line.\n");
        assert_eq!(
            sections[1].text,
            "# Core Principles\nBe clear.\n\n## Detail\nStill core.\n"
        );
        assert!(sections[2].text.contains("# not a heading"));
    }

    #[test]
    fn second_level_split() {
        let sections = split_by_heading(DOC, 2);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "Detail");
    }

    #[test]
    fn blank_preamble_is_dropped() {
        let sections = split_by_heading("\n\n# One\na\n# Two\nb\n", 1);
        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| !s.is_preamble));
    }

    #[test]
    fn slug_is_lowercase_dashed_and_bounded() {
        assert_eq!(section_slug("Core Principles!"), "core-principles");
        assert_eq!(section_slug("  C++ / Rust  "), "c-rust");
        assert_eq!(section_slug("???"), "section");
        let long = section_slug(&"word ".repeat(30));
        assert!(long.len() <= 50);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn plan_numbers_children_and_flags_budget() {
        let chunks = plan_split("guides/style", DOC, 1, 5);
        let ids: Vec<&str> = chunks.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "guides/style/01-overview",
                "guides/style/02-core-principles",
                "guides/style/03-anti-patterns"
            ]
        );
        assert!(chunks[0].is_preamble);
        assert!(!chunks[0].over_budget);
        assert!(chunks[1].over_budget);
    }
}
