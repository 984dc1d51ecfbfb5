//! Lexical module and group recommendations for free text.
//!
//! Everything here is a pure function of the candidate universe and the input
//! text. Scoring is pluggable through [`ScoringStrategy`]; ranking, zero-score
//! filtering, tie-breaking and limits are fixed in [`Recommender`].

use crate::group::GroupStore;
use crate::module::{parse_meta, ModuleStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

const MIN_TOKEN_LEN: usize = 3;
const MIN_PARTIAL_LEN: usize = 4;
const RARITY_MIN_UNIVERSE: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "all", "and", "any", "are", "but", "can", "could", "does", "for", "from", "get",
    "has", "have", "help", "how", "into", "its", "just", "like", "make", "need", "not", "our",
    "please", "should", "some", "than", "that", "the", "their", "them", "then", "there", "these",
    "this", "use", "using", "want", "was", "what", "when", "where", "which", "why", "will",
    "with", "would", "you", "your",
];

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Lowercase alphanumeric runs, minus stop words and very short tokens, in
/// first-seen order without duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(str::to_ascii_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// The token set of the free text being matched against.
#[derive(Debug, Clone, Default)]
pub struct TextTokens {
    tokens: BTreeSet<String>,
}

impl TextTokens {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text).into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A module identifier or group name together with the tokens it matches on.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub tokens: Vec<String>,
}

impl Candidate {
    /// Tokens from the name alone, split on `/`, `-` and `_`.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let tokens = tokenize(&name);
        Self { name, tokens }
    }

    /// Name tokens plus the tokens of each tag.
    pub fn with_tags(name: impl Into<String>, tags: &[String]) -> Self {
        let mut candidate = Self::from_name(name);
        for token in tokenize(&tags.join(" ")) {
            if !candidate.tokens.contains(&token) {
                candidate.tokens.push(token);
            }
        }
        candidate
    }
}

// ---------------------------------------------------------------------------
// ScoringStrategy
// ---------------------------------------------------------------------------

pub trait ScoringStrategy {
    /// Relevance of one candidate; `0.0` means unrelated.
    fn score(&self, candidate_tokens: &[String], text_tokens: &TextTokens) -> f64;
}

/// Token overlap weighted toward long, rare tokens.
///
/// An exact token match earns the token's full weight; a containment match
/// (`button` against `buttons`) earns half. Weight grows with token length and
/// is halved for tokens carried by more than half the universe.
#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    document_frequency: HashMap<String, usize>,
    universe: usize,
}

impl LexicalScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_universe(candidates: &[Candidate]) -> Self {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for c in candidates {
            for token in &c.tokens {
                *document_frequency.entry(token.clone()).or_default() += 1;
            }
        }
        Self {
            document_frequency,
            universe: candidates.len(),
        }
    }

    pub fn weight(&self, token: &str) -> f64 {
        let mut weight = 1.0 + token.len() as f64 / 8.0;
        let df = self.document_frequency.get(token).copied().unwrap_or(0);
        if self.universe >= RARITY_MIN_UNIVERSE && df * 2 > self.universe {
            weight /= 2.0;
        }
        weight
    }
}

fn partial_match(a: &str, b: &str) -> bool {
    (a.len() >= MIN_PARTIAL_LEN && b.contains(a)) || (b.len() >= MIN_PARTIAL_LEN && a.contains(b))
}

impl ScoringStrategy for LexicalScorer {
    fn score(&self, candidate_tokens: &[String], text_tokens: &TextTokens) -> f64 {
        candidate_tokens
            .iter()
            .map(|token| {
                if text_tokens.contains(token) {
                    self.weight(token)
                } else if text_tokens.iter().any(|t| partial_match(token, t)) {
                    self.weight(token) / 2.0
                } else {
                    0.0
                }
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub modules: Vec<Scored>,
    pub groups: Vec<Scored>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.groups.is_empty()
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|s| s.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Recommender
// ---------------------------------------------------------------------------

pub struct Recommender<S = LexicalScorer> {
    scorer: S,
}

impl<S: ScoringStrategy> Recommender<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    /// Score every candidate, drop zero scores, order by score descending,
    /// then shorter name, then name, and keep at most `limit`.
    pub fn rank(&self, candidates: &[Candidate], text: &TextTokens, limit: usize) -> Vec<Scored> {
        if limit == 0 || text.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<Scored> = candidates
            .iter()
            .filter_map(|c| {
                let score = self.scorer.score(&c.tokens, text);
                (score > 0.0).then(|| Scored {
                    name: c.name.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.name.len().cmp(&b.name.len()))
                .then_with(|| a.name.cmp(&b.name))
        });
        scored.truncate(limit);
        scored
    }
}

/// Rank prepared module and group candidates against `text` with the default
/// lexical scorer, each universe weighted on its own.
pub fn recommend_candidates(
    modules: &[Candidate],
    groups: &[Candidate],
    text: &str,
    max_modules: usize,
    max_groups: usize,
) -> Recommendation {
    let text = TextTokens::new(text);
    Recommendation {
        modules: Recommender::new(LexicalScorer::for_universe(modules)).rank(
            modules,
            &text,
            max_modules,
        ),
        groups: Recommender::new(LexicalScorer::for_universe(groups)).rank(
            groups,
            &text,
            max_groups,
        ),
    }
}

/// Build candidates from the stores and rank them. Never fails: listing or
/// read errors shrink the candidate universe instead.
pub fn recommend(
    modules: &dyn ModuleStore,
    groups: &dyn GroupStore,
    text: &str,
    max_modules: usize,
    max_groups: usize,
) -> Recommendation {
    let module_candidates = module_candidates(modules);
    let group_candidates: Vec<Candidate> = groups
        .list_groups()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list groups for recommendation");
            Vec::new()
        })
        .into_iter()
        .map(Candidate::from_name)
        .collect();

    recommend_candidates(
        &module_candidates,
        &group_candidates,
        text,
        max_modules,
        max_groups,
    )
}

fn module_candidates(store: &dyn ModuleStore) -> Vec<Candidate> {
    let identifiers = store.list_all().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not list modules for recommendation");
        Vec::new()
    });
    identifiers
        .into_iter()
        .map(|id| match store.resolve(&id) {
            Ok(text) => Candidate::with_tags(id, &parse_meta(&text).tags),
            Err(e) => {
                tracing::warn!(module = %id, error = %e, "scoring module on its name only");
                Candidate::from_name(id)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::MemoryGroupStore;
    use crate::module::MemoryModuleStore;

    fn ui_store() -> MemoryModuleStore {
        [
            ("design/ui-patterns/buttons", "# Buttons\n"),
            (
                "design/principles/visual-hierarchy",
                "---\ntags: [contrast, typography, layout]\n---\n# Visual hierarchy\n",
            ),
            (
                "development/techniques/prompt-engineering",
                "---\ntags: [llm]\n---\n# Prompting\n",
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn tokenize_lowercases_and_drops_noise() {
        assert_eq!(
            tokenize("I need help with Button accessibility, and CONTRAST!"),
            vec!["button", "accessibility", "contrast"]
        );
        assert_eq!(
            tokenize("design/ui-patterns/buttons"),
            vec!["design", "patterns", "buttons"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ?? a an").is_empty());
    }

    #[test]
    fn candidate_merges_tag_tokens() {
        let c = Candidate::with_tags(
            "design/principles/visual-hierarchy",
            &["contrast".to_string(), "visual weight".to_string()],
        );
        assert_eq!(
            c.tokens,
            vec!["design", "principles", "visual", "hierarchy", "contrast", "weight"]
        );
    }

    #[test]
    fn accessibility_request_ranks_ui_modules() {
        let modules = ui_store();
        let groups = MemoryGroupStore::new();
        let rec = recommend(
            &modules,
            &groups,
            "I need help with button accessibility and contrast",
            5,
            2,
        );
        let names = rec.module_names();
        assert!(names.contains(&"design/ui-patterns/buttons"));
        assert!(names.contains(&"design/principles/visual-hierarchy"));
        assert!(!names.contains(&"development/techniques/prompt-engineering"));
        assert!(rec.groups.is_empty());
    }

    #[test]
    fn groups_match_on_name_only() {
        let modules = ui_store();
        let mut groups = MemoryGroupStore::new();
        groups
            .create_group("prompting", vec!["design/ui-patterns/buttons".into()], None)
            .unwrap();
        groups
            .create_group("accessibility-review", Vec::new(), None)
            .unwrap();

        let rec = recommend(&modules, &groups, "button accessibility", 5, 2);
        assert_eq!(rec.group_names(), vec!["accessibility-review"]);
    }

    #[test]
    fn zero_scores_are_excluded_and_limits_apply() {
        let modules = ui_store();
        let groups = MemoryGroupStore::new();
        let rec = recommend(&modules, &groups, "contrast buttons", 1, 0);
        assert_eq!(rec.modules.len(), 1);
        assert!(rec.groups.is_empty());

        let none = recommend(&modules, &groups, "quarterly tax filing", 5, 5);
        assert!(none.is_empty());
    }

    #[test]
    fn empty_or_garbage_input_yields_nothing() {
        let modules = ui_store();
        let groups = MemoryGroupStore::new();
        assert!(recommend(&modules, &groups, "", 5, 5).is_empty());
        assert!(recommend(&modules, &groups, "\u{0}\u{1} ### ---", 5, 5).is_empty());
    }

    #[test]
    fn ties_prefer_shorter_then_lexical() {
        let candidates = vec![
            Candidate::from_name("zz/forms-long"),
            Candidate::from_name("b/forms"),
            Candidate::from_name("a/forms"),
        ];
        let ranked = Recommender::new(LexicalScorer::new()).rank(
            &candidates,
            &TextTokens::new("forms"),
            10,
        );
        let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a/forms", "b/forms", "zz/forms-long"]);
    }

    #[test]
    fn exact_match_beats_partial_match() {
        let scorer = LexicalScorer::new();
        let text = TextTokens::new("buttons");
        let exact = scorer.score(&["buttons".to_string()], &text);
        let partial = scorer.score(&["button".to_string()], &text);
        assert!(exact > partial);
        assert!(partial > 0.0);
    }

    #[test]
    fn common_tokens_are_down_weighted() {
        let universe: Vec<Candidate> = [
            "design/forms",
            "design/buttons",
            "design/tables",
            "design/navigation",
        ]
        .into_iter()
        .map(Candidate::from_name)
        .collect();
        let scorer = LexicalScorer::for_universe(&universe);
        assert!(scorer.weight("design") < LexicalScorer::new().weight("design"));
        assert_eq!(scorer.weight("forms"), LexicalScorer::new().weight("forms"));

        let ranked = Recommender::new(scorer).rank(&universe, &TextTokens::new("design tables"), 4);
        assert_eq!(ranked[0].name, "design/tables");
    }

    #[test]
    fn longer_tokens_weigh_more() {
        let scorer = LexicalScorer::new();
        assert!(scorer.weight("accessibility") > scorer.weight("form"));
    }

    #[test]
    fn custom_strategy_plugs_in() {
        struct CountOverlap;
        impl ScoringStrategy for CountOverlap {
            fn score(&self, candidate_tokens: &[String], text_tokens: &TextTokens) -> f64 {
                candidate_tokens
                    .iter()
                    .filter(|t| text_tokens.contains(t))
                    .count() as f64
            }
        }

        let candidates = vec![
            Candidate::from_name("alpha/beta-gamma"),
            Candidate::from_name("alpha/delta"),
        ];
        let ranked = Recommender::new(CountOverlap).rank(
            &candidates,
            &TextTokens::new("alpha gamma beta"),
            5,
        );
        assert_eq!(ranked[0].name, "alpha/beta-gamma");
        assert_eq!(ranked[0].score, 3.0);
        assert_eq!(ranked[1].score, 1.0);
    }
}
