use crate::config::Config;
use crate::error::{DevError, Result};
use crate::paths;
use crate::types::Priority;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// ModuleStore
// ---------------------------------------------------------------------------

/// Read-only access to context modules addressed by slash-delimited identifiers.
pub trait ModuleStore {
    /// Return the full text of one module. Fails with `InvalidIdentifier` for
    /// malformed or escaping identifiers and `ModuleNotFound` when absent.
    fn resolve(&self, identifier: &str) -> Result<String>;

    /// Every resolvable identifier, sorted.
    fn list_all(&self) -> Result<Vec<String>>;

    fn exists(&self, identifier: &str) -> bool {
        self.resolve(identifier).is_ok()
    }
}

// ---------------------------------------------------------------------------
// FsModuleStore
// ---------------------------------------------------------------------------

/// Modules stored as plain files below a base directory, one file per
/// identifier. Nothing is cached: every call reads the disk.
#[derive(Debug, Clone)]
pub struct FsModuleStore {
    base: PathBuf,
    extension: String,
}

impl FsModuleStore {
    pub fn new(base: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self::new(config.modules_root(root), config.extension.clone())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        paths::validate_identifier(identifier)?;
        Ok(paths::module_file(&self.base, identifier, &self.extension))
    }

    /// Write a new module. Fails with `ModuleExists` rather than overwrite.
    pub fn create(&self, identifier: &str, content: &str) -> Result<PathBuf> {
        let path = self.path_for(identifier)?;
        if !crate::io::write_if_missing(&path, content.as_bytes())? {
            return Err(DevError::ModuleExists(identifier.to_string()));
        }
        Ok(path)
    }

    fn identifier_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.base).ok()?;
        let leaf = rel.file_name()?.to_str()?;
        let stem = leaf.strip_suffix(&format!(".{}", self.extension))?;
        let mut segments: Vec<&str> = Vec::new();
        if let Some(parent) = rel.parent() {
            for component in parent.components() {
                segments.push(component.as_os_str().to_str()?);
            }
        }
        segments.push(stem);
        let identifier = segments.join("/");
        paths::validate_identifier(&identifier).ok()?;
        Some(identifier)
    }
}

impl ModuleStore for FsModuleStore {
    fn resolve(&self, identifier: &str) -> Result<String> {
        let path = self.path_for(identifier)?;
        if !path.is_file() {
            return Err(DevError::ModuleNotFound(identifier.to_string()));
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(module = identifier, bytes = text.len(), "resolved module");
                Ok(text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DevError::ModuleNotFound(identifier.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> Result<Vec<String>> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let mut identifiers = Vec::new();
        let walker = WalkDir::new(&self.base)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable module store entry");
                    continue;
                }
            };
            if !entry.path().is_file() {
                continue;
            }
            if let Some(id) = self.identifier_for(entry.path()) {
                identifiers.push(id);
            }
        }

        identifiers.sort();
        Ok(identifiers)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

// ---------------------------------------------------------------------------
// MemoryModuleStore
// ---------------------------------------------------------------------------

/// In-memory store with the same contract as `FsModuleStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleStore {
    modules: BTreeMap<String, String>,
}

impl MemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, content: impl Into<String>) {
        self.modules.insert(identifier.into(), content.into());
    }

    pub fn remove(&mut self, identifier: &str) -> Option<String> {
        self.modules.remove(identifier)
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryModuleStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(items: I) -> Self {
        let mut store = Self::new();
        for (k, v) in items {
            store.insert(k, v);
        }
        store
    }
}

impl ModuleStore for MemoryModuleStore {
    fn resolve(&self, identifier: &str) -> Result<String> {
        paths::validate_identifier(identifier)?;
        self.modules
            .get(identifier)
            .cloned()
            .ok_or_else(|| DevError::ModuleNotFound(identifier.to_string()))
    }

    fn list_all(&self) -> Result<Vec<String>> {
        Ok(self.modules.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Metadata recovered from a module's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleMeta {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
}

static PRIORITY_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn priority_line_re() -> &'static Regex {
    PRIORITY_LINE_RE
        .get_or_init(|| Regex::new(r"(?m)^#priority:\s*([A-Za-z]+)\s*$").expect("valid regex"))
}

/// Split `---` delimited YAML front matter from the body.
///
/// Returns `(Some(yaml), body)` when the text opens with a complete block,
/// otherwise `(None, text)`.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

/// Parse title, priority and tags. Malformed front matter is ignored; a
/// legacy `#priority: <level>` line supplies the priority when the front
/// matter does not.
pub fn parse_meta(text: &str) -> ModuleMeta {
    let (yaml, body) = split_front_matter(text);
    let front: FrontMatter = match yaml {
        Some(yaml) => serde_yaml::from_str(yaml).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "ignoring malformed front matter");
            FrontMatter::default()
        }),
        None => FrontMatter::default(),
    };

    let priority = front
        .priority
        .as_deref()
        .and_then(|p| p.parse::<Priority>().ok())
        .or_else(|| {
            priority_line_re()
                .captures(body)
                .and_then(|c| c[1].parse::<Priority>().ok())
        });

    ModuleMeta {
        title: front.title,
        priority,
        tags: front.tags,
    }
}

// ---------------------------------------------------------------------------
// Scaffolding
// ---------------------------------------------------------------------------

const SCAFFOLD_SECTIONS: &[&str] = &[
    "Conceptual Definition",
    "Core Principles",
    "Implementation Patterns",
    "Anti-Patterns",
    "Reasoning Principles",
    "Related Concepts",
];

/// `design/principles/visual-hierarchy` -> `Visual Hierarchy`.
pub fn title_from_identifier(identifier: &str) -> String {
    let leaf = identifier.rsplit('/').next().unwrap_or(identifier);
    leaf.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Skeleton text for a new module.
pub fn scaffold_text(title: &str, priority: Priority) -> Result<String> {
    let front = FrontMatter {
        title: Some(title.to_string()),
        priority: Some(priority.to_string()),
        tags: Vec::new(),
    };
    let yaml = serde_yaml::to_string(&front)?;

    let mut text = format!("---\n{yaml}---\n\n# {title}\n");
    for section in SCAFFOLD_SECTIONS {
        text.push_str(&format!("\n## {section}\n\n"));
    }
    Ok(text)
}

/// Split an existing markdown document into an optional title and body.
/// Front matter is dropped; a leading `#` heading becomes the title and is
/// removed from the body.
pub fn import_markdown(source: &str) -> (Option<String>, &str) {
    let (_, body) = split_front_matter(source);
    let body = body.trim_start_matches(['\n', '\r']);
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
    if first.starts_with('#') {
        let title = first.trim_start_matches('#').trim();
        if !title.is_empty() {
            return (Some(title.to_string()), rest);
        }
    }
    (None, body)
}

/// Skeleton text followed by `body`, for turning existing notes into a module.
pub fn scaffold_with_body(title: &str, priority: Priority, body: &str) -> Result<String> {
    let mut text = scaffold_text(title, priority)?;
    let body = body.trim();
    if !body.is_empty() {
        text.push('\n');
        text.push_str(body);
        text.push('\n');
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fs_store(dir: &TempDir) -> FsModuleStore {
        FsModuleStore::new(dir.path().join("context"), "md")
    }

    fn write(dir: &TempDir, rel: &str, text: &str) {
        let path = dir.path().join("context").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn resolve_reads_module_text() {
        let dir = TempDir::new().unwrap();
        write(&dir, "design/ui-patterns/buttons.md", "# Buttons\n");
        let store = fs_store(&dir);
        assert_eq!(
            store.resolve("design/ui-patterns/buttons").unwrap(),
            "# Buttons\n"
        );
    }

    #[test]
    fn resolve_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = fs_store(&dir).resolve("design/nope").unwrap_err();
        assert!(matches!(err, DevError::ModuleNotFound(ref id) if id == "design/nope"));
    }

    #[test]
    fn resolve_rejects_traversal_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("secret.md"), "top secret").unwrap();
        let store = fs_store(&dir);
        for id in ["../../etc/passwd", "../secret"] {
            let err = store.resolve(id).unwrap_err();
            assert!(matches!(err, DevError::InvalidIdentifier(..)), "{id}: {err:?}");
        }
    }

    #[test]
    fn resolve_is_case_sensitive_and_exact() {
        let dir = TempDir::new().unwrap();
        write(&dir, "design/Buttons.md", "x");
        let store = fs_store(&dir);
        assert!(store.resolve("design/Buttons").is_ok());
        assert!(store.resolve("design/button").is_err());
    }

    #[test]
    fn resolve_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("context/design.md")).unwrap();
        let err = fs_store(&dir).resolve("design").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_all_is_sorted_and_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "development/techniques/prompt-engineering.md", "p");
        write(&dir, "design/ui-patterns/buttons.md", "b");
        write(&dir, "design/principles/visual-hierarchy.md", "v");
        write(&dir, "design/notes.txt", "ignored");
        write(&dir, ".git/HEAD.md", "ignored");
        write(&dir, "design/.draft.md", "ignored");

        let ids = fs_store(&dir).list_all().unwrap();
        assert_eq!(
            ids,
            vec![
                "design/principles/visual-hierarchy",
                "design/ui-patterns/buttons",
                "development/techniques/prompt-engineering",
            ]
        );
    }

    #[test]
    fn list_all_missing_base_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(fs_store(&dir).list_all().unwrap().is_empty());
    }

    #[test]
    fn create_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = fs_store(&dir);
        let path = store.create("design/new-thing", "first").unwrap();
        assert!(path.ends_with("design/new-thing.md"));
        let err = store.create("design/new-thing", "second").unwrap_err();
        assert!(matches!(err, DevError::ModuleExists(_)));
        assert_eq!(store.resolve("design/new-thing").unwrap(), "first");
    }

    #[test]
    fn memory_store_matches_contract() {
        let mut store: MemoryModuleStore = [("b/two", "2"), ("a/one", "1")].into_iter().collect();
        assert_eq!(store.list_all().unwrap(), vec!["a/one", "b/two"]);
        assert_eq!(store.resolve("a/one").unwrap(), "1");
        assert!(matches!(
            store.resolve("../a/one").unwrap_err(),
            DevError::InvalidIdentifier(..)
        ));
        store.remove("a/one");
        assert!(store.resolve("a/one").unwrap_err().is_not_found());
    }

    #[test]
    fn parse_meta_reads_front_matter() {
        let text = "---\ntitle: \"Buttons\"\npriority: high\ntags: [contrast, a11y]\n---\n# Body\n";
        let meta = parse_meta(text);
        assert_eq!(meta.title.as_deref(), Some("Buttons"));
        assert_eq!(meta.priority, Some(Priority::High));
        assert_eq!(meta.tags, vec!["contrast", "a11y"]);
    }

    #[test]
    fn parse_meta_falls_back_to_priority_line() {
        let meta = parse_meta("# Title\n\n#priority: critical\n\nbody");
        assert_eq!(meta.priority, Some(Priority::Critical));
        assert!(meta.title.is_none());
    }

    #[test]
    fn parse_meta_tolerates_garbage() {
        let meta = parse_meta("---\n: : [unclosed\n---\nbody");
        assert_eq!(meta, ModuleMeta::default());
        let meta = parse_meta("---\npriority: someday\n---\n");
        assert!(meta.priority.is_none());
    }

    #[test]
    fn split_front_matter_requires_closing_fence() {
        assert_eq!(split_front_matter("---\ntitle: x\nbody"), (None, "---\ntitle: x\nbody"));
        assert_eq!(
            split_front_matter("---\ntitle: x\n---\nbody"),
            (Some("title: x\n"), "body")
        );
    }

    #[test]
    fn scaffold_text_has_front_matter_and_sections() {
        let text = scaffold_text("Visual Hierarchy", Priority::Medium).unwrap();
        let meta = parse_meta(&text);
        assert_eq!(meta.title.as_deref(), Some("Visual Hierarchy"));
        assert_eq!(meta.priority, Some(Priority::Medium));
        assert!(text.contains("## Anti-Patterns"));
        assert!(text.contains("## Related Concepts"));
    }

    #[test]
    fn import_markdown_takes_heading_as_title() {
        let (title, body) =
            import_markdown("---\nsource: notes\n---\n\n# Active Voice\nPrefer it.\n");
        assert_eq!(title.as_deref(), Some("Active Voice"));
        assert_eq!(body, "Prefer it.\n");

        let (title, body) = import_markdown("No heading here.\nSecond line.\n");
        assert!(title.is_none());
        assert_eq!(body, "No heading here.\nSecond line.\n");
    }

    #[test]
    fn scaffold_with_body_appends_source_below_sections() {
        let text = scaffold_with_body("Active Voice", Priority::High, "Prefer it.\n").unwrap();
        assert_eq!(parse_meta(&text).priority, Some(Priority::High));
        let sections_end = text.find("## Related Concepts").unwrap();
        assert!(text[sections_end..].ends_with("\nPrefer it.\n"));

        let bare = scaffold_with_body("Empty", Priority::Low, "  \n").unwrap();
        assert_eq!(bare, scaffold_text("Empty", Priority::Low).unwrap());
    }

    #[test]
    fn title_from_identifier_capitalizes_leaf() {
        assert_eq!(
            title_from_identifier("design/principles/visual-hierarchy"),
            "Visual Hierarchy"
        );
        assert_eq!(title_from_identifier("readme"), "Readme");
    }
}
