use crate::error::Result;
use crate::group::GroupStore;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ActiveSet
// ---------------------------------------------------------------------------

/// The ordered, duplicate-free list of modules selected for assembly.
///
/// Iteration order is insertion order. Re-adding a removed identifier appends
/// it at the end. Identifiers are not checked against the module store; a
/// stale entry surfaces as a skip at assembly time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveSet {
    #[serde(default)]
    modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Load `.dev/session.yaml`; a missing file is an empty session.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(&paths::session_path(root))
    }

    /// Hand-edited files may repeat an identifier; only the first occurrence
    /// is kept.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw: Self = match crate::io::read_optional(path)? {
            Some(data) if !data.trim().is_empty() => serde_yaml::from_str(&data)?,
            _ => return Ok(Self::new()),
        };
        let mut set = Self {
            modules: Vec::with_capacity(raw.modules.len()),
            updated_at: raw.updated_at,
        };
        for id in raw.modules {
            if !set.contains(&id) {
                set.modules.push(id);
            }
        }
        Ok(set)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        self.save_to(&paths::session_path(root))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn list(&self) -> &[String] {
        &self.modules
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.modules.iter().any(|m| m == identifier)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Append `identifier`. Returns `false` if it was already active.
    pub fn add(&mut self, identifier: &str) -> bool {
        if self.contains(identifier) {
            return false;
        }
        self.modules.push(identifier.to_string());
        self.updated_at = Some(Utc::now());
        true
    }

    /// Add each identifier in order. Returns the ones that were new.
    pub fn extend<I, S>(&mut self, identifiers: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        identifiers
            .into_iter()
            .filter(|id| self.add(id.as_ref()))
            .map(|id| id.as_ref().to_string())
            .collect()
    }

    /// Remove `identifier`. Returns `false` if it was not active.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m != identifier);
        if self.modules.len() < before {
            self.updated_at = Some(Utc::now());
            true
        } else {
            false
        }
    }

    /// Expand a group into the set, in group order, skipping members that are
    /// already active. Fails only when the group does not exist.
    pub fn apply_group(&mut self, groups: &dyn GroupStore, name: &str) -> Result<Vec<String>> {
        let members = groups.get_members(name)?;
        Ok(self.extend(&members))
    }

    /// Empty the set. Returns how many identifiers were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.modules.len();
        if removed > 0 {
            self.modules.clear();
            self.updated_at = Some(Utc::now());
        }
        removed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DevError;
    use crate::group::MemoryGroupStore;
    use tempfile::TempDir;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_preserves_insertion_order_without_duplicates() {
        let mut set = ActiveSet::new();
        assert!(set.add("b"));
        assert!(set.add("a"));
        assert!(!set.add("b"));
        assert_eq!(set.list(), ids(&["b", "a"]).as_slice());
    }

    #[test]
    fn remove_then_add_moves_to_end() {
        let mut set = ActiveSet::new();
        set.extend(["a", "b", "c"]);
        assert!(set.remove("a"));
        assert!(set.add("a"));
        assert_eq!(set.list(), ids(&["b", "c", "a"]).as_slice());
    }

    #[test]
    fn remove_absent_signals_not_active() {
        let mut set = ActiveSet::new();
        assert!(!set.remove("ghost"));
        set.add("x");
        assert!(set.remove("x"));
        assert!(set.is_empty());
    }

    #[test]
    fn apply_group_skips_already_active_members() {
        let mut groups = MemoryGroupStore::new();
        groups.create_group("g", ids(&["a", "b", "c"]), None).unwrap();

        let mut set = ActiveSet::new();
        set.add("a");
        let added = set.apply_group(&groups, "g").unwrap();
        assert_eq!(added, ids(&["b", "c"]));
        assert_eq!(set.list(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn apply_unknown_group_fails_and_leaves_set_alone() {
        let groups = MemoryGroupStore::new();
        let mut set = ActiveSet::new();
        set.add("keep");
        let err = set.apply_group(&groups, "missing").unwrap_err();
        assert!(matches!(err, DevError::GroupNotFound(_)));
        assert_eq!(set.list(), ids(&["keep"]).as_slice());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut set = ActiveSet::new();
        set.extend(["a", "b"]);
        assert_eq!(set.clear(), 2);
        assert_eq!(set.clear(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn session_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut set = ActiveSet::new();
        set.extend(["design/ui-patterns/buttons", "design/principles/visual-hierarchy"]);
        set.save(dir.path()).unwrap();

        let loaded = ActiveSet::load(dir.path()).unwrap();
        assert_eq!(loaded.list(), set.list());
        assert!(loaded.updated_at().is_some());
    }

    #[test]
    fn load_drops_repeated_identifiers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(&path, "modules: [a, b, a, c, b]\n").unwrap();

        let set = ActiveSet::load_from(&path).unwrap();
        assert_eq!(set.list(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn missing_session_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(ActiveSet::load(dir.path()).unwrap().is_empty());
    }
}
