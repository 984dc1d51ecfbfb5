use crate::error::{DevError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named, ordered bundle of module identifiers. Members are names only and
/// are not checked against the module store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>, modules: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            modules,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupRegistry
// ---------------------------------------------------------------------------

/// The persisted form of every group, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRegistry {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub groups: Vec<Group>,
}

fn default_version() -> u32 {
    1
}

fn validate_members(members: &[String]) -> Result<()> {
    members
        .iter()
        .try_for_each(|m| paths::validate_identifier(m))
}

impl GroupRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        match crate::io::read_optional(path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Self {
                version: default_version(),
                groups: Vec::new(),
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&Group> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| DevError::GroupNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| DevError::GroupNotFound(name.to_string()))
    }

    pub fn create(
        &mut self,
        name: &str,
        members: Vec<String>,
        description: Option<String>,
    ) -> Result<Group> {
        paths::validate_group_name(name)?;
        validate_members(&members)?;
        if self.groups.iter().any(|g| g.name == name) {
            return Err(DevError::GroupExists(name.to_string()));
        }
        let mut group = Group::new(name, members);
        group.description = description;
        self.groups.push(group.clone());
        Ok(group)
    }

    /// Append members not already present. Returns the ones actually added.
    pub fn extend(&mut self, name: &str, members: Vec<String>) -> Result<Vec<String>> {
        validate_members(&members)?;
        let group = self.get_mut(name)?;
        let mut added = Vec::new();
        for m in members {
            if !group.modules.contains(&m) {
                group.modules.push(m.clone());
                added.push(m);
            }
        }
        if !added.is_empty() {
            group.updated_at = Utc::now();
        }
        Ok(added)
    }

    /// Replace the member list of an existing group.
    pub fn replace(&mut self, name: &str, members: Vec<String>) -> Result<Group> {
        validate_members(&members)?;
        let group = self.get_mut(name)?;
        group.modules = members;
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    pub fn remove(&mut self, name: &str) -> Result<Group> {
        let idx = self
            .groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| DevError::GroupNotFound(name.to_string()))?;
        Ok(self.groups.remove(idx))
    }
}

// ---------------------------------------------------------------------------
// GroupStore
// ---------------------------------------------------------------------------

pub trait GroupStore {
    fn list_groups(&self) -> Result<Vec<String>>;

    fn get_group(&self, name: &str) -> Result<Group>;

    fn get_members(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.get_group(name)?.modules)
    }

    /// Fails with `GroupExists` if `name` is taken; never overwrites.
    fn create_group(
        &mut self,
        name: &str,
        members: Vec<String>,
        description: Option<String>,
    ) -> Result<Group>;

    fn extend_group(&mut self, name: &str, members: Vec<String>) -> Result<Vec<String>>;

    fn update_group(&mut self, name: &str, members: Vec<String>) -> Result<Group>;

    fn delete_group(&mut self, name: &str) -> Result<Group>;
}

// ---------------------------------------------------------------------------
// FsGroupStore
// ---------------------------------------------------------------------------

/// Groups persisted in a single YAML registry. Each operation re-reads the
/// file and mutations are written back atomically.
#[derive(Debug, Clone)]
pub struct FsGroupStore {
    path: PathBuf,
}

impl FsGroupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::groups_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut GroupRegistry) -> Result<T>) -> Result<T> {
        let mut registry = GroupRegistry::load(&self.path)?;
        let out = f(&mut registry)?;
        registry.save(&self.path)?;
        Ok(out)
    }
}

impl GroupStore for FsGroupStore {
    fn list_groups(&self) -> Result<Vec<String>> {
        Ok(GroupRegistry::load(&self.path)?.names())
    }

    fn get_group(&self, name: &str) -> Result<Group> {
        GroupRegistry::load(&self.path)?.get(name).cloned()
    }

    fn create_group(
        &mut self,
        name: &str,
        members: Vec<String>,
        description: Option<String>,
    ) -> Result<Group> {
        let group = self.mutate(|r| r.create(name, members, description))?;
        tracing::debug!(group = name, members = group.modules.len(), "created group");
        Ok(group)
    }

    fn extend_group(&mut self, name: &str, members: Vec<String>) -> Result<Vec<String>> {
        self.mutate(|r| r.extend(name, members))
    }

    fn update_group(&mut self, name: &str, members: Vec<String>) -> Result<Group> {
        self.mutate(|r| r.replace(name, members))
    }

    fn delete_group(&mut self, name: &str) -> Result<Group> {
        self.mutate(|r| r.remove(name))
    }
}

// ---------------------------------------------------------------------------
// MemoryGroupStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryGroupStore {
    registry: GroupRegistry,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupStore for MemoryGroupStore {
    fn list_groups(&self) -> Result<Vec<String>> {
        Ok(self.registry.names())
    }

    fn get_group(&self, name: &str) -> Result<Group> {
        self.registry.get(name).cloned()
    }

    fn create_group(
        &mut self,
        name: &str,
        members: Vec<String>,
        description: Option<String>,
    ) -> Result<Group> {
        self.registry.create(name, members, description)
    }

    fn extend_group(&mut self, name: &str, members: Vec<String>) -> Result<Vec<String>> {
        self.registry.extend(name, members)
    }

    fn update_group(&mut self, name: &str, members: Vec<String>) -> Result<Group> {
        self.registry.replace(name, members)
    }

    fn delete_group(&mut self, name: &str) -> Result<Group> {
        self.registry.remove(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
