use crate::error::Result;
use crate::paths;
use crate::types::Priority;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RecommendConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendConfig {
    #[serde(default = "default_max_modules")]
    pub max_modules: usize,
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
}

fn default_max_modules() -> usize {
    5
}

fn default_max_groups() -> usize {
    3
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            max_modules: default_max_modules(),
            max_groups: default_max_groups(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Module store root, relative to the project root unless absolute.
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
    /// File extension of module files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    /// Priority used for modules that declare none.
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default)]
    pub recommend: RecommendConfig,
}

fn default_version() -> u32 {
    1
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_MODULES_DIR)
}

fn default_extension() -> String {
    paths::DEFAULT_EXTENSION.to_string()
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_LOGS_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            modules_dir: default_modules_dir(),
            extension: default_extension(),
            logs_dir: default_logs_dir(),
            default_priority: Priority::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl Config {
    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Load `.dev/config.yaml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match crate::io::read_optional(&path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Resolved locations
    // ---------------------------------------------------------------------------

    pub fn modules_root(&self, root: &Path) -> PathBuf {
        root.join(&self.modules_dir)
    }

    pub fn logs_root(&self, root: &Path) -> PathBuf {
        root.join(&self.logs_dir)
    }

    // ---------------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let ext = self.extension.trim();
        if ext.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "extension is empty; module files could not be located".to_string(),
            });
        } else if ext.starts_with('.') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("extension '{ext}' must not start with '.'"),
            });
        }

        let modules_root = self.modules_root(root);
        if !modules_root.is_dir() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "modules directory {} does not exist; run 'dev init'",
                    modules_root.display()
                ),
            });
        }

        if self.recommend.max_modules == 0 && self.recommend.max_groups == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "recommend limits are both 0; analyze will never suggest anything"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
