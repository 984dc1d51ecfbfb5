use crate::error::{DevError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEV_DIR: &str = ".dev";
pub const CONFIG_FILE: &str = ".dev/config.yaml";
pub const GROUPS_FILE: &str = ".dev/groups.yaml";
pub const SESSION_FILE: &str = ".dev/session.yaml";

pub const DEFAULT_MODULES_DIR: &str = "context";
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn dev_dir(root: &Path) -> PathBuf {
    root.join(DEV_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn groups_path(root: &Path) -> PathBuf {
    root.join(GROUPS_FILE)
}

pub fn session_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE)
}

/// Map a validated identifier onto a file below `base`.
///
/// `design/ui-patterns/buttons` + `md` becomes `base/design/ui-patterns/buttons.md`.
pub fn module_file(base: &Path, identifier: &str, extension: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    let (dirs, leaf) = identifier.rsplit_once('/').unwrap_or(("", identifier));
    for segment in dirs.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    // Not `set_extension`: it would clobber dots already in the leaf name.
    path.push(format!("{leaf}.{extension}"));
    path
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject identifiers that could escape the module store root or that do not
/// map onto exactly one file.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let invalid = |reason| Err(DevError::InvalidIdentifier(identifier.to_string(), reason));

    if identifier.trim().is_empty() {
        return invalid("identifier is empty");
    }
    if identifier.starts_with('/') {
        return invalid("identifier must be relative");
    }
    if identifier.contains('\\') || identifier.contains(':') || identifier.contains('\0') {
        return invalid("identifier contains a forbidden character");
    }
    for segment in identifier.split('/') {
        match segment {
            "" => return invalid("identifier contains an empty segment"),
            "." | ".." => return invalid("identifier contains a path traversal segment"),
            s if s.starts_with('.') => return invalid("segments must not start with '.'"),
            _ => {}
        }
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains("..")
        || name.chars().any(char::is_whitespace)
    {
        return Err(DevError::InvalidGroupName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
