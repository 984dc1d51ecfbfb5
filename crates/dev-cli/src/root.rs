use dev_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root that holds `.dev/` and the module store.
///
/// Priority:
/// 1. `--root` flag / `DEV_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.dev/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, paths::DEV_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_dev_dir_from_nested_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".dev")).unwrap();
        let nested = dir.path().join("context/design/deep");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_upward(&nested, ".dev").unwrap(), dir.path());
    }

    #[test]
    fn dev_marker_is_preferred_over_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(project.join(".dev")).unwrap();

        assert_eq!(find_upward(&project, ".dev").unwrap(), project);
        assert_eq!(find_upward(&project, ".git").unwrap(), dir.path());
    }
}
