use crate::output::print_json;
use anyhow::Context;
use dev_core::{config::Config, io, paths};
use std::path::{Path, PathBuf};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut created: Vec<PathBuf> = Vec::new();
    let mut existing: Vec<PathBuf> = Vec::new();

    let dev_dir = paths::dev_dir(root);
    io::ensure_dir(&dev_dir).with_context(|| format!("failed to create {}", dev_dir.display()))?;

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        existing.push(config_path);
        Config::load(root).context("failed to read config.yaml")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        created.push(config_path);
        cfg
    };

    for dir in [config.modules_root(root), config.logs_root(root)] {
        if dir.is_dir() {
            existing.push(dir);
        } else {
            io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
            created.push(dir);
        }
    }

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "created": created,
            "exists": existing,
        }))?;
        return Ok(());
    }

    println!("Initializing dev in: {}", root.display());
    for path in &created {
        println!("  created: {}", relative(root, path).display());
    }
    for path in &existing {
        println!("  exists:  {}", relative(root, path).display());
    }
    Ok(())
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
