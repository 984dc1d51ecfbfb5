use super::context::{load_active, save_active};
use super::Project;
use crate::output::print_json;
use anyhow::Context;
use dev_core::recommend::recommend;
use std::path::Path;

pub struct AnalyzeArgs {
    pub text: Option<String>,
    pub max_modules: Option<usize>,
    pub max_groups: Option<usize>,
    pub apply: bool,
}

pub fn run(
    project: &Project,
    args: AnalyzeArgs,
    clipboard_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match args.text {
        Some(t) => t,
        None => crate::clipboard::sink_for(clipboard_file)
            .read()
            .context("failed to read clipboard")?,
    };

    let max_modules = args
        .max_modules
        .unwrap_or(project.config.recommend.max_modules);
    let max_groups = args.max_groups.unwrap_or(project.config.recommend.max_groups);

    let modules = project.modules();
    let groups = project.groups();
    let rec = recommend(&modules, &groups, &text, max_modules, max_groups);

    let applied = if args.apply && !rec.modules.is_empty() {
        let mut active = load_active(project)?;
        let added = active.extend(rec.module_names());
        save_active(project, &active)?;
        added
    } else {
        Vec::new()
    };

    if json {
        print_json(&serde_json::json!({
            "modules": rec.modules,
            "groups": rec.groups,
            "applied": applied,
        }))?;
        return Ok(());
    }

    if rec.is_empty() {
        println!("No relevant modules or groups found.");
        return Ok(());
    }

    if !rec.modules.is_empty() {
        println!("Suggested modules:");
        for (i, s) in rec.modules.iter().enumerate() {
            println!("{:>3}. {}  (score {:.2})", i + 1, s.name, s.score);
            println!("       dev context add {}", s.name);
        }
    }
    if !rec.groups.is_empty() {
        println!("Suggested groups:");
        for (i, s) in rec.groups.iter().enumerate() {
            println!("{:>3}. {}  (score {:.2})", i + 1, s.name, s.score);
            println!("       dev context add-group {}", s.name);
        }
    }
    if !applied.is_empty() {
        println!("Activated {} suggested module(s).", applied.len());
    }
    Ok(())
}
