use super::context::load_active;
use super::Project;
use crate::output::{print_json, print_table};
use anyhow::Context;
use dev_core::{
    metrics::module_stats,
    module::{
        import_markdown, parse_meta, scaffold_text, scaffold_with_body, title_from_identifier,
        ModuleStore,
    },
    split::plan_split,
    types::Priority,
    DevError,
};
use std::path::Path;

pub fn list(project: &Project, filter: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = project.modules();
    let active = load_active(project)?;
    let identifiers: Vec<String> = store
        .list_all()
        .context("failed to list modules")?
        .into_iter()
        .filter(|id| filter.map_or(true, |f| id.contains(f)))
        .collect();

    let entries: Vec<(String, Option<String>, Priority, bool)> = identifiers
        .into_iter()
        .map(|id| {
            let meta = store.resolve(&id).map(|t| parse_meta(&t)).unwrap_or_default();
            let priority = meta.priority.unwrap_or(project.config.default_priority);
            let is_active = active.contains(&id);
            (id, meta.title, priority, is_active)
        })
        .collect();

    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, title, priority, is_active)| {
                serde_json::json!({
                    "identifier": id,
                    "title": title,
                    "priority": priority,
                    "active": is_active,
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "No modules found in {}.",
            project.config.modules_root(&project.root).display()
        );
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .into_iter()
        .map(|(id, title, priority, is_active)| {
            vec![
                if is_active { "*".to_string() } else { String::new() },
                id,
                priority.to_string(),
                title.unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["", "MODULE", "PRIORITY", "TITLE"], rows);
    Ok(())
}

pub fn show(project: &Project, identifier: &str, json: bool) -> anyhow::Result<()> {
    let text = project.modules().resolve(identifier)?;
    if json {
        print_json(&serde_json::json!({
            "identifier": identifier,
            "meta": parse_meta(&text),
            "text": text,
        }))?;
        return Ok(());
    }
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn stats(project: &Project, identifiers: &[String], json: bool) -> anyhow::Result<()> {
    let store = project.modules();
    let targets: Vec<String> = if identifiers.is_empty() {
        load_active(project)?.list().to_vec()
    } else {
        identifiers.to_vec()
    };
    let report = module_stats(&store, &targets);

    if json {
        print_json(&report)?;
        return Ok(());
    }

    for skipped in &report.skipped {
        eprintln!(
            "warning: skipped '{}': {}",
            skipped.identifier, skipped.reason
        );
    }
    if report.modules.is_empty() {
        println!("Nothing to measure.");
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = report
        .modules
        .iter()
        .map(|m| {
            vec![
                m.identifier.clone(),
                m.metrics.characters.to_string(),
                m.metrics.lines.to_string(),
                m.metrics.words.to_string(),
                m.metrics.approx_tokens.to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        "TOTAL".to_string(),
        report.total.characters.to_string(),
        report.total.lines.to_string(),
        report.total.words.to_string(),
        report.total.approx_tokens.to_string(),
    ]);
    print_table(&["MODULE", "CHARS", "LINES", "WORDS", "~TOKENS"], rows);
    Ok(())
}

pub fn scaffold(
    project: &Project,
    identifier: &str,
    title: Option<&str>,
    priority: Option<&str>,
    from: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let priority = match priority {
        Some(p) => p.parse::<Priority>()?,
        None => project.config.default_priority,
    };
    let source = from
        .map(|p| {
            std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        })
        .transpose()?;
    let (source_title, body) = match &source {
        Some(s) => import_markdown(s),
        None => (None, ""),
    };
    let title = title
        .map(str::to_string)
        .or(source_title)
        .unwrap_or_else(|| title_from_identifier(identifier));
    let text = if source.is_some() {
        scaffold_with_body(&title, priority, body)?
    } else {
        scaffold_text(&title, priority)?
    };
    let path = project.modules().create(identifier, &text)?;

    if json {
        print_json(&serde_json::json!({
            "identifier": identifier,
            "title": title,
            "path": path,
        }))?;
    } else {
        println!("Created module '{identifier}' at {}", path.display());
    }
    Ok(())
}

/// Write one child module per heading. The parent module is left untouched.
pub fn split(
    project: &Project,
    identifier: &str,
    level: usize,
    max_tokens: usize,
    json: bool,
) -> anyhow::Result<()> {
    let store = project.modules();
    let text = store.resolve(identifier)?;
    let chunks = plan_split(identifier, &text, level, max_tokens);
    if chunks.iter().all(|c| c.is_preamble) {
        anyhow::bail!("'{identifier}' has no level-{level} headings to split on");
    }
    if let Some(taken) = chunks.iter().find(|c| store.exists(&c.identifier)) {
        return Err(DevError::ModuleExists(taken.identifier.clone()).into());
    }

    let mut written = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let path = store
            .create(&chunk.identifier, &chunk.text)
            .with_context(|| format!("failed to write '{}'", chunk.identifier))?;
        written.push(path);
    }

    if json {
        print_json(&serde_json::json!({
            "parent": identifier,
            "max_tokens": max_tokens,
            "modules": chunks,
        }))?;
        return Ok(());
    }

    for (chunk, path) in chunks.iter().zip(&written) {
        println!(
            "Created '{}' at {} (~{} tokens)",
            chunk.identifier,
            path.display(),
            chunk.metrics.approx_tokens
        );
        if chunk.over_budget {
            eprintln!(
                "warning: '{}' is ~{} tokens, above the {max_tokens} token budget; consider splitting it further",
                chunk.identifier, chunk.metrics.approx_tokens
            );
        }
    }
    Ok(())
}
