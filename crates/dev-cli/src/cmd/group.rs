use super::context::{load_active, save_active};
use super::Project;
use crate::output::{print_json, print_table};
use anyhow::Context;
use dev_core::group::GroupStore;

pub fn create(
    project: &Project,
    name: &str,
    identifiers: Vec<String>,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut groups = project.groups();
    let group = groups
        .create_group(name, identifiers, description)
        .with_context(|| format!("failed to create group '{name}'"))?;

    if json {
        print_json(&group)?;
    } else {
        println!("Created group '{}'.", group.name);
        println!("  Modules: {}", group.modules.join(", "));
    }
    Ok(())
}

pub fn list(project: &Project, json: bool) -> anyhow::Result<()> {
    let groups = project.groups();
    let names = groups.list_groups().context("failed to read groups")?;
    let all = names
        .iter()
        .map(|n| groups.get_group(n))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read groups")?;

    if json {
        print_json(&all)?;
        return Ok(());
    }

    if all.is_empty() {
        println!("No groups.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = all
        .iter()
        .map(|g| {
            vec![
                g.name.clone(),
                g.modules.len().to_string(),
                g.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["GROUP", "MODULES", "DESCRIPTION"], rows);
    Ok(())
}

pub fn show(project: &Project, name: &str, json: bool) -> anyhow::Result<()> {
    let group = project.groups().get_group(name)?;

    if json {
        print_json(&group)?;
        return Ok(());
    }

    println!("Group:   {}", group.name);
    if let Some(desc) = &group.description {
        println!("About:   {desc}");
    }
    println!("Modules: {}", group.modules.len());
    if group.modules.is_empty() {
        println!("  (none)");
    } else {
        for m in &group.modules {
            println!("  {m}");
        }
    }
    Ok(())
}

pub fn extend(
    project: &Project,
    name: &str,
    identifiers: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut groups = project.groups();
    let added = groups.extend_group(name, identifiers)?;

    if json {
        print_json(&serde_json::json!({ "group": name, "added": added }))?;
    } else if added.is_empty() {
        println!("Group '{name}' already contains those modules.");
    } else {
        println!("Added to '{name}': {}", added.join(", "));
    }
    Ok(())
}

pub fn update(
    project: &Project,
    name: &str,
    identifiers: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut groups = project.groups();
    let group = groups.update_group(name, identifiers)?;

    if json {
        print_json(&group)?;
    } else {
        println!("Updated group '{}': {}", group.name, group.modules.join(", "));
    }
    Ok(())
}

pub fn delete(project: &Project, name: &str, json: bool) -> anyhow::Result<()> {
    let mut groups = project.groups();
    let group = groups.delete_group(name)?;

    if json {
        print_json(&serde_json::json!({ "deleted": group.name }))?;
    } else {
        println!("Deleted group '{}'.", group.name);
    }
    Ok(())
}

/// Expand a group into the active set.
pub fn apply(project: &Project, name: &str, json: bool) -> anyhow::Result<()> {
    let groups = project.groups();
    let mut active = load_active(project)?;
    let added = active.apply_group(&groups, name)?;
    save_active(project, &active)?;

    if json {
        print_json(&serde_json::json!({
            "group": name,
            "added": added,
            "active": active.list(),
        }))?;
    } else if added.is_empty() {
        println!("Every module in '{name}' is already active.");
    } else {
        println!("Activated {} module(s) from '{name}':", added.len());
        for id in &added {
            println!("  {id}");
        }
    }
    Ok(())
}
