use super::Project;
use crate::output::{metrics_summary, print_json};
use anyhow::Context;
use clap::Subcommand;
use dev_core::{
    assemble::{Assembler, Assembly, AssemblyFormat},
    metrics::ContentMetrics,
    module::ModuleStore,
    paths,
    session::ActiveSet,
    split::DEFAULT_MAX_TOKENS,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ContextSubcommand {
    /// Add modules to the active set (order is kept, duplicates ignored)
    Add {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Remove modules from the active set
    Remove {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// List the active set in assembly order
    List,
    /// Empty the active set
    Clear,
    /// Add every member of a group to the active set
    #[command(alias = "apply-group")]
    AddGroup { name: String },
    /// Create a named group of modules
    CreateGroup {
        name: String,
        #[arg(required = true)]
        identifiers: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List groups
    Groups,
    /// Show a group's members
    GroupShow { name: String },
    /// Append modules to an existing group
    ExtendGroup {
        name: String,
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Replace the members of an existing group
    UpdateGroup {
        name: String,
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Delete a group
    DeleteGroup { name: String },
    /// Assemble the active set and copy it to the clipboard
    #[command(alias = "copy")]
    Push {
        /// Omit the <context> wrappers
        #[arg(long)]
        plain: bool,
        /// Print the assembly instead of copying it
        #[arg(long)]
        stdout: bool,
    },
    /// Suggest modules and groups for text (clipboard by default)
    Analyze {
        /// Analyze this text instead of the clipboard
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_name = "N")]
        max_modules: Option<usize>,
        #[arg(long, value_name = "N")]
        max_groups: Option<usize>,
        /// Add the suggested modules to the active set
        #[arg(long)]
        apply: bool,
    },
    /// List available modules
    Modules {
        /// Only identifiers containing this substring
        filter: Option<String>,
    },
    /// Print one module
    Show { identifier: String },
    /// Size and token estimates per module (active set when none given)
    Stats { identifiers: Vec<String> },
    /// Create a new module from the standard skeleton
    Scaffold {
        identifier: String,
        #[arg(long)]
        title: Option<String>,
        /// critical | high | medium | low
        #[arg(long)]
        priority: Option<String>,
        /// Append the body of an existing markdown file; its first heading
        /// becomes the title unless --title is given
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },
    /// Split a module into numbered child modules, one per heading
    Split {
        identifier: String,
        /// Warn about children estimated above this many tokens
        #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: usize,
        /// Heading level to split on (1 = '#', 2 = '##')
        #[arg(long, value_name = "N", default_value_t = 1)]
        level: usize,
    },
}

pub fn run(
    root: &Path,
    subcmd: ContextSubcommand,
    clipboard_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::load(root)?;
    match subcmd {
        ContextSubcommand::Add { identifiers } => add(&project, &identifiers, json),
        ContextSubcommand::Remove { identifiers } => remove(&project, &identifiers, json),
        ContextSubcommand::List => list(&project, json),
        ContextSubcommand::Clear => clear(&project, json),
        ContextSubcommand::AddGroup { name } => super::group::apply(&project, &name, json),
        ContextSubcommand::CreateGroup {
            name,
            identifiers,
            description,
        } => super::group::create(&project, &name, identifiers, description, json),
        ContextSubcommand::Groups => super::group::list(&project, json),
        ContextSubcommand::GroupShow { name } => super::group::show(&project, &name, json),
        ContextSubcommand::ExtendGroup { name, identifiers } => {
            super::group::extend(&project, &name, identifiers, json)
        }
        ContextSubcommand::UpdateGroup { name, identifiers } => {
            super::group::update(&project, &name, identifiers, json)
        }
        ContextSubcommand::DeleteGroup { name } => super::group::delete(&project, &name, json),
        ContextSubcommand::Push { plain, stdout } => {
            push(&project, plain, stdout, clipboard_file, json)
        }
        ContextSubcommand::Analyze {
            text,
            max_modules,
            max_groups,
            apply,
        } => super::analyze::run(
            &project,
            super::analyze::AnalyzeArgs {
                text,
                max_modules,
                max_groups,
                apply,
            },
            clipboard_file,
            json,
        ),
        ContextSubcommand::Modules { filter } => {
            super::module::list(&project, filter.as_deref(), json)
        }
        ContextSubcommand::Show { identifier } => {
            super::module::show(&project, &identifier, json)
        }
        ContextSubcommand::Stats { identifiers } => {
            super::module::stats(&project, &identifiers, json)
        }
        ContextSubcommand::Scaffold {
            identifier,
            title,
            priority,
            from,
        } => super::module::scaffold(
            &project,
            &identifier,
            title.as_deref(),
            priority.as_deref(),
            from.as_deref(),
            json,
        ),
        ContextSubcommand::Split {
            identifier,
            max_tokens,
            level,
        } => super::module::split(&project, &identifier, level, max_tokens, json),
    }
}

pub(crate) fn load_active(project: &Project) -> anyhow::Result<ActiveSet> {
    ActiveSet::load(&project.root).context("failed to load .dev/session.yaml")
}

pub(crate) fn save_active(project: &Project, active: &ActiveSet) -> anyhow::Result<()> {
    active
        .save(&project.root)
        .context("failed to save .dev/session.yaml")
}

// ---------------------------------------------------------------------------
// add / remove / list / clear
// ---------------------------------------------------------------------------

fn add(project: &Project, identifiers: &[String], json: bool) -> anyhow::Result<()> {
    for id in identifiers {
        paths::validate_identifier(id)?;
    }

    let store = project.modules();
    let mut active = load_active(project)?;
    let mut added = Vec::new();
    let mut already = Vec::new();
    for id in identifiers {
        if active.add(id) {
            added.push(id.clone());
        } else {
            already.push(id.clone());
        }
    }
    save_active(project, &active)?;

    let missing: Vec<&String> = added.iter().filter(|id| !store.exists(id)).collect();

    if json {
        print_json(&serde_json::json!({
            "added": added,
            "already_active": already,
            "missing": missing,
            "active": active.list(),
        }))?;
        return Ok(());
    }

    for id in &added {
        println!("Activated '{id}'.");
    }
    for id in &already {
        println!("'{id}' is already active.");
    }
    for id in &missing {
        eprintln!("warning: '{id}' does not exist yet; it will be skipped until created");
    }
    Ok(())
}

fn remove(project: &Project, identifiers: &[String], json: bool) -> anyhow::Result<()> {
    let mut active = load_active(project)?;
    let (removed, not_active): (Vec<String>, Vec<String>) =
        identifiers.iter().cloned().partition(|id| active.remove(id));
    save_active(project, &active)?;

    if json {
        print_json(&serde_json::json!({
            "removed": removed,
            "not_active": not_active,
            "active": active.list(),
        }))?;
        return Ok(());
    }

    for id in &removed {
        println!("Deactivated '{id}'.");
    }
    for id in &not_active {
        println!("'{id}' is not active.");
    }
    Ok(())
}

fn list(project: &Project, json: bool) -> anyhow::Result<()> {
    let active = load_active(project)?;
    let store = project.modules();

    if json {
        let items: Vec<serde_json::Value> = active
            .list()
            .iter()
            .map(|id| serde_json::json!({ "identifier": id, "exists": store.exists(id) }))
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if active.is_empty() {
        println!("No active modules.");
        return Ok(());
    }
    for (i, id) in active.list().iter().enumerate() {
        let marker = if store.exists(id) { "" } else { "  (missing)" };
        println!("{:>3}. {id}{marker}", i + 1);
    }
    Ok(())
}

fn clear(project: &Project, json: bool) -> anyhow::Result<()> {
    let mut active = load_active(project)?;
    let removed = active.clear();
    save_active(project, &active)?;

    if json {
        print_json(&serde_json::json!({ "cleared": removed }))?;
    } else if removed == 0 {
        println!("Active set already empty.");
    } else {
        println!("Cleared {removed} active module(s).");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

fn push(
    project: &Project,
    plain: bool,
    stdout: bool,
    clipboard_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let active = load_active(project)?;
    if active.is_empty() {
        if json {
            print_json(&serde_json::json!({ "modules": [], "skipped": [] }))?;
        } else {
            println!("No active modules. Add some with 'dev context add <identifier>'.");
        }
        return Ok(());
    }

    let store = project.modules();
    let format = if plain {
        AssemblyFormat::Plain
    } else {
        AssemblyFormat::Tagged
    };
    let assembly = Assembler::new(&store)
        .with_default_priority(project.config.default_priority)
        .with_format(format)
        .assemble(active.list());

    warn_skipped(&assembly);

    let metrics = if stdout {
        ContentMetrics::measure(&assembly.text)
    } else {
        crate::clipboard::sink_for(clipboard_file)
            .write(&assembly.text)
            .context("failed to copy to clipboard")?
    };

    if json {
        let mut value = serde_json::json!({
            "modules": assembly.included,
            "skipped": assembly.skipped,
            "metrics": metrics,
        });
        if stdout {
            value["text"] = serde_json::Value::String(assembly.text.clone());
        }
        print_json(&value)?;
        return Ok(());
    }

    if stdout {
        print!("{}", assembly.text);
        eprintln!(
            "Assembled {} module(s): {}",
            assembly.included.len(),
            metrics_summary(&metrics)
        );
    } else {
        println!(
            "Copied {} module(s) to clipboard: {}",
            assembly.included.len(),
            metrics_summary(&metrics)
        );
    }
    Ok(())
}

fn warn_skipped(assembly: &Assembly) {
    for skipped in &assembly.skipped {
        eprintln!(
            "warning: skipped '{}': {}",
            skipped.identifier, skipped.reason
        );
    }
}
