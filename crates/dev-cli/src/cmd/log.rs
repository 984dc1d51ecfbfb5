use super::Project;
use crate::output::print_json;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::Path;

pub fn run(
    root: &Path,
    message: &[String],
    show: bool,
    date: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::load(root)?;
    let logs_root = project.config.logs_root(root);

    if show || message.is_empty() {
        let day = match date {
            Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{d}': expected YYYY-MM-DD"))?,
            None => Local::now().date_naive(),
        };
        let text = dev_core::log::read_day(&logs_root, day)?;
        if json {
            print_json(&serde_json::json!({ "date": day, "log": text }))?;
        } else {
            match text {
                Some(t) => print!("{t}"),
                None => println!("No log for {}.", day.format("%Y-%m-%d")),
            }
        }
        return Ok(());
    }

    let entry = message.join(" ");
    let path = dev_core::log::append_entry(&logs_root, &entry, Local::now().naive_local())
        .context("failed to append log entry")?;

    if json {
        print_json(&serde_json::json!({ "path": path, "entry": entry }))?;
    } else {
        println!("Logged to {}", path.display());
    }
    Ok(())
}
