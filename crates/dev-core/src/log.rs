use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// `logs/2026-10-16.md`
pub fn day_path(logs_root: &Path, date: NaiveDate) -> PathBuf {
    logs_root.join(format!("{}.md", date.format("%Y-%m-%d")))
}

/// Append a timestamped entry to the day's log, creating the file with a
/// heading on first use. Returns the log file path.
pub fn append_entry(logs_root: &Path, message: &str, at: NaiveDateTime) -> Result<PathBuf> {
    let path = day_path(logs_root, at.date());

    let mut text = String::new();
    if !path.exists() {
        text.push_str(&format!("# Log {}\n", at.date().format("%Y-%m-%d")));
    }
    text.push_str(&format!(
        "\n## {}\n\n{}\n",
        at.format("%H:%M"),
        message.trim_end()
    ));

    crate::io::append_text(&path, &text)?;
    tracing::debug!(path = %path.display(), "appended log entry");
    Ok(path)
}

pub fn read_day(logs_root: &Path, date: NaiveDate) -> Result<Option<String>> {
    crate::io::read_optional(&day_path(logs_root, date))
}
