use dev_core::metrics::{ClipboardSink, ContentMetrics};
use dev_core::{DevError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Pick the clipboard for this invocation: a plain file when one is
/// configured, otherwise the system clipboard.
pub fn sink_for(file: Option<&Path>) -> Box<dyn ClipboardSink> {
    match file {
        Some(path) => Box::new(FileClipboard::new(path)),
        None => Box::new(SystemClipboard),
    }
}

// ---------------------------------------------------------------------------
// FileClipboard
// ---------------------------------------------------------------------------

/// A file standing in for the clipboard (headless machines, tests).
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ClipboardSink for FileClipboard {
    fn write(&self, text: &str) -> Result<ContentMetrics> {
        dev_core::io::atomic_write(&self.path, text.as_bytes())?;
        Ok(ContentMetrics::measure(text))
    }

    fn read(&self) -> Result<String> {
        Ok(dev_core::io::read_optional(&self.path)?.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// SystemClipboard
// ---------------------------------------------------------------------------

struct ClipboardTool {
    copy: &'static str,
    copy_args: &'static [&'static str],
    paste: &'static str,
    paste_args: &'static [&'static str],
}

const TOOLS: &[ClipboardTool] = &[
    ClipboardTool {
        copy: "pbcopy",
        copy_args: &[],
        paste: "pbpaste",
        paste_args: &[],
    },
    ClipboardTool {
        copy: "wl-copy",
        copy_args: &[],
        paste: "wl-paste",
        paste_args: &["--no-newline"],
    },
    ClipboardTool {
        copy: "xclip",
        copy_args: &["-selection", "clipboard"],
        paste: "xclip",
        paste_args: &["-selection", "clipboard", "-o"],
    },
    ClipboardTool {
        copy: "xsel",
        copy_args: &["--clipboard", "--input"],
        paste: "xsel",
        paste_args: &["--clipboard", "--output"],
    },
];

/// The desktop clipboard, driven through whichever copy/paste utility is on
/// `PATH`. Detection happens per call so commands that never touch the
/// clipboard do not require one.
pub struct SystemClipboard;

impl SystemClipboard {
    fn tool() -> Result<(&'static ClipboardTool, PathBuf, PathBuf)> {
        for tool in TOOLS {
            if let (Ok(copy), Ok(paste)) = (which::which(tool.copy), which::which(tool.paste)) {
                tracing::debug!(tool = tool.copy, "using system clipboard utility");
                return Ok((tool, copy, paste));
            }
        }
        Err(DevError::Clipboard(
            "no clipboard utility found (pbcopy, wl-copy, xclip, xsel); \
             use --stdout or set DEV_CLIPBOARD_FILE"
                .to_string(),
        ))
    }
}

impl ClipboardSink for SystemClipboard {
    fn write(&self, text: &str) -> Result<ContentMetrics> {
        let (tool, copy, _) = Self::tool()?;
        let mut child = Command::new(copy)
            .args(tool.copy_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(DevError::Clipboard(format!(
                "{} failed: {}",
                tool.copy,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(ContentMetrics::measure(text))
    }

    fn read(&self) -> Result<String> {
        let (tool, _, paste) = Self::tool()?;
        let output = Command::new(paste)
            .args(tool.paste_args)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(DevError::Clipboard(format!(
                "{} failed: {}",
                tool.paste,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_clipboard_roundtrip() {
        let dir = TempDir::new().unwrap();
        let sink = FileClipboard::new(dir.path().join("clip.txt"));
        let metrics = sink.write("line one\nline two\n").unwrap();
        assert_eq!(metrics.lines, 2);
        assert_eq!(sink.read().unwrap(), "line one\nline two\n");
    }

    #[test]
    fn empty_file_clipboard_reads_empty() {
        let dir = TempDir::new().unwrap();
        let sink = sink_for(Some(&dir.path().join("never-written.txt")));
        assert_eq!(sink.read().unwrap(), "");
    }
}
