use crate::module::{parse_meta, ModuleStore};
use crate::types::Priority;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyFormat {
    /// Each module wrapped in `<context name=".." priority="..">` tags.
    #[default]
    Tagged,
    /// Module texts separated by a blank line.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledModule {
    pub identifier: String,
    pub priority: Priority,
    pub characters: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModule {
    pub identifier: String,
    pub reason: String,
}

/// Result of an assembly. `skipped` non-empty means a partial assembly: the
/// text holds every module that resolved, in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assembly {
    pub text: String,
    pub included: Vec<AssembledModule>,
    pub skipped: Vec<SkippedModule>,
}

impl Assembly {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn skipped_identifiers(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.identifier.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

pub struct Assembler<'a> {
    store: &'a dyn ModuleStore,
    default_priority: Priority,
    format: AssemblyFormat,
}

impl<'a> Assembler<'a> {
    pub fn new(store: &'a dyn ModuleStore) -> Self {
        Self {
            store,
            default_priority: Priority::default(),
            format: AssemblyFormat::default(),
        }
    }

    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn with_format(mut self, format: AssemblyFormat) -> Self {
        self.format = format;
        self
    }

    /// Concatenate modules in the given order, re-reading each from the store.
    ///
    /// Never fails: an identifier that does not resolve is recorded in
    /// `skipped` and the rest of the assembly proceeds.
    pub fn assemble<I, S>(&self, identifiers: I) -> Assembly
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut assembly = Assembly::default();
        let mut blocks: Vec<String> = Vec::new();

        for id in identifiers {
            let id = id.as_ref();
            let text = match self.store.resolve(id) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(module = id, error = %e, "skipping module during assembly");
                    assembly.skipped.push(SkippedModule {
                        identifier: id.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let priority = parse_meta(&text).priority.unwrap_or(self.default_priority);
            blocks.push(self.render_block(id, priority, &text));
            assembly.included.push(AssembledModule {
                identifier: id.to_string(),
                priority,
                characters: text.chars().count(),
            });
        }

        assembly.text = blocks.join("\n");
        assembly
    }

    fn render_block(&self, identifier: &str, priority: Priority, text: &str) -> String {
        let mut block = String::with_capacity(text.len() + 64);
        if self.format == AssemblyFormat::Tagged {
            block.push_str(&format!(
                "<context name=\"{}\" priority=\"{}\">\n",
                escape_attr(identifier),
                priority
            ));
        }
        block.push_str(text);
        if !text.ends_with('\n') {
            block.push('\n');
        }
        if self.format == AssemblyFormat::Tagged {
            block.push_str("</context>\n");
        }
        block
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
