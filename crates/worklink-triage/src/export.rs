//! Diagram rendering of the blocking graph.
//!
//! One `blocks` edge statement is emitted per distinct blocking edge between
//! existing units, ordered by blocker then blocked id. A unit that only
//! appears as a destination is still drawn through that edge.
//!
//! - Mermaid: `graph TD` followed by `    A -->|blocks| B` lines. Ids that
//!   are not plain alphanumeric get an encoded node name and a quoted label.
//! - Graphviz DOT: `digraph worklink { ... }` with `"A" -> "B" [label="blocks"];`.

use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use worklink_core::WorkUnitDataset;
use worklink_core::config::ExportConfig;
use worklink_core::graph::GraphIndex;
use worklink_core::model::ParseEnumError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    Dot,
}

impl DiagramFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Dot => "dot",
        }
    }

    /// The format named in the `[export]` config table.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured name is not a known format.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        config
            .format
            .parse()
            .with_context(|| format!("invalid [export] format '{}'", config.format))
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            _ => Err(ParseEnumError {
                expected: "diagram format",
                got: s.to_string(),
            }),
        }
    }
}

/// Render the blocking graph of `dataset` as text.
#[must_use]
pub fn render_diagram(dataset: &WorkUnitDataset, format: DiagramFormat) -> String {
    let index = GraphIndex::from_dataset(dataset);
    let mut out = String::new();

    match format {
        DiagramFormat::Mermaid => {
            let _ = writeln!(out, "graph TD");
            for edge in index.edges() {
                let _ = writeln!(
                    out,
                    "    {} -->|blocks| {}",
                    mermaid_node(&edge.blocker),
                    mermaid_node(&edge.blocked)
                );
            }
        }
        DiagramFormat::Dot => {
            let _ = writeln!(out, "digraph worklink {{");
            let _ = writeln!(out, "    rankdir=TB;");
            for edge in index.edges() {
                let _ = writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"blocks\"];",
                    escape_dot(&edge.blocker),
                    escape_dot(&edge.blocked)
                );
            }
            let _ = writeln!(out, "}}");
        }
    }

    out
}

/// Render and write the diagram to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
#[instrument(skip(dataset))]
pub fn export_diagram(dataset: &WorkUnitDataset, path: &Path, format: DiagramFormat) -> Result<()> {
    let body = render_diagram(dataset, format);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("failed to write diagram {}", path.display()))?;
    info!(path = %path.display(), %format, "diagram exported");
    Ok(())
}

fn escape_dot(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Node reference for a Mermaid edge line.
///
/// `_` never appears in a plain id, so encoded names cannot collide with
/// plain ones or with each other.
fn mermaid_node(id: &str) -> String {
    let plain = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric())
        && !id.eq_ignore_ascii_case("end");
    if plain {
        return id.to_string();
    }
    let mut name = String::from("u_");
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            let _ = write!(name, "_{:x}_", u32::from(c));
        }
    }
    let label = id.replace('#', "#35;").replace('"', "#quot;");
    format!("{name}[\"{label}\"]")
}
