//! `DiffReport`: a structured rendering of `bundle diff`'s output, in three
//! formats, generalizing `signia-cli::output`'s JSON-or-human split the way
//! spec §6's CLI table calls `diff`'s output a "diff report" rather than
//! raw stdout prose.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
    Markdown,
}

impl ReportFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(anyhow::anyhow!("unknown report format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub local_version: String,
    pub remote_version: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
            ReportFormat::Text => self.render_text(),
            ReportFormat::Markdown => self.render_markdown(),
        }
    }

    fn render_text(&self) -> String {
        let mut out = format!(
            "local {} -> remote {}\n",
            self.local_version, self.remote_version
        );
        if self.is_empty() {
            out.push_str("no differences\n");
            return out;
        }
        for path in &self.added {
            out.push_str(&format!("+ {path}\n"));
        }
        for path in &self.updated {
            out.push_str(&format!("~ {path}\n"));
        }
        for path in &self.removed {
            out.push_str(&format!("- {path}\n"));
        }
        out
    }

    fn render_markdown(&self) -> String {
        let mut out = format!(
            "## Diff: `{}` -> `{}`\n\n",
            self.local_version, self.remote_version
        );
        if self.is_empty() {
            out.push_str("_no differences_\n");
            return out;
        }
        if !self.added.is_empty() {
            out.push_str("### Added\n\n");
            for path in &self.added {
                out.push_str(&format!("- `{path}`\n"));
            }
            out.push('\n');
        }
        if !self.updated.is_empty() {
            out.push_str("### Updated\n\n");
            for path in &self.updated {
                out.push_str(&format!("- `{path}`\n"));
            }
            out.push('\n');
        }
        if !self.removed.is_empty() {
            out.push_str("### Removed\n\n");
            for path in &self.removed {
                out.push_str(&format!("- `{path}`\n"));
            }
        }
        out
    }
}
