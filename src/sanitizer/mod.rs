//! Sanitization passes for SQLite dumps headed into PostgreSQL.
//!
//! A dump is read whole, rewritten through an ordered list of passes and
//! written back in place:
//! - Strip PRAGMA, BEGIN and sqlite_sequence statements
//! - Quote INSERT table names so reserved words survive the import
//! - Remove CREATE statements for data-only imports
//! - Decode X'..' hex literals into the \x escape form
//! - Trim the trailing numeric column from tables whose target schema
//!   does not carry it
//! - Apply caller-supplied pattern rules

mod passes;
mod rules;

pub use passes::{
    decode_hex_literals, quote_table_names, remove_create_statements, strip_sqlite_statements,
    trim_trailing_column, PassOutcome, TableTrim, DEFAULT_TRIM_TABLES,
};
pub use rules::{RewriteRule, RuleSpec, RulesFile};

use crate::dump;
use indicatif::{ProgressBar, ProgressStyle};
use schemars::JsonSchema;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One transformation applied to the whole dump buffer.
#[derive(Debug, Clone)]
pub enum SanitizePass {
    /// Drop PRAGMA, BEGIN and sqlite_sequence statements
    StripSqliteStatements,
    /// Normalize INSERT table names to double quotes
    QuoteTableNames,
    /// Drop CREATE statements for data-only imports
    RemoveCreateStatements,
    /// Rewrite X'..' blobs into \x escape syntax
    DecodeHexLiterals,
    /// Drop the trailing numeric column from the named tables
    TrimTrailingColumn { tables: Vec<String> },
    /// Caller-supplied pattern and replacement
    Custom(RewriteRule),
}

impl SanitizePass {
    /// Pass name as shown in statistics and progress output.
    pub fn name(&self) -> &str {
        match self {
            SanitizePass::StripSqliteStatements => "strip",
            SanitizePass::QuoteTableNames => "quote-tables",
            SanitizePass::RemoveCreateStatements => "remove-schema",
            SanitizePass::DecodeHexLiterals => "hex-decode",
            SanitizePass::TrimTrailingColumn { .. } => "trim-columns",
            SanitizePass::Custom(rule) => rule.name(),
        }
    }

    /// Run the pass over a buffer. Infallible: pattern compilation happens
    /// when a pass is built, not when it runs.
    pub fn apply<'a>(&self, data: &'a [u8]) -> PassOutcome<'a> {
        match self {
            SanitizePass::StripSqliteStatements => strip_sqlite_statements(data),
            SanitizePass::QuoteTableNames => quote_table_names(data),
            SanitizePass::RemoveCreateStatements => remove_create_statements(data),
            SanitizePass::DecodeHexLiterals => decode_hex_literals(data),
            SanitizePass::TrimTrailingColumn { tables } => trim_trailing_column(data, tables),
            SanitizePass::Custom(rule) => rule.apply(data),
        }
    }
}

/// Default tables for the trailing column trim.
pub fn default_trim_tables() -> Vec<String> {
    DEFAULT_TRIM_TABLES.iter().map(|t| t.to_string()).collect()
}

/// The standard pipeline: strip, quote, decode hex, trim trailing columns.
pub fn standard_passes() -> Vec<SanitizePass> {
    vec![
        SanitizePass::StripSqliteStatements,
        SanitizePass::QuoteTableNames,
        SanitizePass::DecodeHexLiterals,
        SanitizePass::TrimTrailingColumn {
            tables: default_trim_tables(),
        },
    ]
}

/// Statistics from a sanitize run
#[derive(Debug, Default, Clone, Serialize, JsonSchema)]
pub struct SanitizeStats {
    /// Bytes read from the dump, after decompression
    pub bytes_read: u64,
    /// Bytes written back, after recompression. Zero when nothing changed
    /// or when running dry
    pub bytes_written: u64,
    /// Whether any pass altered the buffer
    pub changed: bool,
    /// Total matches across all passes
    pub total_matches: u64,
    /// Per-pass counts, in pipeline order
    pub passes: Vec<PassStats>,
}

/// Statistics for a single pass
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PassStats {
    /// Pass name
    pub name: String,
    /// Number of matches the pass rewrote
    pub matches: u64,
    /// Per-table breakdown, only present for the column trim pass
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableTrim>,
}

/// Rewrites a dump file in place through a list of passes.
///
/// The file is only touched when at least one pass changed the buffer, so
/// sanitizing an already-clean dump leaves it byte-identical on disk.
pub struct Sanitizer {
    input: PathBuf,
    passes: Vec<SanitizePass>,
    dry_run: bool,
    backup: Option<String>,
    progress: bool,
}

impl Sanitizer {
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        Self {
            input: input.into(),
            passes: standard_passes(),
            dry_run: false,
            backup: None,
            progress: false,
        }
    }

    pub fn with_passes(mut self, passes: Vec<SanitizePass>) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Keep a copy of the original beside the dump, named with the suffix.
    pub fn with_backup(mut self, backup: Option<String>) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run every pass over the dump and write the result back in place.
    pub fn run(&self) -> anyhow::Result<SanitizeStats> {
        if self.passes.is_empty() {
            anyhow::bail!("no passes configured");
        }

        let progress_bar = if self.progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            pb.set_message(format!("Reading {}", self.input.display()));
            Some(pb)
        } else {
            None
        };

        let mut current = dump::read_dump(&self.input)?;

        let mut stats = SanitizeStats {
            bytes_read: current.len() as u64,
            ..Default::default()
        };

        for pass in &self.passes {
            if let Some(ref pb) = progress_bar {
                pb.set_message(format!("Running pass: {}", pass.name()));
            }

            let PassOutcome {
                data,
                matches,
                tables,
            } = pass.apply(&current);

            stats.total_matches += matches;
            stats.passes.push(PassStats {
                name: pass.name().to_string(),
                matches,
                tables,
            });

            match data {
                Cow::Owned(next) => {
                    if next != current {
                        stats.changed = true;
                    }
                    current = next;
                }
                Cow::Borrowed(_) => {}
            }
        }

        if stats.changed && !self.dry_run {
            if let Some(ref suffix) = self.backup {
                dump::write_backup(&self.input, suffix)?;
            }
            stats.bytes_written = dump::replace_dump(&self.input, &current)?;
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!(
                "Sanitized {} ({} matches)",
                self.input.display(),
                stats.total_matches
            ));
        }

        Ok(stats)
    }
}

/// Run the standard pipeline over a dump file in place.
pub fn sanitize_file(path: &Path) -> anyhow::Result<SanitizeStats> {
    Sanitizer::new(path).run()
}

/// Apply a single pattern and replacement over a dump file in place.
///
/// The pattern is compiled before the file is opened, so a malformed
/// pattern never touches the dump.
pub fn custom_sanitize(
    path: &Path,
    pattern: &str,
    replacement: &[u8],
) -> anyhow::Result<SanitizeStats> {
    let rule = RewriteRule::new(pattern, replacement)?;
    Sanitizer::new(path)
        .with_passes(vec![SanitizePass::Custom(rule)])
        .run()
}

/// Apply one pass over a dump file in place.
pub fn apply_pass(path: &Path, pass: SanitizePass) -> anyhow::Result<SanitizeStats> {
    Sanitizer::new(path).with_passes(vec![pass]).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_order() {
        let passes = standard_passes();
        let names: Vec<&str> = passes.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["strip", "quote-tables", "hex-decode", "trim-columns"]);
    }

    #[test]
    fn test_passes_compose_on_a_buffer() {
        let mut current = b"PRAGMA foreign_keys=OFF;\nINSERT INTO users VALUES(1,'a');\n".to_vec();
        for pass in standard_passes() {
            if let Cow::Owned(next) = pass.apply(&current).data {
                current = next;
            }
        }
        assert_eq!(current, b"\nINSERT INTO \"users\" VALUES(1,'a');\n");
    }

    #[test]
    fn test_custom_pass_uses_rule_name() {
        let rule = RewriteRule::named("drop-comments", "--.*", b"").unwrap();
        let pass = SanitizePass::Custom(rule);
        assert_eq!(pass.name(), "drop-comments");
    }
}
