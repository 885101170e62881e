//! Shared single-file and multi-file execution for the pass commands.

use crate::sanitizer::{SanitizePass, SanitizeStats, Sanitizer};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// JSON output for one sanitized file
#[derive(Debug, Serialize, JsonSchema)]
pub struct SanitizeJsonOutput {
    /// Path of the dump file
    pub file: String,
    /// Whether changes were withheld
    pub dry_run: bool,
    /// Seconds spent sanitizing the file
    pub elapsed_secs: f64,
    /// Pipeline statistics
    #[serde(flatten)]
    pub stats: SanitizeStats,
}

/// JSON output for a glob run over several files
#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchJsonOutput {
    /// Number of files matched by the pattern
    pub total_files: usize,
    /// Files sanitized without error
    pub succeeded: usize,
    /// Files that failed
    pub failed: usize,
    /// Seconds spent on the whole run
    pub elapsed_secs: f64,
    /// Per-file results, in the order the files were processed
    pub files: Vec<SanitizeJsonOutput>,
    /// Errors for the files that failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchError>,
}

/// One failed file in a glob run
#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchError {
    /// Path of the dump file
    pub file: String,
    /// Error message
    pub error: String,
}

pub fn run(
    file: PathBuf,
    passes: Vec<SanitizePass>,
    backup: Option<String>,
    dry_run: bool,
    progress: bool,
    json: bool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let files = expand_pattern(&file)?;

    if files.len() == 1 {
        run_single(
            files.into_iter().next().unwrap(),
            &passes,
            backup,
            dry_run,
            progress,
            json,
        )
    } else {
        run_multi(files, &passes, backup, dry_run, json, fail_fast)
    }
}

/// Expand a literal path or glob pattern into the files to sanitize.
fn expand_pattern(pattern: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let raw = pattern.to_string_lossy();

    let is_glob = raw.contains('*') || raw.contains('?') || raw.contains('[');
    if !is_glob {
        if !pattern.exists() {
            anyhow::bail!("file does not exist: {}", pattern.display());
        }
        return Ok(vec![pattern.to_path_buf()]);
    }

    let entries =
        glob::glob(&raw).map_err(|e| anyhow::anyhow!("invalid glob pattern '{}': {}", raw, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path =
            entry.map_err(|e| anyhow::anyhow!("error reading path for pattern '{}': {}", raw, e))?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        anyhow::bail!("no files match pattern: {}", raw);
    }

    // Deterministic processing order regardless of filesystem iteration
    files.sort();

    Ok(files)
}

fn run_single(
    file: PathBuf,
    passes: &[SanitizePass],
    backup: Option<String>,
    dry_run: bool,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let stats = Sanitizer::new(&file)
        .with_passes(passes.to_vec())
        .with_backup(backup)
        .with_dry_run(dry_run)
        .with_progress(progress && !json)
        .run()?;

    let elapsed = start_time.elapsed();

    if json {
        let output = SanitizeJsonOutput {
            file: file.display().to_string(),
            dry_run,
            elapsed_secs: elapsed.as_secs_f64(),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_stats(&file, &stats, dry_run, elapsed);
    }

    Ok(())
}

fn run_multi(
    files: Vec<PathBuf>,
    passes: &[SanitizePass],
    backup: Option<String>,
    dry_run: bool,
    json: bool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let total = files.len();
    let mut outputs: Vec<SanitizeJsonOutput> = Vec::new();
    let mut errors: Vec<BatchError> = Vec::new();
    let start_time = Instant::now();

    if !json {
        eprintln!("Sanitizing {} files...\n", total);
    }

    for (idx, file) in files.iter().enumerate() {
        if !json {
            eprintln!("[{}/{}] Sanitizing: {}", idx + 1, total, file.display());
        }

        let file_start = Instant::now();
        let result = Sanitizer::new(file)
            .with_passes(passes.to_vec())
            .with_backup(backup.clone())
            .with_dry_run(dry_run)
            .run();

        match result {
            Ok(stats) => {
                if !json {
                    let size_mb = stats.bytes_read as f64 / (1024.0 * 1024.0);
                    eprintln!(
                        "  {:.2} MB → {} matches, {}\n",
                        size_mb,
                        stats.total_matches,
                        if stats.changed { "rewritten" } else { "unchanged" }
                    );
                }
                outputs.push(SanitizeJsonOutput {
                    file: file.display().to_string(),
                    dry_run,
                    elapsed_secs: file_start.elapsed().as_secs_f64(),
                    stats,
                });
            }
            Err(e) => {
                if !json {
                    eprintln!("  Error: {}\n", e);
                }
                errors.push(BatchError {
                    file: file.display().to_string(),
                    error: e.to_string(),
                });
                if fail_fast {
                    break;
                }
            }
        }
    }

    let failed = errors.len();
    let succeeded = outputs.len();

    if json {
        let output = BatchJsonOutput {
            total_files: total,
            succeeded,
            failed,
            elapsed_secs: start_time.elapsed().as_secs_f64(),
            files: outputs,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);

        if failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("Sanitize Summary:");
    eprintln!("  Total files: {}", total);
    eprintln!("  Succeeded: {}", succeeded);
    eprintln!("  Failed: {}", failed);

    if !errors.is_empty() {
        eprintln!();
        eprintln!("Failed files:");
        for err in &errors {
            eprintln!("  - {}: {}", err.file, err.error);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn print_stats(file: &Path, stats: &SanitizeStats, dry_run: bool, elapsed: Duration) {
    eprintln!();
    eprintln!("Sanitize Statistics:");
    eprintln!("  File: {}", file.display());
    eprintln!("  Bytes read: {}", stats.bytes_read);

    for pass in &stats.passes {
        eprintln!("  {}: {} matches", pass.name, pass.matches);
        for table in &pass.tables {
            eprintln!(
                "    {}: {} statements, {} trimmed",
                table.table, table.statements, table.trimmed
            );
        }
    }

    if !stats.changed {
        eprintln!("  No changes");
    } else if !dry_run {
        eprintln!("  Bytes written: {}", stats.bytes_written);
    }
    eprintln!("  Elapsed time: {:.3?}", elapsed);

    if dry_run {
        eprintln!();
        eprintln!("(Dry run - no output written)");
    }
}
