mod custom;
mod exec;
mod schema;

pub use exec::{BatchJsonOutput, SanitizeJsonOutput};

use crate::sanitizer::SanitizePass;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sql-sanitizer")]
#[command(version)]
#[command(about = "Sanitize SQLite dump files for PostgreSQL import", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full sanitize pipeline on a dump file
    Sanitize {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Also remove CREATE statements (data-only import)
        #[arg(long)]
        data_only: bool,

        /// Skip the hex literal decode pass
        #[arg(long)]
        no_hex_decode: bool,

        /// Skip the trailing column trim pass
        #[arg(long)]
        no_column_trim: bool,

        /// Tables for the trailing column trim (comma-separated)
        #[arg(long, value_name = "TABLES", default_value = "alert_rule,alert_rule_version")]
        trim_tables: String,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Remove PRAGMA, BEGIN and sqlite_sequence statements
    Strip {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Quote INSERT table names with double quotes
    QuoteTables {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Remove CREATE statements for data-only imports
    RemoveSchema {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Decode X'..' hex literals into \x escape syntax
    HexDecode {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Drop the trailing numeric column from selected tables
    TrimColumns {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Tables for the trailing column trim (comma-separated)
        #[arg(long, value_name = "TABLES", default_value = "alert_rule,alert_rule_version")]
        trim_tables: String,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Apply custom pattern rules to a dump file
    Custom {
        /// Input dump file or glob pattern (e.g., *.sql, dumps/**/*.sql)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Pattern to match
        #[arg(long, conflicts_with = "rules")]
        pattern: Option<String>,

        /// Replacement text ($1 references capture groups, empty deletes matches)
        #[arg(long, requires = "pattern", conflicts_with = "rules")]
        replace: Option<String>,

        /// YAML file with an ordered list of rewrite rules
        #[arg(long, conflicts_with = "pattern")]
        rules: Option<PathBuf>,

        /// Keep a copy of the original next to the dump, named with SUFFIX
        #[arg(long, num_args = 0..=1, default_missing_value = ".bak", value_name = "SUFFIX")]
        backup: Option<String>,

        /// Preview without writing changes (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,

        /// Stop on first file that fails (for glob patterns)
        #[arg(long)]
        fail_fast: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print JSON schemas for --json output
    JsonSchema {
        /// Schema name (prints all schemas if omitted)
        name: Option<String>,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Sanitize {
            file,
            data_only,
            no_hex_decode,
            no_column_trim,
            trim_tables,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => {
            let passes = pipeline_passes(data_only, no_hex_decode, no_column_trim, &trim_tables)?;
            exec::run(file, passes, backup, dry_run, progress, json, fail_fast)
        }
        Commands::Strip {
            file,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => exec::run(
            file,
            vec![SanitizePass::StripSqliteStatements],
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        ),
        Commands::QuoteTables {
            file,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => exec::run(
            file,
            vec![SanitizePass::QuoteTableNames],
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        ),
        Commands::RemoveSchema {
            file,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => exec::run(
            file,
            vec![SanitizePass::RemoveCreateStatements],
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        ),
        Commands::HexDecode {
            file,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => exec::run(
            file,
            vec![SanitizePass::DecodeHexLiterals],
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        ),
        Commands::TrimColumns {
            file,
            trim_tables,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => exec::run(
            file,
            vec![SanitizePass::TrimTrailingColumn {
                tables: parse_table_list(&trim_tables)?,
            }],
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        ),
        Commands::Custom {
            file,
            pattern,
            replace,
            rules,
            backup,
            dry_run,
            progress,
            json,
            fail_fast,
        } => custom::run(
            file, pattern, replace, rules, backup, dry_run, progress, json, fail_fast,
        ),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "sql-sanitizer",
                &mut io::stdout(),
            );
            Ok(())
        }
        Commands::JsonSchema { name } => schema::run(name),
    }
}

fn parse_table_list(raw: &str) -> anyhow::Result<Vec<String>> {
    let tables: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tables.is_empty() {
        anyhow::bail!("--trim-tables requires at least one table name");
    }

    Ok(tables)
}

fn pipeline_passes(
    data_only: bool,
    no_hex_decode: bool,
    no_column_trim: bool,
    trim_tables: &str,
) -> anyhow::Result<Vec<SanitizePass>> {
    let mut passes = vec![SanitizePass::StripSqliteStatements];

    if data_only {
        passes.push(SanitizePass::RemoveCreateStatements);
    }

    passes.push(SanitizePass::QuoteTableNames);

    if !no_hex_decode {
        passes.push(SanitizePass::DecodeHexLiterals);
    }

    // Trimming matches double-quoted names, so it always runs after quoting.
    if !no_column_trim {
        passes.push(SanitizePass::TrimTrailingColumn {
            tables: parse_table_list(trim_tables)?,
        });
    }

    Ok(passes)
}
