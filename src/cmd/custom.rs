//! Custom command CLI handler.

use crate::sanitizer::{RewriteRule, RulesFile, SanitizePass};
use std::path::PathBuf;

use super::exec;

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    pattern: Option<String>,
    replace: Option<String>,
    rules: Option<PathBuf>,
    backup: Option<String>,
    dry_run: bool,
    progress: bool,
    json: bool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let compiled: Vec<RewriteRule> = match (pattern, rules) {
        (Some(pattern), None) => {
            let replacement = replace.unwrap_or_default();
            vec![RewriteRule::new(&pattern, replacement.as_bytes())?]
        }
        (None, Some(path)) => RulesFile::load(&path)?,
        (None, None) => anyhow::bail!("either --pattern or --rules is required"),
        (Some(_), Some(_)) => anyhow::bail!("--pattern and --rules are mutually exclusive"),
    };

    let passes: Vec<SanitizePass> = compiled.into_iter().map(SanitizePass::Custom).collect();

    exec::run(file, passes, backup, dry_run, progress, json, fail_fast)
}
