use anyhow::Context;
use regex::bytes::Regex;
use serde::Deserialize;
use std::path::Path;

use super::passes::PassOutcome;

/// A compiled pattern and replacement pair for the custom pass.
///
/// The replacement supports `$1`-style group references.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    pattern: Regex,
    replacement: Vec<u8>,
}

impl RewriteRule {
    /// Compile a rule. A malformed pattern fails here, before any file is read.
    pub fn new(pattern: &str, replacement: &[u8]) -> anyhow::Result<Self> {
        Self::named("custom", pattern, replacement)
    }

    pub fn named(name: &str, pattern: &str, replacement: &[u8]) -> anyhow::Result<Self> {
        let compiled =
            Regex::new(pattern).with_context(|| format!("invalid pattern '{}'", pattern))?;
        Ok(Self {
            name: name.to_string(),
            pattern: compiled,
            replacement: replacement.to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply<'a>(&self, data: &'a [u8]) -> PassOutcome<'a> {
        let matches = self.pattern.find_iter(data).count() as u64;
        if matches == 0 {
            return PassOutcome::unchanged(data);
        }
        let replaced = self.pattern.replace_all(data, &self.replacement[..]);
        PassOutcome::new(replaced, matches)
    }
}

/// One entry in a YAML rules file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    /// Optional name shown in statistics
    #[serde(default)]
    pub name: Option<String>,
    /// Pattern to match
    pub pattern: String,
    /// Replacement text, may reference capture groups with $1
    #[serde(default)]
    pub replace: String,
}

/// A YAML file holding an ordered list of rewrite rules.
///
/// ```yaml
/// rules:
///   - name: drop-comments
///     pattern: '(?m)^--.*\n'
///     replace: ''
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RulesFile {
    pub rules: Vec<RuleSpec>,
}

impl RulesFile {
    /// Load a rules file and compile every rule, in order.
    ///
    /// Any malformed pattern fails the whole load.
    pub fn load(path: &Path) -> anyhow::Result<Vec<RewriteRule>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        let file: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))?;

        if file.rules.is_empty() {
            anyhow::bail!("rules file contains no rules: {}", path.display());
        }

        file.rules
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let name = spec
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("rule-{}", idx + 1));
                RewriteRule::named(&name, &spec.pattern, spec.replace.as_bytes())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_rule_applies_group_references() {
        let rule = RewriteRule::new(r"(\d+)-(\d+)", b"$2-$1").unwrap();
        let out = rule.apply(b"10-20 30-40");
        assert_eq!(out.matches, 2);
        assert_eq!(out.data.as_ref(), b"20-10 40-30");
    }

    #[test]
    fn test_rule_without_matches_borrows() {
        let rule = RewriteRule::new("nothing", b"").unwrap();
        let out = rule.apply(b"INSERT INTO t VALUES(1);\n");
        assert_eq!(out.matches, 0);
        assert_eq!(out.data.as_ref(), b"INSERT INTO t VALUES(1);\n");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = RewriteRule::new("(unclosed", b"").unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_rules_file_compiles_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        let yaml = r#"rules:
  - name: drop-comments
    pattern: '(?m)^--.*\n'
    replace: ''
  - pattern: foo
    replace: bar
"#;
        fs::write(&path, yaml).unwrap();

        let rules = RulesFile::load(&path).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name(), "drop-comments");
        assert_eq!(rules[1].name(), "rule-2");
    }

    #[test]
    fn test_rules_file_rejects_bad_pattern() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        fs::write(&path, "rules:\n  - pattern: '('\n    replace: ''\n").unwrap();
        assert!(RulesFile::load(&path).is_err());
    }

    #[test]
    fn test_rules_file_rejects_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        fs::write(&path, "rules: []\n").unwrap();
        assert!(RulesFile::load(&path).is_err());
    }

    #[test]
    fn test_rules_file_reports_missing_file() {
        let err = RulesFile::load(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read rules file"));
    }
}
