use once_cell::sync::Lazy;
use regex::bytes::{Captures, Regex};
use schemars::JsonSchema;
use serde::Serialize;
use std::borrow::Cow;

/// Tables trimmed by default when no table list is given.
pub const DEFAULT_TRIM_TABLES: &[&str] = &["alert_rule", "alert_rule_version"];

// Single-line PRAGMA and BEGIN statements plus any line touching
// sqlite_sequence, together with one preceding line break. COMMIT stays.
static STRIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[\r\n]?^(PRAGMA.*;|BEGIN.*;|.*sqlite_sequence.*;)$").unwrap()
});

// Bare, backticked and double-quoted table names all capture the same way.
// Dot-all keeps statements with embedded newlines in their VALUES matched.
static QUOTE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?msU)^(INSERT INTO) ["`]?([a-zA-Z0-9_]*)["`]? (VALUES.*;)$"#).unwrap()
});

// CREATE statements can span lines, so the match runs lazily up to the first
// terminator at a line end. The leading break requirement keeps a CREATE at
// the very start of the dump in place.
static CREATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?msU)[\r\n]+^CREATE.*;$").unwrap());

static HEX_LITERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"X'([0-9a-fA-F]+)'").unwrap());

// Anchored to the end of a single statement, never applied to a whole dump.
static TRAILING_NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\d+\);$").unwrap());

/// Buffer and match count produced by a single pass.
///
/// The buffer stays borrowed when nothing matched, so a pass over an
/// already-clean dump never copies.
#[derive(Debug)]
pub struct PassOutcome<'a> {
    pub data: Cow<'a, [u8]>,
    pub matches: u64,
    pub tables: Vec<TableTrim>,
}

impl<'a> PassOutcome<'a> {
    pub(crate) fn new(data: Cow<'a, [u8]>, matches: u64) -> Self {
        Self {
            data,
            matches,
            tables: Vec::new(),
        }
    }

    pub(crate) fn unchanged(data: &'a [u8]) -> Self {
        Self::new(Cow::Borrowed(data), 0)
    }
}

/// Per-table outcome of the trailing column trim.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableTrim {
    /// Table name as it appears in the dump
    pub table: String,
    /// INSERT statements found for the table
    pub statements: u64,
    /// Statements whose trailing numeric value was removed
    pub trimmed: u64,
}

/// Remove PRAGMA and BEGIN statements plus every line touching sqlite_sequence.
///
/// Each match consumes the line break before it, so stripping consecutive
/// lines leaves a single break behind.
pub fn strip_sqlite_statements(data: &[u8]) -> PassOutcome<'_> {
    let matches = STRIP_RE.find_iter(data).count() as u64;
    if matches == 0 {
        return PassOutcome::unchanged(data);
    }
    PassOutcome::new(STRIP_RE.replace_all(data, &b""[..]), matches)
}

/// Wrap the table name of every INSERT statement in double quotes.
///
/// Backticks and bare names are normalized, names already double-quoted are
/// rewritten to the same text.
pub fn quote_table_names(data: &[u8]) -> PassOutcome<'_> {
    let matches = QUOTE_TABLE_RE.find_iter(data).count() as u64;
    if matches == 0 {
        return PassOutcome::unchanged(data);
    }
    PassOutcome::new(
        QUOTE_TABLE_RE.replace_all(data, &b"$1 \"$2\" $3"[..]),
        matches,
    )
}

/// Remove CREATE statements so the dump only carries data.
pub fn remove_create_statements(data: &[u8]) -> PassOutcome<'_> {
    let matches = CREATE_RE.find_iter(data).count() as u64;
    if matches == 0 {
        return PassOutcome::unchanged(data);
    }
    PassOutcome::new(CREATE_RE.replace_all(data, &b""[..]), matches)
}

/// Rewrite X'ABCD' hex literals into the '\xABCD' escape form.
///
/// The marker is matched case-sensitively and empty literals are left alone.
pub fn decode_hex_literals(data: &[u8]) -> PassOutcome<'_> {
    let matches = HEX_LITERAL_RE.find_iter(data).count() as u64;
    if matches == 0 {
        return PassOutcome::unchanged(data);
    }
    PassOutcome::new(HEX_LITERAL_RE.replace_all(data, &b"'\\x$1'"[..]), matches)
}

/// Drop the trailing numeric value from INSERT statements for the named tables.
///
/// Works in two stages: isolate each statement for the table, then trim the
/// suffix only when the last value is purely numeric. Numeric values in
/// earlier rows or columns are never touched. Table names must already be
/// double-quoted, so this runs after [`quote_table_names`].
///
/// The reported matches count the statements actually trimmed.
pub fn trim_trailing_column<'a>(data: &'a [u8], tables: &[String]) -> PassOutcome<'a> {
    let mut current = Cow::Borrowed(data);
    let mut matches = 0u64;
    let mut per_table = Vec::with_capacity(tables.len());

    for table in tables {
        let statement_re = insert_statement_re(table);
        let mut statements = 0u64;
        let mut trimmed = 0u64;

        let next = match statement_re.replace_all(current.as_ref(), |caps: &Captures| {
            statements += 1;
            let stmt = &caps[0];
            match TRAILING_NUMERIC_RE.replace(stmt, &b");"[..]) {
                Cow::Owned(rewritten) => {
                    trimmed += 1;
                    rewritten
                }
                Cow::Borrowed(_) => stmt.to_vec(),
            }
        }) {
            Cow::Owned(v) => Some(v),
            Cow::Borrowed(_) => None,
        };

        if let Some(v) = next {
            current = Cow::Owned(v);
        }

        matches += trimmed;
        per_table.push(TableTrim {
            table: table.clone(),
            statements,
            trimmed,
        });
    }

    PassOutcome {
        data: current,
        matches,
        tables: per_table,
    }
}

// The table name is escaped, so the assembled pattern always compiles.
fn insert_statement_re(table: &str) -> Regex {
    Regex::new(&format!(
        r#"(?s)INSERT INTO "{}" VALUES\(.*?\);"#,
        regex::escape(table)
    ))
    .unwrap()
}
