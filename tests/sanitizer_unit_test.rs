use sql_sanitizer::sanitizer::{
    default_trim_tables, standard_passes, strip_sqlite_statements, trim_trailing_column,
    RewriteRule, SanitizePass,
};
use std::borrow::Cow;

fn run_passes(passes: &[SanitizePass], input: &[u8]) -> Vec<u8> {
    let mut current = input.to_vec();
    for pass in passes {
        if let Cow::Owned(next) = pass.apply(&current).data {
            current = next;
        }
    }
    current
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_pipeline_produces_import_ready_inserts() {
        let input = b"PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\nINSERT INTO users VALUES(1,'a');\nDELETE FROM sqlite_sequence;\nCOMMIT;\n";
        let output = run_passes(&standard_passes(), input);
        assert_eq!(output, b"\nINSERT INTO \"users\" VALUES(1,'a');\nCOMMIT;\n");
    }

    #[test]
    fn test_second_run_leaves_buffer_unchanged() {
        let input =
            b"PRAGMA foreign_keys=OFF;\nINSERT INTO \"alert_rule\" VALUES(1,'rule',X'FF',0);\nCOMMIT;\n";
        let first = run_passes(&standard_passes(), input);
        assert_eq!(
            first,
            b"\nINSERT INTO \"alert_rule\" VALUES(1,'rule','\\xFF');\nCOMMIT;\n"
        );

        let second = run_passes(&standard_passes(), &first);
        assert_eq!(second, first);
    }

    #[test]
    fn test_unrelated_statements_survive_untouched() {
        let input = b"DELETE FROM users WHERE id=1;\nUPDATE posts SET title='x' WHERE id=2;\n";
        let output = run_passes(&standard_passes(), input);
        assert_eq!(output, input);
    }

    #[test]
    fn test_crlf_dump_is_left_alone() {
        let input = b"PRAGMA foreign_keys=OFF;\r\nINSERT INTO t VALUES(1);\r\n";
        let out = strip_sqlite_statements(input);
        assert_eq!(out.matches, 0);
        assert!(matches!(out.data, Cow::Borrowed(_)));
    }
}

mod trim_tests {
    use super::*;

    #[test]
    fn test_trim_spans_values_with_embedded_newlines() {
        let input = b"INSERT INTO \"alert_rule_version\" VALUES(1,'line one\nline two',7);\n";
        let out = trim_trailing_column(input, &[String::from("alert_rule_version")]);
        assert_eq!(out.matches, 1);
        assert_eq!(
            out.data.as_ref(),
            b"INSERT INTO \"alert_rule_version\" VALUES(1,'line one\nline two');\n"
        );
    }

    #[test]
    fn test_trim_counts_statements_and_trims_separately() {
        let input = b"INSERT INTO \"alert_rule\" VALUES(1,'a',0);\nINSERT INTO \"alert_rule\" VALUES(2,'b','x');\n";
        let out = trim_trailing_column(input, &[String::from("alert_rule")]);
        assert_eq!(out.matches, 1);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].statements, 2);
        assert_eq!(out.tables[0].trimmed, 1);
        assert_eq!(
            out.data.as_ref(),
            b"INSERT INTO \"alert_rule\" VALUES(1,'a');\nINSERT INTO \"alert_rule\" VALUES(2,'b','x');\n"
        );
    }

    #[test]
    fn test_trim_reports_every_requested_table() {
        let input =
            b"INSERT INTO \"alert_rule\" VALUES(1,2);\nINSERT INTO \"alert_rule_version\" VALUES(3,'v');\n";
        let out = trim_trailing_column(input, &default_trim_tables());
        assert_eq!(out.matches, 1);
        assert_eq!(out.tables.len(), 2);
        assert_eq!(out.tables[0].table, "alert_rule");
        assert_eq!(out.tables[0].statements, 1);
        assert_eq!(out.tables[0].trimmed, 1);
        assert_eq!(out.tables[1].table, "alert_rule_version");
        assert_eq!(out.tables[1].statements, 1);
        assert_eq!(out.tables[1].trimmed, 0);
    }

    #[test]
    fn test_trim_reduces_arity_by_one() {
        let input = b"INSERT INTO \"alert_rule\" VALUES(1,'a','b',3);\n";
        let out = trim_trailing_column(input, &[String::from("alert_rule")]);
        let commas = |bytes: &[u8]| bytes.iter().filter(|&&b| b == b',').count();
        assert_eq!(out.matches, 1);
        assert_eq!(commas(out.data.as_ref()), commas(input) - 1);
    }
}

mod rule_tests {
    use super::*;

    #[test]
    fn test_custom_rule_composes_with_standard_passes() {
        let rule = RewriteRule::named("drop-comments", r"(?m)^--.*\n", b"").unwrap();
        let mut passes = standard_passes();
        passes.push(SanitizePass::Custom(rule));

        let input = b"-- dumped by sqlite3\nPRAGMA foreign_keys=OFF;\nINSERT INTO users VALUES(1);\n";
        let output = run_passes(&passes, input);
        assert_eq!(output, b"INSERT INTO \"users\" VALUES(1);\n");
    }

    #[test]
    fn test_rules_apply_in_document_order() {
        let first = RewriteRule::named("first", "foo", b"bar").unwrap();
        let second = RewriteRule::named("second", "bar", b"baz").unwrap();
        let passes = vec![SanitizePass::Custom(first), SanitizePass::Custom(second)];

        let output = run_passes(&passes, b"foo\n");
        assert_eq!(output, b"baz\n");
    }
}
