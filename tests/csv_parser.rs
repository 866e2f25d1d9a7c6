mod common;

use common::{TestWorkspace, fixture_path};
use dataset_fixture::tokenizer::{CsvParser, CsvParserError, PipelineError, quote_field};
use encoding_rs::UTF_8;
use itertools::Itertools;
use proptest::prelude::*;

#[test]
fn unterminated_quote_never_returns_a_partial_record() {
    let mut parser = CsvParser::new();
    let err = parser.parse_line("AAAAA,\"BB").unwrap_err();
    assert_eq!(err, PipelineError::UnterminatedQuote { field: 1 });

    let err = parser.parse_str("A,B\nAAAAA,\"BB\n", "doc").unwrap_err();
    assert!(
        matches!(err, CsvParserError::Lexical { line: 2, .. }),
        "{err:?}"
    );
}

#[test]
fn parses_fixture_with_escapes_and_multiline_values() {
    let mut parser = CsvParser::new();
    let records = parser
        .parse_path(&fixture_path("orders_expected/ORDERS.csv"), UTF_8)
        .unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[1][3], "first \"rush\" order");
    assert_eq!(records[2][3], "null");
    assert_eq!(records[3][3], "multi\nline");
    assert!(records.iter().all(|r| r.len() == 5));
}

#[test]
fn decodes_input_with_requested_encoding() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("latin1.csv");
    std::fs::write(&path, b"NAME\ncaf\xe9\n").unwrap();
    let latin1 = encoding_rs::Encoding::for_label(b"latin1").unwrap();

    let records = CsvParser::new().parse_path(&path, latin1).unwrap();
    assert_eq!(records[1][0], "café");
    assert!(matches!(
        CsvParser::new().parse_path(&path, UTF_8),
        Err(CsvParserError::Decode { .. })
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let workspace = TestWorkspace::new();
    let err = CsvParser::new()
        .parse_path(&workspace.path().join("absent.csv"), UTF_8)
        .unwrap_err();
    assert!(matches!(err, CsvParserError::Io { .. }));
}

proptest! {
    #[test]
    fn plain_value_round_trips(value in "[A-Za-z0-9._:/;!?-]([A-Za-z0-9 ._:/;!?-]{0,20}[A-Za-z0-9._:/;!?-])?") {
        let mut parser = CsvParser::new();
        prop_assert_eq!(parser.parse_line(&value).unwrap(), vec![value.clone()]);
    }

    #[test]
    fn quoted_value_round_trips(value in "(?s).{0,30}") {
        let mut parser = CsvParser::new();
        prop_assert_eq!(parser.parse_line(&quote_field(&value)).unwrap(), vec![value.clone()]);
    }

    #[test]
    fn field_count_is_separator_count_plus_one(
        fields in prop::collection::vec("[ \t]{0,2}[A-Za-z0-9]{0,6}( [A-Za-z0-9]{1,4})?[ \t]{0,2}", 1..8)
    ) {
        let line = fields.join(",");
        let mut parser = CsvParser::new();
        let parsed = parser.parse_line(&line).unwrap();
        prop_assert_eq!(parsed.len(), line.matches(',').count() + 1);
        let trimmed = fields.iter().map(|f| f.trim().to_string()).collect::<Vec<_>>();
        prop_assert_eq!(parsed, trimmed);
    }

    #[test]
    fn uniform_documents_parse_and_ragged_ones_fail(
        (columns, rows) in (1usize..5).prop_flat_map(|columns| (
            Just(columns),
            prop::collection::vec(prop::collection::vec("[^\r]{0,10}", columns), 1..8),
        )),
        ragged_row in any::<prop::sample::Index>(),
    ) {
        let render = |rows: &[Vec<String>]| {
            rows.iter()
                .map(|row| row.iter().map(|v| quote_field(v)).join(","))
                .join("\n")
        };

        let mut parser = CsvParser::new();
        let parsed = parser.parse_str(&render(&rows), "generated").unwrap();
        prop_assert_eq!(parsed.len(), rows.len());
        prop_assert!(parsed.iter().all(|record| record.len() == columns));
        prop_assert_eq!(&parsed, &rows);

        let mut ragged = rows.clone();
        ragged.push(vec!["x".to_string(); columns]);
        let idx = ragged_row.index(ragged.len());
        ragged[idx].push("extra".to_string());
        prop_assert!(
            matches!(
                parser.parse_str(&render(&ragged), "ragged"),
                Err(CsvParserError::ColumnCountMismatch { .. })
            ),
            "a record with a different field count must fail"
        );
    }
}
