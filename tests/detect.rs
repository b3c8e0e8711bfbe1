mod common;

use common::{TestWorkspace, latin1, utf16le_with_bom};
use table2sql::dialect::{DialectCandidate, DialectDetector, Separator, TextEncoding};
use table2sql::error::{ConversionError, ErrorKind};
use table2sql::table::{NullMarkers, Table};

fn detect(contents: &[u8]) -> Result<table2sql::dialect::Detection, ConversionError> {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("input.csv", contents);
    DialectDetector::default().detect(&path, None)
}

fn column_names(table: &Table) -> Vec<&str> {
    table.columns.iter().map(String::as_str).collect()
}

#[test]
fn comma_utf8_is_detected() {
    let detection = detect("nome,età\nMario,30\nLucia,25".as_bytes()).expect("detect");
    assert_eq!(detection.candidate.separator, Separator::Comma);
    assert_eq!(detection.candidate.encoding, TextEncoding::Utf8);
    assert_eq!(column_names(&detection.table), ["nome", "età"]);
    assert_eq!(detection.table.row_count(), 2);
    assert_eq!(detection.table.rows[0][0].as_deref(), Some("Mario"));
}

#[test]
fn semicolon_beats_single_column_comma_parse() {
    let detection = detect("nome;età\nMario;30\nLucia;25".as_bytes()).expect("detect");
    assert_eq!(detection.candidate.separator, Separator::Semicolon);
    assert_eq!(detection.candidate.encoding, TextEncoding::Utf8);
    assert_eq!(column_names(&detection.table), ["nome", "età"]);
    assert_eq!(detection.table.row_count(), 2);
}

#[test]
fn latin1_semicolon_file_is_decoded() {
    let bytes = latin1("nome;età;città\nMàrio;30;Ròma\nLùcia;25;Milàno");
    let detection = detect(&bytes).expect("detect");
    assert_eq!(detection.candidate.separator, Separator::Semicolon);
    assert_eq!(detection.candidate.encoding, TextEncoding::Latin1);
    assert_eq!(detection.table.rows[0][0].as_deref(), Some("Màrio"));
    assert_eq!(column_names(&detection.table), ["nome", "età", "città"]);
}

#[test]
fn tab_and_pipe_files_are_detected() {
    let tab = detect("nome\tetà\tcittà\nMario\t30\tRoma\nLucia\t25\tMilano".as_bytes())
        .expect("detect tab");
    assert_eq!(tab.candidate.separator, Separator::Tab);
    assert_eq!(column_names(&tab.table), ["nome", "età", "città"]);

    let pipe = detect("nome|età|città\nMario|30|Roma\nLucia|25|Milano".as_bytes())
        .expect("detect pipe");
    assert_eq!(pipe.candidate.separator, Separator::Pipe);
    assert_eq!(pipe.table.row_count(), 2);
}

#[test]
fn utf16_with_bom_is_detected() {
    let bytes = utf16le_with_bom("id;name\r\n1;Zoë\r\n2;Ana\r\n");
    let detection = detect(&bytes).expect("detect");
    assert_eq!(detection.candidate.separator, Separator::Semicolon);
    assert_eq!(detection.candidate.encoding, TextEncoding::Utf16Le);
    assert_eq!(column_names(&detection.table), ["id", "name"]);
    assert_eq!(detection.table.rows[0][1].as_deref(), Some("Zoë"));
}

#[test]
fn ambiguous_separators_tie_to_earlier_candidate() {
    // Comma and semicolon both split into two columns with identical scores.
    let detection =
        detect("col1,col2;col3\nval1,val2;val3\nval4,val5;val6".as_bytes()).expect("detect");
    assert_eq!(detection.table.column_count(), 2);
    assert_eq!(detection.candidate.separator, Separator::Comma);
    let semicolon = detection
        .attempts
        .iter()
        .find(|a| a.candidate == DialectCandidate::new(Separator::Semicolon, TextEncoding::Utf8))
        .and_then(|a| a.score)
        .expect("semicolon scored");
    assert_eq!(semicolon.value, detection.score.value);
}

#[test]
fn candidate_order_breaks_ties() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("plain.csv", "a,b\n1,2\n");
    let preferred = DialectCandidate::new(Separator::Comma, TextEncoding::Windows1252);
    let later = DialectCandidate::new(Separator::Comma, TextEncoding::Utf8);
    let detector = DialectDetector::new(vec![preferred, later], NullMarkers::default());
    let detection = detector.detect(&path, None).expect("detect");
    assert_eq!(detection.candidate, preferred);
}

#[test]
fn short_rows_are_padded_and_null_markers_mapped() {
    let detection = detect("a,b,c\n1,,z\n2,y\n3,NULL,w\n".as_bytes()).expect("detect");
    assert_eq!(detection.candidate.separator, Separator::Comma);
    let cell = |s: &str| Some(s.to_string());
    assert_eq!(detection.table.rows[0], vec![cell("1"), None, cell("z")]);
    assert_eq!(detection.table.rows[1], vec![cell("2"), cell("y"), None]);
    assert_eq!(detection.table.rows[2], vec![cell("3"), None, cell("w")]);
}

#[test]
fn unparseable_content_lists_every_candidate() {
    let err = detect(b"dati corrotti \x00\x01\x02 non parsabili").expect_err("no dialect");
    assert_eq!(err.kind(), ErrorKind::NoViableDialect);
    let message = err.to_string();
    assert!(message.starts_with("CSVLoadError"));
    for candidate in DialectCandidate::priority_list() {
        assert!(
            message.contains(&candidate.to_string()),
            "missing {candidate} in {message}"
        );
    }
}

#[test]
fn empty_file_fails_detection() {
    let err = detect(b"").expect_err("empty");
    assert_eq!(err.kind(), ErrorKind::NoViableDialect);
    assert!(err.to_string().contains("no columns to parse"));
}

#[test]
fn missing_file_is_reader_failure() {
    let workspace = TestWorkspace::new();
    let err = DialectDetector::default()
        .detect(&workspace.path().join("absent.csv"), None)
        .expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::ReaderFailure);
}

#[test]
fn probe_limit_bounds_rows_read() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("big.csv", &common::sample_csv(50));
    let detection = DialectDetector::default()
        .detect(&path, Some(10))
        .expect("detect");
    assert_eq!(detection.table.row_count(), 10);
    assert_eq!(detection.candidate.separator, Separator::Comma);
}
