//! Behavior-driven tests for parsing step output that does not follow the
//! happy path: ragged rows, stray text, odd encodings.

use bandwatch_core::{
    merge_positional, parse_price_records, parse_support_ranges, Diagnostic, PRICE_COLUMNS,
};
use serde_json::json;

// =============================================================================
// Price artifact
// =============================================================================

#[test]
fn when_rows_are_ragged_every_row_still_yields_a_record() {
    // Given: A short row, an over-long row and a well-formed row
    let text = "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
                2024-01-01,10,12\n\
                2024-01-02,11,13,10,12,12,1100,extra,fields\n\
                2024-01-03,12,14,11,13,13,1200\n";

    // When: The artifact is parsed
    let parsed = parse_price_records(text);

    // Then: Three records in file order
    assert_eq!(parsed.records.len(), 3);
    assert_eq!(parsed.records[0].high.as_deref(), Some("12"));
    assert_eq!(parsed.records[0].low, None);
    assert_eq!(parsed.records[1].volume.as_deref(), Some("1100"));

    // And: The tolerated rows are reported
    assert_eq!(
        parsed.diagnostics,
        vec![
            Diagnostic::MissingFields { line: 2, found: 3 },
            Diagnostic::ExtraFields { line: 3, found: 9 },
        ]
    );
}

#[test]
fn when_header_names_differ_columns_are_still_positional() {
    let text = "Date,O,H,L,C,Adj Close,Vol\n2024-01-01,10,12,9,11,11,1000\n";

    let parsed = parse_price_records(text);

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].adj_close.as_deref(), Some("11"));
    assert_eq!(PRICE_COLUMNS[5], "AdjClose");
}

#[test]
fn when_file_has_only_a_header_no_records_are_produced() {
    let parsed = parse_price_records("Datetime,Open,High,Low,Close,AdjClose,Volume\n");

    assert!(parsed.records.is_empty());
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn when_file_is_empty_no_records_are_produced() {
    let parsed = parse_price_records("");

    assert!(parsed.records.is_empty());
}

#[test]
fn blank_lines_and_crlf_endings_are_tolerated() {
    let text = "Datetime,Open,High,Low,Close,AdjClose,Volume\r\n\
                \r\n\
                2024-01-01 09:15:00+05:30,10,12,9,11,11,1000\r\n\
                \r\n";

    let parsed = parse_price_records(text);

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(
        parsed.records[0].datetime.as_deref(),
        Some("2024-01-01 09:15:00+05:30")
    );
    assert_eq!(parsed.records[0].volume.as_deref(), Some("1000"));
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
}

#[test]
fn values_are_carried_verbatim_even_when_not_numeric() {
    let text = "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
                yesterday,10,,9,NaN?,11,1e3\n";

    let parsed = parse_price_records(text);

    assert_eq!(parsed.records.len(), 1);
    let record = &parsed.records[0];
    assert_eq!(record.datetime.as_deref(), Some("yesterday"));
    assert_eq!(record.high.as_deref(), Some(""));
    assert_eq!(record.close.as_deref(), Some("NaN?"));
    assert_eq!(
        parsed.diagnostics,
        vec![
            Diagnostic::BadTimestamp {
                line: 2,
                value: String::from("yesterday"),
            },
            Diagnostic::NonNumeric {
                line: 2,
                column: "High",
                value: String::new(),
            },
            Diagnostic::NonNumeric {
                line: 2,
                column: "Close",
                value: String::from("NaN?"),
            },
        ]
    );
}

#[test]
fn quotes_are_plain_text_and_commas_always_split() {
    // Given: A row whose volume is written as a quoted thousands value
    let text = "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
                2024-01-01,10,12,9,11,11,\"1,000\"\n";

    // When: The artifact is parsed
    let parsed = parse_price_records(text);

    // Then: The quote is kept as text and the comma yields an extra field
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].volume.as_deref(), Some("\"1"));
    assert_eq!(
        parsed.diagnostics,
        vec![
            Diagnostic::ExtraFields { line: 2, found: 8 },
            Diagnostic::NonNumeric {
                line: 2,
                column: "Volume",
                value: String::from("\"1"),
            },
        ]
    );
}

#[test]
fn unbalanced_quote_does_not_merge_rows() {
    // Given: A stray opening quote in the first row
    let text = "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
                2024-01-01,10,12,9,\"11,11,1000\n\
                2024-01-02,11,13,10,12,12,1100\n\
                2024-01-03,12,14,11,13,13,1200\n";

    // When: The artifact is parsed
    let parsed = parse_price_records(text);

    // Then: Every line still yields its own record, in file order
    let dates: Vec<_> = parsed
        .records
        .iter()
        .map(|record| record.datetime.as_deref())
        .collect();
    assert_eq!(
        dates,
        vec![Some("2024-01-01"), Some("2024-01-02"), Some("2024-01-03")]
    );
    assert_eq!(parsed.records[0].close.as_deref(), Some("\"11"));
}

#[test]
fn duplicate_rows_are_passed_through() {
    let row = "2024-01-01,10,12,9,11,11,1000\n";
    let text = format!("Datetime,Open,High,Low,Close,AdjClose,Volume\n{row}{row}");

    let parsed = parse_price_records(&text);

    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[0], parsed.records[1]);
}

// =============================================================================
// Analysis report
// =============================================================================

#[test]
fn only_marker_lines_contribute_ranges() {
    // Given: A report mixing progress output, a summary list and marker lines
    let text = "Loading stock_data_1d.csv\n\
                Range 1: 1.00-2.00 INR\n\
                Support Range 1: 100.25 - 101.75 INR\n\
                support range 2: 3.00-4.00\n\
                Support Range 3: 110.00-112.00\n";

    // When: The report is parsed
    let parsed = parse_support_ranges(text);

    // Then: Only lines with the exact marker phrase count, in line order
    let bounds: Vec<(f64, f64)> = parsed
        .ranges
        .iter()
        .flatten()
        .map(|r| (r.min, r.max))
        .collect();
    assert_eq!(parsed.ranges.len(), 2);
    assert_eq!(bounds, vec![(100.25, 101.75), (110.0, 112.0)]);
}

#[test]
fn integer_bounds_are_not_recognized_as_a_band() {
    let parsed = parse_support_ranges("Support Range 1: 100-101\nSupport Range 2: 1.5-2.5\n");

    assert_eq!(parsed.ranges.len(), 1);
    assert_eq!(parsed.ranges[0].map(|r| r.min), Some(1.5));
}

#[test]
fn first_band_on_a_line_wins() {
    let parsed = parse_support_ranges("Support Range 1: 5.00-6.00 (previous 4.00-4.50)\n");

    assert_eq!(parsed.ranges.len(), 1);
    assert_eq!(parsed.ranges[0].map(|r| (r.min, r.max)), Some((5.0, 6.0)));
}

#[test]
fn equal_bounds_form_a_valid_range() {
    let parsed = parse_support_ranges("Support Range 1: 7.25-7.25\n");

    assert_eq!(parsed.ranges.len(), 1);
    assert!(parsed.ranges[0].is_some());
    assert!(parsed.diagnostics.is_empty());
}

// =============================================================================
// Merged output
// =============================================================================

#[test]
fn dropped_range_line_shifts_later_annotations() {
    // Given: Three rows and a report whose first marker line has no band
    let records = parse_price_records(
        "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
         2024-01-01,10,12,9,11,11,1000\n\
         2024-01-02,11,13,10,12,12,1100\n\
         2024-01-03,12,14,11,13,13,1200\n",
    );
    let ranges = parse_support_ranges(
        "Support Range 1: pending\n\
         Support Range 2: 10.00-11.00\n\
         Support Range 3: 11.00-12.00\n",
    );

    // When: Rows and ranges are merged
    let merged = merge_positional(records.records, &ranges.ranges);

    // Then: Annotation follows index, not the numbering printed by the step
    let json = serde_json::to_value(&merged).expect("serialize");
    assert_eq!(json[0]["supportMin"], json!(10.0));
    assert_eq!(json[1]["supportMin"], json!(11.0));
    assert!(json[2].get("support").is_none());
    assert!(json[2].get("supportMin").is_none());
}

#[test]
fn inverted_band_leaves_its_row_unannotated_without_shifting() {
    // Given: Three rows and a report whose first band has its bounds reversed
    let records = parse_price_records(
        "Datetime,Open,High,Low,Close,AdjClose,Volume\n\
         2024-01-01,10,12,9,11,11,1000\n\
         2024-01-02,11,13,10,12,12,1100\n\
         2024-01-03,12,14,11,13,13,1200\n",
    );
    let ranges = parse_support_ranges(
        "Support Range 1: 12.00-11.00\n\
         Support Range 2: 10.00-11.00\n",
    );

    // When: Rows and ranges are merged
    let merged = merge_positional(records.records, &ranges.ranges);

    // Then: Row one is unannotated and row two keeps the band from line two
    let json = serde_json::to_value(&merged).expect("serialize");
    assert!(json[0].get("support").is_none());
    assert_eq!(json[1]["supportMin"], json!(10.0));
    assert_eq!(json[1]["supportMax"], json!(11.0));
    assert!(json[2].get("support").is_none());

    // And: The reversed band is still reported
    assert_eq!(
        ranges.diagnostics,
        vec![Diagnostic::InvalidRange {
            line: 1,
            text: String::from("12.00-11.00"),
        }]
    );
}
