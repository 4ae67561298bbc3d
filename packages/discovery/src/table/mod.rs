//! Tabular input, tabular output, and the JSON run report.
//!
//! Input rows become items one-to-one (duplicates and blanks included).
//! The output table has exactly one row per outcome, in order.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DiscoveryError, Result};
use crate::pipeline::parse::year_in_text;
use crate::types::item::{known_source_type, Item};
use crate::types::outcome::{Outcome, ResultTable};

/// Default field delimiter for input and output tables.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Output columns, in order.
pub const OUTPUT_HEADERS: [&str; 8] = [
    "ID",
    "NAME",
    "VARIABLE",
    "SRC",
    "REFYEAR",
    "VALIDATED",
    "ROUNDS_USED",
    "FEEDBACK_SUMMARY",
];

/// Column positions resolved from the input header row.
struct Columns {
    id: usize,
    name: usize,
    variable: usize,
    source_type: Option<usize>,
    /// `TYPE` classifies rows in some datasets (e.g. `FIN_REP`/`OTHER`);
    /// it is only used when it names a known document kind.
    row_type: Option<usize>,
    ref_year: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let required = |name: &str| {
            find(&[name]).ok_or_else(|| {
                DiscoveryError::Input(format!("missing required column {}", name))
            })
        };

        Ok(Self {
            id: required("ID")?,
            name: required("NAME")?,
            variable: required("VARIABLE")?,
            source_type: find(&["SOURCE_TYPE"]),
            row_type: find(&["TYPE"]),
            ref_year: find(&["REFYEAR"]),
        })
    }
}

/// Read items from a delimited file.
pub fn read_items(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<Item>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_items_from(file, delimiter)
}

/// Read items from any reader.
pub fn read_items_from<R: io::Read>(reader: R, delimiter: u8) -> Result<Vec<Item>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(reader.headers()?)?;
    let field = |record: &StringRecord, index: usize| record.get(index).unwrap_or("").to_string();

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut item = Item::new(
            field(&record, columns.id),
            field(&record, columns.name),
            field(&record, columns.variable),
        );

        let explicit = columns
            .source_type
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty());
        let from_row_type = columns
            .row_type
            .and_then(|i| record.get(i))
            .and_then(known_source_type);
        if let Some(source_type) = explicit.or(from_row_type) {
            item = item.with_source_type(source_type);
        }

        if let Some(raw) = columns.ref_year.and_then(|i| record.get(i)).filter(|s| !s.is_empty()) {
            match year_in_text(raw) {
                Some(year) => item = item.with_pinned_year(year),
                None => tracing::warn!(row = row + 1, value = raw, "Ignoring unreadable REFYEAR"),
            }
        }

        items.push(item);
    }

    tracing::info!(items = items.len(), "Loaded input table");
    Ok(items)
}

/// Write one row per outcome to a delimited file.
pub fn write_results(path: impl AsRef<Path>, table: &ResultTable, delimiter: u8) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_results_to(file, table, delimiter)
}

/// Write one row per outcome to any writer.
pub fn write_results_to<W: io::Write>(writer: W, table: &ResultTable, delimiter: u8) -> Result<()> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    writer.write_record(OUTPUT_HEADERS)?;

    for outcome in table.iter() {
        writer.write_record(output_row(outcome))?;
    }

    writer.flush()?;
    Ok(())
}

fn output_row(outcome: &Outcome) -> [String; 8] {
    [
        outcome.item.id.clone(),
        outcome.item.name.clone(),
        outcome.item.variable.clone(),
        outcome.final_candidate.url_or_empty().to_string(),
        outcome.final_candidate.year_or_empty(),
        outcome.validated.to_string(),
        outcome.rounds_used.to_string(),
        outcome.feedback_summary(),
    ]
}

/// Machine-readable record of a whole run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub validated: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub validation_rate: f64,
    pub outcomes: &'a [Outcome],
}

impl<'a> RunReport<'a> {
    pub fn new(table: &'a ResultTable) -> Self {
        let summary = table.summary();
        Self {
            run_id: table.run_id,
            timestamp: Utc::now(),
            total: summary.total,
            validated: summary.validated,
            exhausted: summary.exhausted,
            failed: summary.failed,
            validation_rate: summary.validation_rate(),
            outcomes: table.outcomes(),
        }
    }
}

/// Write the JSON run report.
pub fn write_report(path: impl AsRef<Path>, table: &ResultTable) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RunReport::new(table))?;
    io::Write::flush(&mut writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::candidate::Candidate;
    use crate::types::feedback::{Checks, Feedback};
    use crate::types::round::{PromptState, RoundStatus};

    #[test]
    fn test_read_items_with_optional_columns() {
        let input = "ID;NAME;VARIABLE;TYPE;REFYEAR\n1;Acme Corp;turnover;Annual Report;FY2023\n2;Globex;employees;;\n";
        let items = read_items_from(input.as_bytes(), DEFAULT_DELIMITER).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Acme Corp");
        assert_eq!(items[0].pinned_year, Some(2023));
        assert_eq!(items[1].source_type(), "Annual Report");
        assert_eq!(items[1].pinned_year, None);
    }

    #[test]
    fn test_row_classifier_type_is_not_a_source_type() {
        let input = "ID;NAME;TYPE;VARIABLE;SRC;VALUE;CURRENCY;REFYEAR\n\
                     1;Acme Corp;FIN_REP;TURNOVER;;;;\n\
                     2;Globex;OTHER;EMPLOYEES;;;;\n\
                     3;Initech;quarterly;TURNOVER;;;;\n";
        let items = read_items_from(input.as_bytes(), DEFAULT_DELIMITER).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].source_type, None);
        assert_eq!(items[0].source_type(), "Annual Report");
        assert_eq!(items[0].variable, "TURNOVER");
        assert_eq!(items[0].pinned_year, None);
        assert_eq!(items[1].source_type, None);
        assert_eq!(items[2].source_type(), "Quarterly Report");

        let prompt = crate::pipeline::format_search_prompt(
            &items[0],
            &crate::types::item::SeedContext::empty(),
            None,
        );
        assert!(!prompt.contains("FIN_REP"));
        assert!(prompt.contains("requested source type: Annual Report"));
    }

    #[test]
    fn test_source_type_column_wins_over_type() {
        let input = "ID;NAME;VARIABLE;TYPE;SOURCE_TYPE\n1;Acme Corp;turnover;annual;Sustainability Report\n";
        let items = read_items_from(input.as_bytes(), DEFAULT_DELIMITER).unwrap();
        assert_eq!(items[0].source_type(), "Sustainability Report");
    }

    #[test]
    fn test_duplicate_rows_are_kept() {
        let input = "ID,NAME,VARIABLE\n1,Acme,turnover\n1,Acme,turnover\n";
        let items = read_items_from(input.as_bytes(), b',').unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_missing_required_column() {
        let input = "ID;NAME\n1;Acme\n";
        let err = read_items_from(input.as_bytes(), DEFAULT_DELIMITER).unwrap_err();
        assert!(err.to_string().contains("VARIABLE"));
    }

    #[test]
    fn test_write_results_one_row_per_outcome() {
        let item = Item::new("1", "Acme Corp", "turnover");
        let mut state = PromptState::new("p");
        state.record(
            Candidate::new("https://acme.com/ar-2024.pdf", 2024),
            Feedback::from_checks(Checks::all_pass(), "direct link"),
            RoundStatus::Accepted,
        );
        let table = ResultTable::new(
            Uuid::nil(),
            vec![
                Outcome::from_history(item.clone(), state.into_history()),
                Outcome::failed(Item::new("2", "Globex", "turnover"), "panicked"),
            ],
        );

        let mut buffer = Vec::new();
        write_results_to(&mut buffer, &table, DEFAULT_DELIMITER).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ID;NAME;VARIABLE;SRC;REFYEAR;VALIDATED;ROUNDS_USED;FEEDBACK_SUMMARY");
        assert_eq!(
            lines[1],
            "1;Acme Corp;turnover;https://acme.com/ar-2024.pdf;2024;true;1;accepted: direct link"
        );
        assert_eq!(lines[2], "2;Globex;turnover;;;false;0;worker failure: panicked");
    }

    #[test]
    fn test_report_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let table = ResultTable::new(
            Uuid::now_v7(),
            vec![Outcome::failed(Item::new("1", "Acme Corp", "turnover"), "panicked")],
        );

        write_report(&path, &table).unwrap();
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["total"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["validation_rate"], 0.0);
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 1);
    }
}
