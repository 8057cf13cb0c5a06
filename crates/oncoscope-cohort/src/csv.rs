//! Tolerant CSV ingestion.
//!
//! Converts raw uploaded text into patient records. Tolerates a UTF-8
//! BOM, `\r\n`/`\r` line endings, quoted fields with embedded commas,
//! and doubled-quote escapes. Rows with the wrong field count are
//! padded or truncated rather than aborting the batch; rows without a
//! usable patient identifier are dropped. Row-level problems are
//! collected as warnings so partial success is the default outcome.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::models::PatientRecord;

/// The implicit schema contract for uploads, offered for download.
pub const TEMPLATE_CSV: &str = "\
patient_id,age,gender,tumor_stage,tumor_size,lymph_nodes,histological_grade,er_status,pr_status,her2_status,treatment_history
PATIENT_001,65,female,II,2.3,1,2,positive,positive,negative,chemotherapy
PATIENT_002,58,female,I,1.8,0,1,positive,negative,negative,surgery
PATIENT_003,72,male,III,3.1,3,3,negative,negative,positive,combination
PATIENT_004,61,female,II,2.7,2,2,positive,positive,negative,radiation
PATIENT_005,69,male,IV,4.2,5,3,negative,negative,negative,palliative
";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("CSV file must contain at least a header row and one data row")]
    TooFewLines,

    #[error(
        "No patient ID column found. Available columns: {}. \
         Please ensure your CSV has a column named 'patient_id', 'patientId', or 'id'.",
        available.join(", ")
    )]
    NoIdentifierColumn { available: Vec<String> },
}

/// Successes plus row-level diagnostics from one parse run.
#[derive(Debug)]
pub struct ParseOutcome {
    /// Lower-cased, trimmed header names in file order.
    pub headers: Vec<String>,
    pub patients: Vec<PatientRecord>,
    pub warnings: Vec<String>,
}

/// Parse uploaded CSV text into patient records.
///
/// Pure transformation: no I/O, and warnings never interrupt parsing of
/// subsequent rows. Fails only when the file as a whole is unusable —
/// fewer than two non-empty lines, or no recognizable identifier column.
pub fn parse_csv(raw: &str) -> Result<ParseOutcome, FormatError> {
    let clean = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);

    let lines: Vec<&str> = clean
        .split(['\n', '\r'])
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(FormatError::TooFewLines);
    }

    let headers: Vec<String> = split_line(lines[0])
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    debug!(headers = ?headers, "detected CSV headers");

    let id_column = headers
        .iter()
        .find(|h| {
            (h.contains("patient") && h.contains("id"))
                || h.as_str() == "id"
                || h.as_str() == "patient_id"
                || h.as_str() == "patientid"
        })
        .cloned()
        .ok_or_else(|| FormatError::NoIdentifierColumn {
            available: headers.clone(),
        })?;

    let mut patients = Vec::new();
    let mut warnings = Vec::new();

    for (i, line) in lines.iter().enumerate().skip(1) {
        let mut values = split_line(line);

        if values.len() != headers.len() {
            warnings.push(format!(
                "Row {} has {} columns, expected {}",
                i + 1,
                values.len(),
                headers.len()
            ));
            // Best-effort: pad short rows, truncate long ones
            values.resize(headers.len(), String::new());
        }

        let fields: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(values.into_iter())
            .collect();

        let patient_id = fields
            .get(&id_column)
            .map(|v| v.trim())
            .unwrap_or_default();
        if patient_id.is_empty() {
            continue;
        }

        patients.push(PatientRecord::new(patient_id.to_string(), fields));
    }

    debug!(
        parsed = patients.len(),
        rows = lines.len() - 1,
        warnings = warnings.len(),
        "CSV parse complete"
    );

    Ok(ParseOutcome {
        headers,
        patients,
        warnings,
    })
}

/// Split one CSV line into trimmed fields, honoring double quotes.
/// A doubled quote inside a quoted field is an escaped literal quote.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_plain() {
        assert_eq!(split_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_line(" a , b "), vec!["a", "b"]);
    }

    #[test]
    fn test_split_line_quoted_comma_and_escape() {
        assert_eq!(
            split_line(r#"P1,"Smith, Jane",72"#),
            vec!["P1", "Smith, Jane", "72"]
        );
        assert_eq!(
            split_line(r#""she said ""hi""",x"#),
            vec![r#"she said "hi""#, "x"]
        );
    }

    #[test]
    fn test_parse_strips_bom_and_crlf() {
        let raw = "\u{FEFF}patient_id,age\r\nP1,70\r\nP2,55\r\n";
        let out = parse_csv(raw).unwrap();
        assert_eq!(out.headers, vec!["patient_id", "age"]);
        assert_eq!(out.patients.len(), 2);
        assert_eq!(out.patients[0].patient_id(), "P1");
    }

    #[test]
    fn test_parse_header_only_is_format_error() {
        let err = parse_csv("patient_id,age\n").unwrap_err();
        assert!(matches!(err, FormatError::TooFewLines));
    }

    #[test]
    fn test_parse_no_id_column_names_available() {
        let err = parse_csv("name,age\nJane,70\n").unwrap_err();
        match err {
            FormatError::NoIdentifierColumn { available } => {
                assert_eq!(available, vec!["name", "age"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = parse_csv("name,age\nJane,70\n").unwrap_err().to_string();
        assert!(msg.contains("name, age"));
    }

    #[test]
    fn test_id_column_synonyms() {
        for header in ["patient_id", "PatientID", "id", "Patient Identifier ID"] {
            let raw = format!("{header},age\nP1,70\n");
            let out = parse_csv(&raw).unwrap();
            assert_eq!(out.patients.len(), 1, "header {header}");
        }
    }

    #[test]
    fn test_short_rows_padded_with_warning() {
        let out = parse_csv("patient_id,age,stage\nP1,70\nP2,55,II\n").unwrap();
        assert_eq!(out.patients.len(), 2);
        assert_eq!(out.patients[0].get("stage"), Some(""));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("Row 2"));
    }

    #[test]
    fn test_long_rows_truncated_with_warning() {
        let out = parse_csv("patient_id,age\nP1,70,extra,junk\n").unwrap();
        assert_eq!(out.patients.len(), 1);
        assert_eq!(out.patients[0].get("age"), Some("70"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rows_without_id_silently_dropped() {
        let out = parse_csv("patient_id,age\n,70\n  ,71\nP3,72\n").unwrap();
        assert_eq!(out.patients.len(), 1);
        assert_eq!(out.patients[0].patient_id(), "P3");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_template_round_trip() {
        let out = parse_csv(TEMPLATE_CSV).unwrap();
        assert_eq!(out.patients.len(), 5);
        assert!(out.warnings.is_empty());
        assert_eq!(out.patients[2].patient_id(), "PATIENT_003");
        assert_eq!(out.patients[2].get("treatment_history"), Some("combination"));
    }
}
