use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Error;
use crate::phone::Normalizer;
use crate::validation::{validate_message, validate_sender};

const HEADER: [&str; 3] = ["phone", "from", "message"];

/// One data line of a batch file, fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub phone: String,
    pub from: String,
    pub message: String,
}

/// A row that failed validation, kept with its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRow {
    /// 1-based index among data rows (header and blank lines excluded).
    pub row: usize,
    pub record: CsvRow,
    pub errors: Vec<String>,
}

/// Classification of every data row of a batch file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub valid_rows: Vec<CsvRow>,
    pub invalid_rows: Vec<InvalidRow>,
    pub total_rows: usize,
}

/// Parses `phone,from,message` batch files and validates each row.
#[derive(Debug, Clone, Default)]
pub struct BatchValidator {
    normalizer: Normalizer,
}

/// Column positions of the required fields.
struct Columns {
    phone: usize,
    from: usize,
    message: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, Error> {
        let names: Vec<&str> = headers.iter().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        let mut expected = HEADER;
        expected.sort_unstable();

        if sorted != expected {
            return Err(Error::Csv(format!(
                "header must be exactly {}, found '{}'",
                HEADER.join(","),
                names.join(",")
            )));
        }

        let position = |name: &str| names.iter().position(|h| *h == name).unwrap_or_default();
        Ok(Self {
            phone: position("phone"),
            from: position("from"),
            message: position("message"),
        })
    }

    fn extract(&self, record: &csv::StringRecord) -> CsvRow {
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        CsvRow {
            phone: field(self.phone),
            from: field(self.from),
            message: field(self.message),
        }
    }
}

impl BatchValidator {
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Parse `content` and classify every data row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] when the file itself is malformed: missing or
    /// wrong header, unbalanced quotes, a row with the wrong number of fields.
    /// Row-level validation failures are reported in the result instead.
    pub fn parse_and_validate(&self, content: &str) -> Result<BatchResult, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = Columns::locate(&headers)?;

        let mut result = BatchResult::default();
        for record in reader.records() {
            let record = record?;
            // Whitespace-only lines come through as one empty field. A row of
            // empty fields like `,,` is data and gets validated.
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() != headers.len() {
                let line = record.position().map_or(0, csv::Position::line);
                return Err(Error::Csv(format!(
                    "line {line}: expected {} fields, found {}",
                    headers.len(),
                    record.len()
                )));
            }

            result.total_rows += 1;
            let row = columns.extract(&record);
            let errors = self.validate_row(&row);
            if errors.is_empty() {
                result.valid_rows.push(row);
            } else {
                result.invalid_rows.push(InvalidRow {
                    row: result.total_rows,
                    record: row,
                    errors,
                });
            }
        }

        tracing::debug!(
            total = result.total_rows,
            valid = result.valid_rows.len(),
            invalid = result.invalid_rows.len(),
            "validated batch file"
        );
        Ok(result)
    }

    fn validate_row(&self, row: &CsvRow) -> Vec<String> {
        let mut errors = Vec::new();

        if row.phone.is_empty() {
            errors.push("Phone number is missing".to_string());
        } else if !self.normalizer.validate(&row.phone) {
            errors.push(format!("Invalid phone number format: {}", row.phone));
        }

        if row.from.is_empty() {
            errors.push("Sender name is missing".to_string());
        } else if !validate_sender(&row.from) {
            errors.push(format!(
                "Invalid sender name: {} (3-11 alphanumeric characters, not all digits, must not start with a digit)",
                row.from
            ));
        }

        if row.message.is_empty() {
            errors.push("Message is missing".to_string());
        } else if !validate_message(&row.message).valid {
            errors.push("Message is empty".to_string());
        }

        errors
    }
}

/// Human-readable report of a batch validation.
pub fn summarize(result: &BatchResult) -> String {
    let mut summary = String::from("CSV validation result:\n");
    let _ = writeln!(summary, "- Total rows: {}", result.total_rows);
    let _ = writeln!(summary, "- Valid rows: {}", result.valid_rows.len());
    let _ = writeln!(summary, "- Invalid rows: {}", result.invalid_rows.len());

    if !result.invalid_rows.is_empty() {
        summary.push_str("\nInvalid row details:\n");
        for invalid in &result.invalid_rows {
            let _ = writeln!(summary, "- Row {}: {}", invalid.row, invalid.errors.join(", "));
        }
    }

    summary
}
