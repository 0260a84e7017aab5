use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{ApplicationSubmission, NumericInput};

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read application batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid application CSV data: {}", err),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Reads intake-form exports with one application per row.
///
/// Headers are matched case-insensitively, with spaces and hyphens treated as underscores,
/// so both `fico_score` and `FICO Score` work.
pub struct ApplicationCsvImporter;

impl ApplicationCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ApplicationSubmission>, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicationSubmission>, BatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: csv::StringRecord = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();
        csv_reader.set_headers(headers);

        let mut submissions = Vec::new();
        for row in csv_reader.deserialize::<ApplicationRow>() {
            submissions.push(row?.into_submission());
        }

        Ok(submissions)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ApplicationRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    business_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    geographic_location: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    industry_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    revenue: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    equipment_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    business_duration: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    paynet_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    personal_guarantor_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fico_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    trade_lines: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    credit_history_flags: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    loan_amount: Option<String>,
}

impl ApplicationRow {
    fn into_submission(self) -> ApplicationSubmission {
        ApplicationSubmission {
            business_name: self.business_name,
            geographic_location: self.geographic_location,
            industry_type: self.industry_type,
            revenue: self.revenue.map(NumericInput::Text),
            equipment_type: self.equipment_type,
            business_duration: self.business_duration.map(NumericInput::Text),
            paynet_score: self.paynet_score.map(NumericInput::Text),
            personal_guarantor_name: self.personal_guarantor_name,
            fico_score: self.fico_score.map(NumericInput::Text),
            trade_lines: self.trade_lines.map(NumericInput::Text),
            credit_history_flags: self.credit_history_flags,
            loan_amount: self.loan_amount.map(NumericInput::Text),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
