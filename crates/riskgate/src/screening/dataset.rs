use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::{FeatureMap, FeatureValue, ScreeningSubmission};

/// Failure while importing a screening dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read screening dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid screening CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("screening CSV is missing the '{0}' column")]
    MissingColumn(String),
    #[error("invalid screening JSON subject: {0}")]
    Json(#[from] serde_json::Error),
}

const REFERENCE_COLUMN: &str = "subject_reference";

/// Imports screening submissions from a CSV export: one row per subject, a
/// `subject_reference` column, and every other column treated as a feature.
///
/// Cell values are typed on sight: parseable numbers become numeric
/// features, `true`/`false` become flags, everything else stays text, and
/// empty cells leave the feature absent.
pub struct SubmissionImporter;

impl SubmissionImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ScreeningSubmission>, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ScreeningSubmission>, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let reference_index = headers
            .iter()
            .position(|name| name == REFERENCE_COLUMN)
            .ok_or_else(|| DatasetError::MissingColumn(REFERENCE_COLUMN.to_string()))?;

        let mut submissions = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let subject_reference = record
                .get(reference_index)
                .unwrap_or_default()
                .to_string();

            let mut features = FeatureMap::new();
            for (index, cell) in record.iter().enumerate() {
                if index == reference_index || cell.is_empty() {
                    continue;
                }
                let Some(name) = headers.get(index) else {
                    continue;
                };
                features.insert(name.to_string(), type_cell(cell));
            }

            submissions.push(ScreeningSubmission {
                subject_reference,
                features,
            });
        }

        Ok(submissions)
    }

    /// Loads a single submission from a JSON document shaped like the HTTP
    /// submit payload: `{"subject_reference": "...", "features": {...}}`.
    pub fn subject_from_path<P: AsRef<Path>>(path: P) -> Result<ScreeningSubmission, DatasetError> {
        let file = File::open(path)?;
        Self::subject_from_reader(file)
    }

    pub fn subject_from_reader<R: Read>(reader: R) -> Result<ScreeningSubmission, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

fn type_cell(cell: &str) -> FeatureValue {
    if cell.eq_ignore_ascii_case("true") {
        return FeatureValue::Flag(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return FeatureValue::Flag(false);
    }
    if let Ok(number) = cell.parse::<f64>() {
        return FeatureValue::Number(number);
    }
    FeatureValue::Text(cell.to_string())
}
