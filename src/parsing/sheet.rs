//! Dataset sheets: one repertoire per row.
//!
//! ```text
//! filename            identifier  CD     age
//! rep1.tsv            subject1    true   34
//! rep2.tsv.gz         subject2    false  51
//! ```
//!
//! `filename` is required and resolved relative to the sheet; `identifier` defaults to
//! the file stem. Every other column becomes a repertoire label, with numbers and
//! booleans stored as JSON scalars.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::{
    ReceptorSequence, Repertoire, RepertoireDataset, RepertoireError, RepertoireMetadata,
};
use crate::parsing::tsv::{open_text, parse_sequences_file};
use crate::parsing::ParseError;

/// A repertoire backed by a sequence file, read on every load
#[derive(Debug, Clone)]
pub struct TsvRepertoire {
    identifier: String,
    path: PathBuf,
    metadata: RepertoireMetadata,
}

impl TsvRepertoire {
    /// Repertoire identified by the file stem, without labels
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            identifier: file_stem(&path),
            path,
            metadata: RepertoireMetadata::new(),
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: RepertoireMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Repertoire for TsvRepertoire {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn filename(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn metadata(&self) -> &RepertoireMetadata {
        &self.metadata
    }

    fn load_sequences(&self) -> Result<Vec<ReceptorSequence>, RepertoireError> {
        parse_sequences_file(&self.path).map_err(|e| RepertoireError::Load {
            identifier: self.identifier.clone(),
            source: Box::new(e),
        })
    }
}

/// File name without `.gz` and the last remaining extension
fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Interpret a label cell: numbers and booleans become JSON scalars, anything else a string
fn parse_label(value: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(parsed) if parsed.is_number() || parsed.is_boolean() => parsed,
        _ => serde_json::Value::String(value.to_string()),
    }
}

/// Read a dataset sheet; repertoire files are not opened until loaded
///
/// # Errors
///
/// Returns `ParseError::Io` if the sheet cannot be read, `ParseError::InvalidFormat`
/// if it has no `filename` column, a row lacks a filename, or a row has more fields
/// than the header.
pub fn parse_dataset_sheet(path: &Path) -> Result<RepertoireDataset<TsvRepertoire>, ParseError> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_dataset_sheet_reader(open_text(path)?, base)
}

/// Read a dataset sheet, resolving relative filenames against `base`
///
/// # Errors
///
/// As [`parse_dataset_sheet`].
pub fn parse_dataset_sheet_reader<R: BufRead>(
    reader: R,
    base: &Path,
) -> Result<RepertoireDataset<TsvRepertoire>, ParseError> {
    let mut header: Option<Vec<String>> = None;
    let mut repertoires = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').map(str::trim).collect();

        if header.is_none() {
            let names: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
            if !names.iter().any(|n| n == "filename") {
                return Err(ParseError::InvalidFormat(
                    "Dataset sheet has no filename column".to_string(),
                ));
            }
            if names.len() <= 1 + usize::from(names.iter().any(|n| n == "identifier")) {
                warn!("Dataset sheet has no label columns");
            }
            header = Some(fields.iter().map(|f| (*f).to_string()).collect());
            continue;
        }
        let names = header.as_deref().unwrap_or_default();

        if fields.len() > names.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields but the header has {}",
                fields.len(),
                names.len()
            )));
        }

        let mut filename = None;
        let mut identifier = None;
        let mut metadata = RepertoireMetadata::new();
        for (name, value) in names.iter().zip(&fields) {
            if value.is_empty() {
                continue;
            }
            match name.to_lowercase().as_str() {
                "filename" => filename = Some(*value),
                "identifier" => identifier = Some(*value),
                _ => {
                    metadata.insert(name.clone(), parse_label(value));
                }
            }
        }

        let Some(filename) = filename else {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has no filename"
            )));
        };
        let mut repertoire = TsvRepertoire::new(base.join(filename)).with_metadata(metadata);
        if let Some(identifier) = identifier {
            repertoire = repertoire.with_identifier(identifier);
        }
        repertoires.push(repertoire);
    }

    Ok(RepertoireDataset::new(repertoires))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dataset_sheet() {
        let sheet = "filename\tidentifier\tCD\tage\tsite
rep1.tsv\tsubject1\ttrue\t34\tOslo
rep2.tsv.gz\t\tfalse\t51.5\t
";
        let dataset = parse_dataset_sheet_reader(sheet.as_bytes(), Path::new("/data")).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.repertoires()[0];
        assert_eq!(first.identifier(), "subject1");
        assert_eq!(first.filename(), Some(Path::new("/data/rep1.tsv")));
        assert_eq!(first.metadata()["CD"], json!(true));
        assert_eq!(first.metadata()["age"], json!(34));
        assert_eq!(first.metadata()["site"], json!("Oslo"));

        let second = &dataset.repertoires()[1];
        assert_eq!(second.identifier(), "rep2");
        assert_eq!(second.metadata()["age"], json!(51.5));
        assert!(!second.metadata().contains_key("site"));
    }

    #[test]
    fn test_missing_filename_column() {
        let err = parse_dataset_sheet_reader("identifier\tCD\ns1\ttrue\n".as_bytes(), Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_row_without_filename() {
        let err = parse_dataset_sheet_reader("filename\tCD\n\ttrue\n".as_bytes(), Path::new("."))
            .unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/a/rep1.tsv")), "rep1");
        assert_eq!(file_stem(Path::new("rep1.tsv.gz")), "rep1");
        assert_eq!(file_stem(Path::new("rep1")), "rep1");
    }

    #[test]
    fn test_lazy_load_reports_missing_file() {
        let repertoire = TsvRepertoire::new("/nonexistent/rep.tsv");
        let err = repertoire.load_sequences().unwrap_err();
        assert!(err.to_string().contains("rep"));
    }

    #[test]
    fn test_load_from_sheet_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rep1.tsv"), "sequence_aa\tcount\nCASSF\t2\n").unwrap();
        let sheet = dir.path().join("dataset.tsv");
        std::fs::write(&sheet, "filename\tCD\nrep1.tsv\ttrue\n").unwrap();

        let dataset = parse_dataset_sheet(&sheet).unwrap();
        let sequences = dataset.repertoires()[0].load_sequences().unwrap();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].count(), 2);
    }
}
