use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::core::{ReceptorSequence, SequenceError, SequenceMetadata};
use crate::parsing::ParseError;
use crate::utils::validation::check_sequence_limit;

/// A recognised column of a sequence file
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    AminoAcid,
    Nucleotide,
    Identifier,
    Chain,
    VGene,
    VSubgroup,
    VAllele,
    JGene,
    JSubgroup,
    JAllele,
    Count,
    FrameType,
    RegionType,
    Custom(String),
}

impl Column {
    fn from_header(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "sequence_aa" | "amino_acid_sequence" | "cdr3_aa" => Self::AminoAcid,
            "sequence" | "nucleotide_sequence" | "cdr3" => Self::Nucleotide,
            "sequence_id" | "identifier" => Self::Identifier,
            "chain" | "locus" => Self::Chain,
            "v_gene" | "v_call" => Self::VGene,
            "v_subgroup" => Self::VSubgroup,
            "v_allele" => Self::VAllele,
            "j_gene" | "j_call" => Self::JGene,
            "j_subgroup" => Self::JSubgroup,
            "j_allele" => Self::JAllele,
            "count" | "duplicate_count" => Self::Count,
            "frame_type" => Self::FrameType,
            "region_type" => Self::RegionType,
            _ => Self::Custom(name.trim().to_string()),
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".gz")
}

/// Open a plain or gzip-compressed text file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse a sequence file (`.tsv` or `.tsv.gz`)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors if the
/// content is invalid.
pub fn parse_sequences_file(path: &Path) -> Result<Vec<ReceptorSequence>, ParseError> {
    parse_sequences_reader(open_text(path)?)
}

/// Parse sequence-file text
///
/// # Errors
///
/// As [`parse_sequences_reader`].
pub fn parse_sequences_text(text: &str) -> Result<Vec<ReceptorSequence>, ParseError> {
    parse_sequences_reader(text.as_bytes())
}

/// Parse tab-separated sequences; the first non-comment line is the header.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the header lacks a sequence column or a row
/// has more fields than the header, `ParseError::InvalidValue` for unparseable
/// chain, count, frame or region values, and `ParseError::TooManySequences` if the
/// limit is exceeded.
pub fn parse_sequences_reader<R: BufRead>(reader: R) -> Result<Vec<ReceptorSequence>, ParseError> {
    let mut columns: Option<Vec<Column>> = None;
    let mut sequences = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();

        if columns.is_none() {
            let header: Vec<Column> = fields.iter().map(|f| Column::from_header(f)).collect();
            if !header
                .iter()
                .any(|c| matches!(c, Column::AminoAcid | Column::Nucleotide))
            {
                return Err(ParseError::InvalidFormat(format!(
                    "Header on line {line_num} has no sequence_aa or sequence column"
                )));
            }
            columns = Some(header);
            continue;
        }
        let columns = columns.as_deref().unwrap_or_default();

        if fields.len() > columns.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields but the header has {}",
                fields.len(),
                columns.len()
            )));
        }

        if let Some(message) = check_sequence_limit(sequences.len()) {
            tracing::warn!("{message}");
            return Err(ParseError::TooManySequences(sequences.len()));
        }

        let sequence = parse_row(columns, &fields, sequences.len() + 1)
            .map_err(|source| ParseError::InvalidValue { line: line_num, source })?;
        sequences.push(sequence);
    }

    if columns.is_none() {
        return Err(ParseError::InvalidFormat("No header found".to_string()));
    }

    Ok(sequences)
}

fn parse_row(
    columns: &[Column],
    fields: &[&str],
    row_number: usize,
) -> Result<ReceptorSequence, SequenceError> {
    let mut sequence = ReceptorSequence {
        identifier: row_number.to_string(),
        amino_acid_sequence: None,
        nucleotide_sequence: None,
        metadata: SequenceMetadata::default(),
    };

    for (column, value) in columns.iter().zip(fields) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let meta = &mut sequence.metadata;
        match column {
            Column::AminoAcid => sequence.amino_acid_sequence = Some(value.to_string()),
            Column::Nucleotide => sequence.nucleotide_sequence = Some(value.to_string()),
            Column::Identifier => sequence.identifier = value.to_string(),
            Column::Chain => meta.chain = Some(value.parse()?),
            Column::VGene => meta.v_gene = Some(value.to_string()),
            Column::VSubgroup => meta.v_subgroup = Some(value.to_string()),
            Column::VAllele => meta.v_allele = Some(value.to_string()),
            Column::JGene => meta.j_gene = Some(value.to_string()),
            Column::JSubgroup => meta.j_subgroup = Some(value.to_string()),
            Column::JAllele => meta.j_allele = Some(value.to_string()),
            Column::Count => {
                meta.count = value.parse().map_err(|_| SequenceError::InvalidValue {
                    kind: "count",
                    value: value.to_string(),
                })?;
            }
            Column::FrameType => meta.frame_type = value.parse()?,
            Column::RegionType => meta.region_type = value.parse()?,
            Column::Custom(name) => {
                meta.custom.insert(name.clone(), value.to_string());
            }
        }
    }

    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chain, FrameType};
    use std::io::Write;

    #[test]
    fn test_parse_sequences_text() {
        let tsv = "# exported repertoire
sequence_id\tsequence_aa\tsequence\tlocus\tv_call\tj_call\tduplicate_count\tframe_type\tepitope
s1\tCASSLGQ\tTGTGCC\tTRB\tTRBV5-1\tTRBJ2-7\t12\tIN\tGILGFVFTL
s2\tCASSLGE\t\tTRB\tTRBV5-1\t\t\tOUT\t
";
        let sequences = parse_sequences_text(tsv).unwrap();
        assert_eq!(sequences.len(), 2);

        let first = &sequences[0];
        assert_eq!(first.identifier, "s1");
        assert_eq!(first.amino_acid_sequence.as_deref(), Some("CASSLGQ"));
        assert_eq!(first.nucleotide_sequence.as_deref(), Some("TGTGCC"));
        assert_eq!(first.metadata.chain, Some(Chain::Beta));
        assert_eq!(first.metadata.j_gene.as_deref(), Some("TRBJ2-7"));
        assert_eq!(first.count(), 12);
        assert_eq!(first.metadata.custom["epitope"], "GILGFVFTL");

        let second = &sequences[1];
        assert!(second.nucleotide_sequence.is_none());
        assert!(second.metadata.j_gene.is_none());
        assert_eq!(second.count(), 1);
        assert_eq!(second.metadata.frame_type, FrameType::Out);
        assert!(!second.metadata.custom.contains_key("epitope"));
    }

    #[test]
    fn test_default_identifier_is_row_number() {
        let sequences = parse_sequences_text("cdr3_aa\nCASSF\nCASSY\n").unwrap();
        assert_eq!(sequences[0].identifier, "1");
        assert_eq!(sequences[1].identifier, "2");
        assert!(sequences[1].is_in_frame());
    }

    #[test]
    fn test_missing_sequence_column() {
        let err = parse_sequences_text("v_call\tj_call\nTRBV5\tTRBJ2\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_sequences_text("sequence_aa\tcount\nCASSF\tmany\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { line: 2, .. }));

        let err = parse_sequences_text("sequence_aa\tframe_type\nCASSF\tmaybe\n").unwrap_err();
        assert!(err.to_string().contains("frame type"));

        let err = parse_sequences_text("sequence_aa\tcount\nCASSF\t-3\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse_sequences_text("sequence_aa\nCASSF\textra\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_sequences_text("").is_err());
        assert!(parse_sequences_text("sequence_aa\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rep.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"sequence_aa\tcount\nCASSF\t3\n").unwrap();
        encoder.finish().unwrap();

        let sequences = parse_sequences_file(&path).unwrap();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].count(), 3);
    }
}
