//! End-to-end matching scenarios over parsed repertoires.

use repmatch::core::{InMemoryRepertoire, MetadataAttribute, RepertoireDataset};
use repmatch::matching::{
    DatasetMatcher, MatchDetail, MatchDirection, MatchingConfig, SummaryType,
};
use repmatch::parsing::tsv::parse_sequences_text;

const REFERENCES: &str = "sequence_aa\tv_call\tj_call\tchain
CASSLGQF\tTRBV5-1\tTRBJ2-7\tTRB
CASRPGTF\tTRBV7-2\tTRBJ1-1\tTRB
";

const SUBJECT: &str = "sequence_id\tsequence_aa\tv_call\tj_call\tchain\tduplicate_count\tframe_type
s1\tCASSLGYF\tTRBV5-1\tTRBJ2-7\tTRB\t5\tIN
s2\tCASSLGYF\tTRBV5-2\tTRBJ2-7\tTRB\t3\tIN
s3\tCASRPGTF\tTRBV7-2\tTRBJ1-1\tTRB\t2\tOUT
s4\tCAWWWWWW\tTRBV5-1\tTRBJ2-7\tTRB\t1\tIN
";

fn dataset() -> RepertoireDataset<InMemoryRepertoire> {
    RepertoireDataset::new(vec![
        InMemoryRepertoire::new("subject", parse_sequences_text(SUBJECT).unwrap())
            .with_label("CD", true),
        InMemoryRepertoire::new("empty", Vec::new()).with_label("CD", false),
    ])
}

#[test]
fn test_metadata_restricts_matches() {
    let references = parse_sequences_text(REFERENCES).unwrap();
    let matcher = DatasetMatcher::new(MatchingConfig::default().with_workers(2)).unwrap();
    let result = matcher
        .match_query_to_reference(&dataset(), references)
        .unwrap();

    let subject = &result.repertoires[0];
    assert_eq!(subject.identifier, "subject");
    assert_eq!(subject.total_reads, 11);
    assert_eq!(subject.unique_reads, 4);
    // s2 differs in V gene, s3 is out of frame
    assert_eq!(subject.unique_reads_with_match, 1);
    assert_eq!(subject.total_reads_with_match, 5);
    assert!((subject.pct_total_reads_with_match - 5.0 / 11.0).abs() < 1e-12);
    assert_eq!(subject.metadata["CD"], serde_json::json!(true));

    let empty = &result.repertoires[1];
    assert_eq!(empty.total_reads, 0);
    assert_eq!(empty.pct_unique_reads_with_match, 0.0);
}

#[test]
fn test_without_attributes_only_distance_counts() {
    let references = parse_sequences_text(REFERENCES).unwrap();
    let config = MatchingConfig::default()
        .with_metadata_attributes(Vec::new())
        .with_workers(1);
    let result = DatasetMatcher::new(config)
        .unwrap()
        .match_query_to_reference(&dataset(), references)
        .unwrap();

    assert_eq!(result.repertoires[0].unique_reads_with_match, 2);
    assert_eq!(result.repertoires[0].total_reads_with_match, 8);
}

#[test]
fn test_reference_detail_and_features() {
    let references = parse_sequences_text(REFERENCES).unwrap();
    let config = MatchingConfig::default().with_workers(1).with_detail(true);
    let matcher = DatasetMatcher::new(config).unwrap();
    let result = matcher
        .match_reference_to_query(&dataset(), references)
        .unwrap();

    let subject = &result.repertoires[0];
    let Some(MatchDetail::ReferenceSequences(detail)) = &subject.detail else {
        panic!("expected reference detail");
    };
    assert_eq!(detail.len(), 2);
    assert_eq!(detail[0].reference_sequence["sequence"], "CASSLGQF");
    assert_eq!(detail[0].matching_query_sequences[0]["identifier"], "s1");
    assert!(detail[1].matching_query_sequences.is_empty());

    let names = result
        .reference_feature_names(
            &[MetadataAttribute::VGene, MetadataAttribute::JGene],
            matcher.config().sequence_type,
        )
        .unwrap();
    assert_eq!(names, vec!["CASSLGQF-TRBV5-1-TRBJ2-7", "CASRPGTF-TRBV7-2-TRBJ1-1"]);
    assert_eq!(
        subject.reference_feature_values(SummaryType::TotalReadsWithMatch),
        vec![5.0, 0.0]
    );
}

#[test]
fn test_directions_agree_on_summaries() {
    let references = parse_sequences_text(REFERENCES).unwrap();
    let matcher = DatasetMatcher::new(MatchingConfig::default().with_workers(3)).unwrap();
    let query = matcher
        .match_dataset(&dataset(), references.clone(), MatchDirection::QueryToReference)
        .unwrap();
    let reference = matcher
        .match_dataset(&dataset(), references, MatchDirection::ReferenceToQuery)
        .unwrap();

    for (a, b) in query.repertoires.iter().zip(&reference.repertoires) {
        for summary in SummaryType::ALL {
            assert_eq!(summary.value(a), summary.value(b));
        }
    }
}
