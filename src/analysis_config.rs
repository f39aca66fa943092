/*!
Contains configuration information for variant analysis and observation ingest.
Typical usage is to the use the builder to construct the config, e.g.
```
use plasvar::analysis_config::{AnalysisConfig, AnalysisConfigBuilder};
use plasvar::mutation::TrimWindow;
let config: AnalysisConfig = AnalysisConfigBuilder::default()
    .trim_window(Some(TrimWindow::new(3, 220).unwrap()))
    .label_prefix("mNeon")
    .build()
    .unwrap();
```
*/

use crate::mutation::TrimWindow;

/**
Contains configuration information for the variant analyzer.
Typical usage is to the use the builder to construct the config, e.g.
```
use plasvar::analysis_config::{AnalysisConfig, AnalysisConfigBuilder};
let config: AnalysisConfig = AnalysisConfigBuilder::default()
    .exact_labels(false)
    .inconsistency_margin(5)
    .build()
    .unwrap();
```
*/
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct AnalysisConfig {
    /// Window of positions kept when grouping variants by mutation set; None disables trimming
    pub trim_window: Option<TrimWindow>,
    /// If true, labels must match exactly; otherwise a label matches any label containing it
    pub exact_labels: bool,
    /// Default label selection for presence searches: every label starting with this prefix
    #[builder(setter(into))]
    pub label_prefix: String,
    /// Number of residues ignored at both ends when comparing replicate sequences of one source
    pub inconsistency_margin: usize,
    /// Reference inputs this short (or shorter) are treated as names that need resolving
    pub max_reference_name_len: usize
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            // tuned on ~238 residue fluorescent proteins, the ends are frequently truncated or tagged
            trim_window: Some(TrimWindow::default()),
            // fuzzy matching is opt-in
            exact_labels: true,
            // monomeric variants are conventionally prefixed with "m"
            label_prefix: "m".to_string(),
            // replicate reads tend to disagree in the first and last few residues
            inconsistency_margin: 3,
            // no real protein is shorter than 10 residues
            max_reference_name_len: 9
        }
    }
}

/// Labels of selection markers, tags, and other coding sequences that are not worth cataloging
pub const DEFAULT_IGNORED_LABELS: &[&str] = &[
    "NeoR", "AmpR", "KanR", "6xHis", "Xpress(TM)", "T7 tag",
    "HygR", "PuroR", "Rep101", "araC", "GmR", "TcR", "TetR",
    "ccdB", "BSD", "pVS1", "CmR", "URA3", "ORF1629", "ORF603",
    "SmR", "VN155", "LEU2", "Cre", "NrsR", "LAMP1", "DHFR",
    "BirA", "RhoA", "mini-white", "rtTA", "lacZ", "c-Myc", "TRP1",
    "HIS3", "FLP", "Cas9", "dCas9", "lacI", "VN173",
    "t antigen", "BlpR"
];

/**
Controls which observations are kept when building a `VariantIndex` from raw records.
```
use plasvar::analysis_config::{IngestFilter, IngestFilterBuilder};
let filter: IngestFilter = IngestFilterBuilder::default()
    .min_sequence_length(100)
    .build()
    .unwrap();
assert!(filter.ignored_labels.iter().any(|l| l == "AmpR"));
```
*/
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct IngestFilter {
    /// Observations with a sequence of this length or shorter are dropped
    pub min_sequence_length: usize,
    /// Observations whose label contains any of these are dropped
    pub ignored_labels: Vec<String>
}

impl Default for IngestFilter {
    fn default() -> Self {
        Self {
            // shorter than any fluorescent protein, longer than most tags
            min_sequence_length: 140,
            ignored_labels: DEFAULT_IGNORED_LABELS.iter().map(|l| l.to_string()).collect()
        }
    }
}

impl IngestFilter {
    /// Returns true if an observation with this label and sequence should be kept
    /// # Arguments
    /// * `label` - the observation label
    /// * `sequence` - the observed protein sequence
    pub fn accepts(&self, label: &str, sequence: &str) -> bool {
        sequence.len() > self.min_sequence_length &&
            !self.ignored_labels.iter().any(|ignored| label.contains(ignored.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfigBuilder::default().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.trim_window, Some(TrimWindow::new(4, 233).unwrap()));
        assert!(config.exact_labels);
        assert_eq!(config.label_prefix, "m");
    }

    #[test]
    fn test_ingest_filter() {
        let filter = IngestFilterBuilder::default()
            .min_sequence_length(5)
            .build().unwrap();
        assert!(filter.accepts("mCherry", "MVSKGEE"));
        // too short
        assert!(!filter.accepts("mCherry", "MVSKG"));
        // marker genes are skipped, even when part of a longer label
        assert!(!filter.accepts("AmpR promoter", "MSIQHFRVALIPFFAAFCLPVFA"));

        let keep_all = IngestFilterBuilder::default()
            .min_sequence_length(0)
            .ignored_labels(vec![])
            .build().unwrap();
        assert!(keep_all.accepts("AmpR", "M"));
    }
}
