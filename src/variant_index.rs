/*!
This module provides access to the VariantIndex, which groups raw observations by label and then by exact sequence.
Each distinct sequence under a label is a variant, and the set of source ids that reported it determines its rank.

# Example usage
```rust
use plasvar::variant_index::{Observation, VariantIndex};

let index: VariantIndex = [
    Observation::new("mCherry", "MVSKGEEDNM", "p1"),
    Observation::new("mCherry", "MVSKGEEDNM", "p2"),
    Observation::new("mCherry", "MVSKGEEDNA", "p3"),
    Observation::new("EGFP", "MVSKGEELFT", "p4"),
].into_iter().collect();

// the most common variant is the one reported by two sources
assert_eq!(index.most_common("mCherry", 1), vec!["MVSKGEEDNM"]);
assert_eq!(index.most_common_with_counts("mCherry", 2), vec![("MVSKGEEDNM", 2), ("MVSKGEEDNA", 1)]);
assert!(index.most_common("mScarlet", 1).is_empty());
```
*/

use itertools::Itertools;
use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use std::fmt;
use std::str::FromStr;

use crate::analysis_config::IngestFilter;
use crate::error::VariantError;
use crate::grouping::GroupedSources;

/// Distinct sequences and the sources reporting each of them, in discovery order
pub type Variants = GroupedSources<String>;

/// Whether the record a sequence came from covered the full construct or only part of it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LengthClass {
    Full,
    Partial
}

impl fmt::Display for LengthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthClass::Full => write!(f, "full"),
            LengthClass::Partial => write!(f, "partial")
        }
    }
}

impl FromStr for LengthClass {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(LengthClass::Full),
            "partial" => Ok(LengthClass::Partial),
            other => Err(VariantError::InvalidObservation(format!("unknown length class \"{other}\"")))
        }
    }
}

/// A single coding sequence reported by one source under one label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    /// The entity or category this sequence was annotated as
    label: String,
    /// Amino-acid sequence
    sequence: String,
    /// The physical record the sequence came from
    source_id: String,
    /// Who provided the sequence, e.g. the depositor or the repository itself
    contributor: Option<String>,
    /// Whether the record covered the full construct
    length_class: Option<LengthClass>
}

impl Observation {
    /// Constructor without any metadata
    pub fn new<L, S, I>(label: L, sequence: S, source_id: I) -> Observation
    where
        L: Into<String>,
        S: Into<String>,
        I: Into<String>
    {
        Observation {
            label: label.into(),
            sequence: sequence.into(),
            source_id: source_id.into(),
            contributor: None,
            length_class: None
        }
    }

    pub fn with_contributor<C: Into<String>>(mut self, contributor: C) -> Observation {
        self.contributor = Some(contributor.into());
        self
    }

    pub fn with_length_class(mut self, length_class: LengthClass) -> Observation {
        self.length_class = Some(length_class);
        self
    }

    // Getters
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn contributor(&self) -> Option<&str> {
        self.contributor.as_deref()
    }

    pub fn length_class(&self) -> Option<LengthClass> {
        self.length_class
    }
}

/// Per-label counts used to find the most variable labels
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSummary {
    /// The label
    pub label: String,
    /// Number of distinct sequences
    pub distinct_variants: usize,
    /// Number of observations, including repeats of the same sequence
    pub observations: usize
}

/// Read-only grouping of observations: label -> sequence -> source ids.
#[derive(Clone, Debug, Default)]
pub struct VariantIndex {
    /// Every observation, in the order it was added
    observations: Vec<Observation>,
    /// Variants for each exact label
    by_label: HashMap<String, Variants>,
    /// Labels in discovery order
    label_order: Vec<String>
}

impl VariantIndex {
    /// Builds an index over all provided observations
    pub fn new<I: IntoIterator<Item = Observation>>(observations: I) -> VariantIndex {
        let mut index = VariantIndex::default();
        for observation in observations {
            index.add_observation(observation);
        }
        debug!("Indexed {} observations across {} labels", index.len(), index.label_order.len());
        index
    }

    /// Builds an index, dropping observations that the filter rejects
    /// # Arguments
    /// * `observations` - the raw observations
    /// * `filter` - controls minimum sequence length and ignored labels
    pub fn with_filter<I: IntoIterator<Item = Observation>>(observations: I, filter: &IngestFilter) -> VariantIndex {
        let mut dropped: usize = 0;
        let kept = observations.into_iter()
            .filter(|o| {
                let accepted = filter.accepts(&o.label, &o.sequence);
                if !accepted {
                    trace!("Dropping {} from {} (length {})", o.label, o.source_id, o.sequence.len());
                    dropped += 1;
                }
                accepted
            })
            .collect::<Vec<Observation>>();
        debug!("Ingest filter dropped {dropped} observations");
        VariantIndex::new(kept)
    }

    /// Adds a single observation to the index
    pub fn add_observation(&mut self, observation: Observation) {
        if !self.by_label.contains_key(&observation.label) {
            self.label_order.push(observation.label.clone());
        }
        self.by_label.entry(observation.label.clone()).or_default()
            .insert(observation.sequence.clone(), observation.source_id.as_str());
        self.observations.push(observation);
    }

    /// Returns the variants for a label.
    /// # Arguments
    /// * `label` - the label to search for
    /// * `exact` - if false, every label containing `label` (case-sensitive) contributes to the result
    pub fn variants_for(&self, label: &str, exact: bool) -> Variants {
        if exact {
            self.by_label.get(label).cloned().unwrap_or_default()
        } else {
            self.observations.iter()
                .filter(|o| o.label.contains(label))
                .map(|o| (o.sequence.clone(), o.source_id.as_str()))
                .collect()
        }
    }

    /// Returns up to `depth` sequences for `label`, most frequently reported first.
    /// Ties keep the order the sequences were first observed in.
    pub fn most_common(&self, label: &str, depth: usize) -> Vec<&str> {
        self.most_common_with_counts(label, depth).into_iter()
            .map(|(sequence, _count)| sequence)
            .collect()
    }

    /// Same as `most_common()`, paired with the number of sources reporting each sequence
    pub fn most_common_with_counts(&self, label: &str, depth: usize) -> Vec<(&str, usize)> {
        match self.by_label.get(label) {
            Some(variants) => variants.ranked().into_iter()
                .take(depth)
                .map(|(sequence, sources)| (sequence.as_str(), sources.len()))
                .collect(),
            None => vec![]
        }
    }

    /// Groups the observations by source id; sources and their observations keep discovery order
    pub fn observations_by_source(&self) -> Vec<(&str, Vec<&Observation>)> {
        let mut lookup: HashMap<&str, usize> = Default::default();
        let mut grouped: Vec<(&str, Vec<&Observation>)> = vec![];
        for observation in self.observations.iter() {
            let index = *lookup.entry(observation.source_id.as_str()).or_insert_with(|| {
                grouped.push((observation.source_id.as_str(), vec![]));
                grouped.len() - 1
            });
            grouped[index].1.push(observation);
        }
        grouped
    }

    /// Number of distinct variants and observations per label, most variants first.
    /// Ties keep label discovery order.
    pub fn label_summaries(&self) -> Vec<LabelSummary> {
        self.summaries_by_discovery().into_iter()
            .sorted_by_key(|summary| std::cmp::Reverse(summary.distinct_variants))
            .collect()
    }

    fn summaries_by_discovery(&self) -> Vec<LabelSummary> {
        let observation_counts = self.observations.iter()
            .map(|o| o.label.as_str())
            .counts();

        self.label_order.iter()
            .map(|label| LabelSummary {
                label: label.clone(),
                distinct_variants: self.by_label.get(label).map(|v| v.len()).unwrap_or_default(),
                observations: observation_counts.get(label.as_str()).copied().unwrap_or_default()
            })
            .collect()
    }

    /// Labels ordered by the fraction of observations that are a distinct variant, ties in label discovery order.
    /// Only labels with more than one observation and more than one variant are reported.
    pub fn most_variable(&self) -> Vec<(String, f64)> {
        let mut ratios: Vec<(String, f64)> = self.summaries_by_discovery().into_iter()
            .filter(|s| s.observations > 1 && s.distinct_variants > 1)
            .map(|s| {
                let ratio = s.distinct_variants as f64 / s.observations as f64;
                (s.label, ratio)
            })
            .collect();
        ratios.sort_by(|a, b| b.1.total_cmp(&a.1));
        ratios
    }

    /// Returns the sorted, distinct source ids of every observation whose sequence contains `fragment`
    pub fn sources_containing(&self, fragment: &str) -> Vec<&str> {
        self.observations.iter()
            .filter(|o| o.sequence.contains(fragment))
            .map(|o| o.source_id.as_str())
            .sorted()
            .dedup()
            .collect()
    }

    /// Labels in the order they were first observed
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.label_order.iter().map(|l| l.as_str())
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Total number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl FromIterator<Observation> for VariantIndex {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        VariantIndex::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::analysis_config::IngestFilterBuilder;

    fn build_index() -> VariantIndex {
        [
            Observation::new("mEGFP", "AAAA", "1"),
            Observation::new("mEGFP", "AAAB", "2"),
            Observation::new("mEGFP", "AAAB", "3"),
            Observation::new("mEGFP", "AAAC", "4"),
            Observation::new("mEGFP", "AAAC", "5"),
            Observation::new("mEGFP", "AAAA", "1"), // repeat report from the same source
            Observation::new("EGFP", "BBBB", "6"),
            Observation::new("EGFP", "BBBB", "7"),
            Observation::new("mEGFP-N1", "AAAD", "8"),
            Observation::new("mCherry", "CCCC", "9"),
        ].into_iter().collect()
    }

    #[test]
    fn test_variants_partition() {
        let index = build_index();
        let variants = index.variants_for("mEGFP", true);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants.keys().cloned().collect::<Vec<String>>(), vec!["AAAA", "AAAB", "AAAC"]);
        assert_eq!(variants.get("AAAA").unwrap().len(), 1);
        assert_eq!(variants.get("AAAB").unwrap().len(), 2);

        // every source under the label shows up exactly once per sequence
        let total: usize = variants.iter().map(|(_s, ids)| ids.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_fuzzy_labels() {
        let index = build_index();
        let variants = index.variants_for("EGFP", false);
        // mEGFP, EGFP, and mEGFP-N1 all contain EGFP
        assert_eq!(variants.keys().cloned().collect::<Vec<String>>(), vec!["AAAA", "AAAB", "AAAC", "BBBB", "AAAD"]);

        // matching is case-sensitive
        assert!(index.variants_for("egfp", false).is_empty());
        assert!(index.variants_for("egfp", true).is_empty());
    }

    #[test]
    fn test_most_common_stable() {
        let index = build_index();
        // AAAB and AAAC are tied, AAAB was seen first
        assert_eq!(index.most_common("mEGFP", 1), vec!["AAAB"]);
        assert_eq!(index.most_common_with_counts("mEGFP", 5), vec![("AAAB", 2), ("AAAC", 2), ("AAAA", 1)]);
        assert!(index.most_common("mEGFP", 0).is_empty());
        assert!(index.most_common("mScarlet", 3).is_empty());
    }

    #[test]
    fn test_observations_by_source() {
        let index = build_index();
        let by_source = index.observations_by_source();
        assert_eq!(by_source.len(), 9);
        assert_eq!(by_source[0].0, "1");
        assert_eq!(by_source[0].1.len(), 2);
        assert_eq!(by_source[1].0, "2");
    }

    #[test]
    fn test_label_summaries() {
        let index = build_index();
        let summaries = index.label_summaries();
        assert_eq!(summaries[0], LabelSummary { label: "mEGFP".to_string(), distinct_variants: 3, observations: 6 });
        assert_eq!(summaries[1], LabelSummary { label: "EGFP".to_string(), distinct_variants: 1, observations: 2 });
        assert_eq!(summaries.len(), 4);

        let variable = index.most_variable();
        assert_eq!(variable, vec![("mEGFP".to_string(), 0.5)]);
    }

    #[test]
    fn test_most_variable_order() {
        let index: VariantIndex = [
            // 2 variants over 4 observations
            Observation::new("a", "AAAA", "1"),
            Observation::new("a", "AAAA", "2"),
            Observation::new("a", "AAAB", "3"),
            Observation::new("a", "AAAB", "4"),
            // every observation is distinct
            Observation::new("b", "BBBA", "5"),
            Observation::new("b", "BBBB", "6"),
            // one variant only, never reported
            Observation::new("c", "CCCC", "7"),
            Observation::new("c", "CCCC", "8"),
            // same ratio as "a" but more variants, found later
            Observation::new("e", "EEEA", "9"),
            Observation::new("e", "EEEA", "10"),
            Observation::new("e", "EEEB", "11"),
            Observation::new("e", "EEEB", "12"),
            Observation::new("e", "EEEC", "13"),
            Observation::new("e", "EEEC", "14"),
        ].into_iter().collect();

        assert_eq!(index.most_variable(), vec![
            ("b".to_string(), 1.0),
            ("a".to_string(), 0.5),
            ("e".to_string(), 0.5)
        ]);

        // summaries rank by variant count instead
        let order: Vec<String> = index.label_summaries().into_iter().map(|s| s.label).collect();
        assert_eq!(order, vec!["e", "a", "b", "c"]);
    }

    #[test]
    fn test_sources_containing() {
        let index = build_index();
        assert_eq!(index.sources_containing("AAA"), vec!["1", "2", "3", "4", "5", "8"]);
        assert_eq!(index.sources_containing("CC"), vec!["9"]);
        assert!(index.sources_containing("XYZ").is_empty());
    }

    #[test]
    fn test_filtered_index() {
        let filter = IngestFilterBuilder::default()
            .min_sequence_length(3)
            .build().unwrap();
        let index = VariantIndex::with_filter(vec![
            Observation::new("mEGFP", "AAAA", "1"),
            Observation::new("mEGFP", "AAA", "2"),
            Observation::new("KanR", "KKKK", "3"),
        ], &filter);
        assert_eq!(index.len(), 1);
        assert_eq!(index.labels().collect::<Vec<&str>>(), vec!["mEGFP"]);
    }

    #[test]
    fn test_observation_metadata() {
        let observation = Observation::new("mEGFP", "AAAA", "1")
            .with_contributor("depositor")
            .with_length_class("Full".parse().unwrap());
        assert_eq!(observation.contributor(), Some("depositor"));
        assert_eq!(observation.length_class(), Some(LengthClass::Full));
        assert_eq!(LengthClass::Partial.to_string(), "partial");
        assert!("half".parse::<LengthClass>().is_err());
    }
}
