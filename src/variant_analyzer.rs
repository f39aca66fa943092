/*!
This module provides access to the VariantAnalyzer, which compares every variant of a label against a reference
and reduces the variants to the distinct mutation sets they carry.
It also checks replicate sequences of a single source against each other to flag inconsistent annotations.

# Example usage
```rust
use plasvar::analysis_config::AnalysisConfigBuilder;
use plasvar::mutation::TrimWindow;
use plasvar::variant_analyzer::VariantAnalyzer;
use plasvar::variant_index::{Observation, VariantIndex};

let reference = "MSKGEELFTGVVPILVELDG";
let index: VariantIndex = [
    Observation::new("mGFP", "MSKGEELFTGVVPILVELDG", "1"), // matches the reference
    Observation::new("mGFP", "MSKGEELFTGVVPALVELDG", "2"), // I14A
    Observation::new("mGFP", "VSKGEELFTGVVPALVELDG", "3"), // I14A, plus an ignored change at the start
].into_iter().collect();

let config = AnalysisConfigBuilder::default()
    .trim_window(Some(TrimWindow::new(2, 17).unwrap()))
    .build()
    .unwrap();
let analyzer = VariantAnalyzer::with_config(&index, config);

let report = analyzer.variant_mutations("mGFP", reference);
assert!(report.is_complete());
let groups = report.results();
assert_eq!(groups.len(), 1);
assert_eq!(groups[0].mutations().to_string(), "I14A");
assert_eq!(groups[0].sources().len(), 2);
```
*/

use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;
use rustc_hash::FxHashMap as HashMap;
use std::cmp::Reverse;

use crate::analysis_config::AnalysisConfig;
use crate::error::VariantError;
use crate::grouping::{GroupedSources, SourceSet};
use crate::mutation::{Mutation, MutationSet, TrimWindow};
use crate::reference::{ReferenceCache, ReferenceInput, ReferenceResolver};
use crate::report::{record_failure, BatchFailure, BatchReport};
use crate::sequence_differ::SequenceDiffer;
use crate::variant_index::{Observation, VariantIndex};

/// All variants of a label that reduce to the same (trimmed) mutation set
#[derive(Clone, Debug, PartialEq)]
pub struct MutationGroup {
    /// The shared mutation set relative to the reference
    mutations: MutationSet,
    /// Every source reporting one of the merged variants
    sources: SourceSet,
    /// The distinct sequences that were merged, in discovery order
    sequences: Vec<String>
}

impl MutationGroup {
    // Getters
    pub fn mutations(&self) -> &MutationSet {
        &self.mutations
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }
}

/// Which observations a presence search looks at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelSelection {
    /// Every observation
    All,
    /// Only these exact labels
    Labels(Vec<String>),
    /// Every label starting with this prefix (case-sensitive)
    Prefix(String)
}

impl LabelSelection {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelSelection::All => true,
            LabelSelection::Labels(labels) => labels.iter().any(|l| l == label),
            LabelSelection::Prefix(prefix) => label.starts_with(prefix.as_str())
        }
    }
}

/// One source reported different sequences under the same label
#[derive(Clone, Debug, PartialEq)]
pub struct Inconsistency {
    /// The source with conflicting sequences
    source_id: String,
    /// The label with more than one sequence
    label: String,
    /// First observation of the conflicting pair
    first: Observation,
    /// Second observation of the conflicting pair
    second: Observation,
    /// Mutations from `first` to `second`, after trimming both ends
    mutations: MutationSet
}

impl Inconsistency {
    // Getters
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn first(&self) -> &Observation {
        &self.first
    }

    pub fn second(&self) -> &Observation {
        &self.second
    }

    pub fn mutations(&self) -> &MutationSet {
        &self.mutations
    }
}

/// Result of comparing known reference sequences against the most common variant of their label
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceCheck {
    /// Labels whose most common variant is the reference
    pub matching: Vec<String>,
    /// Labels without any observation
    pub missing: Vec<String>,
    /// Labels whose most common variant differs, with the mutations from the reference to that variant
    pub differing: Vec<(String, MutationSet)>
}

/// Answers mutation questions about the variants in a `VariantIndex`.
/// The analyzer never modifies the index, so one index can back any number of analyzers.
#[derive(Clone, Debug)]
pub struct VariantAnalyzer<'a> {
    /// The grouped observations
    index: &'a VariantIndex,
    /// The config for this analyzer
    config: AnalysisConfig,
    /// Trimming is controlled per call, so this differ has no default window
    differ: SequenceDiffer
}

impl<'a> VariantAnalyzer<'a> {
    /// Creates an analyzer with the default config
    pub fn new(index: &'a VariantIndex) -> VariantAnalyzer<'a> {
        VariantAnalyzer::with_config(index, Default::default())
    }

    /// Creates an analyzer with a custom config
    /// # Arguments
    /// * `index` - the observations to analyze
    /// * `config` - trimming, label matching, and reference name policy
    pub fn with_config(index: &'a VariantIndex, config: AnalysisConfig) -> VariantAnalyzer<'a> {
        VariantAnalyzer {
            index,
            config,
            differ: SequenceDiffer::new()
        }
    }

    /// Turns user input into a reference sequence; short inputs are resolved as names through `cache`.
    /// # Errors
    /// * `ReferenceResolution` if a name cannot be resolved
    pub fn reference_sequence<'s, R: ReferenceResolver>(&self, cache: &'s mut ReferenceCache<R>, input: &'s str) -> Result<&'s str, VariantError> {
        cache.sequence_for(ReferenceInput::infer(input, self.config.max_reference_name_len))
    }

    /// Groups the variants of `label` by their mutations relative to `reference`, using the configured trim window and label matching.
    /// See `variant_mutations_with()` for details.
    pub fn variant_mutations(&self, label: &str, reference: &str) -> BatchReport<Vec<MutationGroup>> {
        self.variant_mutations_with(label, reference, self.config.trim_window, self.config.exact_labels)
    }

    /// Groups the variants of `label` by their mutations relative to `reference`.
    /// Variants that trim down to the same mutation set are merged; variants without any remaining mutation are left out.
    /// Groups are ordered by number of sources, descending, with ties in discovery order.
    /// # Arguments
    /// * `label` - the label to analyze
    /// * `reference` - the reference sequence
    /// * `trim` - window of positions to keep, None keeps everything
    /// * `exact` - if false, every label containing `label` is included
    /// # Failures
    /// * each variant whose length differs from the reference is reported and skipped
    pub fn variant_mutations_with(&self, label: &str, reference: &str, trim: Option<TrimWindow>, exact: bool) -> BatchReport<Vec<MutationGroup>> {
        let variants = self.index.variants_for(label, exact);
        let mut groups: GroupedSources<MutationSet> = Default::default();
        let mut merged_sequences: HashMap<MutationSet, Vec<String>> = Default::default();
        let mut failures = vec![];

        for (sequence, sources) in variants.iter() {
            match self.differ.compute(reference, sequence, trim) {
                Ok(mutations) if mutations.is_empty() => {
                    trace!("{label}: variant from {} source(s) is indistinguishable from the reference", sources.len());
                },
                Ok(mutations) => {
                    trace!("{label}: {mutations} from {} source(s)", sources.len());
                    groups.extend(mutations.clone(), sources.iter().cloned());
                    merged_sequences.entry(mutations).or_default().push(sequence.clone());
                },
                Err(e) => record_failure(&mut failures, variant_item(label, sources), e)
            }
        }
        debug!("{label}: {} variants reduced to {} mutation sets", variants.len(), groups.len());

        let results = groups.into_ranked().into_iter()
            .map(|(mutations, sources)| {
                let sequences = merged_sequences.remove(&mutations).unwrap_or_default();
                MutationGroup {
                    mutations,
                    sources,
                    sequences
                }
            })
            .collect();
        BatchReport::new(results, failures)
    }

    /// Runs `variant_mutations()` for many labels in parallel.
    /// Results keep the order of `labels`; failures of all labels are concatenated.
    pub fn variant_mutations_for_labels(&self, labels: &[&str], reference: &str) -> BatchReport<Vec<(String, Vec<MutationGroup>)>> {
        let per_label: Vec<(String, BatchReport<Vec<MutationGroup>>)> = labels.par_iter()
            .map(|&label| (label.to_string(), self.variant_mutations(label, reference)))
            .collect();

        let mut results = Vec::with_capacity(per_label.len());
        let mut failures = vec![];
        for (label, report) in per_label {
            let (groups, label_failures) = report.into_parts();
            results.push((label, groups));
            failures.extend(label_failures);
        }
        BatchReport::new(results, failures)
    }

    /// Finds the sources carrying (or lacking) a mutation relative to `reference`, grouped by label.
    /// No trimming is applied.
    /// # Arguments
    /// * `mutation` - the substitution to look for
    /// * `reference` - the reference sequence the mutation is relative to
    /// * `selection` - which labels to search; None selects every label starting with the configured prefix
    /// * `without` - if true, report the sources that do *not* carry the mutation instead
    /// # Failures
    /// * each observation whose length differs from the reference is reported and skipped
    pub fn mutation_presence(&self, mutation: &Mutation, reference: &str, selection: Option<&LabelSelection>, without: bool) -> BatchReport<GroupedSources<String>> {
        let selection = selection.cloned()
            .unwrap_or_else(|| LabelSelection::Prefix(self.config.label_prefix.clone()));

        let mut hits: GroupedSources<String> = Default::default();
        let mut failures = vec![];
        // most observations share their sequence with others, so only diff each sequence once
        let mut carries: HashMap<&str, bool> = Default::default();

        for observation in self.index.observations().iter().filter(|o| selection.matches(o.label())) {
            let has_mutation = match carries.get(observation.sequence()) {
                Some(&carried) => carried,
                None => match self.differ.compute(reference, observation.sequence(), None) {
                    Ok(mutations) => {
                        let carried = mutations.contains(mutation);
                        carries.insert(observation.sequence(), carried);
                        carried
                    },
                    Err(e) => {
                        record_failure(&mut failures, format!("{} from {}", observation.label(), observation.source_id()), e);
                        continue;
                    }
                }
            };

            if has_mutation != without {
                hits.insert(observation.label().to_string(), observation.source_id());
            }
        }
        debug!("{} label(s) {} {}", hits.len(), if without { "lack" } else { "carry" }, mutation);
        BatchReport::new(hits, failures)
    }

    /// Checks every source of the index for replicate sequences that disagree; see `find_inconsistencies_in()`.
    pub fn find_inconsistencies(&self) -> BatchReport<Vec<Inconsistency>> {
        self.find_inconsistencies_in(self.index.observations_by_source())
    }

    /// For each source with more than one observation, finds the label with the most distinct sequences.
    /// If that label has more than one sequence, the pair of sequences with the largest trimmed difference is reported.
    /// Both ends are trimmed by the configured margin, relative to the length of the first sequence of the pair.
    /// # Arguments
    /// * `observations_by_source` - observations grouped by source id
    /// # Failures
    /// * each compared pair with mismatched lengths is reported
    pub fn find_inconsistencies_in<'o, I>(&self, observations_by_source: I) -> BatchReport<Vec<Inconsistency>>
    where
        I: IntoIterator<Item = (&'o str, Vec<&'o Observation>)>
    {
        let mut results = vec![];
        let mut failures = vec![];
        let mut sources_checked: usize = 0;
        for (source_id, observations) in observations_by_source {
            if observations.len() < 2 {
                continue;
            }
            sources_checked += 1;
            if let Some(inconsistency) = self.source_inconsistency(source_id, &observations, &mut failures) {
                results.push(inconsistency);
            }
        }
        debug!("Found {} inconsistencies in {} sources with replicate observations", results.len(), sources_checked);
        BatchReport::new(results, failures)
    }

    /// Core check for a single source
    fn source_inconsistency(&self, source_id: &str, observations: &[&Observation], failures: &mut Vec<BatchFailure>) -> Option<Inconsistency> {
        // distinct (label, sequence) pairs; first occurrence wins
        let uniques: Vec<&Observation> = observations.iter()
            .copied()
            .unique_by(|o| (o.label(), o.sequence()))
            .collect();

        // the number of distinct sequences for each label, in discovery order
        let mut label_counts: Vec<(&str, usize)> = vec![];
        for observation in uniques.iter() {
            match label_counts.iter_mut().find(|(label, _count)| *label == observation.label()) {
                Some((_label, count)) => *count += 1,
                None => label_counts.push((observation.label(), 1))
            }
        }

        // min_by_key keeps the first of equal elements, so ties go to the label seen first
        let (majority_label, count) = label_counts.into_iter().min_by_key(|&(_label, count)| Reverse(count))?;
        if count < 2 {
            return None;
        }

        let candidates: Vec<&Observation> = uniques.into_iter()
            .filter(|o| o.label() == majority_label)
            .collect();

        let mut best: Option<(usize, usize, MutationSet)> = None;
        for ((i, first), (j, second)) in candidates.iter().enumerate().tuple_combinations() {
            let window = TrimWindow::scaled(first.sequence().len(), self.config.inconsistency_margin);
            match self.differ.compute(first.sequence(), second.sequence(), Some(window)) {
                Ok(mutations) => {
                    let is_better = best.as_ref().map_or(true, |(_i, _j, b)| mutations.len() > b.len());
                    if !mutations.is_empty() && is_better {
                        best = Some((i, j, mutations));
                    }
                },
                Err(e) => record_failure(failures, format!("source {source_id}"), e)
            }
        }

        best.map(|(i, j, mutations)| {
            trace!("{majority_label} in source {source_id}: {mutations}");
            Inconsistency {
                source_id: source_id.to_string(),
                label: majority_label.to_string(),
                first: candidates[i].clone(),
                second: candidates[j].clone(),
                mutations
            }
        })
    }

    /// Compares known reference sequences to the most common variant observed for their label.
    /// # Arguments
    /// * `references` - pairs of (label, reference sequence)
    /// # Failures
    /// * each label whose most common variant has a different length than its reference
    pub fn reference_check(&self, references: &[(&str, &str)]) -> BatchReport<ReferenceCheck> {
        let mut check = ReferenceCheck::default();
        let mut failures = vec![];
        for &(label, reference) in references {
            let most_common = self.index.most_common(label, 1);
            let top = match most_common.first() {
                Some(&top) => top,
                None => {
                    check.missing.push(label.to_string());
                    continue;
                }
            };

            if top == reference {
                check.matching.push(label.to_string());
            } else {
                match self.differ.compute(reference, top, None) {
                    Ok(mutations) => check.differing.push((label.to_string(), mutations)),
                    Err(e) => record_failure(&mut failures, label, e)
                }
            }
        }
        BatchReport::new(check, failures)
    }

    /// Returns the sorted source ids whose sequences contain the query, resolving short queries as reference names.
    /// # Errors
    /// * `ReferenceResolution` if a name cannot be resolved
    pub fn sources_containing_reference<R: ReferenceResolver>(&self, cache: &mut ReferenceCache<R>, query: &str) -> Result<Vec<&'a str>, VariantError> {
        let fragment = self.reference_sequence(cache, query)?;
        Ok(self.index.sources_containing(fragment))
    }

    // Getters
    pub fn index(&self) -> &'a VariantIndex {
        self.index
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

/// Describes a variant in failure reports
fn variant_item(label: &str, sources: &SourceSet) -> String {
    format!("{label} variant from source(s) {}", sources.iter().sorted().join(","))
}
