/*!
# plasvar
This library consolidates protein sequence variants that many independent sources report under the same label.
Variants are reduced to the point substitutions they carry relative to a reference, so that sequences differing only
in their poorly-determined ends collapse into the same biologically meaningful variant.

Key benefits:
* Groups observations by label and exact sequence, and ranks variants by the number of sources reporting them
* Collapses variants into trimmed mutation sets, with partial results whenever individual variants cannot be compared
* Finds sources carrying (or lacking) a specific substitution, and sources whose replicate sequences disagree
* Reference sequences can be given directly or by name through a pluggable, memoized resolver

Limitations:
* Only equal-length sequences are compared; there is no alignment, so insertions and deletions are reported as failures

# Example usage
```rust
use plasvar::variant_analyzer::VariantAnalyzer;
use plasvar::variant_index::{Observation, VariantIndex};

// a 238 residue reference
let reference: String = std::iter::once('M').chain("SKGEELFTGV".chars().cycle().take(237)).collect();
let mut variant = reference.clone().into_bytes();
variant[100] = b'W';
let variant = String::from_utf8(variant).unwrap();

// three sources report the reference, two report a variant
let index: VariantIndex = [
    Observation::new("mGFP", reference.clone(), "1"),
    Observation::new("mGFP", reference.clone(), "2"),
    Observation::new("mGFP", reference.clone(), "3"),
    Observation::new("mGFP", variant.clone(), "4"),
    Observation::new("mGFP", variant.clone(), "5"),
].into_iter().collect();

// the reference itself is not a variant, leaving one mutation set
let analyzer = VariantAnalyzer::new(&index);
let report = analyzer.variant_mutations("mGFP", &reference);
assert!(report.is_complete());
assert_eq!(report.results().len(), 1);
assert_eq!(report.results()[0].mutations().to_string(), "V101W");
assert_eq!(report.results()[0].sources().len(), 2);
```
*/

/// Configuration for variant analysis and observation ingest
pub mod analysis_config;
/// Error type shared by all components
pub mod error;
/// Utility for generating examples
pub mod example_gen;
/// Insertion-ordered grouping of source ids
pub mod grouping;
/// Point substitutions, mutation sets, and positional diffing
pub mod mutation;
/// Reference name resolution and caching
pub mod reference;
/// Partial results for batch operations
pub mod report;
/// Diffing with trimming and reference lookups
pub mod sequence_differ;
/// Main functionality for the mutation analysis component
pub mod variant_analyzer;
/// Grouping of observations by label and sequence
pub mod variant_index;
