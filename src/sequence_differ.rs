/*!
The SequenceDiffer wraps positional diffing with reference resolution and a trimming policy.

# Example usage
```rust
use plasvar::mutation::TrimWindow;
use plasvar::reference::{MapResolver, ReferenceCache, ReferenceInput};
use plasvar::sequence_differ::SequenceDiffer;

let differ = SequenceDiffer::new();
let mutations = differ.compute("MSKGEELFTG", "MTKGEELFAG", None).unwrap();
assert_eq!(mutations.to_string(), "S2T/T9A");

// an explicit window drops the N-terminal difference
let window = TrimWindow::new(4, 233).unwrap();
assert_eq!(differ.compute("MSKGEELFTG", "MTKGEELFAG", Some(window)).unwrap().to_string(), "T9A");

// references can also be looked up by name
let resolver: MapResolver = [("avGFP", "MSKGEELFTG")].into_iter().collect();
let mut cache = ReferenceCache::new(resolver);
let mutations = differ.compute_with(&mut cache, ReferenceInput::Name("avGFP"), "MSKGEELFAG", None).unwrap();
assert_eq!(mutations.to_string(), "T9A");
```
*/

use log::trace;

use crate::error::VariantError;
use crate::mutation::{diff, MutationSet, TrimWindow};
use crate::reference::{ReferenceCache, ReferenceInput, ReferenceResolver};

/// Computes mutation sets between a reference and observed sequences.
/// Holds no state other than an optional default trim window, so it can be shared freely.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SequenceDiffer {
    /// Applied when a call does not provide its own window
    default_trim: Option<TrimWindow>
}

impl SequenceDiffer {
    /// Creates a differ that does not trim unless asked to
    pub fn new() -> SequenceDiffer {
        Default::default()
    }

    /// Creates a differ that trims with `window` unless a call provides its own
    pub fn with_trim(window: TrimWindow) -> SequenceDiffer {
        SequenceDiffer {
            default_trim: Some(window)
        }
    }

    pub fn default_trim(&self) -> Option<TrimWindow> {
        self.default_trim
    }

    /// Diffs `observed` against `reference` and applies trimming.
    /// # Arguments
    /// * `reference` - the reference sequence
    /// * `observed` - the observed sequence, must be the same length as `reference`
    /// * `trim` - optional trim window; falls back to the default window, and returns the untrimmed set if neither is set.
    ///   A differ with a default window always trims, pass `TrimWindow::unbounded()` to keep every mutation.
    /// # Errors
    /// * `InvalidObservation` if either sequence contains non-ASCII characters
    /// * `LengthMismatch` if the sequences differ in length
    pub fn compute(&self, reference: &str, observed: &str, trim: Option<TrimWindow>) -> Result<MutationSet, VariantError> {
        let mutations = diff(residues(reference)?, residues(observed)?)?;
        match trim.or(self.default_trim) {
            Some(window) => {
                let trimmed = mutations.trim_ends(window);
                if trimmed.len() != mutations.len() {
                    trace!("Trimmed {} => {}", mutations, trimmed);
                }
                Ok(trimmed)
            },
            None => Ok(mutations)
        }
    }

    /// Same as `compute()`, but resolves a named reference through the caller's cache first.
    /// # Errors
    /// * `ReferenceResolution` if the name cannot be resolved
    /// * `InvalidObservation` if either sequence contains non-ASCII characters
    /// * `LengthMismatch` if the sequences differ in length
    pub fn compute_with<R: ReferenceResolver>(
        &self, cache: &mut ReferenceCache<R>, reference: ReferenceInput<'_>, observed: &str, trim: Option<TrimWindow>
    ) -> Result<MutationSet, VariantError> {
        let reference = cache.sequence_for(reference)?;
        self.compute(reference, observed, trim)
    }
}

/// Residues are single ASCII letters, so positions and lengths are byte offsets
fn residues(sequence: &str) -> Result<&[u8], VariantError> {
    if sequence.is_ascii() {
        Ok(sequence.as_bytes())
    } else {
        Err(VariantError::InvalidObservation(format!("sequence contains non-ASCII residues: {sequence:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::reference::MapResolver;

    #[test]
    fn test_untrimmed_by_default() {
        let differ = SequenceDiffer::new();
        let mutations = differ.compute("MSKGEELFTG", "VSKGEELFTA", None).unwrap();
        assert_eq!(mutations.to_string(), "M1V/G10A");
        assert_eq!(differ.default_trim(), None);
    }

    #[test]
    fn test_default_and_explicit_trim() {
        let differ = SequenceDiffer::with_trim(TrimWindow::new(1, 8).unwrap());
        assert_eq!(differ.compute("MSKGEELFTG", "VSKGEELFTA", None).unwrap(), MutationSet::new());

        // an explicit window wins over the default
        let wide = TrimWindow::new(0, 9).unwrap();
        assert_eq!(differ.compute("MSKGEELFTG", "VSKGEELFTA", Some(wide)).unwrap().len(), 2);
    }

    #[test]
    fn test_length_mismatch() {
        let differ = SequenceDiffer::new();
        assert_eq!(
            differ.compute("MSKGEELFTG", "MSKGEELFT", None).unwrap_err(),
            VariantError::LengthMismatch { reference_len: 10, observed_len: 9 }
        );
    }

    #[test]
    fn test_non_ascii_rejected() {
        let differ = SequenceDiffer::new();
        // same number of characters, different number of bytes
        assert!(matches!(differ.compute("MSK", "MSÄ", None), Err(VariantError::InvalidObservation(_))));
        assert!(matches!(differ.compute("MSÄ", "MSK", None), Err(VariantError::InvalidObservation(_))));
        // byte lengths would match here, so no bogus mutations may come back
        assert!(matches!(differ.compute("MSKG", "MSÄ", None), Err(VariantError::InvalidObservation(_))));
    }

    #[test]
    fn test_unbounded_override() {
        let differ = SequenceDiffer::with_trim(TrimWindow::new(1, 8).unwrap());
        let everything = differ.compute("MSKGEELFTG", "VSKGEELFTA", Some(TrimWindow::unbounded())).unwrap();
        assert_eq!(everything.to_string(), "M1V/G10A");
    }

    #[test]
    fn test_compute_with_cache() {
        let resolver: MapResolver = [("avGFP", "MSKGEELFTG")].into_iter().collect();
        let mut cache = ReferenceCache::new(resolver);
        let differ = SequenceDiffer::new();

        let by_name = differ.compute_with(&mut cache, ReferenceInput::Name("AVGFP"), "MSKGEELFAG", None).unwrap();
        let by_sequence = differ.compute_with(&mut cache, ReferenceInput::Sequence("MSKGEELFTG"), "MSKGEELFAG", None).unwrap();
        assert_eq!(by_name, by_sequence);
        assert_eq!(cache.len(), 1);

        let err = differ.compute_with(&mut cache, ReferenceInput::Name("EGFP"), "MSKGEELFAG", None).unwrap_err();
        assert!(matches!(err, VariantError::ReferenceResolution { .. }));
    }
}
