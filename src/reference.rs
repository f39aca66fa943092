/*!
Reference sequences can be supplied directly or by a short name (e.g. `avGFP`).
Names are resolved by an external `ReferenceResolver`; the `ReferenceCache` memoizes those lookups
for as long as the caller keeps it around.

# Example usage
```rust
use plasvar::reference::{MapResolver, ReferenceCache, ReferenceInput};

let mut resolver = MapResolver::new();
resolver.insert("mEGFP", "MVSKGEELFTGVVPILVELDGDVNGHKF");

let mut cache = ReferenceCache::new(resolver);
assert_eq!(cache.resolve("megfp").unwrap(), "MVSKGEELFTGVVPILVELDGDVNGHKF");

// long inputs are already sequences and bypass the resolver
let input = ReferenceInput::infer("MVSKGEELFTGVVPILVELDG", 9);
assert_eq!(cache.sequence_for(input).unwrap(), "MVSKGEELFTGVVPILVELDG");
assert_eq!(cache.len(), 1);
```
*/

use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use simple_error::bail;
use std::collections::hash_map::Entry;

use crate::error::VariantError;

/// Error type returned by resolvers; anything convertible into a boxed error works
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Looks up the sequence of a named reference, e.g. from a protein database.
pub trait ReferenceResolver {
    /// Returns the sequence for `name`; `name` has already been passed through `slugify`
    fn resolve(&self, name: &str) -> Result<String, ResolveError>;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&str) -> Result<String, ResolveError>
{
    fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        self(name)
    }
}

/// Normalizes a reference name for lookups: drops punctuation, lowercases, and joins words with `-`.
/// # Examples
/// ```rust
/// use plasvar::reference::slugify;
/// assert_eq!(slugify(" mEGFP (A206K) "), "megfp-a206k");
/// assert_eq!(slugify("super--folder GFP"), "super-folder-gfp");
/// ```
pub fn slugify(value: &str) -> String {
    let kept: String = value.chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace())
        .collect();
    let lowered = kept.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
        } else {
            slug.push(c);
            in_separator = false;
        }
    }
    slug
}

/// Simple in-memory resolver keyed by slug
#[derive(Clone, Debug, Default)]
pub struct MapResolver {
    sequences: HashMap<String, String>
}

impl MapResolver {
    pub fn new() -> MapResolver {
        Default::default()
    }

    /// Adds or replaces a named sequence
    pub fn insert<S: Into<String>>(&mut self, name: &str, sequence: S) {
        self.sequences.insert(slugify(name), sequence.into());
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for MapResolver {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut resolver = MapResolver::new();
        for (name, sequence) in iter {
            resolver.insert(name, sequence);
        }
        resolver
    }
}

impl ReferenceResolver for MapResolver {
    fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        match self.sequences.get(&slugify(name)) {
            Some(sequence) => Ok(sequence.clone()),
            None => bail!("No reference sequence named \"{}\"", name)
        }
    }
}

/// A reference supplied by the caller, either as the raw sequence or as a name to resolve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceInput<'a> {
    Sequence(&'a str),
    Name(&'a str)
}

impl<'a> ReferenceInput<'a> {
    /// Guesses the input type from its length: anything with at most `max_name_len` characters is a name.
    /// # Arguments
    /// * `value` - the raw user input
    /// * `max_name_len` - the longest input that is still considered a name
    pub fn infer(value: &'a str, max_name_len: usize) -> ReferenceInput<'a> {
        if value.chars().count() <= max_name_len {
            ReferenceInput::Name(value)
        } else {
            ReferenceInput::Sequence(value)
        }
    }
}

/// Session-owned memo of resolved reference names.
/// Nothing is ever evicted implicitly; use `evict()` or `clear()` when the underlying catalog changes.
#[derive(Debug)]
pub struct ReferenceCache<R> {
    /// The external lookup
    resolver: R,
    /// Slug to sequence
    resolved: HashMap<String, String>
}

impl<R: ReferenceResolver> ReferenceCache<R> {
    /// Creates an empty cache in front of `resolver`
    pub fn new(resolver: R) -> ReferenceCache<R> {
        ReferenceCache {
            resolver,
            resolved: Default::default()
        }
    }

    /// Returns the sequence for a reference name, asking the resolver only on the first request.
    /// # Errors
    /// * `ReferenceResolution` if the resolver fails; failures are not cached
    pub fn resolve(&mut self, name: &str) -> Result<&str, VariantError> {
        match self.resolved.entry(slugify(name)) {
            Entry::Occupied(entry) => {
                trace!("Reference cache hit for {:?}", entry.key());
                Ok(entry.into_mut().as_str())
            },
            Entry::Vacant(entry) => {
                debug!("Resolving reference {:?}", entry.key());
                let sequence = self.resolver.resolve(entry.key())
                    .map_err(|e| VariantError::ReferenceResolution {
                        name: name.to_string(),
                        reason: e.to_string()
                    })?;
                Ok(entry.insert(sequence).as_str())
            }
        }
    }

    /// Returns the sequence for either kind of input; raw sequences pass through unchanged
    pub fn sequence_for<'s>(&'s mut self, input: ReferenceInput<'s>) -> Result<&'s str, VariantError> {
        match input {
            ReferenceInput::Sequence(sequence) => Ok(sequence),
            ReferenceInput::Name(name) => self.resolve(name)
        }
    }

    /// Forgets a resolved name, returning the sequence that was cached
    pub fn evict(&mut self, name: &str) -> Option<String> {
        self.resolved.remove(&slugify(name))
    }

    pub fn clear(&mut self) {
        self.resolved.clear();
    }

    /// Number of cached names
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("avGFP"), "avgfp");
        assert_eq!(slugify("mNeonGreen"), "mneongreen");
        assert_eq!(slugify("  EGFP  "), "egfp");
        assert_eq!(slugify("mTurquoise 2"), "mturquoise-2");
        assert_eq!(slugify("Dronpa-2 / M159T"), "dronpa-2-m159t");
        // already slugged values do not change
        assert_eq!(slugify("dronpa-2-m159t"), "dronpa-2-m159t");
    }

    #[test]
    fn test_infer() {
        assert_eq!(ReferenceInput::infer("avGFP", 9), ReferenceInput::Name("avGFP"));
        assert_eq!(ReferenceInput::infer("MSKGEELFTG", 9), ReferenceInput::Sequence("MSKGEELFTG"));
        assert_eq!(ReferenceInput::infer("MSKGEELFT", 9), ReferenceInput::Name("MSKGEELFT"));
    }

    #[test]
    fn test_cache_memoizes() {
        let calls = Cell::new(0);
        let resolver = |name: &str| -> Result<String, ResolveError> {
            calls.set(calls.get() + 1);
            Ok(format!("SEQ-{name}"))
        };

        let mut cache = ReferenceCache::new(resolver);
        assert_eq!(cache.resolve("avGFP").unwrap(), "SEQ-avgfp");
        assert_eq!(cache.resolve("AVGFP ").unwrap(), "SEQ-avgfp");
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);

        // evicting forces a new lookup
        assert_eq!(cache.evict("avgfp"), Some("SEQ-avgfp".to_string()));
        assert!(cache.is_empty());
        cache.resolve("avGFP").unwrap();
        assert_eq!(calls.get(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolution_failure() {
        let resolver: MapResolver = [("EGFP", "MVSKGEELFTGVVPILVELDGDVNGHKF")].into_iter().collect();
        let mut cache = ReferenceCache::new(resolver);

        let err = cache.resolve("mScarlet").unwrap_err();
        match err {
            VariantError::ReferenceResolution { name, reason } => {
                assert_eq!(name, "mScarlet");
                assert_eq!(reason, "No reference sequence named \"mscarlet\"");
            },
            other => panic!("unexpected error: {other:?}")
        }

        // failures are not cached
        assert!(cache.is_empty());
        assert!(cache.resolve("egfp").is_ok());
        assert_eq!(cache.resolver().len(), 1);
    }

    #[test]
    fn test_sequence_passthrough() {
        let mut cache = ReferenceCache::new(MapResolver::new());
        let input = ReferenceInput::Sequence("MVSKGEELFTGVV");
        assert_eq!(cache.sequence_for(input).unwrap(), "MVSKGEELFTGVV");
        assert!(cache.sequence_for(ReferenceInput::Name("EGFP")).is_err());
    }
}
