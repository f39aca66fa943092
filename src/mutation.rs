/*!
Point substitutions and the ordered sets of them that separate an observed protein from a reference.

# Example usage
```rust
use plasvar::mutation::{diff, TrimWindow};

let reference = b"MSKGEELFTG";
let observed = b"MTKGEELFAG";
let mutations = diff(reference, observed).unwrap();
assert_eq!(mutations.to_string(), "S2T/T9A");

// the N-terminal difference falls outside of the window and is dropped
let trimmed = mutations.trim_ends(TrimWindow::new(4, 233).unwrap());
assert_eq!(trimmed.to_string(), "T9A");
```
*/

use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

use crate::error::VariantError;

/// A single amino-acid substitution at a fixed, 0-based position of the reference.
/// Ordering is by position first, which is what keeps a `MutationSet` sorted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mutation {
    /// 0-based offset into the reference sequence
    position: usize,
    /// The residue in the reference
    from_residue: u8,
    /// The residue in the observed sequence
    to_residue: u8
}

impl Mutation {
    /// Constructor
    /// # Arguments
    /// * `position` - 0-based offset into the reference sequence
    /// * `from_residue` - the reference residue
    /// * `to_residue` - the observed residue
    /// # Errors
    /// * if `from_residue` and `to_residue` are the same, since that is not a substitution
    pub fn new(position: usize, from_residue: u8, to_residue: u8) -> Result<Mutation, VariantError> {
        if from_residue == to_residue {
            return Err(VariantError::InvalidMutation(format!(
                "{}{}{} does not change the residue",
                from_residue as char, position + 1, to_residue as char
            )));
        }
        Ok(Mutation {
            position,
            from_residue,
            to_residue
        })
    }

    // Getters
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn from_residue(&self) -> u8 {
        self.from_residue
    }

    pub fn to_residue(&self) -> u8 {
        self.to_residue
    }
}

impl fmt::Display for Mutation {
    /// Conventional protein notation with a 1-based position, e.g. `A206K`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from_residue as char, self.position + 1, self.to_residue as char)
    }
}

impl FromStr for Mutation {
    type Err = VariantError;

    /// Parses notation such as `A206K` (1-based position) into a Mutation at position 205.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || VariantError::InvalidMutation(format!("cannot parse \"{s}\""));
        if !s.is_ascii() || s.len() < 3 {
            return Err(invalid());
        }

        let bytes = s.as_bytes();
        let from_residue = bytes[0];
        let to_residue = bytes[bytes.len() - 1];
        if !is_residue(from_residue) || !is_residue(to_residue) {
            return Err(invalid());
        }

        let digits = &s[1..s.len() - 1];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let one_based: usize = digits.parse().map_err(|_| invalid())?;
        if one_based == 0 {
            return Err(invalid());
        }
        Mutation::new(one_based - 1, from_residue, to_residue)
    }
}

/// Residue letters plus the `*` stop symbol
fn is_residue(symbol: u8) -> bool {
    symbol.is_ascii_alphabetic() || symbol == b'*'
}

/// Inclusive window of positions that are kept when trimming a `MutationSet`.
/// Anything with `position < low` or `position > high` is discarded.
/// `new()` only accepts `low <= high`; `scaled()` may produce `low > high` for very short sequences,
/// which is an empty window that discards every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrimWindow {
    low: usize,
    high: usize
}

impl Default for TrimWindow {
    fn default() -> Self {
        // the window used when comparing full-length fluorescent proteins against avGFP-like references
        TrimWindow { low: 4, high: 233 }
    }
}

impl TrimWindow {
    /// Creates a new window of kept positions.
    /// # Arguments
    /// * `low` - the smallest position that is kept
    /// * `high` - the largest position that is kept
    /// # Errors
    /// * if `low > high`
    pub fn new(low: usize, high: usize) -> Result<TrimWindow, VariantError> {
        if low > high {
            return Err(VariantError::InvalidTrimWindow { low, high });
        }
        Ok(TrimWindow { low, high })
    }

    /// Creates a window that ignores `margin` residues at both ends of a sequence of `sequence_len` residues.
    /// For sequences shorter than twice the margin this window keeps nothing.
    pub fn scaled(sequence_len: usize, margin: usize) -> TrimWindow {
        TrimWindow {
            low: margin,
            high: sequence_len.saturating_sub(margin)
        }
    }

    /// Creates a window that keeps every position
    pub fn unbounded() -> TrimWindow {
        TrimWindow {
            low: 0,
            high: usize::MAX
        }
    }

    /// Returns true if the window discards every position
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// Returns true if a mutation at `position` survives trimming
    pub fn contains(&self, position: usize) -> bool {
        self.low <= position && position <= self.high
    }

    // Getters
    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }
}

/// An ordered set of mutations relative to one reference; no two entries share a position.
/// Equality and hashing are structural, so two sets that trim down to the same substitutions
/// collapse into one key when used in a map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationSet {
    /// Sorted by position, positions are unique
    mutations: Vec<Mutation>
}

impl MutationSet {
    /// Creates an empty set
    pub fn new() -> MutationSet {
        Default::default()
    }

    /// Builds a set from arbitrary mutations, sorting them and removing exact duplicates.
    /// # Errors
    /// * if two different substitutions share a position
    pub fn from_mutations<I: IntoIterator<Item = Mutation>>(mutations: I) -> Result<MutationSet, VariantError> {
        let mut mutations: Vec<Mutation> = mutations.into_iter().collect();
        mutations.sort();
        mutations.dedup();

        if let Some((m, _)) = mutations.iter().tuple_windows().find(|(m1, m2)| m1.position == m2.position) {
            return Err(VariantError::ConflictingPosition { position: m.position });
        }
        Ok(MutationSet { mutations })
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// An empty set means there is no meaningful difference to the reference
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.mutations.iter()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.mutations.iter().map(|m| m.position)
    }

    /// Returns true if this exact substitution is in the set
    pub fn contains(&self, mutation: &Mutation) -> bool {
        self.mutations.binary_search(mutation).is_ok()
    }

    /// Returns true if any mutation in the set changes a residue *to* `residue`, e.g. "anything to K"
    pub fn contains_residue(&self, residue: u8) -> bool {
        self.mutations.iter().any(|m| m.to_residue == residue)
    }

    /// Returns the mutation at a given position, if any
    pub fn get(&self, position: usize) -> Option<&Mutation> {
        self.mutations.binary_search_by_key(&position, |m| m.position)
            .ok()
            .map(|i| &self.mutations[i])
    }

    /// Removes a single mutation, returning true if it was present
    pub fn remove(&mut self, mutation: &Mutation) -> bool {
        match self.mutations.binary_search(mutation) {
            Ok(index) => {
                self.mutations.remove(index);
                true
            },
            Err(_) => false
        }
    }

    /// Returns a copy of this set without any mutation outside of `window`.
    /// Trimming is idempotent for a fixed window.
    pub fn trim_ends(&self, window: TrimWindow) -> MutationSet {
        MutationSet {
            mutations: self.mutations.iter()
                .filter(|m| window.contains(m.position))
                .copied()
                .collect()
        }
    }

    /// Combines two sets relative to the same reference.
    /// # Errors
    /// * if the sets carry different substitutions at the same position
    pub fn union(&self, other: &MutationSet) -> Result<MutationSet, VariantError> {
        MutationSet::from_mutations(self.mutations.iter().chain(other.mutations.iter()).copied())
    }

    /// Mutations present in both sets
    pub fn intersection(&self, other: &MutationSet) -> MutationSet {
        MutationSet {
            mutations: self.mutations.iter()
                .filter(|m| other.contains(m))
                .copied()
                .collect()
        }
    }

    /// Mutations in this set that are not in `other`
    pub fn difference(&self, other: &MutationSet) -> MutationSet {
        MutationSet {
            mutations: self.mutations.iter()
                .filter(|m| !other.contains(m))
                .copied()
                .collect()
        }
    }
}

impl<'a> IntoIterator for &'a MutationSet {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

impl fmt::Display for MutationSet {
    /// Mutations joined by `/`, e.g. `S2T/A206K`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mutations.iter().join("/"))
    }
}

impl FromStr for MutationSet {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(MutationSet::new());
        }
        let mutations: Vec<Mutation> = s.split('/')
            .map(|m| m.parse())
            .collect::<Result<_, _>>()?;
        MutationSet::from_mutations(mutations)
    }
}

/// Positional comparison of two equal-length sequences.
/// Every index where the residues differ becomes one `Mutation`, ordered by position.
/// No alignment is attempted.
/// # Arguments
/// * `reference` - the baseline sequence
/// * `observed` - the sequence being compared to the baseline
/// # Errors
/// * `LengthMismatch` if the two sequences differ in length
pub fn diff(reference: &[u8], observed: &[u8]) -> Result<MutationSet, VariantError> {
    if reference.len() != observed.len() {
        return Err(VariantError::LengthMismatch {
            reference_len: reference.len(),
            observed_len: observed.len()
        });
    }

    // zip + enumerate gives us ascending, unique positions for free
    let mutations = reference.iter().zip(observed.iter())
        .enumerate()
        .filter(|(_i, (r, o))| r != o)
        .map(|(position, (&from_residue, &to_residue))| Mutation {
            position,
            from_residue,
            to_residue
        })
        .collect();
    Ok(MutationSet { mutations })
}
