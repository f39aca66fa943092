use thiserror::Error;

/// Errors raised while diffing sequences or resolving references.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    /// Positional diffing requires both sequences to have the same length.
    #[error("Sequence length mismatch: reference has {reference_len} residues, observed has {observed_len}")]
    LengthMismatch { reference_len: usize, observed_len: usize },

    /// The reference resolver could not provide a sequence for a name.
    #[error("Failed to resolve reference \"{name}\": {reason}")]
    ReferenceResolution { name: String, reason: String },

    /// A mutation could not be constructed or parsed.
    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),

    /// Two different substitutions would end up at the same position of one set.
    #[error("Conflicting substitutions at position {position}")]
    ConflictingPosition { position: usize },

    /// An observation field could not be interpreted.
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),

    /// The lower bound of a trim window is above its upper bound.
    #[error("Invalid trim window: low ({low}) is greater than high ({high})")]
    InvalidTrimWindow { low: usize, high: usize },
}
