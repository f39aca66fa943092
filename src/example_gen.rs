use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::variant_index::Observation;

/// The 20 standard amino acids
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Creates a test set we can verify is working.
/// Returns the reference and one observation per source, each reporting either the reference or one of the variants.
/// # Arguments
/// * `label` - the label shared by every observation
/// * `seq_len` - the length of the reference, starting with `M`
/// * `num_variants` - the number of mutated variants derived from the reference
/// * `num_sources` - the number of sources, i.e. observations, to generate
/// * `max_substitutions` - each variant carries between 1 and this many substitutions
pub fn generate_observations(label: &str, seq_len: usize, num_variants: usize, num_sources: usize, max_substitutions: usize) -> (String, Vec<Observation>) {
    assert!(seq_len > 1);
    assert!(max_substitutions > 0);

    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let residue_distribution = Uniform::new(0, AMINO_ACIDS.len());
    let offset_distribution = Uniform::new(1, AMINO_ACIDS.len());
    // the leading M is never substituted
    let position_distribution = Uniform::new(1, seq_len);
    let count_distribution = Uniform::new_inclusive(1, max_substitutions);
    let choice_distribution = Uniform::new_inclusive(0, num_variants);

    let reference: Vec<u8> = std::iter::once(b'M')
        .chain((1..seq_len).map(|_i| AMINO_ACIDS[rng.sample(residue_distribution)]))
        .collect();

    let variants: Vec<Vec<u8>> = (0..num_variants)
        .map(|_i| {
            let mut variant = reference.clone();
            for _s in 0..rng.sample(count_distribution) {
                let position = rng.sample(position_distribution);
                let current = AMINO_ACIDS.iter().position(|&r| r == variant[position]).unwrap_or_default();
                // an offset in [1, 20) always picks a different residue
                let alt = (current + rng.sample(offset_distribution)) % AMINO_ACIDS.len();
                variant[position] = AMINO_ACIDS[alt];
            }
            variant
        })
        .collect();

    let observations: Vec<Observation> = (0..num_sources)
        .map(|source| {
            // 0 picks the reference
            let choice = rng.sample(choice_distribution);
            let sequence = if choice == 0 { &reference } else { &variants[choice - 1] };
            Observation::new(label, String::from_utf8_lossy(sequence).into_owned(), format!("src{source}"))
        })
        .collect();

    (String::from_utf8_lossy(&reference).into_owned(), observations)
}
