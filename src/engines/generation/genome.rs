/// Germinal vector: the raw genetic material of a specimen.
///
/// A flat sequence of independent uniform reals in [0, 1). It carries no
/// structure of its own; `Retrotranscriptor::normalize_vector` reads it as a
/// circular tape and derives a well-typed genotype from it.
///
/// # Why a flat vector?
///
/// - **No invalid states**: any germinal vector maps to a valid genotype
/// - **Canonical form**: the normalized vector derived from it is itself a
///   germinal vector that derives to exactly the same genotype
///
/// # Example
///
/// ```
/// use genomus::engines::generation::{new_germinal_vector, Retrotranscriptor};
/// use genomus::functions::FunctionRegistry;
/// use genomus::config::GenotypeConfig;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let germinal = new_germinal_vector(&mut rng, 20);
/// let registry = FunctionRegistry::global().unwrap();
/// let normalized = Retrotranscriptor::new(registry, GenotypeConfig::default())
///     .normalize_vector(&germinal)
///     .unwrap();
/// assert_eq!(normalized[0], 1.0);
/// ```
pub type GerminalVector = Vec<f64>;

use rand::Rng;

/// Random germinal vector with a length drawn uniformly from `[1, max_length]`.
pub fn new_germinal_vector<R: Rng>(rng: &mut R, max_length: usize) -> GerminalVector {
    let length = rng.gen_range(1..=max_length.max(1));
    (0..length).map(|_| rng.gen::<f64>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_germinal_vector_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = new_germinal_vector(&mut rng, 15);
            assert!(!v.is_empty() && v.len() <= 15);
            assert!(v.iter().all(|&x| (0.0..1.0).contains(&x)));
        }
    }
}
