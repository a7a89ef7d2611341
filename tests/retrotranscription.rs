use genomus::config::GenotypeConfig;
use genomus::engines::generation::{new_germinal_vector, Retrotranscriptor};
use genomus::functions::FunctionRegistry;
use genomus::GenomusError;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn germinal_vectors(seed: u64, count: usize, max_length: usize) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| new_germinal_vector(&mut rng, max_length))
        .collect()
}

fn retrotranscriptor(config: GenotypeConfig) -> Retrotranscriptor<'static> {
    Retrotranscriptor::new(FunctionRegistry::global().unwrap(), config)
}

fn paren_depth(expression: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for c in expression.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    deepest
}

#[test]
fn test_normalization_is_idempotent() {
    let rt = retrotranscriptor(GenotypeConfig::default());
    for germinal in germinal_vectors(42, 300, 100) {
        let once = rt.normalize_vector(&germinal).unwrap();
        let twice = rt.normalize_vector(&once).unwrap();
        assert_eq!(once, twice, "germinal vector {:?}", germinal);
    }
}

#[test]
fn test_idempotent_under_tight_limits() {
    let rt = retrotranscriptor(GenotypeConfig {
        max_genotype_depth: 2,
        max_genotype_vector_size: 40,
        max_list_size: 3,
        ..GenotypeConfig::default()
    });
    for germinal in germinal_vectors(7, 200, 30) {
        let once = rt.normalize_vector(&germinal).unwrap();
        assert_eq!(rt.normalize_vector(&once).unwrap(), once);
    }
}

#[test]
fn test_derivation_terminates_within_bounds() {
    for config in [
        GenotypeConfig::default(),
        GenotypeConfig {
            max_genotype_depth: 1,
            max_genotype_vector_size: 10,
            ..GenotypeConfig::default()
        },
    ] {
        let rt = retrotranscriptor(config);
        // Past the limits every open slot closes through a bounded default chain.
        let length_bound = config.max_genotype_vector_size + 4000;
        let depth_bound = config.max_genotype_depth + 5;

        for germinal in germinal_vectors(1234, 200, 100) {
            let normalized = rt.normalize_vector(&germinal).unwrap();
            assert!(normalized.len() <= length_bound, "{} values", normalized.len());

            let expression = rt.to_expression(&normalized).unwrap();
            assert!(
                paren_depth(&expression) <= depth_bound,
                "{} is too deep",
                expression
            );
        }
    }
}

#[test]
fn test_single_value_germinal_vectors() {
    let rt = retrotranscriptor(GenotypeConfig::default());
    for value in [0.0, 0.25, 0.5, 0.75, 0.999] {
        let normalized = rt.normalize_vector(&[value]).unwrap();
        assert_eq!(normalized[0], 1.0);
        assert_eq!(normalized[normalized.len() - 1], 0.0);
        assert!(rt.to_expression(&normalized).unwrap().starts_with('s'));
    }
}

#[test]
fn test_empty_germinal_vector() {
    let rt = retrotranscriptor(GenotypeConfig::default());
    assert_eq!(rt.normalize_vector(&[]), Err(GenomusError::EmptyVector));
}

#[test]
fn test_batch_matches_sequential() {
    let rt = retrotranscriptor(GenotypeConfig::default());
    let mut inputs = germinal_vectors(99, 64, 100);
    inputs.push(Vec::new());

    let batch = rt.normalize_batch(&inputs);
    assert_eq!(batch.len(), inputs.len());
    for (input, result) in inputs.iter().zip(batch) {
        assert_eq!(result, rt.normalize_vector(input));
    }
}

#[test]
fn test_lists_respect_max_size() {
    let config = GenotypeConfig {
        max_list_size: 2,
        ..GenotypeConfig::default()
    };
    let rt = retrotranscriptor(config);
    for germinal in germinal_vectors(5, 100, 100) {
        let normalized = rt.normalize_vector(&germinal).unwrap();
        let expression = rt.to_expression(&normalized).unwrap();
        for list in ["ln(", "lm(", "la(", "li("] {
            for (start, _) in expression.match_indices(list) {
                let arguments = &expression[start + list.len()..];
                let end = arguments.find(')').unwrap();
                assert!(arguments[..end].split(',').count() <= 2, "{}", expression);
            }
        }
    }
}

#[test]
fn test_trailing_values_are_format_errors() {
    let rt = retrotranscriptor(GenotypeConfig::default());
    let mut normalized = rt.normalize_vector(&[0.3, 0.6, 0.9]).unwrap();
    let length = normalized.len();
    normalized.push(0.5);
    assert!(matches!(
        rt.to_expression(&normalized),
        Err(GenomusError::Format { position, .. }) if position == length
    ));
}
