/// Golden ratio.
pub const PHI: f64 = 1.618_033_988_749_895;

pub fn round_to_6_decimals(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

/// Fractional part of `index * PHI`, rounded to 6 decimals.
///
/// Consecutive integers land far apart on [0, 1), which is what makes this
/// usable both as a symbol key and as the golden integer encoding.
pub fn encode_index(index: u32) -> f64 {
    let scaled = index as f64 * PHI;
    round_to_6_decimals(scaled - scaled.floor())
}

/// Value of `candidates` numerically closest to `target`. Ties go to the
/// lower candidate.
pub fn closest_value(candidates: &[f64], target: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &candidate in candidates {
        let distance = (candidate - target).abs();
        best = match best {
            Some((best_value, best_distance))
                if best_distance < distance
                    || (best_distance == distance && best_value <= candidate) =>
            {
                Some((best_value, best_distance))
            }
            _ => Some((candidate, distance)),
        };
    }
    best.map(|(value, _)| value)
}

/// Integer key of a 6-decimal value, usable in ordered maps.
pub fn micro_key(x: f64) -> i64 {
    (x * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_index() {
        assert_eq!(encode_index(2), 0.236068);
        assert_eq!(encode_index(5), 0.09017);
        assert_eq!(encode_index(89), 0.005025);
        assert_eq!(encode_index(0), 0.0);
    }

    #[test]
    fn test_closest_value_ties_go_low() {
        let candidates = [0.2, 0.4, 0.8];
        assert_eq!(closest_value(&candidates, 0.3), Some(0.2));
        assert_eq!(closest_value(&candidates, 0.31), Some(0.4));
        assert_eq!(closest_value(&candidates, 0.99), Some(0.8));
        assert_eq!(closest_value(&[0.8, 0.4, 0.2], 0.3), Some(0.2));
        assert_eq!(closest_value(&[], 0.3), None);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to_6_decimals(0.3891951909), 0.389195);
        assert_eq!(micro_key(0.236068), 236_068);
    }
}
