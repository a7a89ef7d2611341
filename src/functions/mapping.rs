//! Parameter mappers: nonlinear maps between musical parameter values and the
//! normalized [0, 1] space the genotype vectors live in.

use crate::types::GenotypeType;
use crate::utils::numeric::{round_to_6_decimals, PHI};
use std::f64::consts::PI;

/// Upper bound of the golden integer decoding search.
pub const GOLDEN_INTEGER_MAX: i64 = 1000;

/// Pair of inverse maps for one parameter type.
#[derive(Clone, Copy)]
pub struct ParameterMapper {
    pub encoder: fn(f64) -> f64,
    pub decoder: fn(f64) -> f64,
}

const IDENTITY: ParameterMapper = ParameterMapper {
    encoder: identity,
    decoder: identity,
};

fn identity(x: f64) -> f64 {
    x
}

/// Psychoacoustic quantized scale: normalized key for each step in -36..=36.
const QUANTIZED_TABLE: [f64; 73] = [
    0.0, 0.0005, 0.001, 0.003, 0.006, 0.008, 0.01, 0.015, 0.02, 0.025, 0.03, 0.04, 0.045, 0.05,
    0.06, 0.07, 0.08, 0.09, 0.1, 0.11, 0.12, 0.14, 0.15, 0.16, 0.18, 0.2, 0.21, 0.23, 0.25, 0.27,
    0.3, 0.32, 0.33, 0.36, 0.4, 0.45, 0.5, 0.55, 0.6, 0.64, 0.67, 0.68, 0.7, 0.73, 0.75, 0.77,
    0.79, 0.8, 0.82, 0.84, 0.85, 0.86, 0.88, 0.89, 0.9, 0.91, 0.92, 0.93, 0.94, 0.95, 0.955,
    0.96, 0.97, 0.975, 0.98, 0.985, 0.99, 0.992, 0.994, 0.997, 0.999, 0.9995, 1.0,
];
const QUANTIZED_OFFSET: i64 = 36;

fn encode_note_value(v: f64) -> f64 {
    if v < 0.003907 {
        return 0.0;
    }
    (v.log2() + 8.0) / 10.0
}

fn decode_note_value(p: f64) -> f64 {
    if p < 0.006695 {
        return 0.0;
    }
    2f64.powf(10.0 * p - 8.0)
}

fn encode_duration(s: f64) -> f64 {
    if s < 0.015625 {
        return 0.0;
    }
    (s.log2() + 6.0) / 10.0
}

fn decode_duration(p: f64) -> f64 {
    2f64.powf(10.0 * p - 6.0)
}

fn encode_midi_pitch(m: f64) -> f64 {
    m / 127.0
}

fn decode_midi_pitch(p: f64) -> f64 {
    127.0 * p
}

fn encode_frequency(f: f64) -> f64 {
    (f.max(0.0) / 20000.0).powf(0.25)
}

fn decode_frequency(p: f64) -> f64 {
    20000.0 * p.powi(4)
}

fn encode_articulation(a: f64) -> f64 {
    if a <= 10000.0 {
        return 0.63662 * (1.20416 * (a.max(0.0) * 0.01).sqrt()).atan();
    }
    0.998
}

fn decode_articulation(p: f64) -> f64 {
    if p < 0.998 {
        return ((p * PI * 0.5).tan().powi(2) / 1.45 * 100.0).round();
    }
    10000.0
}

fn encode_intensity(i: f64) -> f64 {
    i / 100.0
}

fn decode_intensity(p: f64) -> f64 {
    100.0 * p
}

fn encode_golden_integer(z: f64) -> f64 {
    integer_to_normalized(z.round() as i64)
}

fn decode_golden_integer(p: f64) -> f64 {
    normalized_to_integer(p) as f64
}

fn encode_quantized(z: f64) -> f64 {
    let step = (z.round() as i64).clamp(-QUANTIZED_OFFSET, QUANTIZED_OFFSET);
    QUANTIZED_TABLE[(step + QUANTIZED_OFFSET) as usize]
}

fn decode_quantized(p: f64) -> f64 {
    let mut best = 0;
    for (position, key) in QUANTIZED_TABLE.iter().enumerate() {
        if (key - p).abs() < (QUANTIZED_TABLE[best] - p).abs() {
            best = position;
        }
    }
    (best as i64 - QUANTIZED_OFFSET) as f64
}

/// Golden integer encoding: fractional part of `z * PHI`.
pub fn integer_to_normalized(z: i64) -> f64 {
    round_to_6_decimals((z as f64 * PHI).rem_euclid(1.0))
}

/// Inverse of [`integer_to_normalized`] by nearest match over
/// `0..=GOLDEN_INTEGER_MAX`.
pub fn normalized_to_integer(p: f64) -> i64 {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for z in 0..=GOLDEN_INTEGER_MAX {
        let distance = ((z as f64 * PHI).rem_euclid(1.0) - p).abs();
        if distance < best_distance {
            best = z;
            best_distance = distance;
        }
    }
    best
}

pub fn normalized_to_uniform(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    if x == 1.0 {
        return 1.0;
    }
    let e = (14.0 * x).exp();
    e / (1096.63 + e)
}

pub fn uniform_to_normalized(x: f64) -> f64 {
    if x < 0.000912 {
        return 0.0;
    }
    if x > 0.999088 {
        return 1.0;
    }
    0.5 + (x / (1.0 - x)).ln() / 14.0
}

/// Mapper for a scalar type. List types use their element's mapper and
/// anything without a dedicated mapper falls back to the identity.
pub fn mapper_for(ty: GenotypeType) -> ParameterMapper {
    let scalar = ty.element_type().unwrap_or(ty);
    match scalar {
        GenotypeType::NoteValue => ParameterMapper {
            encoder: encode_note_value,
            decoder: decode_note_value,
        },
        GenotypeType::Duration => ParameterMapper {
            encoder: encode_duration,
            decoder: decode_duration,
        },
        GenotypeType::MidiPitch => ParameterMapper {
            encoder: encode_midi_pitch,
            decoder: decode_midi_pitch,
        },
        GenotypeType::Frequency => ParameterMapper {
            encoder: encode_frequency,
            decoder: decode_frequency,
        },
        GenotypeType::Articulation => ParameterMapper {
            encoder: encode_articulation,
            decoder: decode_articulation,
        },
        GenotypeType::Intensity => ParameterMapper {
            encoder: encode_intensity,
            decoder: decode_intensity,
        },
        GenotypeType::GoldenInteger => ParameterMapper {
            encoder: encode_golden_integer,
            decoder: decode_golden_integer,
        },
        GenotypeType::Quantized => ParameterMapper {
            encoder: encode_quantized,
            decoder: decode_quantized,
        },
        _ => IDENTITY,
    }
}

/// Whether the logistic uniformizing transform follows encoding for `ty`.
pub fn uses_uniform_transformation(ty: GenotypeType) -> bool {
    matches!(
        ty.element_type().unwrap_or(ty),
        GenotypeType::NoteValue
            | GenotypeType::Duration
            | GenotypeType::MidiPitch
            | GenotypeType::Frequency
            | GenotypeType::Articulation
            | GenotypeType::Intensity
            | GenotypeType::Quantized
    )
}

pub fn encode_parameter(ty: GenotypeType, value: f64) -> f64 {
    let encoded = (mapper_for(ty).encoder)(value);
    let uniformed = if uses_uniform_transformation(ty) {
        normalized_to_uniform(encoded)
    } else {
        encoded
    };
    round_to_6_decimals(uniformed)
}

pub fn decode_parameter(ty: GenotypeType, encoded: f64) -> f64 {
    let deuniformed = if uses_uniform_transformation(ty) {
        uniform_to_normalized(encoded)
    } else {
        encoded
    };
    round_to_6_decimals((mapper_for(ty).decoder)(deuniformed))
}
