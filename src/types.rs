use serde::{Deserialize, Serialize};
use std::fmt;

/// Node category of a genotype tree.
///
/// Composite types are built out of other nodes, scalar parameter types hold a
/// single numeric leaf and list types hold a run of leaves of their element
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenotypeType {
    Score,
    Voice,
    Event,

    Param,
    NoteValue,
    Duration,
    MidiPitch,
    Frequency,
    Articulation,
    Intensity,
    GoldenInteger,
    Quantized,

    LNoteValue,
    LDuration,
    LMidiPitch,
    LFrequency,
    LArticulation,
    LIntensity,
    LGoldenInteger,
    LQuantized,
}

impl GenotypeType {
    pub const ALL: [GenotypeType; 20] = [
        GenotypeType::Score,
        GenotypeType::Voice,
        GenotypeType::Event,
        GenotypeType::Param,
        GenotypeType::NoteValue,
        GenotypeType::Duration,
        GenotypeType::MidiPitch,
        GenotypeType::Frequency,
        GenotypeType::Articulation,
        GenotypeType::Intensity,
        GenotypeType::GoldenInteger,
        GenotypeType::Quantized,
        GenotypeType::LNoteValue,
        GenotypeType::LDuration,
        GenotypeType::LMidiPitch,
        GenotypeType::LFrequency,
        GenotypeType::LArticulation,
        GenotypeType::LIntensity,
        GenotypeType::LGoldenInteger,
        GenotypeType::LQuantized,
    ];

    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            GenotypeType::Param
                | GenotypeType::NoteValue
                | GenotypeType::Duration
                | GenotypeType::MidiPitch
                | GenotypeType::Frequency
                | GenotypeType::Articulation
                | GenotypeType::Intensity
                | GenotypeType::GoldenInteger
                | GenotypeType::Quantized
        )
    }

    pub fn is_list(self) -> bool {
        self.element_type().is_some()
    }

    /// Scalar type of the elements of a list type.
    pub fn element_type(self) -> Option<GenotypeType> {
        match self {
            GenotypeType::LNoteValue => Some(GenotypeType::NoteValue),
            GenotypeType::LDuration => Some(GenotypeType::Duration),
            GenotypeType::LMidiPitch => Some(GenotypeType::MidiPitch),
            GenotypeType::LFrequency => Some(GenotypeType::Frequency),
            GenotypeType::LArticulation => Some(GenotypeType::Articulation),
            GenotypeType::LIntensity => Some(GenotypeType::Intensity),
            GenotypeType::LGoldenInteger => Some(GenotypeType::GoldenInteger),
            GenotypeType::LQuantized => Some(GenotypeType::Quantized),
            _ => None,
        }
    }

    /// Sentinel that precedes every leaf of this type in a normalized vector.
    /// List types share the marker of their element type.
    pub fn marker(self) -> Option<f64> {
        let scalar = self.element_type().unwrap_or(self);
        match scalar {
            GenotypeType::Param => Some(0.5),
            GenotypeType::NoteValue => Some(0.51),
            GenotypeType::Duration => Some(0.52),
            GenotypeType::MidiPitch => Some(0.53),
            GenotypeType::Frequency => Some(0.54),
            GenotypeType::Articulation => Some(0.55),
            GenotypeType::Intensity => Some(0.56),
            GenotypeType::GoldenInteger => Some(0.57),
            GenotypeType::Quantized => Some(0.58),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenotypeType::Score => "scoreF",
            GenotypeType::Voice => "voiceF",
            GenotypeType::Event => "eventF",
            GenotypeType::Param => "paramF",
            GenotypeType::NoteValue => "noteValueF",
            GenotypeType::Duration => "durationF",
            GenotypeType::MidiPitch => "midiPitchF",
            GenotypeType::Frequency => "frequencyF",
            GenotypeType::Articulation => "articulationF",
            GenotypeType::Intensity => "intensityF",
            GenotypeType::GoldenInteger => "goldenintegerF",
            GenotypeType::Quantized => "quantizedF",
            GenotypeType::LNoteValue => "lnoteValueF",
            GenotypeType::LDuration => "ldurationF",
            GenotypeType::LMidiPitch => "lmidiPitchF",
            GenotypeType::LFrequency => "lfrequencyF",
            GenotypeType::LArticulation => "larticulationF",
            GenotypeType::LIntensity => "lintensityF",
            GenotypeType::LGoldenInteger => "lgoldenintegerF",
            GenotypeType::LQuantized => "lquantizedF",
        }
    }
}

impl fmt::Display for GenotypeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_unique_per_scalar_type() {
        let mut markers: Vec<f64> = GenotypeType::ALL
            .iter()
            .filter(|t| t.is_parameter())
            .filter_map(|t| t.marker())
            .collect();
        let count = markers.len();
        markers.sort_by(|a, b| a.total_cmp(b));
        markers.dedup();
        assert_eq!(markers.len(), count);
    }

    #[test]
    fn list_types_share_element_marker() {
        assert_eq!(GenotypeType::LMidiPitch.marker(), GenotypeType::MidiPitch.marker());
        assert_eq!(GenotypeType::Event.marker(), None);
        assert!(GenotypeType::LQuantized.is_list());
        assert!(!GenotypeType::LQuantized.is_parameter());
    }
}
