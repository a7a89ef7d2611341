//! The closed vocabulary of genotype functions.
//!
//! Every symbol carries its name, nominal index, signature and flags, plus the
//! compute logic that turns evaluated children into an encoded phenotype.
//! Autoreferences are the only symbols whose value is not computed here: the
//! arena resolves them against previously built subexpressions.

use crate::engines::evaluation::phenotype::{EncodedPhenotype, Event, Parameter, Score, Voice};
use crate::error::{GenomusError, Result};
use crate::functions::mapping::encode_parameter;
use crate::types::GenotypeType;
use crate::utils::numeric::encode_index;
use serde::{Deserialize, Serialize};

use GenotypeType as T;

/// How a symbol receives its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Children are other nodes, typed by `parameter_types`.
    Composite,
    /// One numeric leaf, encoded through the output type's mapper.
    Parameter,
    /// A run of numeric leaves of the element type.
    List,
    /// No arguments, samples a normalized value on first evaluation.
    Random,
    /// Points back at an earlier subexpression of the same type.
    Autoreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    P,
    EPiano,
    V,
    S,

    N,
    D,
    M,
    F,
    A,
    I,
    Z,
    Q,

    Ln,
    Ld,
    Lm,
    Lf,
    La,
    Li,
    Lz,
    Lq,

    S2V,
    VConcatE,
    VConcatV,
    VMotif,
    VMotifLoop,
    VPerpetuumMobile,
    VPerpetuumMobileLoop,
    SAddV,
    SAddS,

    EAutoref,
    VAutoref,

    NRnd,
    DRnd,
    MRnd,
    FRnd,
    ARnd,
    IRnd,
    ZRnd,
    QRnd,
}

/// Every symbol, in registration order.
pub const GENOTYPE_FUNCTIONS: [Symbol; 39] = [
    Symbol::P,
    Symbol::EPiano,
    Symbol::V,
    Symbol::S,
    Symbol::N,
    Symbol::D,
    Symbol::M,
    Symbol::F,
    Symbol::A,
    Symbol::I,
    Symbol::Z,
    Symbol::Q,
    Symbol::Ln,
    Symbol::Ld,
    Symbol::Lm,
    Symbol::Lf,
    Symbol::La,
    Symbol::Li,
    Symbol::Lz,
    Symbol::Lq,
    Symbol::S2V,
    Symbol::VConcatE,
    Symbol::VConcatV,
    Symbol::VMotif,
    Symbol::VMotifLoop,
    Symbol::VPerpetuumMobile,
    Symbol::VPerpetuumMobileLoop,
    Symbol::SAddV,
    Symbol::SAddS,
    Symbol::EAutoref,
    Symbol::VAutoref,
    Symbol::NRnd,
    Symbol::DRnd,
    Symbol::MRnd,
    Symbol::FRnd,
    Symbol::ARnd,
    Symbol::IRnd,
    Symbol::ZRnd,
    Symbol::QRnd,
];

/// Alternative names accepted by the parser.
pub const NAME_ALIASES: [(&str, &str); 1] = [("e", "e_piano")];

const EVENT_PARAMETERS: [GenotypeType; 4] = [T::NoteValue, T::MidiPitch, T::Articulation, T::Intensity];
const MOTIF_PARAMETERS: [GenotypeType; 4] = [T::LNoteValue, T::LMidiPitch, T::LArticulation, T::LIntensity];
const PERPETUUM_PARAMETERS: [GenotypeType; 4] = [T::NoteValue, T::LMidiPitch, T::LArticulation, T::LIntensity];

impl Symbol {
    pub fn name(self) -> &'static str {
        match self {
            Symbol::P => "p",
            Symbol::EPiano => "e_piano",
            Symbol::V => "v",
            Symbol::S => "s",
            Symbol::N => "n",
            Symbol::D => "d",
            Symbol::M => "m",
            Symbol::F => "f",
            Symbol::A => "a",
            Symbol::I => "i",
            Symbol::Z => "z",
            Symbol::Q => "q",
            Symbol::Ln => "ln",
            Symbol::Ld => "ld",
            Symbol::Lm => "lm",
            Symbol::Lf => "lf",
            Symbol::La => "la",
            Symbol::Li => "li",
            Symbol::Lz => "lz",
            Symbol::Lq => "lq",
            Symbol::S2V => "s2V",
            Symbol::VConcatE => "vConcatE",
            Symbol::VConcatV => "vConcatV",
            Symbol::VMotif => "vMotif",
            Symbol::VMotifLoop => "vMotifLoop",
            Symbol::VPerpetuumMobile => "vPerpetuumMobile",
            Symbol::VPerpetuumMobileLoop => "vPerpetuumMobileLoop",
            Symbol::SAddV => "sAddV",
            Symbol::SAddS => "sAddS",
            Symbol::EAutoref => "eAutoref",
            Symbol::VAutoref => "vAutoref",
            Symbol::NRnd => "nRnd",
            Symbol::DRnd => "dRnd",
            Symbol::MRnd => "mRnd",
            Symbol::FRnd => "fRnd",
            Symbol::ARnd => "aRnd",
            Symbol::IRnd => "iRnd",
            Symbol::ZRnd => "zRnd",
            Symbol::QRnd => "qRnd",
        }
    }

    pub fn nominal_index(self) -> u32 {
        match self {
            Symbol::P => 100,
            Symbol::EPiano => 2,
            Symbol::V => 3,
            Symbol::S => 4,
            Symbol::N => 5,
            Symbol::D => 6,
            Symbol::M => 7,
            Symbol::F => 8,
            Symbol::A => 9,
            Symbol::I => 10,
            Symbol::Z => 11,
            Symbol::Q => 12,
            Symbol::Ln => 15,
            Symbol::Ld => 16,
            Symbol::Lm => 17,
            Symbol::Lf => 18,
            Symbol::La => 19,
            Symbol::Li => 20,
            Symbol::Lz => 21,
            Symbol::Lq => 22,
            Symbol::S2V => 104,
            Symbol::VConcatE => 42,
            Symbol::VConcatV => 43,
            Symbol::VMotif => 199,
            Symbol::VMotifLoop => 200,
            Symbol::VPerpetuumMobile => 201,
            Symbol::VPerpetuumMobileLoop => 202,
            Symbol::SAddV => 109,
            Symbol::SAddS => 110,
            Symbol::EAutoref => 27,
            Symbol::VAutoref => 28,
            Symbol::NRnd => 310,
            Symbol::DRnd => 311,
            Symbol::MRnd => 312,
            Symbol::FRnd => 313,
            Symbol::ARnd => 314,
            Symbol::IRnd => 315,
            Symbol::ZRnd => 316,
            Symbol::QRnd => 317,
        }
    }

    /// Golden-ratio key used by the vector codec.
    pub fn encoded_index(self) -> f64 {
        encode_index(self.nominal_index())
    }

    pub fn output_type(self) -> GenotypeType {
        match self {
            Symbol::P => T::Param,
            Symbol::EPiano | Symbol::EAutoref => T::Event,
            Symbol::V
            | Symbol::VConcatE
            | Symbol::VConcatV
            | Symbol::VMotif
            | Symbol::VMotifLoop
            | Symbol::VPerpetuumMobile
            | Symbol::VPerpetuumMobileLoop
            | Symbol::VAutoref => T::Voice,
            Symbol::S | Symbol::S2V | Symbol::SAddV | Symbol::SAddS => T::Score,
            Symbol::N | Symbol::NRnd => T::NoteValue,
            Symbol::D | Symbol::DRnd => T::Duration,
            Symbol::M | Symbol::MRnd => T::MidiPitch,
            Symbol::F | Symbol::FRnd => T::Frequency,
            Symbol::A | Symbol::ARnd => T::Articulation,
            Symbol::I | Symbol::IRnd => T::Intensity,
            Symbol::Z | Symbol::ZRnd => T::GoldenInteger,
            Symbol::Q | Symbol::QRnd => T::Quantized,
            Symbol::Ln => T::LNoteValue,
            Symbol::Ld => T::LDuration,
            Symbol::Lm => T::LMidiPitch,
            Symbol::Lf => T::LFrequency,
            Symbol::La => T::LArticulation,
            Symbol::Li => T::LIntensity,
            Symbol::Lz => T::LGoldenInteger,
            Symbol::Lq => T::LQuantized,
        }
    }

    /// Output types expected as children. Empty for every non-composite.
    pub fn parameter_types(self) -> &'static [GenotypeType] {
        match self {
            Symbol::EPiano => &EVENT_PARAMETERS,
            Symbol::V => &[T::Event],
            Symbol::S => &[T::Voice],
            Symbol::S2V => &[T::Voice, T::Voice],
            Symbol::VConcatE => &[T::Event, T::Event],
            Symbol::VConcatV => &[T::Voice, T::Voice],
            Symbol::VMotif | Symbol::VMotifLoop => &MOTIF_PARAMETERS,
            Symbol::VPerpetuumMobile | Symbol::VPerpetuumMobileLoop => &PERPETUUM_PARAMETERS,
            Symbol::SAddV => &[T::Score, T::Voice],
            Symbol::SAddS => &[T::Score, T::Score],
            _ => &[],
        }
    }

    pub fn kind(self) -> SymbolKind {
        match self {
            Symbol::P
            | Symbol::N
            | Symbol::D
            | Symbol::M
            | Symbol::F
            | Symbol::A
            | Symbol::I
            | Symbol::Z
            | Symbol::Q => SymbolKind::Parameter,
            Symbol::Ln
            | Symbol::Ld
            | Symbol::Lm
            | Symbol::Lf
            | Symbol::La
            | Symbol::Li
            | Symbol::Lz
            | Symbol::Lq => SymbolKind::List,
            Symbol::NRnd
            | Symbol::DRnd
            | Symbol::MRnd
            | Symbol::FRnd
            | Symbol::ARnd
            | Symbol::IRnd
            | Symbol::ZRnd
            | Symbol::QRnd => SymbolKind::Random,
            Symbol::EAutoref | Symbol::VAutoref => SymbolKind::Autoreference,
            _ => SymbolKind::Composite,
        }
    }

    pub fn is_autoreference(self) -> bool {
        self.kind() == SymbolKind::Autoreference
    }

    pub fn is_random(self) -> bool {
        self.kind() == SymbolKind::Random
    }

    /// Leaf-taking symbols are the defaults of their type, as are the plain
    /// event/voice/score wrappers.
    pub fn is_default_for_type(self) -> bool {
        matches!(self.kind(), SymbolKind::Parameter | SymbolKind::List)
            || matches!(self, Symbol::EPiano | Symbol::V | Symbol::S)
    }

    /// Whether `new_leaf` is a legal way of building this symbol.
    pub fn accepts_leaf(self) -> bool {
        !matches!(self.kind(), SymbolKind::Composite)
    }

    /// Applies the symbol to already evaluated children.
    pub fn compute(self, children: Vec<EncodedPhenotype>) -> Result<EncodedPhenotype> {
        match self {
            Symbol::EPiano => {
                let parameters = children
                    .into_iter()
                    .map(EncodedPhenotype::into_parameter)
                    .collect::<Result<Vec<_>>>()?;
                Ok(EncodedPhenotype::Event(Event { parameters }))
            }
            Symbol::V | Symbol::VConcatE => {
                let events = children
                    .into_iter()
                    .map(EncodedPhenotype::into_event)
                    .collect::<Result<Vec<_>>>()?;
                Ok(EncodedPhenotype::Voice(Voice { events }))
            }
            Symbol::S | Symbol::S2V => {
                let voices = children
                    .into_iter()
                    .map(EncodedPhenotype::into_voice)
                    .collect::<Result<Vec<_>>>()?;
                Ok(EncodedPhenotype::Score(Score { voices }))
            }
            Symbol::VConcatV => {
                let mut events = Vec::new();
                for child in children {
                    events.extend(child.into_voice()?.events);
                }
                Ok(EncodedPhenotype::Voice(Voice { events }))
            }
            Symbol::VMotif | Symbol::VMotifLoop => {
                let lists = children
                    .into_iter()
                    .map(EncodedPhenotype::into_list)
                    .collect::<Result<Vec<_>>>()?;
                Ok(EncodedPhenotype::Voice(zip_lists(&lists, self == Symbol::VMotifLoop)))
            }
            Symbol::VPerpetuumMobile | Symbol::VPerpetuumMobileLoop => {
                let mut children = children.into_iter();
                let note_value = children
                    .next()
                    .ok_or_else(|| arity_error(self, 0))?
                    .into_parameter()?;
                let mut lists = vec![vec![note_value]];
                for child in children {
                    lists.push(child.into_list()?);
                }
                let looped = self == Symbol::VPerpetuumMobileLoop;
                // The held note value never limits the length.
                let voice = zip_lists_with(&lists, looped, |i| i > 0);
                Ok(EncodedPhenotype::Voice(voice))
            }
            Symbol::SAddV => {
                let mut children = children.into_iter();
                let mut score = children
                    .next()
                    .ok_or_else(|| arity_error(self, 0))?
                    .into_score()?;
                for child in children {
                    score.voices.push(child.into_voice()?);
                }
                Ok(EncodedPhenotype::Score(score))
            }
            Symbol::SAddS => {
                let mut voices = Vec::new();
                for child in children {
                    voices.extend(child.into_score()?.voices);
                }
                Ok(EncodedPhenotype::Score(Score { voices }))
            }
            _ => Err(GenomusError::Generation(format!(
                "{} is not computed from children",
                self.name()
            ))),
        }
    }

    /// Value of a parametric node from its raw (decoded) leaf.
    pub fn compute_parameter(self, raw: f64) -> EncodedPhenotype {
        let ty = self.output_type();
        EncodedPhenotype::Parameter(Parameter {
            ty,
            value: encode_parameter(ty, raw),
        })
    }

    /// Value of a list node from its raw (decoded) leaves.
    pub fn compute_list(self, raw: &[f64]) -> EncodedPhenotype {
        let ty = self.output_type();
        let element = ty.element_type().unwrap_or(ty);
        EncodedPhenotype::List {
            ty,
            parameters: raw
                .iter()
                .map(|&value| Parameter {
                    ty: element,
                    value: encode_parameter(ty, value),
                })
                .collect(),
        }
    }

    /// Value of a random node from its sampled normalized leaf.
    pub fn compute_random(self, sampled: f64) -> EncodedPhenotype {
        EncodedPhenotype::Parameter(Parameter {
            ty: self.output_type(),
            value: sampled,
        })
    }

    /// Multi-line summary used by the interpreter's verbose listing.
    pub fn describe(self) -> String {
        let parameters: Vec<&str> = self.parameter_types().iter().map(|t| t.as_str()).collect();
        format!(
            "--- {} ---\n\tindex: {} ({})\n\tparameter types: [{}]\n\toutput type: {}\n\tkind: {:?}{}",
            self.name(),
            self.nominal_index(),
            self.encoded_index(),
            parameters.join(", "),
            self.output_type(),
            self.kind(),
            if self.is_default_for_type() { "\n\tdefault for type" } else { "" },
        )
    }
}

fn arity_error(symbol: Symbol, actual: usize) -> GenomusError {
    GenomusError::Arity {
        function: symbol.name().to_string(),
        expected: symbol.parameter_types().len(),
        actual,
    }
}

fn zip_lists(lists: &[Vec<Parameter>], looped: bool) -> Voice {
    zip_lists_with(lists, looped, |_| true)
}

/// Builds one event per position across `lists`. Without looping the voice is
/// as long as the shortest counted list, with looping as long as the longest
/// one, shorter lists being reused cyclically.
fn zip_lists_with(lists: &[Vec<Parameter>], looped: bool, counts: impl Fn(usize) -> bool) -> Voice {
    let lengths = lists
        .iter()
        .enumerate()
        .filter(|(i, _)| counts(*i))
        .map(|(_, list)| list.len());
    let length = if looped { lengths.max() } else { lengths.min() }.unwrap_or(0);

    if lists.iter().any(Vec::is_empty) {
        return Voice { events: Vec::new() };
    }

    let events = (0..length)
        .map(|position| Event {
            parameters: lists
                .iter()
                .map(|list| list[position % list.len()].clone())
                .collect(),
        })
        .collect();

    Voice { events }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ty: GenotypeType, values: &[f64]) -> EncodedPhenotype {
        EncodedPhenotype::List {
            ty,
            parameters: values
                .iter()
                .map(|&value| Parameter { ty, value })
                .collect(),
        }
    }

    #[test]
    fn test_signatures_are_consistent_with_kind() {
        for symbol in GENOTYPE_FUNCTIONS {
            match symbol.kind() {
                SymbolKind::Composite => assert!(!symbol.parameter_types().is_empty()),
                SymbolKind::Parameter => assert!(symbol.output_type().is_parameter()),
                SymbolKind::List => assert!(symbol.output_type().is_list()),
                SymbolKind::Random => assert!(symbol.output_type().is_parameter()),
                SymbolKind::Autoreference => assert!(symbol.parameter_types().is_empty()),
            }
        }
    }

    #[test]
    fn test_motif_zips_to_shortest_list() {
        let children = vec![
            list(T::LNoteValue, &[0.1, 0.2, 0.3]),
            list(T::LMidiPitch, &[0.4, 0.5]),
            list(T::LArticulation, &[0.6, 0.7, 0.8]),
            list(T::LIntensity, &[0.9, 0.95, 0.99]),
        ];
        let voice = Symbol::VMotif.compute(children.clone()).unwrap().into_voice().unwrap();
        assert_eq!(voice.events.len(), 2);

        let looped = Symbol::VMotifLoop.compute(children).unwrap().into_voice().unwrap();
        assert_eq!(looped.events.len(), 3);
        assert_eq!(looped.events[2].parameters[1].value, 0.4);
    }

    #[test]
    fn test_perpetuum_mobile_holds_note_value() {
        let children = vec![
            Symbol::N.compute_parameter(0.25),
            list(T::LMidiPitch, &[0.4, 0.5, 0.6]),
            list(T::LArticulation, &[0.6]),
            list(T::LIntensity, &[0.9, 0.95]),
        ];
        let voice = Symbol::VPerpetuumMobileLoop
            .compute(children.clone())
            .unwrap()
            .into_voice()
            .unwrap();
        assert_eq!(voice.events.len(), 3);
        let note = voice.events[0].parameters[0].value;
        assert!(voice.events.iter().all(|e| e.parameters[0].value == note));

        let short = Symbol::VPerpetuumMobile.compute(children).unwrap().into_voice().unwrap();
        assert_eq!(short.events.len(), 1);
    }

    #[test]
    fn test_concat_voices() {
        let event = Symbol::EPiano
            .compute(vec![
                Symbol::N.compute_parameter(0.1),
                Symbol::M.compute_parameter(60.0),
                Symbol::A.compute_parameter(1.0),
                Symbol::I.compute_parameter(50.0),
            ])
            .unwrap();
        let voice = Symbol::VConcatE.compute(vec![event.clone(), event]).unwrap();
        let doubled = Symbol::VConcatV
            .compute(vec![voice.clone(), voice])
            .unwrap()
            .into_voice()
            .unwrap();
        assert_eq!(doubled.events.len(), 4);
    }

    #[test]
    fn test_wrong_child_kind_is_an_error() {
        let result = Symbol::V.compute(vec![Symbol::N.compute_parameter(0.1)]);
        assert!(matches!(result, Err(GenomusError::TypeMismatch { .. })));
    }
}
