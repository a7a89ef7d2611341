use crate::error::{GenomusError, Result};
use crate::types::GenotypeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized value of a single musical parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub ty: GenotypeType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub voices: Vec<Voice>,
}

/// Result of evaluating a genotype tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncodedPhenotype {
    Parameter(Parameter),
    List {
        ty: GenotypeType,
        parameters: Vec<Parameter>,
    },
    Event(Event),
    Voice(Voice),
    Score(Score),
}

impl EncodedPhenotype {
    pub fn kind(&self) -> &'static str {
        match self {
            EncodedPhenotype::Parameter(_) => "parameter",
            EncodedPhenotype::List { .. } => "list",
            EncodedPhenotype::Event(_) => "event",
            EncodedPhenotype::Voice(_) => "voice",
            EncodedPhenotype::Score(_) => "score",
        }
    }

    pub fn into_parameter(self) -> Result<Parameter> {
        match self {
            EncodedPhenotype::Parameter(p) => Ok(p),
            other => Err(mismatch("parameter", &other)),
        }
    }

    pub fn into_list(self) -> Result<Vec<Parameter>> {
        match self {
            EncodedPhenotype::List { parameters, .. } => Ok(parameters),
            other => Err(mismatch("list", &other)),
        }
    }

    pub fn into_event(self) -> Result<Event> {
        match self {
            EncodedPhenotype::Event(e) => Ok(e),
            other => Err(mismatch("event", &other)),
        }
    }

    pub fn into_voice(self) -> Result<Voice> {
        match self {
            EncodedPhenotype::Voice(v) => Ok(v),
            other => Err(mismatch("voice", &other)),
        }
    }

    pub fn into_score(self) -> Result<Score> {
        match self {
            EncodedPhenotype::Score(s) => Ok(s),
            other => Err(mismatch("score", &other)),
        }
    }

    /// Flattened parameter values, events in order.
    pub fn to_normalized_vector(&self) -> Vec<f64> {
        match self {
            EncodedPhenotype::Parameter(p) => vec![p.value],
            EncodedPhenotype::List { parameters, .. } => {
                parameters.iter().map(|p| p.value).collect()
            }
            EncodedPhenotype::Event(e) => e.values().collect(),
            EncodedPhenotype::Voice(v) => v.events.iter().flat_map(Event::values).collect(),
            EncodedPhenotype::Score(s) => s
                .voices
                .iter()
                .flat_map(|v| v.events.iter().flat_map(Event::values))
                .collect(),
        }
    }
}

impl Event {
    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.parameters.iter().map(|p| p.value)
    }
}

fn mismatch(expected: &str, actual: &EncodedPhenotype) -> GenomusError {
    GenomusError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event({})", join(&self.parameters, ", "))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice(\n\t{}\n)", join(&self.events, ",\n\t"))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "score(\n\t\t{}\n)", join(&self.voices, ",\n\t\t"))
    }
}

impl fmt::Display for EncodedPhenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedPhenotype::Parameter(p) => write!(f, "{}", p),
            EncodedPhenotype::List { parameters, .. } => write!(f, "[{}]", join(parameters, ", ")),
            EncodedPhenotype::Event(e) => write!(f, "{}", e),
            EncodedPhenotype::Voice(v) => write!(f, "{}", v),
            EncodedPhenotype::Score(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(values: &[f64]) -> Event {
        Event {
            parameters: values
                .iter()
                .map(|&value| Parameter {
                    ty: GenotypeType::Param,
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_flattened_vector_follows_event_order() {
        let score = EncodedPhenotype::Score(Score {
            voices: vec![
                Voice {
                    events: vec![event(&[0.1, 0.2]), event(&[0.3, 0.4])],
                },
                Voice {
                    events: vec![event(&[0.5, 0.6])],
                },
            ],
        });
        assert_eq!(score.to_normalized_vector(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_display() {
        let e = EncodedPhenotype::Event(event(&[0.5, 0.25]));
        assert_eq!(e.to_string(), "event(0.5, 0.25)");
    }

    #[test]
    fn test_unwrap_mismatch() {
        let e = EncodedPhenotype::Event(event(&[0.5]));
        assert!(matches!(
            e.into_voice(),
            Err(GenomusError::TypeMismatch { .. })
        ));
    }
}
