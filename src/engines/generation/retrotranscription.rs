use crate::config::GenotypeConfig;
use crate::engines::generation::{
    arena::{format_number, Arena, DecodedGenotype},
    gene_consumer::GeneConsumer,
};
use crate::engines::parsing::Parser;
use crate::error::{GenomusError, Result};
use crate::functions::library::{Symbol, SymbolKind};
use crate::functions::mapping::decode_parameter;
use crate::functions::registry::FunctionRegistry;
use crate::types::GenotypeType;
use crate::utils::numeric::round_to_6_decimals;
use rayon::prelude::*;
use std::collections::HashSet;

/// Every derivation starts from a score.
pub const ROOT_TYPE: GenotypeType = GenotypeType::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    ChooseSymbol,
    End,
}

/// Mutable state of one derivation.
struct Derivation<'a> {
    consumer: GeneConsumer<'a>,
    output: Vec<f64>,
    /// Types that already completed a subexpression, and may therefore be
    /// produced by their autoreference from now on.
    autoreference_eligible: HashSet<GenotypeType>,
    limits_reported: bool,
}

impl<'a> Derivation<'a> {
    fn new(input: &'a [f64]) -> Self {
        Self {
            consumer: GeneConsumer::new(input),
            output: Vec::new(),
            autoreference_eligible: HashSet::new(),
            limits_reported: false,
        }
    }

    /// Appends `value` to the output and moves the tape one step.
    fn emit(&mut self, value: f64) {
        self.output.push(value);
        self.consumer.advance();
    }
}

/// Derives genotypes from germinal vectors (retrotranscription) and renders
/// normalized vectors as expressions.
pub struct Retrotranscriptor<'r> {
    registry: &'r FunctionRegistry,
    config: GenotypeConfig,
}

impl<'r> Retrotranscriptor<'r> {
    pub fn new(registry: &'r FunctionRegistry, config: GenotypeConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &GenotypeConfig {
        &self.config
    }

    /// Canonical normalized vector of the genotype `input` derives to.
    ///
    /// Feeding the result back in reproduces it exactly.
    pub fn normalize_vector(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.is_empty() {
            return Err(GenomusError::EmptyVector);
        }

        let mut derivation = Derivation::new(input);
        self.derive(&mut derivation, ROOT_TYPE, 0)?;

        log::debug!(
            "Derived {} values from a {}-value vector ({} laps)",
            derivation.output.len(),
            input.len(),
            derivation.consumer.laps()
        );
        Ok(derivation.output)
    }

    /// Normalizes many vectors in parallel. Each derivation owns its state.
    pub fn normalize_batch(&self, inputs: &[Vec<f64>]) -> Vec<Result<Vec<f64>>> {
        inputs
            .par_iter()
            .map(|input| self.normalize_vector(input))
            .collect()
    }

    fn derive(&self, derivation: &mut Derivation, ty: GenotypeType, depth: usize) -> Result<()> {
        // Past the depth limit only defaults are chosen and their expansion is
        // bounded by the number of types.
        if depth > self.config.nesting_limit() {
            return Err(GenomusError::Generation(format!(
                "derivation of {} exceeded the call stack guard at depth {}",
                ty, depth
            )));
        }

        let mut state = State::Start;
        loop {
            match state {
                State::Start => {
                    derivation.emit(1.0);
                    state = State::ChooseSymbol;
                }
                State::ChooseSymbol => {
                    self.choose_symbol(derivation, ty, depth)?;
                    state = State::End;
                }
                State::End => {
                    derivation.emit(0.0);
                    derivation.autoreference_eligible.insert(ty);
                    return Ok(());
                }
            }
        }
    }

    fn choose_symbol(&self, derivation: &mut Derivation, ty: GenotypeType, depth: usize) -> Result<()> {
        let limits_exceeded = depth > self.config.max_genotype_depth
            || derivation.consumer.position() > self.config.max_genotype_vector_size;
        if limits_exceeded && !derivation.limits_reported {
            log::warn!(
                "Derivation limits reached at depth {} position {}, falling back to defaults",
                depth,
                derivation.consumer.position()
            );
            derivation.limits_reported = true;
        }
        let allow_autoreference = derivation.autoreference_eligible.contains(&ty);

        let gene = derivation.consumer.current();
        let symbol =
            self.registry
                .closest_function(ty, gene, limits_exceeded, allow_autoreference)?;
        log::trace!(
            "depth {} position {}: {} -> {}",
            depth,
            derivation.consumer.position(),
            gene,
            symbol.name()
        );
        derivation.emit(symbol.encoded_index());

        if ty.is_parameter() && !symbol.is_random() {
            derivation.emit(marker(ty)?);
            let leaf = round_to_6_decimals(derivation.consumer.current());
            derivation.emit(leaf);
        } else if ty.is_list() {
            let marker = marker(ty)?;
            let mut length = 0;
            loop {
                derivation.emit(marker);
                let leaf = round_to_6_decimals(derivation.consumer.current());
                derivation.emit(leaf);
                length += 1;
                if !self.config.list_continues(leaf, length) {
                    break;
                }
            }
        } else {
            for &parameter_type in symbol.parameter_types() {
                self.derive(derivation, parameter_type, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Renders a normalized vector as a textual expression.
    ///
    /// The input must already be normalized: its framing is checked, not
    /// derived, and any deviation is a format error.
    pub fn to_expression(&self, input: &[f64]) -> Result<String> {
        let mut reader = ExpressionReader {
            registry: self.registry,
            input,
            position: 0,
            max_depth: self.config.nesting_limit(),
        };
        let expression = reader.read(ROOT_TYPE, 0)?;
        if reader.position != input.len() {
            return Err(GenomusError::format(
                reader.position,
                format!("{} trailing values", input.len() - reader.position),
            ));
        }
        Ok(expression)
    }

    /// Full pipeline: germinal vector -> normalized vector -> expression ->
    /// tree in a fresh arena.
    pub fn decode_genotype(&self, germinal: &[f64], arena: Arena) -> Result<DecodedGenotype> {
        let normalized = self.normalize_vector(germinal)?;
        let expression = self.to_expression(&normalized)?;
        Parser::with_max_depth(self.registry, self.config.nesting_limit())
            .parse_genotype(&expression, arena)
    }
}

fn marker(ty: GenotypeType) -> Result<f64> {
    ty.marker()
        .ok_or_else(|| GenomusError::Generation(format!("{} has no leaf marker", ty)))
}

struct ExpressionReader<'a> {
    registry: &'a FunctionRegistry,
    input: &'a [f64],
    position: usize,
    max_depth: usize,
}

impl<'a> ExpressionReader<'a> {
    fn peek(&self) -> Option<f64> {
        self.input.get(self.position).copied()
    }

    fn next(&mut self) -> Result<f64> {
        let value = self
            .peek()
            .ok_or_else(|| GenomusError::format(self.position, "unexpected end of vector"))?;
        self.position += 1;
        Ok(value)
    }

    fn expect(&mut self, expected: f64, what: &str) -> Result<()> {
        let position = self.position;
        let value = self.next()?;
        if value != expected {
            return Err(GenomusError::format(
                position,
                format!("expected {} {}, found {}", what, expected, value),
            ));
        }
        Ok(())
    }

    fn read(&mut self, ty: GenotypeType, depth: usize) -> Result<String> {
        if depth > self.max_depth {
            return Err(GenomusError::format(
                self.position,
                format!("{} nested deeper than {}", ty, self.max_depth),
            ));
        }
        self.expect(1.0, "start marker")?;

        let position = self.position;
        let index = self.next()?;
        let symbol = self.registry.get_by_index(index).ok_or_else(|| {
            GenomusError::format(position, format!("unknown function index {}", index))
        })?;
        if symbol.output_type() != ty {
            return Err(GenomusError::format(
                position,
                format!("expected a {} function, found {}", ty, symbol.name()),
            ));
        }

        let arguments = self.read_arguments(symbol, ty, depth)?;
        self.expect(0.0, "end marker")?;
        Ok(format!("{}({})", symbol.name(), arguments))
    }

    fn read_arguments(&mut self, symbol: Symbol, ty: GenotypeType, depth: usize) -> Result<String> {
        match symbol.kind() {
            SymbolKind::Parameter => {
                let leaf = self.read_leaf(ty)?;
                Ok(format_number(decode_parameter(ty, leaf)))
            }
            // Derived random nodes carry no value, evaluated ones do.
            SymbolKind::Random => {
                if self.peek() == ty.marker() {
                    Ok(format_number(self.read_leaf(ty)?))
                } else {
                    Ok(String::new())
                }
            }
            SymbolKind::List => {
                let mut values = Vec::new();
                while self.peek().is_some() && self.peek() == ty.marker() {
                    let leaf = self.read_leaf(ty)?;
                    values.push(format_number(decode_parameter(ty, leaf)));
                }
                if values.is_empty() {
                    return Err(GenomusError::format(
                        self.position,
                        format!("empty {} list", symbol.name()),
                    ));
                }
                Ok(values.join(", "))
            }
            // The vector does not record the key; the first eligible target is used.
            SymbolKind::Autoreference => Ok("0".to_string()),
            SymbolKind::Composite => {
                let children = symbol
                    .parameter_types()
                    .iter()
                    .map(|&parameter_type| self.read(parameter_type, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(children.join(", "))
            }
        }
    }

    fn read_leaf(&mut self, ty: GenotypeType) -> Result<f64> {
        self.expect(marker(ty)?, "type marker")?;
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrotranscriptor() -> Retrotranscriptor<'static> {
        Retrotranscriptor::new(FunctionRegistry::global().unwrap(), GenotypeConfig::default())
    }

    #[test]
    fn test_empty_vector_is_rejected() {
        assert_eq!(retrotranscriptor().normalize_vector(&[]), Err(GenomusError::EmptyVector));
    }

    #[test]
    fn test_single_value_vector_is_framed() {
        let rt = retrotranscriptor();
        let normalized = rt.normalize_vector(&[0.5]).unwrap();
        assert_eq!(normalized.first(), Some(&1.0));
        assert_eq!(normalized.last(), Some(&0.0));
        assert_eq!(rt.normalize_vector(&normalized).unwrap(), normalized);
    }

    #[test]
    fn test_default_path_under_exceeded_limits() {
        let config = GenotypeConfig {
            max_genotype_depth: 0,
            max_genotype_vector_size: 0,
            ..GenotypeConfig::default()
        };
        let rt = Retrotranscriptor::new(FunctionRegistry::global().unwrap(), config);
        let normalized = rt.normalize_vector(&[0.9, 0.8, 0.7]).unwrap();
        let expression = rt.to_expression(&normalized).unwrap();
        assert!(expression.starts_with("s(v(e_piano(n("), "{expression}");
    }

    #[test]
    fn test_event_vector_renders() {
        let rt = retrotranscriptor();
        let vector = [
            1.0, 0.472136, 1.0, 0.854102, 1.0, 0.236068, 1.0, 0.09017, 0.51, 0.389195, 0.0, 1.0,
            0.326238, 0.53, 0.000931, 0.0, 1.0, 0.562306, 0.55, 0.001637, 0.0, 1.0, 0.18034, 0.56,
            0.000963, 0.0, 0.0, 0.0, 0.0,
        ];
        let expression = rt.to_expression(&vector).unwrap();
        assert!(expression.starts_with("s(v(e_piano(n(0.1), m("), "{expression}");
    }

    #[test]
    fn test_deep_vector_is_a_format_error() {
        let rt = retrotranscriptor();
        let add = Symbol::SAddS.encoded_index();
        let vector: Vec<f64> = std::iter::repeat([1.0, add]).take(100_000).flatten().collect();

        // Each level takes two values, so the guard trips at the first start
        // marker past the limit.
        let limit = rt.config().nesting_limit();
        assert!(matches!(
            rt.to_expression(&vector),
            Err(GenomusError::Format { position, .. }) if position == 2 * (limit + 1)
        ));
    }

    #[test]
    fn test_format_errors_report_position() {
        let rt = retrotranscriptor();
        let missing_start = [0.0, 0.472136];
        assert!(matches!(
            rt.to_expression(&missing_start),
            Err(GenomusError::Format { position: 0, .. })
        ));

        // Score slot holding an event function.
        let wrong_type = [1.0, 0.236068, 0.0];
        assert!(matches!(
            rt.to_expression(&wrong_type),
            Err(GenomusError::Format { position: 1, .. })
        ));

        let truncated = [1.0, 0.472136, 1.0, 0.854102];
        assert!(matches!(
            rt.to_expression(&truncated),
            Err(GenomusError::Format { position: 4, .. })
        ));
    }
}
