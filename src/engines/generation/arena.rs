//! Append-only store of genotype tree nodes.
//!
//! Nodes refer to their children by index, and are registered as available
//! subexpressions of their output type as soon as they are pushed. Children
//! must exist before their parent, so creation order is a post-order of the
//! tree and an autoreference can only ever point backwards.
//!
//! Every node records its height, so no tree deeper than [`MAX_TREE_HEIGHT`]
//! can be built and the recursive walks below stay within that bound.

use crate::engines::evaluation::phenotype::EncodedPhenotype;
use crate::error::{GenomusError, Result};
use crate::functions::library::{Symbol, SymbolKind};
use crate::types::GenotypeType;
use crate::utils::numeric::round_to_6_decimals;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;

pub type NodeIndex = usize;

/// Height of the tallest tree an arena accepts. An autoreference counts one
/// above its target.
pub const MAX_TREE_HEIGHT: usize = 256;

/// Numeric payload of a node. Its meaning depends on the symbol kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    None,
    /// Raw (decoded) parameter value.
    Value(f64),
    /// Raw (decoded) list values.
    Values(Vec<f64>),
    /// Normalized value, sampled on first evaluation.
    Random(Option<f64>),
    /// Autoreference key, taken modulo the eligible subexpressions.
    Reference(usize),
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub symbol: Symbol,
    pub children: Vec<NodeIndex>,
    pub leaf: Leaf,
    pub creation_index: usize,
    pub height: usize,
}

pub struct Arena {
    nodes: Vec<TreeNode>,
    subexpressions: HashMap<GenotypeType, Vec<NodeIndex>>,
    rng: StdRng,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Arena whose random nodes sample a reproducible sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            nodes: Vec::new(),
            subexpressions: HashMap::new(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> Result<&TreeNode> {
        self.nodes.get(index).ok_or(GenomusError::UnknownNode(index))
    }

    /// Drops every node and the subexpression index.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.subexpressions.clear();
    }

    /// Drops every node created at or after `len`.
    ///
    /// Nodes below `len` never refer to later ones, so the remaining trees
    /// and their autoreference targets are unchanged.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        self.subexpressions.retain(|_, indices| {
            indices.truncate(indices.partition_point(|&index| index < len));
            !indices.is_empty()
        });
    }

    /// Applies `symbol` to existing child nodes.
    pub fn new_node(&mut self, symbol: Symbol, children: &[NodeIndex]) -> Result<NodeIndex> {
        match symbol.kind() {
            SymbolKind::Composite => {
                self.check_children(symbol, children)?;
                let tallest = children
                    .iter()
                    .map(|&child| self.nodes[child].height)
                    .max()
                    .unwrap_or(0);
                self.push(symbol, children.to_vec(), Leaf::None, tallest + 1)
            }
            SymbolKind::Random => {
                self.check_arity(symbol, children.len(), 0)?;
                self.push(symbol, Vec::new(), Leaf::Random(None), 0)
            }
            SymbolKind::Autoreference => {
                self.check_arity(symbol, children.len(), 0)?;
                self.new_leaf(symbol, 0.0)
            }
            SymbolKind::Parameter | SymbolKind::List => {
                Err(GenomusError::LeafRequired(symbol.name().to_string()))
            }
        }
    }

    /// Applies a zero-arity `symbol` to a literal value.
    pub fn new_leaf(&mut self, symbol: Symbol, value: f64) -> Result<NodeIndex> {
        let mut height = 0;
        let leaf = match symbol.kind() {
            SymbolKind::Parameter => Leaf::Value(value),
            SymbolKind::List => Leaf::Values(vec![value]),
            SymbolKind::Random => Leaf::Random(Some(value)),
            SymbolKind::Autoreference => {
                if !value.is_finite() || value < 0.0 {
                    return Err(GenomusError::Reference(format!(
                        "{} key must be a non-negative integer, got {}",
                        symbol.name(),
                        value
                    )));
                }
                let key = value.round() as usize;
                // Fails now rather than at evaluation if nothing can be referenced.
                let target = self.resolve_autoreference(symbol.output_type(), key, self.nodes.len())?;
                height = self.nodes[target].height + 1;
                Leaf::Reference(key)
            }
            SymbolKind::Composite => {
                return Err(GenomusError::LeafNotAccepted(symbol.name().to_string()));
            }
        };
        self.push(symbol, Vec::new(), leaf, height)
    }

    /// Applies a list `symbol` to its literal elements.
    pub fn new_list(&mut self, symbol: Symbol, values: &[f64]) -> Result<NodeIndex> {
        if symbol.kind() != SymbolKind::List {
            return Err(GenomusError::LeafNotAccepted(symbol.name().to_string()));
        }
        if values.is_empty() {
            return Err(GenomusError::LeafRequired(symbol.name().to_string()));
        }
        self.push(symbol, Vec::new(), Leaf::Values(values.to_vec()), 0)
    }

    fn push(
        &mut self,
        symbol: Symbol,
        children: Vec<NodeIndex>,
        leaf: Leaf,
        height: usize,
    ) -> Result<NodeIndex> {
        if height > MAX_TREE_HEIGHT {
            return Err(GenomusError::Generation(format!(
                "{} would nest {} levels deep, the limit is {}",
                symbol.name(),
                height,
                MAX_TREE_HEIGHT
            )));
        }
        let index = self.nodes.len();
        self.nodes.push(TreeNode {
            symbol,
            children,
            leaf,
            creation_index: index,
            height,
        });
        self.subexpressions
            .entry(symbol.output_type())
            .or_default()
            .push(index);
        Ok(index)
    }

    fn check_arity(&self, symbol: Symbol, actual: usize, expected: usize) -> Result<()> {
        if actual != expected {
            return Err(GenomusError::Arity {
                function: symbol.name().to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn check_children(&self, symbol: Symbol, children: &[NodeIndex]) -> Result<()> {
        let expected = symbol.parameter_types();
        self.check_arity(symbol, children.len(), expected.len())?;

        for (&child, &expected_type) in children.iter().zip(expected) {
            let actual_type = self.node(child)?.symbol.output_type();
            if actual_type != expected_type {
                return Err(GenomusError::TypeMismatch {
                    expected: expected_type.to_string(),
                    actual: actual_type.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Subexpressions of type `ty` created strictly before `creation_index`.
    pub fn eligible_subexpressions(&self, ty: GenotypeType, creation_index: usize) -> &[NodeIndex] {
        let available = self.subexpressions.get(&ty).map(Vec::as_slice).unwrap_or(&[]);
        let end = available.partition_point(|&index| index < creation_index);
        &available[..end]
    }

    /// Target of an autoreference with `key` created at `creation_index`.
    pub fn resolve_autoreference(
        &self,
        ty: GenotypeType,
        key: usize,
        creation_index: usize,
    ) -> Result<NodeIndex> {
        let eligible = self.eligible_subexpressions(ty, creation_index);
        if eligible.is_empty() {
            return Err(GenomusError::Reference(format!(
                "no {} subexpression available before node {}",
                ty, creation_index
            )));
        }
        Ok(eligible[key % eligible.len()])
    }

    /// Computes the encoded phenotype of the subtree rooted at `index`.
    ///
    /// Random nodes sample once and keep their value, so repeated evaluations
    /// of the same tree agree.
    pub fn evaluate(&mut self, index: NodeIndex) -> Result<EncodedPhenotype> {
        let node = self.node(index)?;
        let symbol = node.symbol;
        let leaf = node.leaf.clone();
        let children = node.children.clone();

        match (leaf, symbol.kind()) {
            (Leaf::Value(raw), SymbolKind::Parameter) => Ok(symbol.compute_parameter(raw)),
            (Leaf::Values(raw), SymbolKind::List) => Ok(symbol.compute_list(&raw)),
            (Leaf::Random(Some(sampled)), SymbolKind::Random) => Ok(symbol.compute_random(sampled)),
            (Leaf::Random(None), SymbolKind::Random) => {
                let sampled = round_to_6_decimals(self.rng.gen::<f64>());
                self.nodes[index].leaf = Leaf::Random(Some(sampled));
                Ok(symbol.compute_random(sampled))
            }
            (Leaf::Reference(key), SymbolKind::Autoreference) => {
                let target = self.resolve_autoreference(symbol.output_type(), key, index)?;
                self.evaluate(target)
            }
            (Leaf::None, SymbolKind::Composite) => {
                let values = children
                    .into_iter()
                    .map(|child| self.evaluate(child))
                    .collect::<Result<Vec<_>>>()?;
                symbol.compute(values)
            }
            (leaf, kind) => Err(GenomusError::Generation(format!(
                "{} ({:?}) holds an inconsistent leaf {:?}",
                symbol.name(),
                kind,
                leaf
            ))),
        }
    }

    /// Self-delimiting numeric encoding of the subtree rooted at `index`.
    pub fn to_normalized_vector(&mut self, index: NodeIndex) -> Result<Vec<f64>> {
        let mut out = Vec::new();
        self.write_normalized(index, &mut out)?;
        Ok(out)
    }

    fn write_normalized(&mut self, index: NodeIndex, out: &mut Vec<f64>) -> Result<()> {
        let node = self.node(index)?;
        let symbol = node.symbol;
        let children = node.children.clone();
        let marker = symbol.output_type().marker();

        out.push(1.0);
        out.push(symbol.encoded_index());

        match symbol.kind() {
            SymbolKind::Parameter | SymbolKind::Random => {
                let parameter = self.evaluate(index)?.into_parameter()?;
                out.extend(marker);
                out.push(parameter.value);
            }
            SymbolKind::List => {
                for parameter in self.evaluate(index)?.into_list()? {
                    out.extend(marker);
                    out.push(parameter.value);
                }
            }
            SymbolKind::Composite => {
                for child in children {
                    self.write_normalized(child, out)?;
                }
            }
            // Implicit in the derivation, nothing to encode.
            SymbolKind::Autoreference => {}
        }

        out.push(0.0);
        Ok(())
    }

    /// Textual form `name(args, ...)` of the subtree rooted at `index`.
    pub fn expression(&self, index: NodeIndex) -> Result<String> {
        let mut out = String::new();
        self.write_expression(index, &mut out)?;
        Ok(out)
    }

    fn write_expression(&self, index: NodeIndex, out: &mut String) -> Result<()> {
        let node = self.node(index)?;
        out.push_str(node.symbol.name());
        out.push('(');
        match &node.leaf {
            Leaf::None => {
                for (position, &child) in node.children.iter().enumerate() {
                    if position > 0 {
                        out.push_str(", ");
                    }
                    self.write_expression(child, out)?;
                }
            }
            Leaf::Value(value) | Leaf::Random(Some(value)) => out.push_str(&format_number(*value)),
            Leaf::Values(values) => {
                let values: Vec<String> = values.iter().map(|&v| format_number(v)).collect();
                out.push_str(&values.join(", "));
            }
            Leaf::Random(None) => {}
            Leaf::Reference(key) => out.push_str(&key.to_string()),
        }
        out.push(')');
        Ok(())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// A genotype tree together with the arena that owns it.
pub struct DecodedGenotype {
    pub arena: Arena,
    pub root: NodeIndex,
}

impl DecodedGenotype {
    pub fn new(arena: Arena, root: NodeIndex) -> Self {
        Self { arena, root }
    }

    pub fn evaluate(&mut self) -> Result<EncodedPhenotype> {
        self.arena.evaluate(self.root)
    }

    pub fn to_normalized_vector(&mut self) -> Result<Vec<f64>> {
        self.arena.to_normalized_vector(self.root)
    }

    pub fn expression(&self) -> Result<String> {
        self.arena.expression(self.root)
    }
}

impl fmt::Display for DecodedGenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expression = self.expression().map_err(|_| fmt::Error)?;
        f.write_str(&expression)
    }
}
