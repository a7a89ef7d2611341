//! Genotype encoding for algorithmic composition.
//!
//! A germinal vector of reals is derived into a typed function tree (the
//! genotype), which evaluates to an encoded phenotype of scores, voices and
//! events. Genotypes travel as normalized vectors or as textual expressions.

pub mod config;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;
pub mod utils;

pub use error::{GenomusError, Result};
pub use types::GenotypeType;
