pub mod library;
pub mod mapping;
pub mod registry;

pub use library::{Symbol, SymbolKind, GENOTYPE_FUNCTIONS};
pub use registry::FunctionRegistry;
