pub mod parser;

pub use parser::{Parser, DEFAULT_EXPRESSION};
