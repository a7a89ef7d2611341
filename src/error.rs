use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenomusError {
    #[error("Already existing function index {index} for {name}")]
    DuplicateIndex { name: String, index: f64 },

    #[error("Missing default function for type {0}")]
    MissingDefault(String),

    #[error("Found more than one default function for type {ty}: {names:?}")]
    DuplicateDefault { ty: String, names: Vec<String> },

    #[error("There can only be one autoreference function per type ({0})")]
    DuplicateAutoreference(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Bad arity for {function}: expected {expected} children, got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Function {0} does not accept a numeric leaf")]
    LeafNotAccepted(String),

    #[error("Function {0} requires a numeric leaf")]
    LeafRequired(String),

    #[error("Unknown node index {0}")]
    UnknownNode(usize),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Format error at position {position}: {message}")]
    Format { position: usize, message: String },

    #[error("Cannot derive a genotype from an empty vector")]
    EmptyVector,

    #[error("Bad parser entry: unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("Bad parser entry: unknown function name: {0}")]
    UnknownFunction(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GenomusError {
    pub fn format(position: usize, message: impl Into<String>) -> Self {
        GenomusError::Format {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenomusError>;
