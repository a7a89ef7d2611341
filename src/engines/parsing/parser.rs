use crate::config::GenotypeConfig;
use crate::engines::generation::arena::{Arena, DecodedGenotype, NodeIndex};
use crate::error::{GenomusError, Result};
use crate::functions::library::{Symbol, SymbolKind};
use crate::functions::registry::FunctionRegistry;

/// Genotype produced by an empty expression.
pub const DEFAULT_EXPRESSION: &str = "s(v(e_piano(n(0.25), m(60), a(100), i(64))))";

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Comma,
    Word(String),
}

/// Call tree before any name is resolved.
#[derive(Debug, Clone, PartialEq)]
struct TokenNode {
    word: String,
    children: Vec<TokenNode>,
}

impl TokenNode {
    fn is_number(&self) -> bool {
        self.children.is_empty() && is_number(&self.word)
    }
}

/// `-?[0-9]+(\.[0-9]+)?`
fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(integer) && fraction.map_or(true, all_digits)
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    };

    for c in text.chars() {
        match c {
            '(' | ')' | ',' => {
                flush(&mut word, &mut tokens);
                tokens.push(match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    _ => Token::Comma,
                });
            }
            '{' | '}' => {}
            c if c.is_whitespace() => {}
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn check_balance(tokens: &[Token]) -> Result<()> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(GenomusError::UnbalancedParenthesis)?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GenomusError::UnbalancedParenthesis);
    }
    Ok(())
}

struct TokenReader {
    tokens: Vec<Token>,
    position: usize,
    max_depth: usize,
}

impl TokenReader {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    /// Reads the call at `depth`. Numbers sit one level below their
    /// function and do not count towards `max_depth`.
    fn node(&mut self, depth: usize) -> Result<TokenNode> {
        let word = match self.bump() {
            Some(Token::Word(word)) => word,
            Some(other) => {
                return Err(GenomusError::Parse(format!(
                    "expected a name or number, found {:?}",
                    other
                )))
            }
            None => return Err(GenomusError::Parse("unexpected end of expression".to_string())),
        };

        let mut children = Vec::new();
        if self.peek() == Some(&Token::Open) {
            if depth > self.max_depth {
                return Err(GenomusError::Parse(format!(
                    "expression nested too deeply, the limit is {}",
                    self.max_depth
                )));
            }
            self.bump();
            if self.peek() == Some(&Token::Close) {
                self.bump();
            } else {
                loop {
                    children.push(self.node(depth + 1)?);
                    match self.bump() {
                        Some(Token::Comma) => continue,
                        Some(Token::Close) => break,
                        _ => {
                            return Err(GenomusError::Parse(format!(
                                "expected ',' or ')' in the arguments of {}",
                                word
                            )))
                        }
                    }
                }
            }
        }
        Ok(TokenNode { word, children })
    }
}

/// Builds genotype trees from textual expressions.
pub struct Parser<'r> {
    registry: &'r FunctionRegistry,
    max_depth: usize,
}

impl<'r> Parser<'r> {
    /// Parser accepting the nesting of the default genotype limits.
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self::with_max_depth(registry, GenotypeConfig::default().nesting_limit())
    }

    /// Parser rejecting expressions nested deeper than `max_depth`, the root
    /// being at depth 0.
    pub fn with_max_depth(registry: &'r FunctionRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    /// Parses `text` into `arena` and returns the root node.
    ///
    /// On error the arena is left as it was found.
    pub fn parse_into(&self, arena: &mut Arena, text: &str) -> Result<NodeIndex> {
        let root = self.token_tree(text)?;
        let mark = arena.len();
        self.build(arena, &root).map_err(|e| {
            log::debug!("Discarding {} nodes of a failed parse", arena.len() - mark);
            arena.truncate(mark);
            e
        })
    }

    /// Parses `text` into `arena` and hands both back as a genotype.
    pub fn parse_genotype(&self, text: &str, mut arena: Arena) -> Result<DecodedGenotype> {
        let root = self.parse_into(&mut arena, text)?;
        Ok(DecodedGenotype::new(arena, root))
    }

    /// Parses `text` into a fresh arena.
    pub fn parse(&self, text: &str) -> Result<DecodedGenotype> {
        self.parse_genotype(text, Arena::new())
    }

    fn token_tree(&self, text: &str) -> Result<TokenNode> {
        let mut tokens = tokenize(text);
        if tokens.is_empty() {
            log::debug!("Empty expression, using {}", DEFAULT_EXPRESSION);
            tokens = tokenize(DEFAULT_EXPRESSION);
        }
        check_balance(&tokens)?;

        let mut reader = TokenReader {
            tokens,
            position: 0,
            max_depth: self.max_depth,
        };
        let root = reader.node(0)?;
        if reader.position < reader.tokens.len() {
            return Err(GenomusError::Parse(
                "expression has more than one root".to_string(),
            ));
        }
        Ok(root)
    }

    /// Token trees come from `token_tree`, so the recursion is bounded by
    /// `max_depth`.
    fn build(&self, arena: &mut Arena, node: &TokenNode) -> Result<NodeIndex> {
        if node.is_number() {
            return Err(GenomusError::Parse(format!(
                "number {} where a function was expected",
                node.word
            )));
        }
        let symbol = self
            .registry
            .get_function(&node.word)
            .ok_or_else(|| GenomusError::UnknownFunction(node.word.clone()))?;

        if node.children.is_empty() {
            return arena.new_node(symbol, &[]);
        }

        let numbers = node.children.iter().filter(|c| c.is_number()).count();
        if numbers == node.children.len() {
            let values = node
                .children
                .iter()
                .map(|c| {
                    c.word
                        .parse::<f64>()
                        .map_err(|e| GenomusError::Parse(format!("{}: {}", c.word, e)))
                })
                .collect::<Result<Vec<f64>>>()?;
            return self.build_leaf(arena, symbol, &values);
        }
        if numbers > 0 {
            return Err(GenomusError::Parse(format!(
                "{} mixes numbers with subexpressions",
                symbol.name()
            )));
        }

        let children = node
            .children
            .iter()
            .map(|child| self.build(arena, child))
            .collect::<Result<Vec<_>>>()?;
        arena.new_node(symbol, &children)
    }

    fn build_leaf(&self, arena: &mut Arena, symbol: Symbol, values: &[f64]) -> Result<NodeIndex> {
        match values {
            [value] => arena.new_leaf(symbol, *value),
            _ if symbol.kind() == SymbolKind::List => arena.new_list(symbol, values),
            _ if symbol.accepts_leaf() => Err(GenomusError::Arity {
                function: symbol.name().to_string(),
                expected: 1,
                actual: values.len(),
            }),
            _ => Err(GenomusError::LeafNotAccepted(symbol.name().to_string())),
        }
    }
}
