use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

impl Token {
    pub fn new(address: Address, decimals: u8, symbol: &str) -> Self {
        Self {
            address,
            decimals,
            symbol: symbol.to_string(),
        }
    }

    pub fn same_asset(&self, other: &Token) -> bool {
        self.address == other.address
    }

    /// Whether this token is `currency0` of a pool paired with `other`.
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "{}", self.address)
        } else {
            f.write_str(&self.symbol)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("swap path needs at least 2 tokens, got {0}")]
    TooShort(usize),
    #[error("swap path repeats {token} at hop {index}")]
    ConsecutiveDuplicate { token: Address, index: usize },
}

/// Ordered hop sequence for one candidate: at least two tokens and no
/// token immediately followed by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPath(Vec<Token>);

impl SwapPath {
    pub fn new(tokens: Vec<Token>) -> Result<Self, PathError> {
        if tokens.len() < 2 {
            return Err(PathError::TooShort(tokens.len()));
        }
        if let Some(index) = tokens
            .windows(2)
            .position(|pair| pair[0].same_asset(&pair[1]))
        {
            return Err(PathError::ConsecutiveDuplicate {
                token: tokens[index].address,
                index,
            });
        }
        Ok(Self(tokens))
    }

    pub fn direct(token_in: &Token, token_out: &Token) -> Result<Self, PathError> {
        Self::new(vec![token_in.clone(), token_out.clone()])
    }

    pub fn via(token_in: &Token, bridge: &Token, token_out: &Token) -> Result<Self, PathError> {
        Self::new(vec![token_in.clone(), bridge.clone(), token_out.clone()])
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn hop_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_direct(&self) -> bool {
        self.0.len() == 2
    }

    pub fn token_in(&self) -> &Token {
        &self.0[0]
    }

    pub fn token_out(&self) -> &Token {
        &self.0[self.0.len() - 1]
    }

    /// Iterate `(token_in, token_out)` pairs in hop order.
    pub fn hops(&self) -> impl Iterator<Item = (&Token, &Token)> {
        self.0.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.0
    }
}

impl fmt::Display for SwapPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        f.write_str(&names.join(" -> "))
    }
}
