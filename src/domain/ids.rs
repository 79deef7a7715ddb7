//! Domain identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome token identifier on the exchange.
///
/// The inner String is private so construction goes through the defined
/// constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Catalog market identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MarketId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// On-chain condition identifier (0x-prefixed 32-byte hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(String);

impl ConditionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConditionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ConditionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_new_and_as_str() {
        let id = TokenId::new("test-token");
        assert_eq!(id.as_str(), "test-token");
    }

    #[test]
    fn token_id_display() {
        let id = TokenId::new("display-test");
        assert_eq!(format!("{}", id), "display-test");
    }

    #[test]
    fn market_id_from_string() {
        let id = MarketId::from("12345".to_string());
        assert_eq!(id.as_str(), "12345");
    }

    #[test]
    fn condition_id_roundtrip() {
        let id = ConditionId::new("0xabc123");
        assert_eq!(id.as_str(), "0xabc123");
        assert_eq!(format!("{}", id), "0xabc123");
    }
}
