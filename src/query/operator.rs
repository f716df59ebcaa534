//! Boolean operator and grouping tokens.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A token the query builder can append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
    Not,
    OpenParen,
    CloseParen,
}

impl Operator {
    /// Every operator, in the order they are offered to the user
    pub const ALL: [Operator; 5] = [
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::OpenParen,
        Operator::CloseParen,
    ];

    /// Text inserted into the query
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::OpenParen => "(",
            Operator::CloseParen => ")",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text is not one of the operator tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Operator::And),
            "OR" => Ok(Operator::Or),
            "NOT" => Ok(Operator::Not),
            "(" => Ok(Operator::OpenParen),
            ")" => Ok(Operator::CloseParen),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("and".parse::<Operator>(), Ok(Operator::And));
        assert_eq!(" Not ".parse::<Operator>(), Ok(Operator::Not));
        assert_eq!("(".parse::<Operator>(), Ok(Operator::OpenParen));
        assert!("XOR".parse::<Operator>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for op in Operator::ALL {
            assert_eq!(op.to_string().parse::<Operator>(), Ok(op));
        }
    }
}
