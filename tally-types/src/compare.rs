//! Predicate comparison operators.

use std::fmt;
use std::str::FromStr;

use tally_result::Error;

/// Comparison operators the optimizer asks selectivity questions about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::NotEq,
        CompareOp::Lt,
        CompareOp::LtEq,
        CompareOp::Gt,
        CompareOp::GtEq,
    ];

    /// Render the operator as a human-readable symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::NotEq),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::LtEq),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::GtEq),
            other => Err(Error::InvalidArgumentError(format!(
                "unknown comparison operator '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_parse_back() {
        for op in CompareOp::ALL {
            assert_eq!(op.as_str().parse::<CompareOp>().unwrap(), op);
        }
        assert_eq!("<>".parse::<CompareOp>().unwrap(), CompareOp::NotEq);
        assert!("LIKE".parse::<CompareOp>().is_err());
    }
}
