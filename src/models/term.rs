use serde::{Deserialize, Serialize};

/// Prefix reserved for constants generated during quantifier expansion.
/// The surface parser rejects user constants carrying it, so generated
/// witnesses can never shadow input vocabulary.
pub const FRESH_PREFIX: &str = "c_";

/// A first-order term: either a variable bound by a restricted quantifier
/// or a ground constant. There are no function symbols; constants are the
/// only 0-ary terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl Term {
    /// Build a variable term.
    pub fn variable(name: impl Into<String>) -> Term {
        Term::Variable(name.into())
    }

    /// Build a constant term.
    pub fn constant(name: impl Into<String>) -> Term {
        Term::Constant(name.into())
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Constant(_))
    }

    /// The identifier, independent of the variable/constant distinction.
    pub fn name(&self) -> &str {
        match self {
            Term::Variable(name) | Term::Constant(name) => name,
        }
    }

    /// Whether this is a generated witness constant rather than one taken
    /// from the input vocabulary.
    pub fn is_fresh_constant(&self) -> bool {
        matches!(self, Term::Constant(name) if name.starts_with(FRESH_PREFIX))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
