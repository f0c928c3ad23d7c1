use serde::{Deserialize, Serialize};

use super::formula::{Formula, SharedFormula};
use super::semantics::TruthValue;

/// The six tableau signs of Ferguson's calculus.
///
/// `T`, `F` and `E` are the definite signs: they pin a formula to a single
/// truth value and are the only signs that participate in branch closure.
/// `M` ("meaningful", true or false) and `N` ("nontrue", false or undefined)
/// are decomposed by branching rules, never by closure. `V` is a non-closing
/// marker recording that an oracle found no evidence either way; no logical
/// rule ever introduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    T,
    F,
    E,
    M,
    N,
    V,
}

impl Sign {
    /// The signs that pin a single truth value: `t`, `f`, `e`.
    pub const DEFINITE: [Sign; 3] = [Sign::T, Sign::F, Sign::E];

    /// Whether this sign takes part in the closure probe.
    pub fn is_definite(&self) -> bool {
        matches!(self, Sign::T | Sign::F | Sign::E)
    }

    /// Two distinct definite signs on the same formula close a branch.
    pub fn contradicts(&self, other: Sign) -> bool {
        *self != other && self.is_definite() && other.is_definite()
    }

    /// Whether a truth value satisfies the claim this sign makes.
    pub fn admits(&self, value: TruthValue) -> bool {
        match self {
            Sign::T => value == TruthValue::True,
            Sign::F => value == TruthValue::False,
            Sign::E => value == TruthValue::Undefined,
            Sign::M => value != TruthValue::Undefined,
            Sign::N => value != TruthValue::True,
            Sign::V => true,
        }
    }

    /// The definite sign asserting exactly `value`.
    pub fn for_value(value: TruthValue) -> Sign {
        match value {
            TruthValue::True => Sign::T,
            TruthValue::False => Sign::F,
            TruthValue::Undefined => Sign::E,
        }
    }

    /// Dense index used by the per-sign branch maps.
    pub(crate) fn index(&self) -> usize {
        match self {
            Sign::T => 0,
            Sign::F => 1,
            Sign::E => 2,
            Sign::M => 3,
            Sign::N => 4,
            Sign::V => 5,
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sign::T => "t",
            Sign::F => "f",
            Sign::E => "e",
            Sign::M => "m",
            Sign::N => "n",
            Sign::V => "v",
        };
        f.write_str(s)
    }
}

/// A formula labelled with a sign; the unit of information on a branch.
/// Equality is structural over both components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignedFormula {
    pub sign: Sign,
    pub formula: SharedFormula,
}

impl SignedFormula {
    pub fn new(sign: Sign, formula: Formula) -> SignedFormula {
        SignedFormula { sign, formula: formula.shared() }
    }

    pub fn from_shared(sign: Sign, formula: SharedFormula) -> SignedFormula {
        SignedFormula { sign, formula }
    }

    pub fn is_atomic(&self) -> bool {
        self.formula.is_atomic()
    }
}

impl std::fmt::Display for SignedFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.sign, self.formula)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definite_signs_contradict_each_other() {
        assert!(Sign::T.contradicts(Sign::F));
        assert!(Sign::T.contradicts(Sign::E));
        assert!(Sign::F.contradicts(Sign::E));
        assert!(!Sign::T.contradicts(Sign::T));
    }

    #[test]
    fn test_meta_signs_never_contradict() {
        // m overlaps n on f; neither may close a branch.
        assert!(!Sign::M.contradicts(Sign::N));
        assert!(!Sign::M.contradicts(Sign::T));
        assert!(!Sign::N.contradicts(Sign::E));
        assert!(!Sign::V.contradicts(Sign::T));
        assert!(!Sign::T.contradicts(Sign::V));
    }

    #[test]
    fn test_admits() {
        assert!(Sign::M.admits(TruthValue::True));
        assert!(Sign::M.admits(TruthValue::False));
        assert!(!Sign::M.admits(TruthValue::Undefined));
        assert!(Sign::N.admits(TruthValue::False));
        assert!(Sign::N.admits(TruthValue::Undefined));
        assert!(!Sign::N.admits(TruthValue::True));
        assert!(Sign::V.admits(TruthValue::Undefined));
    }

    #[test]
    fn test_signed_formula_equality() {
        let a = SignedFormula::new(Sign::T, Formula::parse("P & Q").unwrap());
        let b = SignedFormula::new(Sign::T, Formula::parse("P & Q").unwrap());
        let c = SignedFormula::new(Sign::F, Formula::parse("P & Q").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let sf = SignedFormula::new(Sign::N, Formula::parse("P | ~P").unwrap());
        assert_eq!(sf.to_string(), "n: P | ~P");
    }
}
