//! Weak-Kleene truth tables and bilateral truth values.
//!
//! `Undefined` is absorbing for every binary connective: a single undefined
//! operand makes the whole compound undefined, even `True | Undefined`.
//! This is what separates weak Kleene from strong Kleene and it is the
//! reason almost nothing is valid in the "never nontrue" sense. These
//! functions feed rule-soundness checks and model verification only; the
//! expansion loop itself never evaluates a formula.

use serde::{Deserialize, Serialize};

/// The three truth values of weak Kleene logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruthValue {
    True,
    False,
    Undefined,
}

impl TruthValue {
    pub const ALL: [TruthValue; 3] = [TruthValue::True, TruthValue::False, TruthValue::Undefined];

    pub fn is_defined(&self) -> bool {
        *self != TruthValue::Undefined
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TruthValue::True => "t",
            TruthValue::False => "f",
            TruthValue::Undefined => "e",
        };
        f.write_str(s)
    }
}

/// Three-valued negation: the classical swap with `Undefined` fixed.
pub fn neg(v: TruthValue) -> TruthValue {
    match v {
        TruthValue::True => TruthValue::False,
        TruthValue::False => TruthValue::True,
        TruthValue::Undefined => TruthValue::Undefined,
    }
}

/// Weak-Kleene conjunction.
pub fn and(a: TruthValue, b: TruthValue) -> TruthValue {
    if !a.is_defined() || !b.is_defined() {
        TruthValue::Undefined
    } else if a == TruthValue::True && b == TruthValue::True {
        TruthValue::True
    } else {
        TruthValue::False
    }
}

/// Weak-Kleene disjunction.
pub fn or(a: TruthValue, b: TruthValue) -> TruthValue {
    if !a.is_defined() || !b.is_defined() {
        TruthValue::Undefined
    } else if a == TruthValue::True || b == TruthValue::True {
        TruthValue::True
    } else {
        TruthValue::False
    }
}

/// Weak-Kleene material implication.
pub fn implies(a: TruthValue, b: TruthValue) -> TruthValue {
    or(neg(a), b)
}

/// Paired positive and negative evidence for a bilateral predicate.
///
/// The four classically meaningful combinations: `<t,f>` verified, `<f,t>`
/// refuted, `<t,t>` glut (conflicting evidence, tolerated by ACrQ) and
/// `<f,f>` gap (no evidence either way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BilateralTruthValue {
    pub positive: TruthValue,
    pub negative: TruthValue,
}

impl BilateralTruthValue {
    pub fn new(positive: TruthValue, negative: TruthValue) -> Self {
        Self { positive, negative }
    }

    pub fn verified() -> Self {
        Self::new(TruthValue::True, TruthValue::False)
    }

    pub fn refuted() -> Self {
        Self::new(TruthValue::False, TruthValue::True)
    }

    pub fn glut() -> Self {
        Self::new(TruthValue::True, TruthValue::True)
    }

    pub fn gap() -> Self {
        Self::new(TruthValue::False, TruthValue::False)
    }

    pub fn is_glut(&self) -> bool {
        self.positive == TruthValue::True && self.negative == TruthValue::True
    }

    pub fn is_gap(&self) -> bool {
        self.positive == TruthValue::False && self.negative == TruthValue::False
    }
}

impl std::fmt::Display for BilateralTruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{},{}>", self.positive, self.negative)
    }
}
