//! The tableau rule schema.
//!
//! A [`Rule`] is a value describing one expansion step: a name for the
//! trace, one conclusion list per branch the premise splits into, and the
//! constant the step consumed, if any. Rules are produced by the
//! logic-specific selectors in [`wkrq`] and [`acrq`] and applied by the
//! engine; nothing here mutates a branch.

pub mod acrq;
pub mod wkrq;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::signs::SignedFormula;

/// Oracle verdicts are injected before anything else so that atomic
/// refutations land before costly splits.
pub const PRIORITY_ORACLE: u8 = 5;
pub const PRIORITY_ALPHA: u8 = 10;
pub const PRIORITY_BETA: u8 = 20;

/// Which calculus drives rule selection and the closure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    Wkrq,
    Acrq,
}

impl Logic {
    /// ACrQ tolerates `t: p(t̄)` together with `t: p*(t̄)` (a glut); wKrQ
    /// closes on that pair.
    pub fn glut_tolerant(&self) -> bool {
        matches!(self, Logic::Acrq)
    }

    /// Select the rule for a signed formula, if any applies.
    pub fn rule_for(&self, sf: &SignedFormula, ctx: &mut RuleContext<'_>) -> Option<Rule> {
        match self {
            Logic::Wkrq => wkrq::rule_for(sf, ctx),
            Logic::Acrq => acrq::rule_for(sf, ctx),
        }
    }
}

impl Default for Logic {
    fn default() -> Self {
        Logic::Wkrq
    }
}

impl std::fmt::Display for Logic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Logic::Wkrq => f.write_str("wKrQ"),
            Logic::Acrq => f.write_str("ACrQ"),
        }
    }
}

/// Non-branching rules extend the current branch; branching rules split it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Alpha,
    Beta,
}

/// Everything a rule selector needs from the branch it is selecting for.
pub struct RuleContext<'a> {
    /// Constants occurring anywhere on the branch, in lexicographic order.
    pub constants: &'a BTreeSet<String>,
    /// Constants already consumed by this premise on this branch (tracked
    /// for the lazily instantiated quantifier rules).
    pub used: Option<&'a BTreeSet<String>>,
    /// Allocator for a fresh witness constant. Calling it does not commit
    /// the name; the engine registers it only when the rule is applied.
    pub fresh: &'a mut dyn FnMut() -> String,
}

impl RuleContext<'_> {
    /// The smallest branch constant this premise has not yet consumed.
    fn next_unused(&self) -> Option<String> {
        self.constants
            .iter()
            .find(|c| self.used.map_or(true, |used| !used.contains(*c)))
            .cloned()
    }
}

/// One applicable expansion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    /// One inner list per resulting branch; a single list makes the rule α.
    pub conclusions: Vec<Vec<SignedFormula>>,
    pub priority: u8,
    /// Witness constant introduced by this step (existential-type rules).
    pub fresh_constant: Option<String>,
    /// Branch constant consumed by this step (universal-type rules). Rules
    /// carrying this are re-applicable whenever unconsumed constants remain.
    pub reused_constant: Option<String>,
}

impl Rule {
    pub fn alpha(name: impl Into<String>, conclusions: Vec<SignedFormula>) -> Rule {
        Rule {
            name: name.into(),
            conclusions: vec![conclusions],
            priority: PRIORITY_ALPHA,
            fresh_constant: None,
            reused_constant: None,
        }
    }

    pub fn beta(name: impl Into<String>, conclusions: Vec<Vec<SignedFormula>>) -> Rule {
        Rule {
            name: name.into(),
            conclusions,
            priority: PRIORITY_BETA,
            fresh_constant: None,
            reused_constant: None,
        }
    }

    pub fn with_fresh(mut self, constant: impl Into<String>) -> Rule {
        self.fresh_constant = Some(constant.into());
        self
    }

    pub fn with_reused(mut self, constant: impl Into<String>) -> Rule {
        self.reused_constant = Some(constant.into());
        self
    }

    pub fn kind(&self) -> RuleKind {
        if self.conclusions.len() > 1 {
            RuleKind::Beta
        } else {
            RuleKind::Alpha
        }
    }

    pub fn is_branching(&self) -> bool {
        self.kind() == RuleKind::Beta
    }

    /// Tie-breaker after priority: smaller expansions first.
    pub fn complexity_cost(&self) -> usize {
        self.conclusions.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::formula::Formula;
    use crate::models::signs::Sign;

    fn sf(sign: Sign, text: &str) -> SignedFormula {
        SignedFormula::new(sign, Formula::parse(text).unwrap())
    }

    #[test]
    fn test_kind_follows_conclusion_count() {
        let alpha = Rule::alpha("t-conjunction", vec![sf(Sign::T, "P"), sf(Sign::T, "Q")]);
        assert_eq!(alpha.kind(), RuleKind::Alpha);
        assert!(!alpha.is_branching());

        let beta = Rule::beta(
            "m-split",
            vec![vec![sf(Sign::T, "P")], vec![sf(Sign::F, "P")]],
        );
        assert_eq!(beta.kind(), RuleKind::Beta);
        assert_eq!(beta.complexity_cost(), 2);
    }

    #[test]
    fn test_priorities_order_oracle_first() {
        assert!(PRIORITY_ORACLE < PRIORITY_ALPHA);
        assert!(PRIORITY_ALPHA < PRIORITY_BETA);
    }
}
