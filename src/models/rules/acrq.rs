//! The ACrQ specialization (Ferguson's Definition 18).
//!
//! ACrQ replaces negation elimination on predicates with bilateral duality:
//! a negated atom rewrites, sign unchanged, to the dual predicate
//! (`~p(t̄)` to `p*(t̄)`, `~p*(t̄)` back to `p(t̄)`). The rewrite happens at
//! rule-application time, never in the syntax tree. Negation over compound
//! formulas, all connective rules and all quantifier rules fall through to
//! the wKrQ schema unchanged; what makes the logic paraconsistent is this
//! rewrite together with the glut-tolerant closure policy.

use crate::models::formula::Formula;
use crate::models::signs::{Sign, SignedFormula};

use super::{wkrq, Rule, RuleContext};

pub(crate) fn rule_for(sf: &SignedFormula, ctx: &mut RuleContext<'_>) -> Option<Rule> {
    if sf.sign != Sign::V {
        if let Formula::Not(inner) = sf.formula.as_ref() {
            if let Formula::Atom(atom) = inner.as_ref() {
                let name = format!("{}-bilateral-negation", sf.sign);
                let dual = SignedFormula::new(sf.sign, Formula::Atom(atom.dual()));
                return Some(Rule::alpha(name, vec![dual]));
            }
        }
    }
    wkrq::rule_for(sf, ctx)
}
