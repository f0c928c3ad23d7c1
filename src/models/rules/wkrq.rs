//! The wKrQ rule schema (Ferguson's Definition 9).
//!
//! Rules are indexed by `(sign, outermost shape)`. The `t`-disjunction and
//! `t`-implication rules carry a third branch signing both sides `e`;
//! dropping it loses countermodels that live entirely in the undefined row
//! of the weak-Kleene tables. The `e` rules for binary connectives branch on
//! which side is undefined, recording "the other side is meaningful" with an
//! `m` companion so the two branches stay disjoint. `m` and `n` decompose
//! through negation by swapping into each other and split into their
//! definite readings everywhere else.

use crate::models::formula::{Formula, Quantified};
use crate::models::signs::{Sign, SignedFormula};

use super::{Rule, RuleContext};

pub(crate) fn rule_for(sf: &SignedFormula, ctx: &mut RuleContext<'_>) -> Option<Rule> {
    use Formula as Fm;
    use Sign::*;

    let t = |f: &Formula| SignedFormula::new(T, f.clone());
    let f_ = |f: &Formula| SignedFormula::new(F, f.clone());
    let e = |f: &Formula| SignedFormula::new(E, f.clone());

    match (sf.sign, sf.formula.as_ref()) {
        // v records an oracle gap; nothing decomposes it.
        (V, _) => None,

        (sign, Fm::Not(inner)) => negation(sign, inner),

        (T, Fm::And(l, r)) => Some(Rule::alpha("t-conjunction", vec![t(l), t(r)])),
        (F, Fm::And(l, r)) => Some(Rule::beta(
            "f-conjunction",
            vec![vec![f_(l)], vec![f_(r)], vec![e(l), e(r)]],
        )),
        (E, Fm::And(l, r)) => Some(e_binary("e-conjunction", l, r)),

        (T, Fm::Or(l, r)) => Some(Rule::beta(
            "t-disjunction",
            vec![vec![t(l)], vec![t(r)], vec![e(l), e(r)]],
        )),
        (F, Fm::Or(l, r)) => Some(Rule::alpha("f-disjunction", vec![f_(l), f_(r)])),
        (E, Fm::Or(l, r)) => Some(e_binary("e-disjunction", l, r)),

        (T, Fm::Implies(l, r)) => Some(Rule::beta(
            "t-implication",
            vec![vec![f_(l)], vec![t(r)], vec![e(l), e(r)]],
        )),
        (F, Fm::Implies(l, r)) => Some(Rule::alpha("f-implication", vec![t(l), f_(r)])),
        (E, Fm::Implies(l, r)) => Some(e_binary("e-implication", l, r)),

        // A true existential names a fresh witness satisfying both parts.
        (T, Fm::Exists(q)) => {
            let c = (ctx.fresh)();
            let (restriction, matrix) = instantiated(q, &c);
            Some(
                Rule::alpha(
                    "t-restricted-exists",
                    vec![SignedFormula::new(T, restriction), SignedFormula::new(T, matrix)],
                )
                .with_fresh(c),
            )
        }
        // A false existential is refuted one branch constant at a time,
        // lazily, under the same fairness memo as the true universal.
        (F, Fm::Exists(q)) => {
            let c = ctx.next_unused()?;
            let (restriction, matrix) = instantiated(q, &c);
            Some(
                Rule::beta(
                    "f-restricted-exists",
                    vec![
                        vec![SignedFormula::new(F, restriction)],
                        vec![SignedFormula::new(F, matrix)],
                    ],
                )
                .with_reused(c),
            )
        }
        (T, Fm::Forall(q)) => {
            let c = ctx.next_unused()?;
            let (restriction, matrix) = instantiated(q, &c);
            Some(
                Rule::beta(
                    "t-restricted-forall",
                    vec![
                        vec![SignedFormula::new(F, restriction)],
                        vec![SignedFormula::new(T, matrix)],
                    ],
                )
                .with_reused(c),
            )
        }
        (F, Fm::Forall(q)) => {
            let c = (ctx.fresh)();
            let (restriction, matrix) = instantiated(q, &c);
            Some(
                Rule::alpha(
                    "f-restricted-forall",
                    vec![SignedFormula::new(T, restriction), SignedFormula::new(F, matrix)],
                )
                .with_fresh(c),
            )
        }
        // An undefined quantifier needs some witness with an undefined part.
        (E, Fm::Exists(q)) => Some(e_quantifier("e-restricted-exists", q, ctx)),
        (E, Fm::Forall(q)) => Some(e_quantifier("e-restricted-forall", q, ctx)),

        (M, _) => Some(Rule::beta(
            "m-split",
            vec![
                vec![SignedFormula::from_shared(T, sf.formula.clone())],
                vec![SignedFormula::from_shared(F, sf.formula.clone())],
            ],
        )),
        (N, _) => Some(Rule::beta(
            "n-split",
            vec![
                vec![SignedFormula::from_shared(F, sf.formula.clone())],
                vec![SignedFormula::from_shared(E, sf.formula.clone())],
            ],
        )),

        (_, Fm::Atom(_)) => None,
    }
}

fn negation(sign: Sign, inner: &Formula) -> Option<Rule> {
    let rule = match sign {
        Sign::T => Rule::alpha("t-negation", vec![SignedFormula::new(Sign::F, inner.clone())]),
        Sign::F => Rule::alpha("f-negation", vec![SignedFormula::new(Sign::T, inner.clone())]),
        Sign::E => Rule::alpha("e-negation", vec![SignedFormula::new(Sign::E, inner.clone())]),
        Sign::M => Rule::alpha("m-negation", vec![SignedFormula::new(Sign::N, inner.clone())]),
        Sign::N => Rule::alpha("n-negation", vec![SignedFormula::new(Sign::M, inner.clone())]),
        Sign::V => return None,
    };
    Some(rule)
}

/// `e: (φ ∘ ψ)` holds exactly when a side is undefined: either φ is, or φ is
/// meaningful and ψ is.
fn e_binary(name: &str, l: &Formula, r: &Formula) -> Rule {
    Rule::beta(
        name,
        vec![
            vec![SignedFormula::new(Sign::E, l.clone())],
            vec![
                SignedFormula::new(Sign::M, l.clone()),
                SignedFormula::new(Sign::E, r.clone()),
            ],
        ],
    )
}

fn e_quantifier(name: &str, q: &Quantified, ctx: &mut RuleContext<'_>) -> Rule {
    let c = (ctx.fresh)();
    let (restriction, matrix) = instantiated(q, &c);
    Rule::beta(
        name,
        vec![
            vec![SignedFormula::new(Sign::E, restriction.clone())],
            vec![
                SignedFormula::new(Sign::M, restriction),
                SignedFormula::new(Sign::E, matrix),
            ],
        ],
    )
    .with_fresh(c)
}

fn instantiated(q: &Quantified, constant: &str) -> (Formula, Formula) {
    (
        q.restriction.instantiate(&q.variable, constant),
        q.matrix.instantiate(&q.variable, constant),
    )
}
