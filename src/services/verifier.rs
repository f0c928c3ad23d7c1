//! Evaluation of formulas under an extracted model, and verification that a
//! signed formula holds under it.
//!
//! Restricted quantifiers are read as their weak-Kleene aggregations over
//! the model's constant domain: the existential as the disjunction of
//! `restriction(c) ∧ matrix(c)`, the universal as the conjunction of
//! `restriction(c) → matrix(c)`. Undefined absorbs through the aggregation
//! exactly as it does through the binary connectives, so one undefined
//! instance makes the whole quantifier undefined. The empty domain gives
//! the classical units (false and true respectively).

use crate::models::formula::{Formula, Quantified};
use crate::models::model::Model;
use crate::models::semantics::{self, TruthValue};
use crate::models::signs::SignedFormula;

/// The weak-Kleene value of a ground formula in a model. Atoms the model
/// does not mention evaluate to the deterministic default, `False`.
pub fn evaluate(formula: &Formula, model: &Model) -> TruthValue {
    match formula {
        Formula::Atom(atom) => model.value_of(atom),
        Formula::Not(inner) => semantics::neg(evaluate(inner, model)),
        Formula::And(l, r) => semantics::and(evaluate(l, model), evaluate(r, model)),
        Formula::Or(l, r) => semantics::or(evaluate(l, model), evaluate(r, model)),
        Formula::Implies(l, r) => semantics::implies(evaluate(l, model), evaluate(r, model)),
        Formula::Exists(q) => exists_value(q, model),
        Formula::Forall(q) => forall_value(q, model),
    }
}

/// Whether the extracted model reproduces the sign of a branch formula.
pub fn verify(sf: &SignedFormula, model: &Model) -> bool {
    sf.sign.admits(evaluate(&sf.formula, model))
}

fn exists_value(q: &Quantified, model: &Model) -> TruthValue {
    let mut result = TruthValue::False;
    for constant in &model.constants {
        let instance = semantics::and(
            evaluate(&q.restriction.instantiate(&q.variable, constant), model),
            evaluate(&q.matrix.instantiate(&q.variable, constant), model),
        );
        result = semantics::or(result, instance);
    }
    result
}

fn forall_value(q: &Quantified, model: &Model) -> TruthValue {
    let mut result = TruthValue::True;
    for constant in &model.constants {
        let instance = semantics::implies(
            evaluate(&q.restriction.instantiate(&q.variable, constant), model),
            evaluate(&q.matrix.instantiate(&q.variable, constant), model),
        );
        result = semantics::and(result, instance);
    }
    result
}
