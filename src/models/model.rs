use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::formula::Atom;
use super::semantics::{BilateralTruthValue, TruthValue};

/// A three-valued interpretation extracted from an open branch.
///
/// Valuations are keyed by the canonical rendering of the ground atom
/// (`"P"`, `"Human(socrates)"`, `"Human*(socrates)"`), which makes equality,
/// ordering and serialization sort-stable so duplicate models can be pruned
/// deterministically. Under ACrQ the `bilateral` map additionally pairs each
/// predicate instance with its dual into a single `<positive, negative>`
/// value, keyed by the positive rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Model {
    pub valuations: BTreeMap<String, TruthValue>,
    pub constants: BTreeSet<String>,
    pub bilateral: BTreeMap<String, BilateralTruthValue>,
}

impl Model {
    /// Build a model from explicit atom assignments.
    ///
    /// `bilateral_extension` is set for ACrQ models: every assigned atom then
    /// contributes its side of a bilateral pair, the missing side defaulting
    /// to `False`.
    pub fn new(assignments: BTreeMap<Atom, TruthValue>, constants: BTreeSet<String>, bilateral_extension: bool) -> Model {
        let mut valuations = BTreeMap::new();
        let mut bilateral: BTreeMap<String, BilateralTruthValue> = BTreeMap::new();

        for (atom, value) in assignments {
            valuations.insert(atom.to_string(), value);
            if bilateral_extension {
                let key = atom.positive().to_string();
                let entry = bilateral.entry(key).or_insert_with(BilateralTruthValue::gap);
                if atom.negative {
                    entry.negative = value;
                } else {
                    entry.positive = value;
                }
            }
        }

        Model { valuations, constants, bilateral }
    }

    /// The value the model gives a ground atom; unassigned atoms default to
    /// `False`.
    pub fn value_of(&self, atom: &Atom) -> TruthValue {
        self.valuations
            .get(&atom.to_string())
            .copied()
            .unwrap_or(TruthValue::False)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .valuations
            .iter()
            .map(|(atom, value)| format!("{}={}", atom, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
