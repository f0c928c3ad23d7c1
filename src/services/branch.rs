//! A tableau branch: the linear sequence of nodes from the root to one
//! leaf, plus the indices that make contradiction detection O(1) and the
//! memo sets that keep quantifier instantiation fair and oracle calls
//! idempotent.
//!
//! Branches own their indices and memos exclusively; a β-split deep-copies
//! them via [`Branch::fork`] so siblings never share mutable state.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::formula::{Formula, SharedFormula};
use crate::models::rules::Logic;
use crate::models::semantics::BilateralTruthValue;
use crate::models::signs::{Sign, SignedFormula};

use super::tableau::NodeId;

#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub id: usize,
    /// Node ids in the order they were appended to this branch.
    pub node_ids: Vec<NodeId>,
    /// Per-sign formula index for the constant-time contradiction probe.
    index: [HashMap<SharedFormula, Vec<NodeId>>; 6],
    /// Constants occurring anywhere on the branch.
    pub ground_terms: BTreeSet<String>,
    closed: bool,
    closure_witness: Option<(NodeId, NodeId)>,
    /// Constants each lazily instantiated quantifier premise has consumed.
    universal_instantiations: HashMap<SignedFormula, BTreeSet<String>>,
    /// Premises whose (non-reusable) rule already fired on this branch.
    applied: HashSet<NodeId>,
    /// Atoms the oracle verdict has been recorded for on this branch.
    oracle_evaluated: HashSet<SharedFormula>,
    /// Verdicts fetched during rule scans, so the external evaluator is
    /// called at most once per atom per branch.
    oracle_cache: HashMap<SharedFormula, BilateralTruthValue>,
    /// Atoms whose evaluation raised; they are not retried on this branch.
    oracle_failed: HashSet<SharedFormula>,
}

impl Branch {
    pub fn new(id: usize) -> Branch {
        Branch {
            id,
            node_ids: Vec::new(),
            index: std::array::from_fn(|_| HashMap::new()),
            ground_terms: BTreeSet::new(),
            closed: false,
            closure_witness: None,
            universal_instantiations: HashMap::new(),
            applied: HashSet::new(),
            oracle_evaluated: HashSet::new(),
            oracle_cache: HashMap::new(),
            oracle_failed: HashSet::new(),
        }
    }

    /// Independent copy for one side of a β-split.
    pub fn fork(&self, id: usize) -> Branch {
        let mut child = self.clone();
        child.id = id;
        child
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn closure_witness(&self) -> Option<(NodeId, NodeId)> {
        self.closure_witness
    }

    pub fn contains(&self, sf: &SignedFormula) -> bool {
        self.index[sf.sign.index()].contains_key(&sf.formula)
    }

    /// Append a signed formula to the branch and run the closure probe.
    pub fn add(&mut self, node_id: NodeId, sf: &SignedFormula, logic: Logic) {
        self.node_ids.push(node_id);
        self.index[sf.sign.index()]
            .entry(sf.formula.clone())
            .or_default()
            .push(node_id);
        for constant in sf.formula.constants() {
            self.ground_terms.insert(constant);
        }
        if !self.closed {
            if let Some(older) = self.conflicting_node(sf, logic) {
                self.closed = true;
                self.closure_witness = Some((older, node_id));
                log::debug!(
                    "branch {} closed: {} conflicts with node {}",
                    self.id,
                    sf,
                    older
                );
            }
        }
    }

    /// The oldest node this insertion contradicts, honouring the logic's
    /// glut whitelist.
    fn conflicting_node(&self, sf: &SignedFormula, logic: Logic) -> Option<NodeId> {
        if sf.sign.is_definite() {
            for other in Sign::DEFINITE {
                if other == sf.sign {
                    continue;
                }
                if let Some(ids) = self.index[other.index()].get(&sf.formula) {
                    if let Some(&older) = ids.first() {
                        return Some(older);
                    }
                }
            }
        }

        // t: p(t̄) against t: p*(t̄). ACrQ whitelists the pair as a glut;
        // wKrQ closes on it.
        if sf.sign == Sign::T {
            if let Formula::Atom(atom) = sf.formula.as_ref() {
                let dual = Formula::Atom(atom.dual()).shared();
                if let Some(ids) = self.index[Sign::T.index()].get(&dual) {
                    if let Some(&older) = ids.first() {
                        if logic.glut_tolerant() {
                            log::debug!("branch {}: glut admitted on {}", self.id, atom);
                        } else {
                            return Some(older);
                        }
                    }
                }
            }
        }

        None
    }

    pub fn mark_applied(&mut self, node_id: NodeId) {
        self.applied.insert(node_id);
    }

    pub fn is_applied(&self, node_id: NodeId) -> bool {
        self.applied.contains(&node_id)
    }

    /// Constants already consumed by this quantifier premise.
    pub fn used_instantiations(&self, premise: &SignedFormula) -> Option<&BTreeSet<String>> {
        self.universal_instantiations.get(premise)
    }

    pub fn record_instantiation(&mut self, premise: &SignedFormula, constant: &str) {
        self.universal_instantiations
            .entry(premise.clone())
            .or_default()
            .insert(constant.to_string());
    }

    pub fn oracle_is_evaluated(&self, formula: &SharedFormula) -> bool {
        self.oracle_evaluated.contains(formula)
    }

    pub fn oracle_mark_evaluated(&mut self, formula: SharedFormula) {
        self.oracle_evaluated.insert(formula);
    }

    pub fn oracle_cached(&self, formula: &SharedFormula) -> Option<BilateralTruthValue> {
        self.oracle_cache.get(formula).copied()
    }

    pub fn oracle_cache_insert(&mut self, formula: SharedFormula, value: BilateralTruthValue) {
        self.oracle_cache.insert(formula, value);
    }

    pub fn oracle_has_failed(&self, formula: &SharedFormula) -> bool {
        self.oracle_failed.contains(formula)
    }

    pub fn oracle_mark_failed(&mut self, formula: SharedFormula) {
        self.oracle_failed.insert(formula);
    }
}
