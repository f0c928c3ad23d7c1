//! The signed-tableau engine: branch pool, rule prioritization, α/β
//! expansion, oracle interleaving, completion detection and model
//! extraction.
//!
//! One iteration selects an open branch (fewest pending α-rules first,
//! smaller branch id on ties), selects the highest-priority applicable rule
//! on it (oracle verdicts before α-extensions before β-splits, cheaper
//! expansions and older nodes first within a priority), applies it, and
//! re-checks closure at every insertion. Construction stops when no open
//! branch admits a rule, when a resource cap is hit, or when the
//! early-termination hint fires.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::formula::{Atom, Formula};
use crate::models::model::Model;
use crate::models::rules::{Logic, Rule, RuleContext, PRIORITY_ORACLE};
use crate::models::semantics::TruthValue;
use crate::models::signs::{Sign, SignedFormula};
use crate::models::term::FRESH_PREFIX;

use super::branch::Branch;
use super::oracle::OracleAdapter;
use super::verifier;

pub type NodeId = usize;

/// A node of the tableau tree. Nodes are owned by the tableau, append-only,
/// and shared across branches by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableauNode {
    pub id: NodeId,
    pub formula: SignedFormula,
    pub parent: Option<NodeId>,
    /// Name of the rule that produced this node; `None` for initial nodes.
    pub rule: Option<String>,
}

/// Knobs for a single `solve` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOptions {
    pub logic: Logic,
    /// Hard cap on expansion steps.
    pub max_iterations: usize,
    /// Hard cap on open + closed branches.
    pub max_branches: usize,
    /// Record a step-by-step trace in the result.
    pub trace: bool,
    /// Stop as soon as some open branch is atomic-only (suppressed while an
    /// oracle still has unevaluated atoms anywhere).
    pub early_termination: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            logic: Logic::Wkrq,
            max_iterations: 1000,
            max_branches: 500,
            trace: false,
            early_termination: true,
        }
    }
}

impl SolveOptions {
    pub fn with_logic(logic: Logic) -> Self {
        SolveOptions { logic, ..Default::default() }
    }
}

/// One recorded rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: usize,
    pub rule_name: String,
    pub premise_node: NodeId,
    pub produced_nodes: Vec<NodeId>,
    pub branch_before: usize,
    pub branches_after: Vec<usize>,
    pub timestamp: DateTime<Utc>,
}

/// The outcome of a tableau construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableauResult {
    pub satisfiable: bool,
    /// Verified, deduplicated models of the surviving open branches.
    pub models: Vec<Model>,
    pub open_branches: usize,
    pub closed_branches: usize,
    pub total_nodes: usize,
    /// Set when a resource cap stopped expansion before saturation; the
    /// verdict is then "satisfiable iff some branch is still open".
    pub incomplete: bool,
    pub trace: Option<Vec<TraceStep>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableauError {
    /// Input formulas must be ground: a variable outside its binder has no
    /// meaning on a branch.
    #[error("unbound variable `{variable}` in input formula `{formula}`")]
    UnboundVariable { variable: String, formula: String },
    /// The fresh-witness namespace is reserved for the engine.
    #[error("input constant `{0}` uses the reserved fresh-constant prefix")]
    ReservedConstant(String),
    /// An implementation bug, surfaced loudly rather than papered over.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// A signed tableau under construction.
#[derive(Debug)]
pub struct Tableau {
    options: SolveOptions,
    oracle: Option<OracleAdapter>,
    nodes: Vec<TableauNode>,
    open: Vec<Branch>,
    closed: Vec<Branch>,
    branch_counter: usize,
    constant_counter: usize,
    trace: Vec<TraceStep>,
    step: usize,
}

impl Tableau {
    /// Validate the input and set up the root branch.
    pub fn new(initial: Vec<SignedFormula>, options: SolveOptions) -> Result<Tableau, TableauError> {
        for sf in &initial {
            if let Some(variable) = sf.formula.free_variables().into_iter().next() {
                return Err(TableauError::UnboundVariable {
                    variable,
                    formula: sf.formula.to_string(),
                });
            }
            for constant in sf.formula.constants() {
                if constant.starts_with(FRESH_PREFIX) {
                    return Err(TableauError::ReservedConstant(constant));
                }
            }
        }

        let mut tableau = Tableau {
            options,
            oracle: None,
            nodes: Vec::new(),
            open: Vec::new(),
            closed: Vec::new(),
            branch_counter: 1,
            constant_counter: 0,
            trace: Vec::new(),
            step: 0,
        };

        let mut root = Branch::new(0);
        for sf in initial {
            tableau.attach(&mut root, sf, None, None);
        }
        if root.is_closed() {
            tableau.closed.push(root);
        } else {
            tableau.open.push(root);
        }
        Ok(tableau)
    }

    /// Install an oracle; its verdicts are injected with the highest
    /// priority and the early-termination hint is suppressed until every
    /// atom on every open branch has been evaluated.
    pub fn with_oracle(mut self, oracle: OracleAdapter) -> Tableau {
        self.oracle = Some(oracle);
        self
    }

    /// Run the expansion loop to saturation (or to a cap) and extract the
    /// verified models of the surviving branches.
    pub fn construct(&mut self) -> Result<TableauResult, TableauError> {
        let mut iterations = 0usize;
        let mut incomplete = false;

        while !self.open.is_empty() {
            let pending = self.scan();
            if pending.is_empty() {
                break;
            }
            if iterations >= self.options.max_iterations
                || self.open.len() + self.closed.len() >= self.options.max_branches
            {
                incomplete = true;
                log::debug!(
                    "resource cap reached after {} iterations, {} branches",
                    iterations,
                    self.open.len() + self.closed.len()
                );
                break;
            }
            iterations += 1;

            // Fewest pending α-rules first, then smaller branch id.
            let selected = pending.into_iter().min_by_key(|(pos, rules)| {
                let alpha_count = rules.iter().filter(|(_, r)| !r.is_branching()).count();
                (alpha_count, self.open[*pos].id)
            });
            let Some((pos, rules)) = selected else { break };
            let Some((premise, rule)) = rules.into_iter().next() else { break };

            self.apply(pos, premise, rule)?;

            if self.early_termination_fires() {
                log::debug!("early termination: an atomic-only open branch is a model witness");
                break;
            }
        }

        let models = self.extract_models();
        let satisfiable = if incomplete { !self.open.is_empty() } else { !models.is_empty() };

        Ok(TableauResult {
            satisfiable,
            models,
            open_branches: self.open.len(),
            closed_branches: self.closed.len(),
            total_nodes: self.nodes.len(),
            incomplete,
            trace: if self.options.trace { Some(std::mem::take(&mut self.trace)) } else { None },
        })
    }

    /// Append a signed formula to a branch, creating its node. Returns
    /// `None` when the branch already carries the exact signed formula.
    fn attach(
        &mut self,
        branch: &mut Branch,
        sf: SignedFormula,
        parent: Option<NodeId>,
        rule: Option<&str>,
    ) -> Option<NodeId> {
        if branch.contains(&sf) {
            log::trace!("branch {}: {} already present", branch.id, sf);
            return None;
        }
        let id = self.nodes.len();
        self.nodes.push(TableauNode {
            id,
            formula: sf.clone(),
            parent,
            rule: rule.map(str::to_string),
        });
        branch.add(id, &sf, self.options.logic);
        Some(id)
    }

    /// All applicable rules per open branch, each list sorted by
    /// `(priority, complexity cost, node id)`.
    fn scan(&mut self) -> Vec<(usize, Vec<(NodeId, Rule)>)> {
        let next_fresh = self.constant_counter + 1;
        let logic = self.options.logic;
        let nodes = &self.nodes;
        let oracle = self.oracle.as_ref();

        let mut pending = Vec::new();
        for (pos, branch) in self.open.iter_mut().enumerate() {
            let rules = Self::pending_for_branch(nodes, branch, logic, oracle, next_fresh);
            if !rules.is_empty() {
                pending.push((pos, rules));
            }
        }
        pending
    }

    fn pending_for_branch(
        nodes: &[TableauNode],
        branch: &mut Branch,
        logic: Logic,
        oracle: Option<&OracleAdapter>,
        next_fresh: usize,
    ) -> Vec<(NodeId, Rule)> {
        let mut out = Vec::new();
        for i in 0..branch.node_ids.len() {
            let node_id = branch.node_ids[i];
            let sf = &nodes[node_id].formula;

            let mut rule = if branch.is_applied(node_id) {
                None
            } else {
                let used = branch.used_instantiations(sf);
                let mut fresh = || format!("{}{}", FRESH_PREFIX, next_fresh);
                let mut ctx =
                    RuleContext { constants: &branch.ground_terms, used, fresh: &mut fresh };
                logic.rule_for(sf, &mut ctx)
            };

            if rule.is_none() {
                if let Some(adapter) = oracle {
                    rule = Self::oracle_rule(branch, &nodes[node_id].formula, adapter);
                }
            }

            if let Some(rule) = rule {
                out.push((node_id, rule));
            }
        }
        out.sort_by_key(|(node_id, rule)| (rule.priority, rule.complexity_cost(), *node_id));
        out
    }

    /// The oracle as a rule: premise is any not-yet-evaluated ground atom on
    /// the branch; the conclusion records the verdict for the atom and its
    /// bilateral dual through the ordinary branch-add path.
    fn oracle_rule(
        branch: &mut Branch,
        sf: &SignedFormula,
        adapter: &OracleAdapter,
    ) -> Option<Rule> {
        let atom = sf.formula.as_atom()?;
        if !atom.is_ground() {
            return None;
        }
        let formula = sf.formula.clone();
        if branch.oracle_is_evaluated(&formula) || branch.oracle_has_failed(&formula) {
            return None;
        }

        let value = match branch.oracle_cached(&formula) {
            Some(value) => value,
            None => match adapter.evaluate(atom) {
                Ok(value) => {
                    log::debug!("branch {}: oracle({}) = {}", branch.id, atom, value);
                    branch.oracle_cache_insert(formula.clone(), value);
                    value
                }
                Err(err) => {
                    log::debug!("branch {}: oracle({}) failed: {}", branch.id, atom, err);
                    branch.oracle_mark_failed(formula);
                    return None;
                }
            },
        };

        let conclusions = if value.is_gap() && adapter.records_gap_as_unknown() {
            vec![SignedFormula::from_shared(Sign::V, formula)]
        } else {
            vec![
                SignedFormula::from_shared(Sign::for_value(value.positive), formula),
                SignedFormula::new(Sign::for_value(value.negative), Formula::Atom(atom.dual())),
            ]
        };

        Some(Rule {
            name: format!("oracle({})", atom),
            conclusions: vec![conclusions],
            priority: PRIORITY_ORACLE,
            fresh_constant: None,
            reused_constant: None,
        })
    }

    /// Apply one rule to the open branch at `pos`.
    fn apply(&mut self, pos: usize, premise: NodeId, rule: Rule) -> Result<(), TableauError> {
        let mut branch = self.open.swap_remove(pos);
        if branch.is_closed() {
            return Err(TableauError::InvariantViolation(format!(
                "rule {} applied to closed branch {}",
                rule.name, branch.id
            )));
        }

        log::debug!(
            "step {}: {} on node {} of branch {}",
            self.step,
            rule.name,
            premise,
            branch.id
        );

        // Commit the witness the rule allocated during the scan.
        if let Some(fresh) = &rule.fresh_constant {
            self.constant_counter += 1;
            debug_assert_eq!(&format!("{}{}", FRESH_PREFIX, self.constant_counter), fresh);
        }

        let premise_sf = self.nodes[premise].formula.clone();
        if let Some(constant) = &rule.reused_constant {
            branch.record_instantiation(&premise_sf, constant);
        } else if rule.priority == PRIORITY_ORACLE {
            branch.oracle_mark_evaluated(premise_sf.formula.clone());
        } else {
            branch.mark_applied(premise);
        }

        let branch_before = branch.id;
        let mut produced = Vec::new();
        let mut branches_after = Vec::new();

        if rule.conclusions.len() == 1 {
            for sf in &rule.conclusions[0] {
                if let Some(id) = self.attach(&mut branch, sf.clone(), Some(premise), Some(rule.name.as_str())) {
                    produced.push(id);
                }
                if branch.is_closed() {
                    break;
                }
            }
            branches_after.push(branch.id);
            self.file(branch);
        } else {
            for conclusion in &rule.conclusions {
                let mut child = branch.fork(self.branch_counter);
                self.branch_counter += 1;
                for sf in conclusion {
                    if let Some(id) = self.attach(&mut child, sf.clone(), Some(premise), Some(rule.name.as_str())) {
                        produced.push(id);
                    }
                    if child.is_closed() {
                        break;
                    }
                }
                branches_after.push(child.id);
                self.file(child);
            }
            // The parent branch is replaced by its children.
        }

        if self.options.trace {
            self.trace.push(TraceStep {
                step: self.step,
                rule_name: rule.name,
                premise_node: premise,
                produced_nodes: produced,
                branch_before,
                branches_after,
                timestamp: Utc::now(),
            });
        }
        self.step += 1;
        Ok(())
    }

    fn file(&mut self, branch: Branch) {
        if branch.is_closed() {
            self.closed.push(branch);
        } else {
            self.open.push(branch);
        }
    }

    /// The completion hint: some open branch carries only atomic
    /// signed formulas. Unsound while an oracle may still refute a pending
    /// atom, so with an oracle installed it waits until every atom on every
    /// open branch has a recorded verdict.
    fn early_termination_fires(&self) -> bool {
        if !self.options.early_termination || self.open.is_empty() {
            return false;
        }
        let hint = self
            .open
            .iter()
            .any(|b| b.node_ids.iter().all(|&id| self.nodes[id].formula.is_atomic()));
        if !hint {
            return false;
        }
        if self.oracle.is_some() {
            let all_evaluated = self.open.iter().all(|b| {
                b.node_ids.iter().all(|&id| {
                    let sf = &self.nodes[id].formula;
                    !sf.is_atomic() || b.oracle_is_evaluated(&sf.formula)
                })
            });
            if !all_evaluated {
                return false;
            }
        }
        true
    }

    /// Extract one verified model per surviving open branch, deduplicated.
    fn extract_models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = Vec::new();
        for branch in &self.open {
            if let Some(model) = self.extract_model(branch) {
                if !models.contains(&model) {
                    models.push(model);
                }
            }
        }
        models
    }

    /// Read the atomic signs off a branch into an interpretation, then check
    /// that the interpretation reproduces the sign of every formula on the
    /// branch. Branches mandated by the rule schema but semantically
    /// impossible (e.g. the both-`e` branch of a true disjunction) fail the
    /// check and yield no model.
    fn extract_model(&self, branch: &Branch) -> Option<Model> {
        let mut assignments: BTreeMap<Atom, TruthValue> = BTreeMap::new();
        let mut mentioned: BTreeSet<Atom> = BTreeSet::new();

        for &id in &branch.node_ids {
            let sf = &self.nodes[id].formula;
            if let Formula::Atom(atom) = sf.formula.as_ref() {
                mentioned.insert(atom.clone());
                let value = match sf.sign {
                    Sign::T => TruthValue::True,
                    Sign::F => TruthValue::False,
                    Sign::E => TruthValue::Undefined,
                    _ => continue,
                };
                assignments.entry(atom.clone()).or_insert(value);
            }
        }
        // Atoms mentioned only under m, n or v stay unconstrained and take
        // the deterministic default.
        for atom in mentioned {
            assignments.entry(atom).or_insert(TruthValue::False);
        }

        let model = Model::new(
            assignments,
            branch.ground_terms.clone(),
            self.options.logic.glut_tolerant(),
        );

        for &id in &branch.node_ids {
            let sf = &self.nodes[id].formula;
            if !verifier::verify(sf, &model) {
                log::debug!(
                    "branch {}: candidate model {} fails verification on {}",
                    branch.id,
                    model,
                    sf
                );
                return None;
            }
        }
        Some(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::semantics::BilateralTruthValue;
    use crate::models::term::Term;
    use crate::services::oracle::OracleError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn sf(sign: Sign, text: &str) -> SignedFormula {
        SignedFormula::new(sign, Formula::parse(text).unwrap())
    }

    fn run(initial: Vec<SignedFormula>, options: SolveOptions) -> TableauResult {
        Tableau::new(initial, options).unwrap().construct().unwrap()
    }

    fn acrq() -> SolveOptions {
        SolveOptions::with_logic(Logic::Acrq)
    }

    /// An oracle that counts its calls per atom and answers from a fixed
    /// table (anything absent raises).
    fn counting_oracle(
        table: Vec<(&str, BilateralTruthValue)>,
    ) -> (OracleAdapter, Rc<RefCell<HashMap<String, usize>>>) {
        let table: HashMap<String, BilateralTruthValue> =
            table.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let calls = Rc::new(RefCell::new(HashMap::new()));
        let calls_handle = calls.clone();
        let adapter = OracleAdapter::new(move |atom| {
            *calls.borrow_mut().entry(atom.to_string()).or_insert(0usize) += 1;
            table
                .get(&atom.to_string())
                .copied()
                .ok_or_else(|| OracleError::new(format!("no verdict for {}", atom)))
        });
        (adapter, calls_handle)
    }

    // ── End-to-end scenarios ────────────────────────────────────────────────

    #[test]
    fn test_true_excluded_middle_has_classical_models_only() {
        let result = run(vec![sf(Sign::T, "P | ~P")], SolveOptions::default());
        assert!(result.satisfiable);
        assert!(!result.incomplete);
        // The both-e branch survives as an open branch but yields no model:
        // e | e = e, not t.
        assert_eq!(result.models.len(), 2);
        let values: Vec<TruthValue> = result
            .models
            .iter()
            .map(|m| *m.valuations.get("P").unwrap())
            .collect();
        assert!(values.contains(&TruthValue::True));
        assert!(values.contains(&TruthValue::False));
        assert!(!values.contains(&TruthValue::Undefined));
    }

    #[test]
    fn test_nontrue_excluded_middle_has_the_undefined_countermodel() {
        let result = run(vec![sf(Sign::N, "P | ~P")], SolveOptions::default());
        assert!(result.satisfiable);
        assert_eq!(result.models.len(), 1);
        assert_eq!(
            result.models[0].valuations.get("P"),
            Some(&TruthValue::Undefined)
        );
    }

    #[test]
    fn test_contradiction_is_unsatisfiable() {
        let result = run(vec![sf(Sign::T, "P & ~P")], SolveOptions::default());
        assert!(!result.satisfiable);
        assert!(!result.incomplete);
        assert_eq!(result.open_branches, 0);
        assert!(result.models.is_empty());
    }

    #[test]
    fn test_modus_ponens_formula_is_satisfiable_and_never_false() {
        let text = "(P & (P -> Q)) -> Q";
        let result = run(vec![sf(Sign::T, text)], SolveOptions::default());
        assert!(result.satisfiable);

        // No interpretation makes it false: the f-tableau closes everywhere.
        let refutation = run(vec![sf(Sign::F, text)], SolveOptions::default());
        assert!(!refutation.satisfiable);
        assert_eq!(refutation.open_branches, 0);
    }

    #[test]
    fn test_glut_satisfiable_under_acrq_not_wkrq() {
        let initial = vec![sf(Sign::T, "Bird(tweety)"), sf(Sign::T, "Bird*(tweety)")];

        let acrq_result = run(initial.clone(), acrq());
        assert!(acrq_result.satisfiable);
        assert_eq!(acrq_result.models.len(), 1);
        let model = &acrq_result.models[0];
        assert_eq!(model.valuations.get("Bird(tweety)"), Some(&TruthValue::True));
        assert_eq!(model.valuations.get("Bird*(tweety)"), Some(&TruthValue::True));
        assert!(model.bilateral.get("Bird(tweety)").unwrap().is_glut());

        let wkrq_result = run(initial, SolveOptions::default());
        assert!(!wkrq_result.satisfiable);
        assert_eq!(wkrq_result.open_branches, 0);
        assert_eq!(wkrq_result.closed_branches, 1);
    }

    #[test]
    fn test_negated_predicate_is_paraconsistent_under_acrq() {
        let initial = vec![sf(Sign::T, "~Bird(tweety)"), sf(Sign::T, "Bird(tweety)")];

        // ACrQ: ~Bird rewrites to Bird*, the pair is a glut.
        let acrq_result = run(initial.clone(), acrq());
        assert!(acrq_result.satisfiable);

        // wKrQ: ~Bird flips the sign and closes against the input.
        let wkrq_result = run(initial, SolveOptions::default());
        assert!(!wkrq_result.satisfiable);
    }

    #[test]
    fn test_oracle_verified_atom_yields_bilateral_model() {
        let (oracle, _) = counting_oracle(vec![
            ("Human(socrates)", BilateralTruthValue::verified()),
            ("Human*(socrates)", BilateralTruthValue::refuted()),
        ]);
        let result = Tableau::new(vec![sf(Sign::T, "Human(socrates)")], acrq())
            .unwrap()
            .with_oracle(oracle)
            .construct()
            .unwrap();

        assert!(result.satisfiable);
        assert_eq!(result.models.len(), 1);
        let model = &result.models[0];
        assert_eq!(model.valuations.get("Human(socrates)"), Some(&TruthValue::True));
        assert_eq!(model.valuations.get("Human*(socrates)"), Some(&TruthValue::False));
        assert_eq!(
            model.bilateral.get("Human(socrates)"),
            Some(&BilateralTruthValue::verified())
        );
    }

    #[test]
    fn test_oracle_refuted_atom_closes_against_input() {
        let (oracle, _) = counting_oracle(vec![
            ("Human(socrates)", BilateralTruthValue::refuted()),
        ]);
        let result = Tableau::new(vec![sf(Sign::T, "Human(socrates)")], acrq())
            .unwrap()
            .with_oracle(oracle)
            .construct()
            .unwrap();

        assert!(!result.satisfiable);
        assert_eq!(result.open_branches, 0);
        assert_eq!(result.closed_branches, 1);
    }

    // ── Oracle behaviour ────────────────────────────────────────────────────

    #[test]
    fn test_oracle_gap_refutes_a_true_claim_by_default() {
        let (oracle, _) = counting_oracle(vec![("Unknown(thing)", BilateralTruthValue::gap())]);
        let result = Tableau::new(vec![sf(Sign::T, "Unknown(thing)")], acrq())
            .unwrap()
            .with_oracle(oracle)
            .construct()
            .unwrap();
        // <f,f> records f for the atom, closing against t.
        assert!(!result.satisfiable);
    }

    #[test]
    fn test_oracle_gap_as_unknown_marker_does_not_close() {
        let (oracle, _) = counting_oracle(vec![("Unknown(thing)", BilateralTruthValue::gap())]);
        let result = Tableau::new(vec![sf(Sign::T, "Unknown(thing)")], acrq())
            .unwrap()
            .with_oracle(oracle.gap_as_unknown(true))
            .construct()
            .unwrap();
        // Only the v marker is recorded; absence of evidence no longer
        // forces a refutation.
        assert!(result.satisfiable);
        assert_eq!(
            result.models[0].valuations.get("Unknown(thing)"),
            Some(&TruthValue::True)
        );
    }

    #[test]
    fn test_oracle_gap_consistent_with_false_claim() {
        let (oracle, _) = counting_oracle(vec![("Unknown(thing)", BilateralTruthValue::gap())]);
        let result = Tableau::new(vec![sf(Sign::F, "Unknown(thing)")], acrq())
            .unwrap()
            .with_oracle(oracle.gap_as_unknown(true))
            .construct()
            .unwrap();
        assert!(result.satisfiable);
        assert_eq!(
            result.models[0].valuations.get("Unknown(thing)"),
            Some(&TruthValue::False)
        );
    }

    #[test]
    fn test_oracle_called_once_per_atom_per_branch() {
        let (oracle, calls) = counting_oracle(vec![
            ("P", BilateralTruthValue::verified()),
            ("P*", BilateralTruthValue::refuted()),
        ]);
        let result = Tableau::new(vec![sf(Sign::T, "P")], acrq())
            .unwrap()
            .with_oracle(oracle)
            .construct()
            .unwrap();
        assert!(result.satisfiable);
        let calls = calls.borrow();
        assert_eq!(calls.get("P"), Some(&1));
        assert_eq!(calls.get("P*"), Some(&1));
    }

    #[test]
    fn test_oracle_failure_is_skipped_without_retry() {
        let (oracle, calls) = counting_oracle(vec![
            ("Q", BilateralTruthValue::verified()),
            ("Q*", BilateralTruthValue::refuted()),
            // P and P* are absent: every evaluation of them raises.
        ]);
        let result = Tableau::new(vec![sf(Sign::T, "P"), sf(Sign::T, "Q")], acrq())
            .unwrap()
            .with_oracle(oracle)
            .construct()
            .unwrap();

        // The failing atom contributes nothing but does not sink the search.
        assert!(result.satisfiable);
        let calls = calls.borrow();
        assert_eq!(calls.get("P"), Some(&1));
        assert_eq!(calls.get("Q"), Some(&1));
    }

    // ── Quantifier discipline ───────────────────────────────────────────────

    #[test]
    fn test_universal_fires_once_per_constant_per_branch() {
        let mut options = SolveOptions::default();
        options.trace = true;
        let result = run(
            vec![
                sf(Sign::T, "[forall X Human(X)]Human(X)"),
                sf(Sign::T, "Human(alice)"),
                sf(Sign::T, "Human(bob)"),
            ],
            options,
        );
        assert!(result.satisfiable);

        let trace = result.trace.as_ref().unwrap();
        let universal_steps: Vec<_> = trace
            .iter()
            .filter(|step| step.rule_name == "t-restricted-forall")
            .collect();
        // Two constants, two firings, then the memo exhausts the rule.
        assert_eq!(universal_steps.len(), 2);
        // Each firing closes its f-restriction child against the premises.
        assert_eq!(result.closed_branches, 2);
        assert_eq!(result.open_branches, 1);
    }

    #[test]
    fn test_existential_allocates_a_fresh_witness() {
        let result = run(
            vec![sf(Sign::T, "[exists X Bird(X)]Flying(X)")],
            SolveOptions::default(),
        );
        assert!(result.satisfiable);
        let model = &result.models[0];
        assert!(model.constants.contains("c_1"));
        assert_eq!(model.valuations.get("Bird(c_1)"), Some(&TruthValue::True));
        assert_eq!(model.valuations.get("Flying(c_1)"), Some(&TruthValue::True));
    }

    #[test]
    fn test_universal_entailment_pipeline() {
        // t: [forall X Human(X)]Mortal(X), t: Human(socrates), n: Mortal(socrates)
        // closes on every branch.
        let result = run(
            vec![
                sf(Sign::T, "[forall X Human(X)]Mortal(X)"),
                sf(Sign::T, "Human(socrates)"),
                sf(Sign::N, "Mortal(socrates)"),
            ],
            SolveOptions::default(),
        );
        assert!(!result.satisfiable);
        assert_eq!(result.open_branches, 0);
    }

    #[test]
    fn test_nested_quantifiers_terminate_within_caps() {
        let result = run(
            vec![
                sf(Sign::T, "[forall X Human(X)][exists Y Parent(Y)]Loves(Y, X)"),
                sf(Sign::T, "Human(adam)"),
            ],
            SolveOptions::default(),
        );
        // The ∀/∃ interplay grows the domain forever; the caps keep the
        // search finite and the verdict approximate.
        assert!(result.satisfiable || result.incomplete);
        let cap = SolveOptions::default().max_branches;
        assert!(result.open_branches + result.closed_branches <= cap + 2);
    }

    // ── Engine mechanics ────────────────────────────────────────────────────

    #[test]
    fn test_determinism_of_repeated_solves() {
        let input = || {
            vec![
                sf(Sign::T, "(P | Q) & (Q | R)"),
                sf(Sign::N, "R -> P"),
            ]
        };
        let first = run(input(), SolveOptions::default());
        let second = run(input(), SolveOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_iteration_cap_reports_incomplete() {
        let mut options = SolveOptions::default();
        options.max_iterations = 1;
        let result = run(vec![sf(Sign::T, "(P | Q) & (Q | R)")], options);
        assert!(result.incomplete);
        // Open branches survive, so the approximate verdict is satisfiable.
        assert!(result.satisfiable);
    }

    #[test]
    fn test_branch_cap_reports_incomplete() {
        let mut options = SolveOptions::default();
        options.max_branches = 2;
        let result = run(vec![sf(Sign::N, "P | Q")], options);
        assert!(result.incomplete);
        assert!(result.satisfiable);
    }

    #[test]
    fn test_early_termination_on_atomic_branch() {
        let result = run(
            vec![sf(Sign::T, "P"), sf(Sign::M, "Q")],
            SolveOptions::default(),
        );
        assert!(result.satisfiable);
        assert_eq!(result.models.len(), 2);
        for model in &result.models {
            assert_eq!(model.valuations.get("P"), Some(&TruthValue::True));
        }
    }

    #[test]
    fn test_trace_records_rule_applications() {
        let mut options = SolveOptions::default();
        options.trace = true;
        let result = run(vec![sf(Sign::T, "P & Q")], options);

        let trace = result.trace.unwrap();
        assert_eq!(trace.len(), 1);
        let step = &trace[0];
        assert_eq!(step.step, 0);
        assert_eq!(step.rule_name, "t-conjunction");
        assert_eq!(step.premise_node, 0);
        assert_eq!(step.produced_nodes, vec![1, 2]);
        assert_eq!(step.branch_before, 0);
        assert_eq!(step.branches_after, vec![0]);
    }

    #[test]
    fn test_trace_records_branch_splits() {
        let mut options = SolveOptions::default();
        options.trace = true;
        let result = run(vec![sf(Sign::M, "P")], options);
        let trace = result.trace.unwrap();
        assert_eq!(trace[0].rule_name, "m-split");
        assert_eq!(trace[0].branch_before, 0);
        assert_eq!(trace[0].branches_after, vec![1, 2]);
    }

    #[test]
    fn test_reserved_constants_rejected_at_entry() {
        let atom = Atom::new("Human", vec![Term::constant("c_9")]);
        let err = Tableau::new(
            vec![SignedFormula::new(Sign::T, Formula::Atom(atom))],
            SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TableauError::ReservedConstant(_)));
    }

    #[test]
    fn test_unbound_variable_rejected_at_entry() {
        let atom = Atom::new("Likes", vec![Term::variable("X"), Term::constant("bob")]);
        let err = Tableau::new(
            vec![SignedFormula::new(Sign::T, Formula::Atom(atom))],
            SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TableauError::UnboundVariable { .. }));
    }

    #[test]
    fn test_duplicate_initial_formulas_collapse() {
        let result = run(
            vec![sf(Sign::T, "P"), sf(Sign::T, "P")],
            SolveOptions::default(),
        );
        assert!(result.satisfiable);
        assert_eq!(result.total_nodes, 1);
    }

    #[test]
    fn test_result_serializes() {
        let result = run(vec![sf(Sign::T, "P | ~P")], SolveOptions::default());
        let json = serde_json::to_string(&result).unwrap();
        let back: TableauResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn test_model_verification_holds_on_every_surviving_model() {
        let result = run(
            vec![sf(Sign::T, "(P | Q) & (~Q | R)")],
            SolveOptions::default(),
        );
        assert!(result.satisfiable);
        for model in &result.models {
            let value = verifier::evaluate(&Formula::parse("(P | Q) & (~Q | R)").unwrap(), model);
            assert_eq!(value, TruthValue::True);
        }
    }
}
