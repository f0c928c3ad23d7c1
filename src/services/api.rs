//! The four public operations: `solve`, `valid`, `entails` and
//! `check_inference`, plus the inference surface syntax
//! (`premise, premise |- conclusion`).
//!
//! Validity and entailment are refutation queries: the conclusion is signed
//! `n` ("nontrue", which the calculus splits into the `f` and `e` readings)
//! and the claim holds exactly when the resulting tableau is saturated with
//! no verified countermodel.

use serde::{Deserialize, Serialize};

use crate::models::formula::{Formula, FormulaParser, ParseError};
use crate::models::model::Model;
use crate::models::signs::{Sign, SignedFormula};

use super::oracle::OracleAdapter;
use super::tableau::{SolveOptions, Tableau, TableauError, TableauResult};

/// Build a tableau for the given signed formulas and run it to completion.
pub fn solve(
    initial: Vec<SignedFormula>,
    options: SolveOptions,
) -> Result<TableauResult, TableauError> {
    Tableau::new(initial, options)?.construct()
}

/// Like [`solve`], with an oracle injecting atomic verdicts during search.
pub fn solve_with_oracle(
    initial: Vec<SignedFormula>,
    options: SolveOptions,
    oracle: OracleAdapter,
) -> Result<TableauResult, TableauError> {
    Tableau::new(initial, options)?.with_oracle(oracle).construct()
}

/// Whether no interpretation makes `formula` nontrue: the `n`-signed
/// tableau (equivalently, the `f` and `e` refutation branches) closes with
/// no surviving countermodel.
///
/// Weak Kleene is unforgiving here: the all-undefined assignment makes any
/// compound of atoms undefined, so classical tautologies generally fail
/// validity while still holding as entailments from meaningful premises.
pub fn valid(formula: &Formula, options: SolveOptions) -> Result<bool, TableauError> {
    let result = solve(vec![SignedFormula::new(Sign::N, formula.clone())], options)?;
    Ok(!result.incomplete && !result.satisfiable)
}

/// Whether the premises (signed `t`) entail the conclusion: the tableau
/// with the conclusion signed `n` ("nontrue") admits no countermodel.
pub fn entails(
    premises: &[Formula],
    conclusion: &Formula,
    options: SolveOptions,
) -> Result<bool, TableauError> {
    let result = solve(entailment_input(premises, conclusion), options)?;
    Ok(!result.incomplete && !result.satisfiable)
}

fn entailment_input(premises: &[Formula], conclusion: &Formula) -> Vec<SignedFormula> {
    let mut initial: Vec<SignedFormula> = premises
        .iter()
        .map(|p| SignedFormula::new(Sign::T, p.clone()))
        .collect();
    initial.push(SignedFormula::new(Sign::N, conclusion.clone()));
    initial
}

/// An inference to be checked: premises and a conclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inference {
    pub premises: Vec<Formula>,
    pub conclusion: Formula,
}

impl Inference {
    pub fn new(premises: Vec<Formula>, conclusion: Formula) -> Inference {
        Inference { premises, conclusion }
    }

    /// Parse `premise, premise, ... |- conclusion` (`⊢` also accepted; the
    /// premise list may be empty).
    pub fn parse(text: &str) -> Result<Inference, ParseError> {
        let (left, right) = text
            .split_once("|-")
            .or_else(|| text.split_once('⊢'))
            .ok_or_else(|| ParseError {
                message: "Expected '|-' between premises and conclusion".to_string(),
                position: text.len(),
            })?;

        let mut premises = Vec::new();
        for part in split_top_level(left) {
            let part = part.trim();
            if !part.is_empty() {
                premises.push(FormulaParser::new(part).parse()?);
            }
        }
        let conclusion = FormulaParser::new(right.trim()).parse()?;
        Ok(Inference { premises, conclusion })
    }
}

impl std::fmt::Display for Inference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let premises: Vec<String> = self.premises.iter().map(Formula::to_string).collect();
        write!(f, "{} |- {}", premises.join(", "), self.conclusion)
    }
}

/// Split on commas that sit outside parentheses and quantifier brackets, so
/// predicate argument lists survive intact.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// The outcome of [`check_inference`]: the verdict plus the countermodels
/// that witness failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub valid: bool,
    pub countermodels: Vec<Model>,
    pub open_branches: usize,
    pub closed_branches: usize,
    pub total_nodes: usize,
}

/// Structured wrapper around [`entails`]: on failure the surviving models
/// are returned as countermodels to the inference.
pub fn check_inference(
    inference: &Inference,
    options: SolveOptions,
) -> Result<InferenceResult, TableauError> {
    let result = solve(
        entailment_input(&inference.premises, &inference.conclusion),
        options,
    )?;
    Ok(InferenceResult {
        valid: !result.incomplete && !result.satisfiable,
        countermodels: result.models,
        open_branches: result.open_branches,
        closed_branches: result.closed_branches,
        total_nodes: result.total_nodes,
    })
}
