//! Tableau-based theorem proving for weak Kleene logic with restricted
//! quantification (wKrQ) and its paraconsistent bilateral extension (ACrQ).
//!
//! The crate is organised in two layers: [`models`] holds the immutable
//! syntactic and semantic value types (terms, formulas, signs, truth values,
//! rules, extracted models), while [`services`] holds the machinery that
//! operates on them (branches, the tableau engine, the oracle adapter, the
//! model verifier and the public entry points).
//!
//! The usual entry points are [`solve`], [`valid`], [`entails`] and
//! [`check_inference`]:
//!
//! ```
//! use wkrq::{entails, Formula, SolveOptions};
//!
//! let premises = vec![
//!     Formula::parse("[forall X Human(X)]Mortal(X)").unwrap(),
//!     Formula::parse("Human(socrates)").unwrap(),
//! ];
//! let conclusion = Formula::parse("Mortal(socrates)").unwrap();
//! assert!(entails(&premises, &conclusion, SolveOptions::default()).unwrap());
//! ```

pub mod models;
pub mod services;

pub use models::formula::{Atom, Formula, FormulaParser, ParseError, Quantified, SharedFormula};
pub use models::model::Model;
pub use models::rules::{Logic, Rule, RuleKind};
pub use models::semantics::{BilateralTruthValue, TruthValue};
pub use models::signs::{Sign, SignedFormula};
pub use models::term::Term;

pub use services::api::{
    check_inference, entails, solve, solve_with_oracle, valid, Inference, InferenceResult,
};
pub use services::oracle::{OracleAdapter, OracleError};
pub use services::tableau::{
    NodeId, SolveOptions, Tableau, TableauError, TableauNode, TableauResult, TraceStep,
};
