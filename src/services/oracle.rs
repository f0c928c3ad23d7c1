//! Thin wrapper around a caller-supplied atomic evaluator.
//!
//! The engine never talks to the evaluator directly: the adapter is handed
//! ground atoms (without their signs, the oracle assesses the atom, not the
//! claim) and answers with a bilateral truth value. Idempotence per branch
//! is the branch's job; the adapter itself is stateless.

use std::fmt;

use thiserror::Error;

use crate::models::formula::Atom;
use crate::models::semantics::BilateralTruthValue;

/// Failure raised by the caller's evaluator. The engine treats it as "no
/// information": the offending atom is skipped on the asking branch.
#[derive(Debug, Clone, Error)]
#[error("oracle evaluation failed: {message}")]
pub struct OracleError {
    message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> OracleError {
        OracleError { message: message.into() }
    }
}

type Evaluator = dyn Fn(&Atom) -> Result<BilateralTruthValue, OracleError>;

/// A caller-supplied evaluator plus its gap policy.
///
/// With `gap_as_unknown` disabled (the default) a `<f,f>` verdict records
/// `f` for both the atom and its dual, which refutes a `t`-signed atom on
/// the branch. Enabled, the same verdict records only the non-closing `v`
/// marker: absence of evidence stops forcing a negative verdict.
pub struct OracleAdapter {
    evaluator: Box<Evaluator>,
    gap_as_unknown: bool,
}

impl OracleAdapter {
    pub fn new(
        evaluator: impl Fn(&Atom) -> Result<BilateralTruthValue, OracleError> + 'static,
    ) -> OracleAdapter {
        OracleAdapter { evaluator: Box::new(evaluator), gap_as_unknown: false }
    }

    /// Record `<f,f>` verdicts as the non-closing `v` marker instead of a
    /// pair of `f` conclusions.
    pub fn gap_as_unknown(mut self, enabled: bool) -> OracleAdapter {
        self.gap_as_unknown = enabled;
        self
    }

    pub fn records_gap_as_unknown(&self) -> bool {
        self.gap_as_unknown
    }

    pub fn evaluate(&self, atom: &Atom) -> Result<BilateralTruthValue, OracleError> {
        (self.evaluator)(atom)
    }
}

impl fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("gap_as_unknown", &self.gap_as_unknown)
            .finish_non_exhaustive()
    }
}
