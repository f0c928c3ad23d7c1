use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::term::{Term, FRESH_PREFIX};

/// Type alias for shared ownership of formulas using Arc.
/// Branch indices and tableau nodes hold formulas through this alias so that
/// branch copies on a split never deep-clone the syntax tree.
pub type SharedFormula = Arc<Formula>;

/// A predicate application in canonical form.
///
/// `negative` marks the bilateral dual `p*`: the canonical representation
/// guarantees that an atom parsed as `Flying*(tweety)` and one built
/// programmatically as the dual of `Flying(tweety)` compare equal. The
/// predicate name never carries the trailing `*` itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub predicate: String,
    pub terms: Vec<Term>,
    pub negative: bool,
}

impl Atom {
    /// Build an atom, normalising a trailing `*` on the predicate name into
    /// the `negative` flag.
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Atom {
        let mut name: String = predicate.into();
        let negative = name.ends_with('*');
        if negative {
            name.pop();
        }
        Atom { predicate: name, terms, negative }
    }

    /// A 0-ary (propositional) atom.
    pub fn propositional(name: impl Into<String>) -> Atom {
        Atom::new(name, Vec::new())
    }

    /// The bilateral dual: `p(t̄)` ↔ `p*(t̄)`.
    pub fn dual(&self) -> Atom {
        Atom { predicate: self.predicate.clone(), terms: self.terms.clone(), negative: !self.negative }
    }

    /// The positive side of the bilateral pair, regardless of polarity.
    pub fn positive(&self) -> Atom {
        Atom { predicate: self.predicate.clone(), terms: self.terms.clone(), negative: false }
    }

    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_constant)
    }

    fn instantiate(&self, variable: &str, constant: &str) -> Atom {
        let terms = self
            .terms
            .iter()
            .map(|t| match t {
                Term::Variable(name) if name == variable => Term::constant(constant),
                other => other.clone(),
            })
            .collect();
        Atom { predicate: self.predicate.clone(), terms, negative: self.negative }
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.predicate)?;
        if self.negative {
            write!(f, "*")?;
        }
        if !self.terms.is_empty() {
            let args: Vec<String> = self.terms.iter().map(Term::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

/// A restricted quantifier body: `[∀X restriction(X)] matrix(X)` or the
/// existential counterpart. The restriction is part of the quantifier, not
/// a connective inside the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantified {
    pub variable: String,
    pub restriction: Formula,
    pub matrix: Formula,
}

/// A formula of wKrQ/ACrQ.
///
/// Formulas are immutable values with structural equality, hashing and a
/// total deterministic order; they are shared via [`SharedFormula`] wherever
/// identity-heavy structures (branch indices, memo sets) hold them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Formula {
    Atom(Atom),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Exists(Box<Quantified>),
    Forall(Box<Quantified>),
}

impl Formula {
    /// Wrap the formula in an [`Arc`] for shared ownership.
    pub fn shared(self) -> SharedFormula {
        Arc::new(self)
    }

    pub fn atom(a: Atom) -> Formula {
        Formula::Atom(a)
    }

    pub fn negate(&self) -> Formula {
        Formula::Not(Box::new(self.clone()))
    }

    /// Atoms and bilateral atoms are the leaves of the tree.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Formula::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Formula::Atom(a) => Some(a),
            _ => None,
        }
    }

    /// Ground formulas contain no free variables; bound occurrences under a
    /// restricted quantifier are fine.
    pub fn is_ground(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// Variables occurring outside the scope of a quantifier binding them.
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut free = BTreeSet::new();
        let mut bound = Vec::new();
        self.collect_free(&mut bound, &mut free);
        free
    }

    fn collect_free(&self, bound: &mut Vec<String>, free: &mut BTreeSet<String>) {
        match self {
            Formula::Atom(a) => {
                for term in &a.terms {
                    if let Term::Variable(name) = term {
                        if !bound.iter().any(|b| b == name) {
                            free.insert(name.clone());
                        }
                    }
                }
            }
            Formula::Not(inner) => inner.collect_free(bound, free),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) => {
                l.collect_free(bound, free);
                r.collect_free(bound, free);
            }
            Formula::Exists(q) | Formula::Forall(q) => {
                bound.push(q.variable.clone());
                q.restriction.collect_free(bound, free);
                q.matrix.collect_free(bound, free);
                bound.pop();
            }
        }
    }

    /// All constant names occurring anywhere in the formula.
    pub fn constants(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants(&self, out: &mut BTreeSet<String>) {
        match self {
            Formula::Atom(a) => {
                for term in &a.terms {
                    if let Term::Constant(name) = term {
                        out.insert(name.clone());
                    }
                }
            }
            Formula::Not(inner) => inner.collect_constants(out),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) => {
                l.collect_constants(out);
                r.collect_constants(out);
            }
            Formula::Exists(q) | Formula::Forall(q) => {
                q.restriction.collect_constants(out);
                q.matrix.collect_constants(out);
            }
        }
    }

    /// Replace every free occurrence of `variable` with `constant`.
    /// An inner quantifier binding the same name shadows the substitution.
    pub fn instantiate(&self, variable: &str, constant: &str) -> Formula {
        match self {
            Formula::Atom(a) => Formula::Atom(a.instantiate(variable, constant)),
            Formula::Not(inner) => Formula::Not(Box::new(inner.instantiate(variable, constant))),
            Formula::And(l, r) => Formula::And(
                Box::new(l.instantiate(variable, constant)),
                Box::new(r.instantiate(variable, constant)),
            ),
            Formula::Or(l, r) => Formula::Or(
                Box::new(l.instantiate(variable, constant)),
                Box::new(r.instantiate(variable, constant)),
            ),
            Formula::Implies(l, r) => Formula::Implies(
                Box::new(l.instantiate(variable, constant)),
                Box::new(r.instantiate(variable, constant)),
            ),
            Formula::Exists(q) if q.variable == variable => self.clone(),
            Formula::Forall(q) if q.variable == variable => self.clone(),
            Formula::Exists(q) => Formula::Exists(Box::new(Quantified {
                variable: q.variable.clone(),
                restriction: q.restriction.instantiate(variable, constant),
                matrix: q.matrix.instantiate(variable, constant),
            })),
            Formula::Forall(q) => Formula::Forall(Box::new(Quantified {
                variable: q.variable.clone(),
                restriction: q.restriction.instantiate(variable, constant),
                matrix: q.matrix.instantiate(variable, constant),
            })),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Formula::Atom(_) => 5,
            Formula::Not(_) | Formula::Exists(_) | Formula::Forall(_) => 4,
            Formula::And(_, _) => 3,
            Formula::Or(_, _) => 2,
            Formula::Implies(_, _) => 1,
        }
    }

    fn maybe_paren(inner: &Formula, outer: &Formula, is_left: bool) -> String {
        let needs_parens = inner.precedence() < outer.precedence()
            || (inner.precedence() == outer.precedence()
                && !is_left
                && matches!(outer, Formula::Implies(_, _)));
        if needs_parens {
            format!("({})", inner)
        } else {
            inner.to_string()
        }
    }

    fn unary_operand(inner: &Formula) -> String {
        // Prefix forms (atoms, negations, quantifiers) re-parse unambiguously
        // without parentheses; binary connectives do not.
        if matches!(
            inner,
            Formula::Atom(_) | Formula::Not(_) | Formula::Exists(_) | Formula::Forall(_)
        ) {
            inner.to_string()
        } else {
            format!("({})", inner)
        }
    }

    /// Parse a formula from the ASCII surface syntax.
    pub fn parse(input: &str) -> Result<Formula, ParseError> {
        let mut parser = FormulaParser::new(input);
        parser.parse()
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formula::Atom(a) => write!(f, "{}", a),
            Formula::Not(inner) => write!(f, "~{}", Formula::unary_operand(inner)),
            Formula::And(l, r) => write!(
                f,
                "{} & {}",
                Formula::maybe_paren(l, self, true),
                Formula::maybe_paren(r, self, false)
            ),
            Formula::Or(l, r) => write!(
                f,
                "{} | {}",
                Formula::maybe_paren(l, self, true),
                Formula::maybe_paren(r, self, false)
            ),
            Formula::Implies(l, r) => write!(
                f,
                "{} -> {}",
                Formula::maybe_paren(l, self, true),
                Formula::maybe_paren(r, self, false)
            ),
            Formula::Exists(q) => write!(
                f,
                "[exists {} {}]{}",
                q.variable,
                q.restriction,
                Formula::unary_operand(&q.matrix)
            ),
            Formula::Forall(q) => write!(
                f,
                "[forall {} {}]{}",
                q.variable,
                q.restriction,
                Formula::unary_operand(&q.matrix)
            ),
        }
    }
}

/// Maximum nesting depth allowed while parsing.
const MAX_PARSE_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser for the surface syntax:
///
/// ```text
/// φ ::= atom | ~φ | (φ & φ) | (φ | φ) | (φ -> φ) | (φ <-> φ)
///     | [forall X α(X)]β(X) | [exists X α(X)]β(X)
/// atom ::= Ident | Ident'(' term (',' term)* ')' | Ident'*'(...)
/// ```
///
/// Predicate names start uppercase; a trailing `*` marks the bilateral dual.
/// Uppercase identifiers in term position are variables, lowercase ones are
/// constants. `<->` has no ADT counterpart and desugars into the conjunction
/// of the two implications.
pub struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0, depth: 0 }
    }

    pub fn parse(&mut self) -> Result<Formula, ParseError> {
        self.skip_whitespace();
        let result = self.parse_biconditional()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!(
                "Unexpected character: '{}'",
                self.current_char().unwrap()
            )));
        }
        Ok(result)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError { message: message.into(), position: self.pos }
    }

    fn enter_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(self.error(format!(
                "Formula too deeply nested (max {} levels)",
                MAX_PARSE_DEPTH
            )));
        }
        Ok(())
    }

    fn exit_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_biconditional(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_implication()?;
        self.skip_whitespace();
        while self.matches("<->") || self.matches("↔") {
            self.enter_depth()?;
            let right = self.parse_implication()?;
            // No biconditional node in the ADT: φ <-> ψ is (φ -> ψ) & (ψ -> φ).
            let forward = Formula::Implies(Box::new(left.clone()), Box::new(right.clone()));
            let backward = Formula::Implies(Box::new(right), Box::new(left));
            left = Formula::And(Box::new(forward), Box::new(backward));
            self.exit_depth();
            self.skip_whitespace();
        }
        Ok(left)
    }

    fn parse_implication(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_disjunction()?;
        self.skip_whitespace();
        while self.matches("->") || self.matches("→") {
            self.enter_depth()?;
            let right = self.parse_implication()?; // Right associative
            left = Formula::Implies(Box::new(left), Box::new(right));
            self.exit_depth();
            self.skip_whitespace();
        }
        Ok(left)
    }

    fn parse_disjunction(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_conjunction()?;
        self.skip_whitespace();
        while self.matches("|") || self.matches("∨") {
            self.enter_depth()?;
            let right = self.parse_conjunction()?;
            left = Formula::Or(Box::new(left), Box::new(right));
            self.exit_depth();
            self.skip_whitespace();
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_negation()?;
        self.skip_whitespace();
        while self.matches("&") || self.matches("∧") {
            self.enter_depth()?;
            let right = self.parse_negation()?;
            left = Formula::And(Box::new(left), Box::new(right));
            self.exit_depth();
            self.skip_whitespace();
        }
        Ok(left)
    }

    fn parse_negation(&mut self) -> Result<Formula, ParseError> {
        self.skip_whitespace();
        if self.matches("~") || self.matches("¬") {
            self.enter_depth()?;
            let inner = self.parse_negation()?;
            self.exit_depth();
            Ok(Formula::Not(Box::new(inner)))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<Formula, ParseError> {
        self.skip_whitespace();

        if self.matches("[") {
            return self.parse_quantifier();
        }

        if self.matches("(") {
            self.enter_depth()?;
            let inner = self.parse_biconditional()?;
            self.skip_whitespace();
            if !self.matches(")") {
                return Err(self.error("Expected closing parenthesis ')'"));
            }
            self.exit_depth();
            return Ok(inner);
        }

        let start = self.pos;
        let name = self.parse_identifier()?;
        if !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            self.pos = start;
            return Err(self.error(format!(
                "Predicate names must start with an uppercase letter, got '{}'",
                name
            )));
        }

        let negative = self.input[self.pos..].starts_with('*');
        let predicate = if negative {
            self.pos += 1;
            format!("{}*", name)
        } else {
            name
        };

        let mut terms = Vec::new();
        if self.matches_no_ws("(") {
            self.enter_depth()?;
            loop {
                terms.push(self.parse_term()?);
                self.skip_whitespace();
                if self.matches(",") {
                    continue;
                }
                if self.matches(")") {
                    break;
                }
                return Err(self.error("Expected ',' or ')' in argument list"));
            }
            self.exit_depth();
        }

        Ok(Formula::Atom(Atom::new(predicate, terms)))
    }

    fn parse_quantifier(&mut self) -> Result<Formula, ParseError> {
        self.enter_depth()?;
        let universal = if self.matches("forall") || self.matches("∀") {
            true
        } else if self.matches("exists") || self.matches("∃") {
            false
        } else {
            return Err(self.error("Expected 'forall' or 'exists' after '['"));
        };

        self.skip_whitespace();
        let variable = self.parse_identifier()?;
        if !variable.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return Err(self.error(format!(
                "Quantified variables must start with an uppercase letter, got '{}'",
                variable
            )));
        }

        let restriction = self.parse_biconditional()?;
        self.skip_whitespace();
        if !self.matches("]") {
            return Err(self.error("Expected ']' closing the quantifier restriction"));
        }
        let matrix = self.parse_negation()?;
        self.exit_depth();

        let body = Box::new(Quantified { variable, restriction, matrix });
        Ok(if universal { Formula::Forall(body) } else { Formula::Exists(body) })
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        self.skip_whitespace();
        let name = self.parse_identifier()?;
        let first = name.chars().next().unwrap();
        if first.is_ascii_uppercase() {
            Ok(Term::Variable(name))
        } else {
            if name.starts_with(FRESH_PREFIX) {
                return Err(self.error(format!(
                    "Constant '{}' uses the reserved prefix '{}'",
                    name, FRESH_PREFIX
                )));
            }
            Ok(Term::Constant(name))
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("Expected an identifier"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn matches(&mut self, s: &str) -> bool {
        self.skip_whitespace();
        self.matches_no_ws(s)
    }

    fn matches_no_ws(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }
}
