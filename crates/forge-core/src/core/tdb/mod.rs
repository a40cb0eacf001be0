//! In-memory representation of thermodynamic databases in the TDB text format.
//!
//! A [`Database`] holds the elements, species, symbols (named piecewise functions),
//! phases and model parameters of a material system. It is immutable once parsed;
//! evaluation of its expressions goes through [`expr::Evaluator`].

pub mod expr;
mod parser;

use expr::{EvalError, Evaluator, ExprError, Piecewise, StateVariables};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use thiserror::Error;

/// Species name used for vacancies in sublattice models.
pub const VACANCY: &str = "VA";

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub reference_phase: String,
    pub mass: f64,
    pub h298: f64,
    pub s298: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    pub name: String,
    pub formula: String,
}

/// A phase together with its sublattice model.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String,
    /// Model hint letters following the colon in the phase name (e.g. `L` in `LIQUID:L`).
    pub model_hints: String,
    pub site_ratios: Vec<f64>,
    /// Species allowed on each sublattice, filled in by the CONSTITUENT command.
    pub constituents: Vec<Vec<String>>,
}

impl Phase {
    pub fn sublattice_count(&self) -> usize {
        self.site_ratios.len()
    }
}

/// A model parameter such as `G(LIQUID,PT,W;1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter type: `G`, `L`, `TC`, `BMAGN`, ...
    pub kind: String,
    pub phase: String,
    pub constituent_array: Vec<Vec<String>>,
    pub order: u32,
    pub function: Piecewise,
    pub reference: Option<String>,
}

#[derive(Debug, Error)]
pub enum TdbError {
    #[error("Database file not found: '{path}'")]
    NotFound { path: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Parse error in command {command} ('{keyword}'): {kind}")]
    Parse {
        command: usize,
        keyword: String,
        kind: TdbParseErrorKind,
    },
    #[error("Evaluation of '{name}' failed: {source}")]
    Evaluation {
        name: String,
        #[source]
        source: EvalError,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TdbParseErrorKind {
    #[error("Unknown command keyword")]
    UnknownCommand,
    #[error("Keyword abbreviation matches several commands")]
    AmbiguousCommand,
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Malformed parameter descriptor '{0}'")]
    MalformedParameter(String),
    #[error("Malformed piecewise function: {0}")]
    MalformedPiecewise(String),
    #[error("Invalid expression: {0}")]
    Expression(#[from] ExprError),
    #[error("Phase declares {expected} sublattices but {found} were given")]
    SublatticeMismatch { expected: usize, found: usize },
    #[error("Constituents given for undeclared phase '{0}'")]
    UndeclaredPhase(String),
}

impl TdbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TdbError::NotFound { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    elements: Vec<Element>,
    species: Vec<Species>,
    symbols: BTreeMap<String, Piecewise>,
    phases: Vec<Phase>,
    parameters: Vec<Parameter>,
}

impl FromStr for Database {
    type Err = TdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_database(s)
    }
}

impl Database {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn symbols(&self) -> &BTreeMap<String, Piecewise> {
        &self.symbols
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn parameters_for_phase<'a>(
        &'a self,
        phase: &'a str,
    ) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameters
            .iter()
            .filter(move |p| p.phase.eq_ignore_ascii_case(phase))
    }

    /// Element names that can act as components, i.e. excluding vacancies and the
    /// electron gas, sorted alphabetically.
    pub fn components(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .elements
            .iter()
            .map(|e| e.name.clone())
            .filter(|n| n != VACANCY && n != "/-")
            .collect();
        names.sort();
        names
    }

    /// Names of the symbols that are free parameters of an assessment.
    ///
    /// These follow the `V<digits>` / `VV<digits>` naming convention and are returned
    /// in sorted order, which is the order of every parameter vector in this crate.
    pub fn symbols_to_fit(&self) -> Vec<String> {
        self.symbols
            .keys()
            .filter(|name| is_fit_symbol(name))
            .cloned()
            .collect()
    }

    pub fn evaluator(&self, state: StateVariables) -> Evaluator<'_> {
        Evaluator::new(&self.symbols, state)
    }

    pub fn evaluate_symbol(
        &self,
        name: &str,
        state: StateVariables,
        overrides: Option<&HashMap<String, f64>>,
    ) -> Result<f64, TdbError> {
        let evaluator = self.evaluator(state);
        let evaluator = match overrides {
            Some(o) => evaluator.with_overrides(o),
            None => evaluator,
        };
        evaluator.symbol(name).map_err(|source| TdbError::Evaluation {
            name: name.to_string(),
            source,
        })
    }
}

fn is_fit_symbol(name: &str) -> bool {
    let digits = name
        .strip_prefix("VV")
        .or_else(|| name.strip_prefix('V'))
        .unwrap_or("");
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::PT_W_TDB;

    fn state() -> StateVariables {
        StateVariables {
            temperature: 298.15,
            pressure: 101325.0,
        }
    }

    #[test]
    fn fit_symbol_naming_convention() {
        assert!(is_fit_symbol("VV0000"));
        assert!(is_fit_symbol("V12"));
        assert!(!is_fit_symbol("VV"));
        assert!(!is_fit_symbol("GHSERPT"));
        assert!(!is_fit_symbol("VVA1"));
        assert!(!is_fit_symbol("V"));
    }

    #[test]
    fn components_exclude_vacancy_and_electron_gas() {
        let db: Database = PT_W_TDB.parse().unwrap();
        assert_eq!(db.components(), vec!["PT".to_string(), "W".to_string()]);
    }

    #[test]
    fn symbols_to_fit_are_sorted() {
        let db: Database = PT_W_TDB.parse().unwrap();
        assert_eq!(
            db.symbols_to_fit(),
            vec!["VV0000".to_string(), "VV0001".to_string(), "VV0002".to_string()]
        );
    }

    #[test]
    fn phase_lookup_is_case_insensitive() {
        let db: Database = PT_W_TDB.parse().unwrap();
        assert!(db.phase("liquid").is_some());
        assert!(db.phase("SIGMA").is_none());
        assert_eq!(db.parameters_for_phase("LIQUID").count(), 4);
    }

    #[test]
    fn evaluate_symbol_wraps_evaluation_errors() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let err = db.evaluate_symbol("NOPE", state(), None).unwrap_err();
        assert!(matches!(
            err,
            TdbError::Evaluation {
                source: EvalError::UnknownSymbol(_),
                ..
            }
        ));
    }

    #[test]
    fn evaluate_symbol_uses_overrides_when_given() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let overrides = HashMap::from([("VV0000".to_string(), 42.0)]);
        let value = db.evaluate_symbol("VV0000", state(), Some(&overrides)).unwrap();
        assert_eq!(value, 42.0);
    }
}
