//! The seam between an assessment and the optimizer that fits it.
//!
//! An [`Objective`] maps a parameter vector (one entry per optimizable symbol, in
//! sorted symbol order) to a residual vector. A [`Minimizer`] is any external
//! least-squares routine that drives an objective from an initial guess.

use super::error::EngineError;
use super::neq::target_phase;
use crate::core::mixing::{BinaryMixingModel, MixingProperty};
use crate::core::store::{DocumentStore, StructuredRecord};
use crate::core::tdb::Database;
use crate::core::tdb::expr::StateVariables;
use nalgebra::DVector;
use std::collections::HashMap;
use tracing::debug;

pub trait Objective {
    fn dimension(&self) -> usize;

    fn residuals(&self, parameters: &DVector<f64>) -> Result<DVector<f64>, EngineError>;

    /// Sum of squared residuals.
    fn cost(&self, parameters: &DVector<f64>) -> Result<f64, EngineError> {
        Ok(self.residuals(parameters)?.norm_squared())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResult {
    pub success: bool,
    pub x: DVector<f64>,
    pub cost: f64,
    pub evaluations: usize,
    pub message: String,
}

pub trait Minimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        initial: DVector<f64>,
    ) -> Result<OptimizeResult, EngineError>;
}

#[derive(Debug, Clone, PartialEq)]
struct Observation {
    property: MixingProperty,
    x: f64,
    state: StateVariables,
    value: f64,
}

/// Residuals of the mixing model against the non-equilibrium records of a store.
///
/// Every configuration of every record whose `output` names a mixing property
/// contributes one residual, `model - observed`.
pub struct MixingObjective<'a> {
    model: BinaryMixingModel<'a>,
    symbols: Vec<String>,
    observations: Vec<Observation>,
}

impl<'a> MixingObjective<'a> {
    pub fn new(
        db: &'a Database,
        phase: Option<&str>,
        records: &DocumentStore,
        symbols: Vec<String>,
    ) -> Result<Self, EngineError> {
        let model = target_phase(db, phase)?;
        let mut observations = Vec::new();
        for (id, record) in records.iter() {
            let Some(property) = record
                .get("output")
                .and_then(|v| v.as_str())
                .and_then(MixingProperty::from_name)
            else {
                continue;
            };
            observations.extend(
                observations_of(record, property)
                    .map_err(|reason| EngineError::Evaluation(format!("record {}: {}", id, reason)))?,
            );
        }
        debug!(
            "Mixing objective over {} observation(s) and {} symbol(s)",
            observations.len(),
            symbols.len()
        );
        Ok(Self {
            model,
            symbols,
            observations,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

fn observations_of(
    record: &StructuredRecord,
    property: MixingProperty,
) -> Result<Vec<Observation>, String> {
    let number = |pointer: &str| {
        record
            .pointer(pointer)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| format!("missing numeric '{}'", pointer))
    };
    let state = StateVariables {
        temperature: number("/conditions/T")?,
        pressure: number("/conditions/P")?,
    };
    let occupancies = record
        .pointer("/solver/sublattice_occupancies")
        .and_then(|v| v.as_array())
        .ok_or("missing solver occupancies")?;
    let values = record
        .pointer("/values/0/0")
        .and_then(|v| v.as_array())
        .ok_or("missing values")?;
    if values.len() != occupancies.len() {
        return Err(format!(
            "{} values for {} configurations",
            values.len(),
            occupancies.len()
        ));
    }

    occupancies
        .iter()
        .zip(values)
        .map(|(occupancy, value)| -> Result<Observation, String> {
            Ok(Observation {
                property,
                x: occupancy
                    .pointer("/0/1")
                    .and_then(|v| v.as_f64())
                    .ok_or("malformed occupancy")?,
                state,
                value: value.as_f64().ok_or("non-numeric value")?,
            })
        })
        .collect()
}

impl Objective for MixingObjective<'_> {
    fn dimension(&self) -> usize {
        self.symbols.len()
    }

    fn residuals(&self, parameters: &DVector<f64>) -> Result<DVector<f64>, EngineError> {
        if parameters.len() != self.symbols.len() {
            return Err(EngineError::Evaluation(format!(
                "expected {} parameters, got {}",
                self.symbols.len(),
                parameters.len()
            )));
        }
        let overrides: HashMap<String, f64> = self
            .symbols
            .iter()
            .cloned()
            .zip(parameters.iter().copied())
            .collect();

        let residuals = self
            .observations
            .iter()
            .map(|obs| {
                self.model
                    .property(obs.property, obs.x, obs.state, Some(&overrides))
                    .map(|model| model - obs.value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(residuals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::neq::derive_records;
    use crate::test_utils::PT_W_TDB;

    struct SingleStep;

    impl Minimizer for SingleStep {
        fn minimize(
            &self,
            objective: &dyn Objective,
            initial: DVector<f64>,
        ) -> Result<OptimizeResult, EngineError> {
            let cost = objective.cost(&initial)?;
            Ok(OptimizeResult {
                success: true,
                x: initial,
                cost,
                evaluations: 1,
                message: "evaluated initial point".to_string(),
            })
        }
    }

    fn state() -> StateVariables {
        StateVariables {
            temperature: 1500.0,
            pressure: 101325.0,
        }
    }

    fn initial(db: &Database) -> DVector<f64> {
        let values: Vec<f64> = db
            .symbols_to_fit()
            .iter()
            .map(|s| db.evaluate_symbol(s, state(), None).unwrap())
            .collect();
        DVector::from_vec(values)
    }

    #[test]
    fn residuals_vanish_at_the_generating_parameters() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let records = derive_records(&db, None, &[0.2, 0.6], state()).unwrap();
        let objective = MixingObjective::new(&db, None, &records, db.symbols_to_fit()).unwrap();

        assert_eq!(objective.dimension(), 3);
        assert_eq!(objective.observation_count(), 3 * 2 + 2 * 3);
        assert!(objective.cost(&initial(&db)).unwrap() < 1e-6);
    }

    #[test]
    fn moving_away_from_the_generating_parameters_costs_something() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let records = derive_records(&db, None, &[0.5], state()).unwrap();
        let objective = MixingObjective::new(&db, None, &records, db.symbols_to_fit()).unwrap();
        let mut shifted = initial(&db);
        shifted[0] += 1000.0;
        assert!(objective.cost(&shifted).unwrap() > 1.0);
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let records = derive_records(&db, None, &[], state()).unwrap();
        let objective = MixingObjective::new(&db, None, &records, db.symbols_to_fit()).unwrap();
        assert!(matches!(
            objective.residuals(&DVector::zeros(2)),
            Err(EngineError::Evaluation(_))
        ));
    }

    #[test]
    fn records_without_mixing_output_are_skipped() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let mut records = DocumentStore::new();
        records.insert(StructuredRecord::try_from(serde_json::json!({"output": "ZPF"})).unwrap());
        let objective = MixingObjective::new(&db, None, &records, db.symbols_to_fit()).unwrap();
        assert_eq!(objective.observation_count(), 0);
    }

    #[test]
    fn malformed_mixing_record_is_an_error() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let mut records = DocumentStore::new();
        records.insert(
            StructuredRecord::try_from(serde_json::json!({"output": "HM_MIX", "conditions": {"T": 300}}))
                .unwrap(),
        );
        assert!(MixingObjective::new(&db, None, &records, db.symbols_to_fit()).is_err());
    }

    #[test]
    fn minimizer_sees_the_objective_through_the_trait() {
        let db: Database = PT_W_TDB.parse().unwrap();
        let records = derive_records(&db, None, &[0.5], state()).unwrap();
        let objective = MixingObjective::new(&db, None, &records, db.symbols_to_fit()).unwrap();
        let result = SingleStep.minimize(&objective, initial(&db)).unwrap();
        assert!(result.success);
        assert_eq!(result.x.len(), 3);
        assert_eq!(result.evaluations, 1);
    }
}
