use crate::core::io::{index_directory_with_progress, load_database};
use crate::core::store::DocumentStore;
use crate::core::tdb::Database;
use crate::core::tdb::expr::StateVariables;
use crate::engine::config::{
    Condition, ExperimentConfig, ExperimentConfigBuilder, PhysicalParameters, validate_points,
};
use crate::engine::error::EngineError;
use crate::core::mixing::find_binary_phase;
use crate::engine::neq::derive_records;
use crate::engine::objective::{Minimizer, MixingObjective, OptimizeResult};
use crate::engine::progress::ProgressReporter;
use nalgebra::DVector;
use std::path::Path;
use tracing::{info, instrument};

/// A fully loaded and validated assessment problem.
///
/// Construction either succeeds with every part in place or fails with the first
/// error encountered; the checks run in a fixed order (database file, physical
/// conditions, composition points, data directory, record derivation) so that, for
/// example, a missing database is always reported as such whatever else is wrong.
#[derive(Debug, Clone)]
pub struct ExperimentConfiguration {
    db: Database,
    db_zpf: DocumentStore,
    db_neq: DocumentStore,
    points: Vec<f64>,
    conditions: PhysicalParameters,
    phase: Option<String>,
}

impl ExperimentConfiguration {
    pub fn new(
        database_path: impl AsRef<Path>,
        data_directory: impl AsRef<Path>,
        points: Vec<f64>,
        pressure: impl Into<Condition>,
        temperature: impl Into<Condition>,
    ) -> Result<Self, EngineError> {
        let config = ExperimentConfigBuilder::new()
            .database_path(database_path.as_ref().to_path_buf())
            .data_directory(data_directory.as_ref().to_path_buf())
            .points(points)
            .pressure(pressure)
            .temperature(temperature)
            .build()?;
        Self::from_config(&config, &ProgressReporter::new())
    }

    #[instrument(skip_all, name = "experiment_setup")]
    pub fn from_config(
        config: &ExperimentConfig,
        reporter: &ProgressReporter,
    ) -> Result<Self, EngineError> {
        let db = reporter.phase("Loading Database", || load_database(&config.database_path))?;
        info!(
            "Loaded database with {} phase(s) and {} parameter(s)",
            db.phases().len(),
            db.parameters().len()
        );

        let conditions =
            PhysicalParameters::from_conditions(&config.pressure, &config.temperature)?;
        validate_points(&config.points)?;

        let db_zpf = reporter.phase("Indexing Datasets", || {
            index_directory_with_progress(&config.data_directory, reporter)
        })?;

        let state = StateVariables {
            temperature: conditions.temperature,
            pressure: conditions.pressure,
        };
        let phase = match &config.phase {
            Some(name) => Some(db.phase(name).map_or_else(|| name.clone(), |p| p.name.clone())),
            None => find_binary_phase(&db).map(|p| p.name.clone()),
        };
        let db_neq = reporter.phase("Deriving Records", || {
            derive_records(&db, phase.as_deref(), &config.points, state)
        })?;

        info!(
            "Experiment ready: {} ZPF dataset(s), {} non-equilibrium record(s) for {}",
            db_zpf.len(),
            db_neq.len(),
            phase.as_deref().unwrap_or("no binary phase")
        );
        Ok(Self {
            db,
            db_zpf,
            db_neq,
            points: config.points.clone(),
            conditions,
            phase,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn db_zpf(&self) -> &DocumentStore {
        &self.db_zpf
    }

    pub fn db_neq(&self) -> &DocumentStore {
        &self.db_neq
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn pressure(&self) -> f64 {
        self.conditions.pressure
    }

    pub fn temperature(&self) -> f64 {
        self.conditions.temperature
    }

    /// Phase the non-equilibrium records were derived for, if the database has one.
    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    pub fn symbols_to_fit(&self) -> Vec<String> {
        self.db.symbols_to_fit()
    }

    fn state(&self) -> StateVariables {
        StateVariables {
            temperature: self.conditions.temperature,
            pressure: self.conditions.pressure,
        }
    }

    /// Current values of the optimizable symbols, in sorted symbol order.
    pub fn get_initial_values(&self) -> Result<DVector<f64>, EngineError> {
        let state = self.state();
        let values = self
            .symbols_to_fit()
            .iter()
            .map(|name| self.db.evaluate_symbol(name, state, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(values))
    }

    /// Fits the optimizable symbols against the non-equilibrium records.
    #[instrument(skip_all, name = "experiment_optimize")]
    pub fn optimize(&self, minimizer: &dyn Minimizer) -> Result<OptimizeResult, EngineError> {
        let symbols = self.symbols_to_fit();
        if symbols.is_empty() {
            return Err(EngineError::NothingToFit);
        }
        let initial = self.get_initial_values()?;
        let objective =
            MixingObjective::new(&self.db, self.phase.as_deref(), &self.db_neq, symbols)?;
        info!(
            "Starting optimization of {} symbol(s) against {} residual(s)",
            initial.len(),
            objective.observation_count()
        );

        let result = minimizer.minimize(&objective, initial)?;
        info!(
            "Optimization finished: success={}, cost={:.6e}, evaluations={}",
            result.success, result.cost, result.evaluations
        );
        Ok(result)
    }
}
