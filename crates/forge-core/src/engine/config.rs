use super::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Pressure (Pa) and temperature (K) an assessment is set up at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    pub pressure: f64,
    pub temperature: f64,
}

impl PhysicalParameters {
    pub fn new(pressure: f64, temperature: f64) -> Result<Self, EngineError> {
        Ok(Self {
            pressure: check_positive("pressure", pressure)?,
            temperature: check_positive("temperature", temperature)?,
        })
    }

    /// Parses and checks conditions as they were supplied, pressure first.
    pub fn from_conditions(
        pressure: &Condition,
        temperature: &Condition,
    ) -> Result<Self, EngineError> {
        let pressure = check_positive("pressure", pressure.resolve("pressure")?)?;
        let temperature = check_positive("temperature", temperature.resolve("temperature")?)?;
        Ok(Self {
            pressure,
            temperature,
        })
    }
}

/// A pressure or temperature as supplied: a number, or text that is parsed once the
/// database has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Value(f64),
    Text(String),
}

impl Condition {
    pub fn resolve(&self, name: &'static str) -> Result<f64, EngineError> {
        match self {
            Condition::Value(value) => Ok(*value),
            Condition::Text(text) => parse_scalar(name, text),
        }
    }
}

impl From<f64> for Condition {
    fn from(value: f64) -> Self {
        Condition::Value(value)
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Condition::Text(text)
    }
}

impl From<&str> for Condition {
    fn from(text: &str) -> Self {
        Condition::Text(text.to_string())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidValue {
            name,
            value: value.to_string(),
        })
    }
}

/// Parses a numeric condition given as text, e.g. from a project file or the command line.
pub fn parse_scalar(name: &'static str, text: &str) -> Result<f64, EngineError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| EngineError::InvalidValue {
            name,
            value: text.to_string(),
        })
}

/// Checks that every composition point is a mole fraction in `[0, 1]`.
pub fn validate_points(points: &[f64]) -> Result<(), EngineError> {
    match points
        .iter()
        .find(|x| !(x.is_finite() && (0.0..=1.0).contains(*x)))
    {
        Some(bad) => Err(EngineError::InvalidValue {
            name: "composition point",
            value: bad.to_string(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub database_path: PathBuf,
    pub data_directory: PathBuf,
    pub points: Vec<f64>,
    pub pressure: Condition,
    pub temperature: Condition,
    /// Phase the non-equilibrium records are derived for; chosen from the database when unset.
    pub phase: Option<String>,
}

#[derive(Default)]
pub struct ExperimentConfigBuilder {
    database_path: Option<PathBuf>,
    data_directory: Option<PathBuf>,
    points: Option<Vec<f64>>,
    pressure: Option<Condition>,
    temperature: Option<Condition>,
    phase: Option<String>,
}

impl ExperimentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.database_path = Some(path);
        self
    }
    pub fn data_directory(mut self, path: PathBuf) -> Self {
        self.data_directory = Some(path);
        self
    }
    pub fn points(mut self, points: Vec<f64>) -> Self {
        self.points = Some(points);
        self
    }
    pub fn pressure(mut self, pressure: impl Into<Condition>) -> Self {
        self.pressure = Some(pressure.into());
        self
    }
    pub fn temperature(mut self, temperature: impl Into<Condition>) -> Self {
        self.temperature = Some(temperature.into());
        self
    }
    pub fn phase(mut self, phase: Option<String>) -> Self {
        self.phase = phase;
        self
    }

    /// Assembles the configuration. Values are checked later, once the database is loaded.
    pub fn build(self) -> Result<ExperimentConfig, ConfigError> {
        Ok(ExperimentConfig {
            database_path: self
                .database_path
                .ok_or(ConfigError::MissingParameter("database_path"))?,
            data_directory: self
                .data_directory
                .ok_or(ConfigError::MissingParameter("data_directory"))?,
            points: self.points.unwrap_or_default(),
            pressure: self
                .pressure
                .ok_or(ConfigError::MissingParameter("pressure"))?,
            temperature: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            phase: self.phase,
        })
    }
}
