mod defaults;

pub use defaults::DefaultsConfig;

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};
use phaseforge::engine::config::{self as core_config, Condition};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project file contents before defaults and command-line overrides are applied.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialProjectConfig {
    database: Option<PathBuf>,
    #[serde(rename = "data-dir")]
    data_dir: Option<PathBuf>,
    points: Option<Vec<f64>>,
    pressure: Option<toml::Value>,
    temperature: Option<toml::Value>,
    phase: Option<String>,
}

/// Numbers are taken as they are; anything else is left for the core to reject once
/// the database has been loaded.
fn condition_from_toml(value: toml::Value) -> Condition {
    match value {
        toml::Value::Integer(i) => Condition::Value(i as f64),
        toml::Value::Float(f) => Condition::Value(f),
        toml::Value::String(s) => Condition::Text(s),
        other => Condition::Text(other.to_string()),
    }
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

impl PartialProjectConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading project file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Applies command-line overrides and defaults.
    ///
    /// Paths from the file are resolved against `base_dir`; paths given on the command
    /// line are used as given.
    pub fn merge_with_cli(
        self,
        args: &ProjectArgs,
        base_dir: &Path,
        defaults: &DefaultsConfig,
    ) -> Result<core_config::ExperimentConfig> {
        let database = match (&args.database, self.database) {
            (Some(cli), _) => cli.clone(),
            (None, Some(file)) => resolve_path(base_dir, file),
            (None, None) => {
                return Err(CliError::Config(
                    "`database` is required either in the project file or via --database."
                        .to_string(),
                ));
            }
        };
        let data_dir = match (&args.data_dir, self.data_dir) {
            (Some(cli), _) => cli.clone(),
            (None, Some(file)) => resolve_path(base_dir, file),
            (None, None) => resolve_path(base_dir, defaults.data_dir.clone()),
        };

        let pressure = match (&args.pressure, self.pressure) {
            (Some(cli), _) => Condition::Text(cli.clone()),
            (None, Some(file)) => condition_from_toml(file),
            (None, None) => Condition::Value(defaults.pressure),
        };
        let temperature = match (&args.temperature, self.temperature) {
            (Some(cli), _) => Condition::Text(cli.clone()),
            (None, Some(file)) => condition_from_toml(file),
            (None, None) => Condition::Value(defaults.temperature),
        };

        core_config::ExperimentConfigBuilder::new()
            .database_path(database)
            .data_directory(data_dir)
            .points(args.points.clone().or(self.points).unwrap_or_default())
            .pressure(pressure)
            .temperature(temperature)
            .phase(args.phase.clone().or(self.phase))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

/// Reads the project file named in `args` and merges it with the overrides.
pub fn load_project(args: &ProjectArgs) -> Result<core_config::ExperimentConfig> {
    let partial = PartialProjectConfig::from_file(&args.config)?;
    let base_dir = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    partial.merge_with_cli(args, &base_dir, &DefaultsConfig::default())
}
