use crate::cli::DeriveArgs;
use crate::config::load_project;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use phaseforge::engine::error::EngineError;
use phaseforge::workflows::experiment::ExperimentConfiguration;
use tracing::info;

pub fn run(args: DeriveArgs, progress: &CliProgressHandler) -> Result<()> {
    let config = load_project(&args.project)?;
    let experiment = ExperimentConfiguration::from_config(&config, &progress.reporter())?;

    experiment
        .db_neq()
        .save(&args.output)
        .map_err(EngineError::from)?;
    info!(
        "Wrote {} non-equilibrium record(s) to {:?}",
        experiment.db_neq().len(),
        args.output
    );
    println!(
        "Derived {} record(s) for {} and wrote them to {}",
        experiment.db_neq().len(),
        experiment.phase().unwrap_or("no binary phase"),
        args.output.display()
    );
    Ok(())
}
