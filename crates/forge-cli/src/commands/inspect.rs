use crate::cli::InspectArgs;
use crate::config::load_project;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use phaseforge::workflows::experiment::ExperimentConfiguration;
use tracing::info;

pub fn run(args: InspectArgs, progress: &CliProgressHandler) -> Result<()> {
    let config = load_project(&args.project)?;
    info!("Inspecting project {:?}", args.project.config);
    let experiment = ExperimentConfiguration::from_config(&config, &progress.reporter())?;
    println!("{}", render_summary(&experiment)?);
    Ok(())
}

pub fn render_summary(experiment: &ExperimentConfiguration) -> Result<String> {
    let db = experiment.db();
    let mut out = String::new();

    out.push_str(&format!(
        "Database: {} phase(s), {} parameter(s), components {}\n",
        db.phases().len(),
        db.parameters().len(),
        db.components().join(", ")
    ));
    let elements: Vec<&str> = db.elements().iter().map(|e| e.name.as_str()).collect();
    out.push_str(&format!(
        "Elements: {} ({} species)\n",
        elements.join(", "),
        db.species().len()
    ));
    for phase in db.phases() {
        out.push_str(&format!(
            "  {:<12} {} sublattice(s), sites {:?}\n",
            phase.name,
            phase.sublattice_count(),
            phase.site_ratios
        ));
    }

    let symbols = experiment.symbols_to_fit();
    let values = experiment.get_initial_values()?;
    out.push_str(&format!(
        "Symbols to fit at T = {} K, P = {} Pa: {}\n",
        experiment.temperature(),
        experiment.pressure(),
        symbols.len()
    ));
    for (name, value) in symbols.iter().zip(values.iter()) {
        out.push_str(&format!("  {:<12} {}\n", name, value));
    }

    out.push_str(&format!("ZPF datasets: {}\n", experiment.db_zpf().len()));
    out.push_str(&format!(
        "Non-equilibrium records: {} ({} point(s), phase {})",
        experiment.db_neq().len(),
        experiment.points().len(),
        experiment.phase().unwrap_or("none")
    ));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProjectArgs;
    use crate::test_utils::write_demo_project;
    use phaseforge::engine::progress::ProgressReporter;
    use tempfile::tempdir;

    #[test]
    fn summary_lists_symbols_and_store_sizes() {
        let dir = tempdir().unwrap();
        let project = write_demo_project(dir.path());
        let config = load_project(&ProjectArgs {
            config: project,
            ..Default::default()
        })
        .unwrap();
        let experiment =
            ExperimentConfiguration::from_config(&config, &ProgressReporter::new()).unwrap();

        let summary = render_summary(&experiment).unwrap();
        assert!(summary.contains("Database: 3 phase(s)"));
        assert!(summary.contains("components PT, W"));
        assert!(summary.contains("VA, PT, W (0 species)"));
        assert!(summary.contains("VV0000"));
        assert!(summary.contains("-12000"));
        assert!(summary.contains("ZPF datasets: 2"));
        assert!(summary.contains("Non-equilibrium records: 18 (5 point(s), phase LIQUID)"));
    }

    #[test]
    fn run_reports_missing_database() {
        let dir = tempdir().unwrap();
        let project = write_demo_project(dir.path());
        let args = InspectArgs {
            project: ProjectArgs {
                config: project,
                database: Some(dir.path().join("missing.tdb")),
                ..Default::default()
            },
        };
        let err = run(args, &CliProgressHandler::new(false)).unwrap_err();
        assert!(matches!(err, crate::error::CliError::Core(e) if e.is_not_found()));
    }

    #[test]
    fn missing_database_wins_over_non_numeric_temperature() {
        let dir = tempdir().unwrap();
        let project = write_demo_project(dir.path());
        let args = InspectArgs {
            project: ProjectArgs {
                config: project.clone(),
                database: Some(dir.path().join("missing.tdb")),
                temperature: Some("abc".to_string()),
                ..Default::default()
            },
        };
        let err = run(args, &CliProgressHandler::new(false)).unwrap_err();
        assert!(matches!(err, crate::error::CliError::Core(e) if e.is_not_found()));

        let args = InspectArgs {
            project: ProjectArgs {
                config: project,
                temperature: Some("abc".to_string()),
                ..Default::default()
            },
        };
        let err = run(args, &CliProgressHandler::new(false)).unwrap_err();
        assert!(matches!(err, crate::error::CliError::Core(e) if e.is_invalid_value()));
    }
}
