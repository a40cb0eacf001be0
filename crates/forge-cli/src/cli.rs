use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "PhaseForge Developers",
    version,
    about = "PhaseForge CLI - load, validate and prepare CALPHAD assessment data: a TDB database, ZPF datasets and derived mixing records.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a project and summarize the database, datasets and initial parameter values.
    Inspect(InspectArgs),
    /// Index a directory of YAML datasets into a document store.
    Index(IndexArgs),
    /// Derive the non-equilibrium mixing records of a project and write them to a store file.
    Derive(DeriveArgs),
}

/// Project file and the values that may override it.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the project file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the TDB database path.
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Override the directory of ZPF datasets.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Override the pressure in Pa.
    #[arg(long, value_name = "NUMBER")]
    pub pressure: Option<String>,

    /// Override the temperature in K.
    #[arg(long, value_name = "NUMBER")]
    pub temperature: Option<String>,

    /// Override the composition points (mole fractions of the second component).
    #[arg(long, value_name = "X,...", value_delimiter = ',')]
    pub points: Option<Vec<f64>>,

    /// Override the phase the mixing records are derived for.
    #[arg(long, value_name = "NAME")]
    pub phase: Option<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Directory to scan for .yaml/.yml datasets.
    #[arg(required = true, value_name = "DIR")]
    pub directory: PathBuf,

    /// Write the indexed store to this JSON file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `derive` subcommand.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Path of the JSON store file to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn points_are_split_on_commas() {
        let cli = Cli::try_parse_from([
            "phaseforge",
            "-vv",
            "derive",
            "-c",
            "project.toml",
            "-o",
            "neq.json",
            "--points",
            "0.1,0.5,0.9",
            "--pressure",
            "1e5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Derive(args) = cli.command else {
            panic!("expected derive");
        };
        assert_eq!(args.project.points, Some(vec![0.1, 0.5, 0.9]));
        assert_eq!(args.project.pressure.as_deref(), Some("1e5"));
        assert_eq!(args.output, PathBuf::from("neq.json"));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["phaseforge", "-q", "-v", "index", "data"]).is_err());
    }
}
