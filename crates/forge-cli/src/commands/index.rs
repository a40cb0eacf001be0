use crate::cli::IndexArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use phaseforge::core::io::index_directory_with_progress;
use phaseforge::engine::error::EngineError;
use tracing::info;

pub fn run(args: IndexArgs, progress: &CliProgressHandler) -> Result<()> {
    let reporter = progress.reporter();
    let store = reporter
        .phase("Indexing Datasets", || {
            index_directory_with_progress(&args.directory, &reporter)
        })
        .map_err(EngineError::from)?;

    println!(
        "Indexed {} dataset(s) from {}",
        store.len(),
        args.directory.display()
    );

    if let Some(output) = &args.output {
        store.save(output).map_err(EngineError::from)?;
        info!("Document store written to {:?}", output);
        println!("Store written to {}", output.display());
    }
    Ok(())
}
