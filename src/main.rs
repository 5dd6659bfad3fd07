use classification_bandits::config::AppConfig;
use classification_bandits::dataset::DatasetCatalog;
use classification_bandits::errors::{PersistenceError, SimulationError};
use classification_bandits::simulation::run_experiment;
use classification_bandits::state_store::StateStore;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SimulationError> {
    // an explicit path wins over config.toml + APP__* overrides
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let catalog = DatasetCatalog::new(config.datasets.clone());
    info!(
        datasets = ?catalog.names().collect::<Vec<_>>(),
        experiment = %config.experiment.dataset,
        "Configured data sets"
    );

    let train = catalog.load_train(&config.experiment.dataset)?;
    let test = catalog.load_test(&config.experiment.dataset)?;
    let outcome = run_experiment(&config.experiment, &train, &test)?;

    for report in &outcome.reports {
        let last = report.last();
        info!(
            run = %report.run_id,
            seed = ?report.seed,
            realized = last.realized,
            best = last.best,
            "Run finished"
        );
    }

    if let Some(state_store) = config.state_store {
        let store = StateStore::new(state_store);
        let mut storage = match store.load() {
            Ok(storage) => storage,
            Err(err) => {
                warn!(error = %err, path = ?store.path(), "Ignoring unreadable state store");
                Default::default()
            }
        };
        storage.extend(outcome.policies);
        store.save(&storage)?;
    }

    let reports = serde_json::to_string_pretty(&outcome.reports).map_err(PersistenceError::from)?;
    println!("{}", reports);

    Ok(())
}
