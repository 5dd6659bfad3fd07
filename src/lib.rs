pub mod config;
pub mod dataset;
pub mod errors;
pub mod evaluation;
pub mod policies;
pub mod reward;
pub mod rng;
pub mod simulation;
pub mod state_store;

pub use dataset::{Context, Dataset, DatasetCatalog, Sample};
pub use evaluation::{evaluate, Evaluation};
pub use policies::{Policy, PolicyType};
pub use reward::{Reward, RewardType};
pub use simulation::{run_experiment, train_epoch, Run, RunReport};
