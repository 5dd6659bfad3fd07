pub mod epsilon_greedy;
pub mod greedy;
mod policy;
pub mod uniform;
pub mod weights;

pub use epsilon_greedy::EpsilonGreedy;
pub use greedy::Greedy;
pub use policy::{CloneBoxedPolicy, Policy, PolicyType, DEFAULT_EPSILON, DEFAULT_LEARNING_RATE};
pub use uniform::Uniform;
pub use weights::WeightMatrix;
