use super::epsilon_greedy::EpsilonGreedy;
use super::greedy::Greedy;
use super::uniform::Uniform;
use super::weights::WeightMatrix;

use crate::dataset::{Context, Dataset};
use crate::errors::PolicyError;

use rand::RngCore;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_EPSILON: f64 = 0.05;

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Uniform,
    Greedy {
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
    },
    EpsilonGreedy {
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
    },
}

impl PolicyType {
    /// Builds a policy over `k` actions and `d` features.
    pub fn into_inner(
        self,
        k: usize,
        d: usize,
        weights: Option<WeightMatrix>,
    ) -> Result<Box<dyn Policy>, PolicyError> {
        let policy: Box<dyn Policy> = match self {
            PolicyType::Uniform => {
                if weights.is_some() {
                    return Err(PolicyError::InvalidParameter(
                        "uniform policy has no weights".to_string(),
                    ));
                }
                Box::new(Uniform::new(k, d)?)
            }
            PolicyType::Greedy { learning_rate } => {
                Box::new(Greedy::new(k, d, learning_rate, weights)?)
            }
            PolicyType::EpsilonGreedy {
                learning_rate,
                epsilon,
            } => Box::new(EpsilonGreedy::new(k, d, learning_rate, epsilon, weights)?),
        };

        Ok(policy)
    }
}

impl Clone for Box<dyn Policy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedPolicy {
    fn clone_box(&self) -> Box<dyn Policy>;
}

impl<T> CloneBoxedPolicy for T
where
    T: Policy + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

#[typetag::serde(tag = "type")]
pub trait Policy: Send + Sync + CloneBoxedPolicy {
    fn policy_type(&self) -> PolicyType;
    fn num_actions(&self) -> usize;
    fn num_features(&self) -> usize;
    fn weights(&self) -> Option<&WeightMatrix>;
    /// Stochastic choice used while learning.
    fn draw(&self, context: Context<'_>, rng: &mut dyn RngCore) -> Result<usize, PolicyError>;
    /// Best action under the current state, ties going to the lowest index.
    fn max(&self, context: Context<'_>) -> Result<usize, PolicyError>;
    fn probability(&self, context: Context<'_>, action: usize) -> Result<f64, PolicyError>;
    fn update(
        &mut self,
        dataset: &Dataset,
        index: usize,
        action: usize,
        reward: f64,
    ) -> Result<(), PolicyError>;
}

pub(super) fn check_parameters(k: usize, learning_rate: f64) -> Result<(), PolicyError> {
    if k == 0 {
        return Err(PolicyError::InvalidParameter(
            "a policy needs at least one action".to_string(),
        ));
    }
    if !learning_rate.is_finite() || learning_rate < 0.0 {
        return Err(PolicyError::InvalidParameter(format!(
            "learning rate must be finite and non-negative, got {}",
            learning_rate
        )));
    }
    Ok(())
}

pub(super) fn check_weights(
    k: usize,
    d: usize,
    weights: Option<WeightMatrix>,
) -> Result<WeightMatrix, PolicyError> {
    match weights {
        Some(weights) if weights.shape() != (d, k) => Err(PolicyError::Shape {
            expected: (d, k),
            got: weights.shape(),
        }),
        Some(weights) => Ok(weights),
        None => Ok(WeightMatrix::zeros(d, k)),
    }
}

pub(super) fn check_context(context: Context<'_>, d: usize) -> Result<(), PolicyError> {
    if context.len() != d {
        return Err(PolicyError::ContextDimension {
            expected: d,
            got: context.len(),
        });
    }
    Ok(())
}

pub(super) fn check_action(action: usize, k: usize) -> Result<(), PolicyError> {
    if action >= k {
        return Err(PolicyError::ActionOutOfRange {
            action,
            num_actions: k,
        });
    }
    Ok(())
}
