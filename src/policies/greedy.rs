use super::policy::{
    check_action, check_context, check_parameters, check_weights, Policy, PolicyType,
};
use super::weights::{argmax, greedy_mass, WeightMatrix};

use crate::dataset::{Context, Dataset};
use crate::errors::PolicyError;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Always exploits a linear reward estimate learned online.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GreedyState")]
pub struct Greedy {
    k: usize,
    d: usize,
    learning_rate: f64,
    weights: WeightMatrix,
}

#[derive(Deserialize)]
struct GreedyState {
    k: usize,
    d: usize,
    learning_rate: f64,
    weights: WeightMatrix,
}

impl TryFrom<GreedyState> for Greedy {
    type Error = PolicyError;

    fn try_from(state: GreedyState) -> Result<Self, Self::Error> {
        Self::new(state.k, state.d, state.learning_rate, Some(state.weights))
    }
}

impl Greedy {
    pub fn new(
        k: usize,
        d: usize,
        learning_rate: f64,
        weights: Option<WeightMatrix>,
    ) -> Result<Self, PolicyError> {
        check_parameters(k, learning_rate)?;
        let weights = check_weights(k, d, weights)?;

        Ok(Self {
            k,
            d,
            learning_rate,
            weights,
        })
    }
}

#[typetag::serde]
impl Policy for Greedy {
    fn policy_type(&self) -> PolicyType {
        PolicyType::Greedy {
            learning_rate: self.learning_rate,
        }
    }

    fn num_actions(&self) -> usize {
        self.k
    }

    fn num_features(&self) -> usize {
        self.d
    }

    fn weights(&self) -> Option<&WeightMatrix> {
        Some(&self.weights)
    }

    fn draw(&self, context: Context<'_>, _: &mut dyn RngCore) -> Result<usize, PolicyError> {
        self.max(context)
    }

    fn max(&self, context: Context<'_>) -> Result<usize, PolicyError> {
        check_context(context, self.d)?;
        Ok(argmax(&self.weights.scores(context)))
    }

    fn probability(&self, context: Context<'_>, action: usize) -> Result<f64, PolicyError> {
        check_context(context, self.d)?;
        check_action(action, self.k)?;
        Ok(greedy_mass(&self.weights.scores(context), action))
    }

    fn update(
        &mut self,
        dataset: &Dataset,
        index: usize,
        action: usize,
        reward: f64,
    ) -> Result<(), PolicyError> {
        let (context, _) = dataset.get_single(index)?;
        check_context(context, self.d)?;
        check_action(action, self.k)?;

        self.weights.sgd_step(context, action, self.learning_rate, reward);
        Ok(())
    }
}
