use super::policy::{check_action, check_context, check_parameters, Policy, PolicyType};
use super::weights::WeightMatrix;

use crate::dataset::{Context, Dataset};
use crate::errors::PolicyError;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UniformState")]
pub struct Uniform {
    k: usize,
    d: usize,
}

#[derive(Deserialize)]
struct UniformState {
    k: usize,
    d: usize,
}

impl TryFrom<UniformState> for Uniform {
    type Error = PolicyError;

    fn try_from(state: UniformState) -> Result<Self, Self::Error> {
        Self::new(state.k, state.d)
    }
}

impl Uniform {
    pub fn new(k: usize, d: usize) -> Result<Self, PolicyError> {
        check_parameters(k, 0.0)?;
        Ok(Self { k, d })
    }
}

#[typetag::serde]
impl Policy for Uniform {
    fn policy_type(&self) -> PolicyType {
        PolicyType::Uniform
    }

    fn num_actions(&self) -> usize {
        self.k
    }

    fn num_features(&self) -> usize {
        self.d
    }

    fn weights(&self) -> Option<&WeightMatrix> {
        None
    }

    fn draw(&self, context: Context<'_>, rng: &mut dyn RngCore) -> Result<usize, PolicyError> {
        check_context(context, self.d)?;
        Ok(rng.random_range(0..self.k))
    }

    fn max(&self, context: Context<'_>) -> Result<usize, PolicyError> {
        // every action is tied
        check_context(context, self.d)?;
        Ok(0)
    }

    fn probability(&self, context: Context<'_>, action: usize) -> Result<f64, PolicyError> {
        check_context(context, self.d)?;
        check_action(action, self.k)?;
        Ok(1.0 / self.k as f64)
    }

    fn update(
        &mut self,
        dataset: &Dataset,
        index: usize,
        action: usize,
        _: f64,
    ) -> Result<(), PolicyError> {
        let (context, _) = dataset.get_single(index)?;
        check_context(context, self.d)?;
        check_action(action, self.k)
    }
}
