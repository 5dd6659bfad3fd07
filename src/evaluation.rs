use crate::dataset::Dataset;
use crate::errors::PolicyError;
use crate::policies::Policy;
use crate::reward::Reward;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Average rewards over one pass of a data set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub episodes: usize,
    /// Average reward of the actions drawn by the policy.
    pub realized: f64,
    /// Average reward of the policy's best action.
    pub best: f64,
}

impl Evaluation {
    pub fn as_pair(&self) -> (f64, f64) {
        (self.realized, self.best)
    }
}

/// Replays `dataset` once without updating the policy. Each step draws before
/// taking the max so runs with a fixed seed are reproducible.
pub fn evaluate(
    dataset: &Dataset,
    policy: &dyn Policy,
    reward: &dyn Reward,
    rng: &mut dyn RngCore,
) -> Result<Evaluation, PolicyError> {
    if dataset.is_empty() {
        return Ok(Evaluation::default());
    }

    let mut cumulative_realized = 0.0;
    let mut cumulative_best = 0.0;
    for index in 0..dataset.n() {
        let (context, label) = dataset.get_single(index)?;
        let drawn = policy.draw(context, rng)?;
        let best = policy.max(context)?;
        cumulative_realized += reward.reward(context, label, drawn);
        cumulative_best += reward.reward(context, label, best);
    }

    let episodes = dataset.n();
    let evaluation = Evaluation {
        episodes,
        realized: cumulative_realized / episodes as f64,
        best: cumulative_best / episodes as f64,
    };
    debug!(
        episodes,
        realized = evaluation.realized,
        best = evaluation.best,
        "Evaluated policy"
    );

    Ok(evaluation)
}
