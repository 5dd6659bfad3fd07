use super::policy::{
    check_action, check_context, check_parameters, check_weights, Policy, PolicyType,
};
use super::weights::{argmax, greedy_mass, WeightMatrix};

use crate::dataset::{Context, Dataset};
use crate::errors::PolicyError;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Linear epsilon-greedy policy.
///
/// Keeps one weight column per action, scoring a context as `context · w[:, a]`.
/// With probability `epsilon` an action is drawn uniformly, otherwise the best
/// scoring action is taken. Rewards are regressed with plain SGD on squared loss,
/// touching only the column of the action that was played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EpsilonGreedyState")]
pub struct EpsilonGreedy {
    k: usize,
    d: usize,
    learning_rate: f64,
    epsilon: f64,
    weights: WeightMatrix,
}

#[derive(Deserialize)]
struct EpsilonGreedyState {
    k: usize,
    d: usize,
    learning_rate: f64,
    epsilon: f64,
    weights: WeightMatrix,
}

impl TryFrom<EpsilonGreedyState> for EpsilonGreedy {
    type Error = PolicyError;

    fn try_from(state: EpsilonGreedyState) -> Result<Self, Self::Error> {
        Self::new(
            state.k,
            state.d,
            state.learning_rate,
            state.epsilon,
            Some(state.weights),
        )
    }
}

impl EpsilonGreedy {
    pub fn new(
        k: usize,
        d: usize,
        learning_rate: f64,
        epsilon: f64,
        weights: Option<WeightMatrix>,
    ) -> Result<Self, PolicyError> {
        check_parameters(k, learning_rate)?;
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(PolicyError::InvalidParameter(format!(
                "epsilon must be in [0, 1], got {}",
                epsilon
            )));
        }
        let weights = check_weights(k, d, weights)?;

        Ok(Self {
            k,
            d,
            learning_rate,
            epsilon,
            weights,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

#[typetag::serde]
impl Policy for EpsilonGreedy {
    fn policy_type(&self) -> PolicyType {
        PolicyType::EpsilonGreedy {
            learning_rate: self.learning_rate,
            epsilon: self.epsilon,
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

    fn draw(&self, context: Context<'_>, rng: &mut dyn RngCore) -> Result<usize, PolicyError> {
        if rng.random::<f64>() < self.epsilon {
            check_context(context, self.d)?;
            Ok(rng.random_range(0..self.k))
        } else {
            self.max(context)
        }
    }

    fn max(&self, context: Context<'_>) -> Result<usize, PolicyError> {
        check_context(context, self.d)?;
        Ok(argmax(&self.weights.scores(context)))
    }

    fn probability(&self, context: Context<'_>, action: usize) -> Result<f64, PolicyError> {
        check_context(context, self.d)?;
        check_action(action, self.k)?;

        let uniform = 1.0 / self.k as f64;
        let greedy = greedy_mass(&self.weights.scores(context), action);
        Ok(self.epsilon * uniform + (1.0 - self.epsilon) * greedy)
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::SmallRng, SeedableRng};

    const SEED: u64 = 1234;

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![0, 1, 0],
        )
        .unwrap()
    }

    fn make_policy(epsilon: f64) -> EpsilonGreedy {
        // action 0 for the first feature, action 1 for the second, tied on [1, 1]
        let weights = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        EpsilonGreedy::new(2, 2, 0.1, epsilon, Some(weights)).unwrap()
    }

    #[test]
    fn default_weights_are_zero() {
        let policy = EpsilonGreedy::new(3, 4, 0.01, 0.05, None).unwrap();
        assert_eq!(policy.weights.shape(), (4, 3));
        assert!(policy.weights.as_slice().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn shape_mismatch() {
        let weights = WeightMatrix::zeros(2, 3);
        assert!(matches!(
            EpsilonGreedy::new(2, 3, 0.01, 0.05, Some(weights)),
            Err(PolicyError::Shape {
                expected: (3, 2),
                got: (2, 3)
            })
        ));
    }

    #[test]
    fn invalid_epsilon() {
        assert!(EpsilonGreedy::new(2, 2, 0.01, 1.5, None).is_err());
        assert!(EpsilonGreedy::new(2, 2, 0.01, -0.1, None).is_err());
        assert!(EpsilonGreedy::new(2, 2, 0.01, f64::NAN, None).is_err());
    }

    #[test]
    fn max_is_idempotent() {
        let policy = make_policy(0.5);
        let context = Context::new(&[0.0, 2.0]);
        let first = policy.max(context).unwrap();
        assert_eq!(policy.max(context).unwrap(), first);
        assert_eq!(first, 1);
    }

    #[test]
    fn max_breaks_ties_on_lowest_action() {
        let policy = make_policy(0.5);
        let context = Context::new(&[1.0, 1.0]);
        for _ in 0..10 {
            assert_eq!(policy.max(context).unwrap(), 0);
        }
    }

    #[test]
    fn probability_splits_ties() {
        let policy = make_policy(0.2);
        let context = Context::new(&[1.0, 1.0]);
        assert_abs_diff_eq!(policy.probability(context, 0).unwrap(), 0.5);
        assert_abs_diff_eq!(policy.probability(context, 1).unwrap(), 0.5);

        let context = Context::new(&[1.0, 0.0]);
        assert_abs_diff_eq!(policy.probability(context, 0).unwrap(), 0.1 + 0.8);
        assert_abs_diff_eq!(policy.probability(context, 1).unwrap(), 0.1);
    }

    #[test]
    fn probability_with_zero_weights_is_uniform() {
        let policy = EpsilonGreedy::new(4, 2, 0.01, 0.3, None).unwrap();
        let context = Context::new(&[0.5, 2.0]);
        for action in 0..4 {
            assert_abs_diff_eq!(policy.probability(context, action).unwrap(), 0.25);
        }
        assert!(matches!(
            policy.probability(context, 4),
            Err(PolicyError::ActionOutOfRange {
                action: 4,
                num_actions: 4
            })
        ));
    }

    #[test]
    fn draw_without_exploration() {
        let policy = make_policy(0.0);
        let mut rng = SmallRng::seed_from_u64(SEED);
        let context = Context::new(&[0.0, 1.0]);
        for _ in 0..100 {
            assert_eq!(policy.draw(context, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn draw_explores() {
        let policy = make_policy(1.0);
        let mut rng = SmallRng::seed_from_u64(SEED);
        let context = Context::new(&[0.0, 1.0]);
        let explored = (0..1000)
            .filter(|_| policy.draw(context, &mut rng).unwrap() == 0)
            .count();
        assert!(explored > 400 && explored < 600);
    }

    #[test]
    fn draw_checks_context() {
        let policy = make_policy(0.0);
        let mut rng = SmallRng::seed_from_u64(SEED);
        assert!(matches!(
            policy.draw(Context::new(&[1.0]), &mut rng),
            Err(PolicyError::ContextDimension {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn update() {
        let dataset = make_dataset();
        let mut policy = make_policy(0.05);

        // context [1, 1], score on action 1 is 1.0, loss is 1.0
        policy.update(&dataset, 2, 1, 0.0).unwrap();
        assert_abs_diff_eq!(policy.weights.get(0, 1), -0.1);
        assert_abs_diff_eq!(policy.weights.get(1, 1), 0.9);
        assert_eq!(policy.weights.get(0, 0), 1.0);
        assert_eq!(policy.weights.get(1, 0), 0.0);
    }

    #[test]
    fn update_skips_zero_features() {
        let dataset = make_dataset();
        let mut policy = make_policy(0.05);
        let before = policy.weights.clone();

        policy.update(&dataset, 0, 1, 1.0).unwrap();
        assert_eq!(policy.weights.get(1, 1), before.get(1, 1));
        assert_abs_diff_eq!(policy.weights.get(0, 1), 0.1);
    }

    #[test]
    fn update_rejects_bad_arguments() {
        let dataset = make_dataset();
        let mut policy = make_policy(0.05);
        assert!(matches!(
            policy.update(&dataset, 3, 0, 1.0),
            Err(PolicyError::Dataset(_))
        ));
        assert!(matches!(
            policy.update(&dataset, 0, 2, 1.0),
            Err(PolicyError::ActionOutOfRange { .. })
        ));
    }

    #[test]
    fn snapshot_round_trip() {
        let dataset = make_dataset();
        let mut policy: Box<dyn Policy> = Box::new(make_policy(0.25));
        policy.update(&dataset, 2, 0, 0.5).unwrap();

        let json = serde_json::to_string(&policy).unwrap();
        let restored: Box<dyn Policy> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.policy_type(), policy.policy_type());
        assert_eq!(restored.num_actions(), 2);
        assert_eq!(restored.num_features(), 2);
        assert_eq!(restored.weights(), policy.weights());
    }

    #[test]
    fn snapshot_with_wrong_shape_is_rejected() {
        let json = r#"{"type":"EpsilonGreedy","k":2,"d":2,"learning_rate":0.1,"epsilon":0.1,
            "weights":{"rows":3,"cols":2,"data":[0,0,0,0,0,0]}}"#;
        assert!(serde_json::from_str::<Box<dyn Policy>>(json).is_err());
    }

    #[test]
    fn clone_is_deep() {
        let dataset = make_dataset();
        let mut policy: Box<dyn Policy> = Box::new(make_policy(0.05));
        let copy = policy.clone();

        policy.update(&dataset, 0, 0, 0.0).unwrap();
        assert_ne!(copy.weights(), policy.weights());
        assert_eq!(copy.weights().map(|w| w.get(0, 0)), Some(1.0));
    }
}
