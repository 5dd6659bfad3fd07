//! Online training over a replayed data set, one independent run per seed.

use crate::config::ExperimentConfig;
use crate::dataset::Dataset;
use crate::errors::{PolicyError, SimulationError};
use crate::evaluation::{evaluate, Evaluation};
use crate::policies::{Policy, PolicyType};
use crate::reward::Reward;
use crate::rng::MaybeSeededRng;

use rand::{seq::SliceRandom, RngCore};
use serde::Serialize;
use std::collections::HashMap;
use std::thread;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EpochStats {
    pub episodes: usize,
    pub cumulative_reward: f64,
}

impl EpochStats {
    pub fn average_reward(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.cumulative_reward / self.episodes as f64
        }
    }
}

/// Plays every row once under bandit feedback: the policy draws an action, only that
/// action's reward is revealed, and the policy learns from it.
pub fn train_epoch(
    dataset: &Dataset,
    policy: &mut dyn Policy,
    reward: &dyn Reward,
    rng: &mut dyn RngCore,
    shuffle: bool,
) -> Result<EpochStats, PolicyError> {
    let mut order = (0..dataset.n()).collect::<Vec<_>>();
    if shuffle {
        order.shuffle(rng);
    }

    let mut stats = EpochStats::default();
    for index in order {
        let (context, label) = dataset.get_single(index)?;
        let action = policy.draw(context, rng)?;
        let r = reward.reward(context, label, action);
        policy.update(dataset, index, action, r)?;

        stats.episodes += 1;
        stats.cumulative_reward += r;
    }

    Ok(stats)
}

#[derive(Clone, Debug, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub train_reward: f64,
    pub test: Evaluation,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub seed: Option<u64>,
    pub policy: PolicyType,
    pub initial: Evaluation,
    pub epochs: Vec<EpochReport>,
}

impl RunReport {
    pub fn last(&self) -> Evaluation {
        self.epochs
            .last()
            .map(|report| report.test)
            .unwrap_or(self.initial)
    }
}

/// A policy together with the random stream driving it.
#[derive(Clone)]
pub struct Run {
    id: Uuid,
    policy: Box<dyn Policy>,
    rng: MaybeSeededRng,
}

impl Run {
    pub fn new(policy: Box<dyn Policy>, seed: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy,
            rng: MaybeSeededRng::new(seed),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng.seed
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    pub fn into_policy(self) -> Box<dyn Policy> {
        self.policy
    }

    pub fn train_epoch(
        &mut self,
        dataset: &Dataset,
        reward: &dyn Reward,
        shuffle: bool,
    ) -> Result<EpochStats, PolicyError> {
        train_epoch(
            dataset,
            self.policy.as_mut(),
            reward,
            self.rng.get_rng(),
            shuffle,
        )
    }

    pub fn evaluate(
        &mut self,
        dataset: &Dataset,
        reward: &dyn Reward,
    ) -> Result<Evaluation, PolicyError> {
        evaluate(dataset, self.policy.as_ref(), reward, self.rng.get_rng())
    }

    /// Trains for `epochs` passes over `train`, evaluating on `test` before the first
    /// pass and after each one.
    pub fn train(
        &mut self,
        train: &Dataset,
        test: &Dataset,
        reward: &dyn Reward,
        epochs: usize,
        shuffle: bool,
    ) -> Result<RunReport, PolicyError> {
        let initial = self.evaluate(test, reward)?;
        debug!(
            run = %self.id,
            realized = initial.realized,
            best = initial.best,
            "Initial evaluation"
        );

        let mut reports = Vec::with_capacity(epochs);
        for epoch in 1..=epochs {
            let stats = self.train_epoch(train, reward, shuffle)?;
            let evaluation = self.evaluate(test, reward)?;
            info!(
                run = %self.id,
                epoch,
                train_reward = stats.average_reward(),
                realized = evaluation.realized,
                best = evaluation.best,
                "Finished epoch"
            );

            reports.push(EpochReport {
                epoch,
                train_reward: stats.average_reward(),
                test: evaluation,
            });
        }

        Ok(RunReport {
            run_id: self.id,
            seed: self.seed(),
            policy: self.policy.policy_type(),
            initial,
            epochs: reports,
        })
    }
}

pub struct ExperimentOutcome {
    pub reports: Vec<RunReport>,
    pub policies: HashMap<Uuid, Box<dyn Policy>>,
}

/// Runs the configured experiment once per seed, each run on its own thread with its
/// own policy. Without seeds a single run is drawn from entropy.
pub fn run_experiment(
    config: &ExperimentConfig,
    train: &Dataset,
    test: &Dataset,
) -> Result<ExperimentOutcome, SimulationError> {
    let seeds = if config.seeds.is_empty() {
        vec![None]
    } else {
        config.seeds.iter().copied().map(Some).collect()
    };
    let reward = config.reward.clone().into_inner();
    let reward = reward.as_ref();

    info!(
        runs = seeds.len(),
        epochs = config.epochs,
        n = train.n(),
        d = train.d(),
        k = train.k(),
        "Starting experiment"
    );

    let results = thread::scope(|scope| {
        let handles = seeds
            .iter()
            .map(|&seed| {
                let policy_type = config.policy.clone();
                scope.spawn(move || -> Result<(RunReport, Box<dyn Policy>), PolicyError> {
                    let policy = policy_type.into_inner(train.k(), train.d(), None)?;
                    let mut run = Run::new(policy, seed);
                    let report = run.train(train, test, reward, config.epochs, config.shuffle)?;
                    Ok((report, run.into_policy()))
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .zip(&seeds)
            .map(|(handle, &seed)| {
                handle
                    .join()
                    .map_err(|_| SimulationError::RunPanicked(seed))?
                    .map_err(SimulationError::from)
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut outcome = ExperimentOutcome {
        reports: Vec::with_capacity(results.len()),
        policies: HashMap::with_capacity(results.len()),
    };
    for (report, policy) in results {
        outcome.policies.insert(report.run_id, policy);
        outcome.reports.push(report);
    }

    Ok(outcome)
}
