use crate::dataset::Context;

use serde::{Deserialize, Serialize};

/// Reward observed for playing `action` on a context whose true class is `label`.
pub trait Reward: Send + Sync {
    fn reward(&self, context: Context<'_>, label: usize, action: usize) -> f64;
}

impl<F> Reward for F
where
    F: Fn(Context<'_>, usize, usize) -> f64 + Send + Sync,
{
    fn reward(&self, context: Context<'_>, label: usize, action: usize) -> f64 {
        self(context, label, action)
    }
}

/// 1 for predicting the label, 0 otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZeroOne;

impl Reward for ZeroOne {
    fn reward(&self, _: Context<'_>, label: usize, action: usize) -> f64 {
        if action == label {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostSensitive {
    pub correct: f64,
    pub incorrect: f64,
}

impl Reward for CostSensitive {
    fn reward(&self, _: Context<'_>, label: usize, action: usize) -> f64 {
        if action == label {
            self.correct
        } else {
            self.incorrect
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    #[default]
    ZeroOne,
    CostSensitive {
        correct: f64,
        incorrect: f64,
    },
}

impl RewardType {
    pub fn into_inner(self) -> Box<dyn Reward> {
        match self {
            RewardType::ZeroOne => Box::new(ZeroOne),
            RewardType::CostSensitive { correct, incorrect } => {
                Box::new(CostSensitive { correct, incorrect })
            }
        }
    }
}
