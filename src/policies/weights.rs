use crate::dataset::Context;
use crate::errors::PolicyError;

use serde::{Deserialize, Serialize};

/// Dense `rows × cols` matrix, one row per feature and one column per action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightMatrixState")]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct WeightMatrixState {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<WeightMatrixState> for WeightMatrix {
    type Error = PolicyError;

    fn try_from(state: WeightMatrixState) -> Result<Self, Self::Error> {
        if state.data.len() != state.rows * state.cols {
            return Err(PolicyError::InvalidParameter(format!(
                "{} weights cannot fill a {}x{} matrix",
                state.data.len(),
                state.rows,
                state.cols
            )));
        }

        Ok(Self {
            rows: state.rows,
            cols: state.cols,
            data: state.data,
        })
    }
}

impl WeightMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, PolicyError> {
        let n_rows = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != cols) {
            return Err(PolicyError::Shape {
                expected: (n_rows, cols),
                got: (n_rows, row.len()),
            });
        }

        Ok(Self {
            rows: n_rows,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(col).step_by(self.cols.max(1)).copied()
    }

    pub fn score(&self, context: Context<'_>, action: usize) -> f64 {
        context.dot(self.column(action))
    }

    /// `context · w`, one score per action.
    pub fn scores(&self, context: Context<'_>) -> Vec<f64> {
        let mut scores = vec![0.0; self.cols];
        for (feature, value) in context.nonzero() {
            let row = &self.data[feature * self.cols..(feature + 1) * self.cols];
            scores
                .iter_mut()
                .zip(row)
                .for_each(|(score, weight)| *score += value * weight);
        }
        scores
    }

    /// One squared-loss gradient step on column `action`, restricted to the nonzero
    /// features of `context`.
    pub fn sgd_step(
        &mut self,
        context: Context<'_>,
        action: usize,
        learning_rate: f64,
        reward: f64,
    ) {
        let loss = self.score(context, action) - reward;
        for (feature, value) in context.nonzero() {
            self.data[feature * self.cols + action] -= learning_rate * value * loss;
        }
    }
}

/// Index of the highest score, the lowest index winning ties. NaN scores are
/// never chosen unless every score is NaN, in which case action 0 is returned.
pub fn argmax(scores: &[f64]) -> usize {
    scores
        .iter()
        .enumerate()
        .filter(|&(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (action, &score)| match best {
            Some((_, top)) if score <= top => best,
            _ => Some((action, score)),
        })
        .map_or(0, |(action, _)| action)
}

/// Probability of `action` under a greedy choice that splits ties uniformly.
pub fn greedy_mass(scores: &[f64], action: usize) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ties = scores.iter().filter(|&&score| score == max).count();

    if ties == 0 {
        // every score is NaN
        1.0 / scores.len() as f64
    } else if scores[action] == max {
        1.0 / ties as f64
    } else {
        0.0
    }
}
