//! EM scaffolding shared by both trainers: options, the outer iteration loop
//! with its log-likelihood stopping rule, and the M-step renormalization.

use core::hash::Hash;

use tracing::{debug, info};

use crate::error::{AlignError, Result};
use crate::table::{Row, SparseJointTable};
use crate::types::*;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainOptions {
    /// Upper bound on outer EM iterations.
    pub max_iterations: usize,
    /// Training continues while `new_llh > old_llh / improvement_ratio`.
    pub improvement_ratio: f64,
}

impl TrainOptions {
    pub fn model1() -> Self {
        TrainOptions {
            max_iterations: MODEL1_MAX_ITERATIONS,
            improvement_ratio: IMPROVEMENT_RATIO,
        }
    }

    pub fn model2() -> Self {
        TrainOptions {
            max_iterations: MODEL2_MAX_ITERATIONS,
            improvement_ratio: IMPROVEMENT_RATIO,
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_improvement_ratio(mut self, ratio: f64) -> Self {
        self.improvement_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.improvement_ratio.is_finite() || self.improvement_ratio < 1.0 {
            return Err(AlignError::invalid_config(format!(
                "improvement ratio must be a finite value >= 1.0, got {}",
                self.improvement_ratio
            )));
        }
        Ok(())
    }
}

/// What one completed E-step/M-step pass produced.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationReport {
    pub iteration: usize,
    pub log_likelihood: f64,
    /// Largest absolute change of any parameter in this M-step.
    pub max_delta: f64,
    /// Rows with no usable mass that fell back to uniform.
    pub degenerate_rows: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    pub iterations: usize,
    /// False when training stopped at the iteration cap.
    pub converged: bool,
    pub log_likelihood: f64,
    pub history: Vec<IterationReport>,
}

/// Outer EM loop. `step` runs one full iteration on the caller's tables and
/// reports on it; the loop stops once the log-likelihood fails to improve by
/// the configured ratio or the cap is hit.
pub(crate) fn run_em<S, F>(
    model: &'static str,
    options: &TrainOptions,
    mut step: S,
    mut observer: F,
) -> TrainingSummary
where
    S: FnMut(usize) -> IterationReport,
    F: FnMut(&IterationReport),
{
    let mut previous = f64::NEG_INFINITY;
    let mut history: Vec<IterationReport> = Vec::new();
    let mut converged = false;

    for iteration in 0..options.max_iterations {
        let report = step(iteration);
        debug!(
            model,
            iteration,
            log_likelihood = report.log_likelihood,
            max_delta = report.max_delta,
            degenerate_rows = report.degenerate_rows,
            "EM iteration"
        );
        observer(&report);

        // log-likelihoods are negative: dividing by the ratio moves the bar toward 0
        let improved = report.log_likelihood > previous / options.improvement_ratio;
        previous = report.log_likelihood;
        history.push(report);
        if !improved {
            converged = true;
            break;
        }
    }

    let log_likelihood = history.last().map_or(f64::NEG_INFINITY, |r| r.log_likelihood);
    info!(
        model,
        iterations = history.len(),
        converged,
        log_likelihood,
        "training finished"
    );
    TrainingSummary { iterations: history.len(), converged, log_likelihood, history }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ZeroCounts {
    Keep,
    Drop,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Renormalized {
    pub max_delta: f64,
    pub degenerate_rows: usize,
}

impl Renormalized {
    pub fn merge(self, other: Renormalized) -> Renormalized {
        Renormalized {
            max_delta: self.max_delta.max(other.max_delta),
            degenerate_rows: self.degenerate_rows + other.degenerate_rows,
        }
    }
}

/// M-step. Every row present in `counts` is rebuilt in `table` as the counts
/// divided by the row total; rows absent from `counts` are left alone. A row
/// whose total is not usable gets a uniform distribution over every key seen
/// in either the counts or the previous row.
pub(crate) fn renormalize<K1, K2>(
    table: &mut SparseJointTable<K1, K2>,
    counts: SparseJointTable<K1, K2>,
    zeros: ZeroCounts,
) -> Renormalized
where
    K1: Eq + Hash,
    K2: Eq + Hash + Clone,
{
    let mut stats = Renormalized::default();
    for (k1, counted) in counts.into_rows() {
        let total: Prob = counted.values().sum();
        let previous = table.row(&k1);

        let fresh: Row<K2> = if usable_denominator(total) {
            counted
                .into_iter()
                .filter(|&(_, c)| zeros == ZeroCounts::Keep || c != 0.0)
                .map(|(k2, c)| (k2, c / total))
                .collect()
        } else {
            stats.degenerate_rows += 1;
            let mut keys: Row<K2> = counted;
            if let Some(prev) = previous {
                for k2 in prev.keys() {
                    keys.entry(k2.clone()).or_insert(0.0);
                }
            }
            let uniform = 1.0 / keys.len().max(1) as Prob;
            keys.into_iter().map(|(k2, _)| (k2, uniform)).collect()
        };

        let delta = row_delta(previous, &fresh);
        stats.max_delta = stats.max_delta.max(delta);
        table.replace_row(k1, fresh);
    }
    if stats.degenerate_rows > 0 {
        debug!(rows = stats.degenerate_rows, "uniform fallback for rows without mass");
    }
    stats
}

fn row_delta<K2: Eq + Hash>(previous: Option<&Row<K2>>, fresh: &Row<K2>) -> f64 {
    let Some(prev) = previous else {
        return fresh.values().fold(0.0, |m, &v| m.max(v));
    };
    let mut delta = 0.0f64;
    for (k2, &v) in fresh {
        delta = delta.max((prev.get(k2).copied().unwrap_or(0.0) - v).abs());
    }
    for (k2, &v) in prev {
        if !fresh.contains_key(k2) {
            delta = delta.max(v);
        }
    }
    delta
}
