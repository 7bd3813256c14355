//! Limited-memory BFGS with optional L1 regularization (OWL-QN).
//!
//! The two-loop recursion approximates the inverse Hessian from the last `memory`
//! correction pairs. When L1 weights are given, the search follows the orthant-wise
//! variant: steps use the pseudo-gradient of the non-smooth objective, the direction is
//! constrained to the descent orthant, and trial points are projected back onto it.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::linalg::{axpy, dot, norm};
use crate::solver::DiffFunction;

const ARMIJO_C1: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct LbfgsParams {
    pub max_iter: usize,
    pub memory: usize,
    pub tolerance: f64,
    pub line_search_max_steps: usize,
}

impl Default for LbfgsParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            memory: 10,
            tolerance: 1e-6,
            line_search_max_steps: 40,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub x: Vec<f64>,
    /// The objective value at the start and after each iteration.
    pub objective_history: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

fn l1_value(x: &[f64], l1: Option<&[f64]>) -> f64 {
    l1.map_or(0.0, |l1| {
        x.iter().zip(l1).map(|(xi, li)| li * xi.abs()).sum()
    })
}

/// The minimum-norm subgradient of `f(x) + sum(l1_i * |x_i|)`.
fn pseudo_gradient(x: &[f64], gradient: &[f64], l1: Option<&[f64]>) -> Vec<f64> {
    let Some(l1) = l1 else {
        return gradient.to_vec();
    };
    x.iter()
        .zip(gradient)
        .zip(l1)
        .map(|((&xi, &gi), &li)| {
            if li == 0.0 {
                gi
            } else if xi > 0.0 {
                gi + li
            } else if xi < 0.0 {
                gi - li
            } else if gi + li < 0.0 {
                gi + li
            } else if gi - li > 0.0 {
                gi - li
            } else {
                0.0
            }
        })
        .collect()
}

/// Computes `H * g` with the two-loop recursion.
fn two_loop(g: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for c in history.iter().rev() {
        let alpha = c.rho * dot(&c.s, &q);
        axpy(-alpha, &c.y, &mut q);
        alphas.push(alpha);
    }
    if let Some(last) = history.back() {
        let gamma = dot(&last.s, &last.y) / dot(&last.y, &last.y);
        q.iter_mut().for_each(|v| *v *= gamma);
    }
    for (c, alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = c.rho * dot(&c.y, &q);
        axpy(alpha - beta, &c.s, &mut q);
    }
    q
}

fn orthant_project(x: &mut [f64], orthant: &[f64]) {
    for (xi, oi) in x.iter_mut().zip(orthant) {
        if *xi * oi <= 0.0 {
            *xi = 0.0;
        }
    }
}

/// Minimizes `f(x) + sum(l1_i * |x_i|)` starting from `initial`.
pub fn minimize<F: DiffFunction>(
    f: &F,
    initial: Vec<f64>,
    l1: Option<&[f64]>,
    params: &LbfgsParams,
) -> MlResult<OptimizationResult> {
    if let Some(l1) = l1 {
        if l1.len() != initial.len() {
            return Err(MlError::internal(format!(
                "expected {} L1 weights but got {}",
                initial.len(),
                l1.len()
            )));
        }
    }
    let l1 = l1.filter(|l1| l1.iter().any(|v| *v != 0.0));

    let mut x = initial;
    let (loss, mut gradient) = f.calculate(&x)?;
    let mut value = loss + l1_value(&x, l1);
    let mut history = VecDeque::with_capacity(params.memory);
    let mut objective_history = vec![value];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iter {
        let pg = pseudo_gradient(&x, &gradient, l1);
        let pg_norm = norm(&pg);
        if pg_norm == 0.0 {
            converged = true;
            break;
        }

        let mut direction = two_loop(&pg, &history);
        direction.iter_mut().for_each(|v| *v = -*v);
        if l1.is_some() {
            for (d, g) in direction.iter_mut().zip(pg.iter()) {
                if *d * g >= 0.0 {
                    *d = 0.0;
                }
            }
        }
        let mut slope = dot(&pg, &direction);
        if slope >= 0.0 {
            debug!("L-BFGS direction is not a descent direction, resetting history");
            history.clear();
            direction = pg.iter().map(|v| -v).collect();
            slope = -pg_norm * pg_norm;
        }

        let orthant = l1.map(|_| {
            x.iter()
                .zip(pg.iter())
                .map(|(&xi, &gi)| if xi != 0.0 { xi.signum() } else { -gi.signum() })
                .collect::<Vec<_>>()
        });

        let mut step = if history.is_empty() {
            (1.0 / pg_norm).min(1.0)
        } else {
            1.0
        };
        let mut accepted = None;
        for _ in 0..params.line_search_max_steps {
            let mut candidate = x.clone();
            axpy(step, &direction, &mut candidate);
            if let Some(orthant) = &orthant {
                orthant_project(&mut candidate, orthant);
            }
            let (candidate_loss, candidate_gradient) = f.calculate(&candidate)?;
            let candidate_value = candidate_loss + l1_value(&candidate, l1);
            let decrease = if l1.is_some() {
                let moved = candidate
                    .iter()
                    .zip(x.iter())
                    .map(|(c, xi)| c - xi)
                    .collect::<Vec<_>>();
                dot(&pg, &moved)
            } else {
                step * slope
            };
            if candidate_value.is_finite() && candidate_value <= value + ARMIJO_C1 * decrease {
                accepted = Some((candidate, candidate_value, candidate_gradient));
                break;
            }
            step *= 0.5;
        }

        let Some((next, next_value, next_gradient)) = accepted else {
            warn!("L-BFGS line search failed after {iterations} iterations");
            break;
        };

        let s = next
            .iter()
            .zip(x.iter())
            .map(|(a, b)| a - b)
            .collect::<Vec<_>>();
        let y = next_gradient
            .iter()
            .zip(gradient.iter())
            .map(|(a, b)| a - b)
            .collect::<Vec<_>>();
        let sy = dot(&s, &y);
        if sy > 1e-10 {
            if history.len() == params.memory {
                history.pop_front();
            }
            history.push_back(Correction { s, y, rho: 1.0 / sy });
        }

        let improvement = (value - next_value).abs() / value.abs().max(next_value.abs()).max(1e-12);
        x = next;
        value = next_value;
        gradient = next_gradient;
        iterations += 1;
        objective_history.push(value);
        debug!("L-BFGS iteration {iterations}: objective={value:.6}");

        if improvement < params.tolerance {
            converged = true;
            break;
        }
    }

    Ok(OptimizationResult {
        x,
        objective_history,
        iterations,
        converged,
    })
}
