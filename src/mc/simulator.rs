// src/mc/simulator.rs
//! GBM path generation
//!
//! # Algorithm
//!
//! With `dt = T/N`, every path starts at S0 and advances with the exact
//! lognormal update
//! ```text
//! S[t][i] = S[t-1][i] * exp((r - σ²/2)dt + σ√dt * Z[t-1][i])
//! ```
//! for `t = 1..=N`, so the matrix has `N + 1` rows and row `N` sits exactly
//! at maturity.
//!
//! Paths are independent given the variate matrix and are filled in parallel.

use crate::config::{MarketParams, SimConfig};
use crate::error::Result;
use crate::models::gbm::{ExactStep, Gbm};
use crate::rng::{self, NormalDraws};
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, ShapeBuilder};
use tracing::debug;

/// Simulated prices indexed `[time-step][path]`, row 0 = S0
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    prices: Array2<f64>,
    dt: f64,
}

impl PriceMatrix {
    /// Number of time steps (one less than the number of rows)
    pub fn steps(&self) -> usize {
        self.prices.nrows() - 1
    }

    pub fn paths(&self) -> usize {
        self.prices.ncols()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Observation times `0, dt, ..., N·dt`
    pub fn times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.prices.nrows(), |t| t as f64 * self.dt)
    }

    pub fn initial_prices(&self) -> ArrayView1<'_, f64> {
        self.prices.row(0)
    }

    /// Prices at maturity, one per path
    pub fn terminal_prices(&self) -> ArrayView1<'_, f64> {
        self.prices.row(self.steps())
    }

    /// Full trajectory of path `i`
    pub fn path(&self, i: usize) -> ArrayView1<'_, f64> {
        self.prices.column(i)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.prices.view()
    }
}

/// Stateless GBM path generator
pub struct PathSimulator;

impl PathSimulator {
    /// Draw fresh variates from `sim` and simulate the full price matrix
    pub fn generate(market: &MarketParams, sim: &SimConfig, antithetic: bool) -> Result<PriceMatrix> {
        market.validate()?;
        let seed = rng::resolve_seed(sim.seed);
        let draws = NormalDraws::seeded(seed, sim.steps, sim.paths, antithetic)?;
        Self::generate_with_draws(market, &draws)
    }

    /// Simulate the full price matrix from an explicit variate matrix
    pub fn generate_with_draws(market: &MarketParams, draws: &NormalDraws) -> Result<PriceMatrix> {
        market.validate()?;
        let steps = draws.steps();
        let dt = market.t / steps as f64;
        let step = Gbm::risk_neutral(market).stepper(dt);

        debug!(steps, paths = draws.paths(), dt, "generating GBM price matrix");

        let mut prices = Array2::<f64>::zeros((steps + 1, draws.paths()).f());
        prices
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(draws.view().axis_iter(Axis(1)).into_par_iter())
            .for_each(|(mut path, z)| {
                let mut s = market.s0;
                path[0] = s;
                for (t, &z_t) in z.iter().enumerate() {
                    s = step.advance(s, z_t);
                    path[t + 1] = s;
                }
            });

        Ok(PriceMatrix { prices, dt })
    }

    /// Terminal prices only, bit-identical to the last row of
    /// [`PathSimulator::generate_with_draws`] without storing the paths
    pub fn terminal_prices(market: &MarketParams, draws: &NormalDraws) -> Result<Array1<f64>> {
        market.validate()?;
        let dt = market.t / draws.steps() as f64;
        let step = Gbm::risk_neutral(market).stepper(dt);

        let terminal: Vec<f64> = draws
            .view()
            .axis_iter(Axis(1))
            .into_par_iter()
            .map(|z| walk(&step, market.s0, z))
            .collect();

        Ok(Array1::from(terminal))
    }
}

fn walk(step: &ExactStep, s0: f64, z: ArrayView1<'_, f64>) -> f64 {
    z.iter().fold(s0, |s, &z_t| step.advance(s, z_t))
}
