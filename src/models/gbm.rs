// src/models/gbm.rs
//! Geometric Brownian Motion under the risk-neutral measure
//!
//! ```text
//! dS_t = μ S_t dt + σ S_t dW_t
//! S_{t+dt} = S_t * exp((μ - σ²/2)dt + σ√dt * Z),  Z ~ N(0,1)
//! ```
//!
//! The lognormal update is the exact solution, so there is no discretisation
//! bias in the distribution of log S at any step size.

use crate::config::MarketParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gbm {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl Gbm {
    pub fn new(s0: f64, mu: f64, sigma: f64) -> Self {
        Gbm { s0, mu, sigma }
    }

    /// Pricing dynamics: drift equals the risk-free rate
    pub fn risk_neutral(market: &MarketParams) -> Self {
        Gbm::new(market.s0, market.r, market.sigma)
    }

    pub fn exact_step(&self, s_t: f64, dt: f64, normal_draw: f64) -> f64 {
        self.stepper(dt).advance(s_t, normal_draw)
    }

    /// Precompute the per-step log drift and diffusion for a fixed `dt`
    pub fn stepper(&self, dt: f64) -> ExactStep {
        ExactStep {
            log_drift: (self.mu - 0.5 * self.sigma * self.sigma) * dt,
            log_vol: self.sigma * dt.sqrt(),
        }
    }
}

/// Exact GBM update for one fixed step size
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExactStep {
    pub log_drift: f64,
    pub log_vol: f64,
}

impl ExactStep {
    #[inline]
    pub fn advance(&self, s_t: f64, normal_draw: f64) -> f64 {
        s_t * (self.log_drift + self.log_vol * normal_draw).exp()
    }
}
