// src/config.rs
//! Pricing inputs: market parameters, simulation settings and per-call overrides.

use crate::error::{validation::*, Result};

/// Black-Scholes market inputs for a single European option
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketParams {
    pub s0: f64,    // Spot price
    pub k: f64,     // Strike
    pub t: f64,     // Time to maturity in years
    pub r: f64,     // Continuously compounded risk-free rate
    pub sigma: f64, // Volatility
}

impl MarketParams {
    pub fn new(s0: f64, k: f64, t: f64, r: f64, sigma: f64) -> Self {
        MarketParams { s0, k, t, r, sigma }
    }

    /// Validate the market parameters
    pub fn validate(&self) -> Result<()> {
        validate_positive("s0", self.s0)?;
        validate_positive("k", self.k)?;
        validate_positive("t", self.t)?;
        validate_finite("r", self.r)?;
        validate_positive("sigma", self.sigma)?;
        Ok(())
    }

    /// Copy of these parameters with any overridden field replaced
    pub fn with_overrides(&self, overrides: &ParamOverrides) -> Self {
        MarketParams {
            s0: overrides.s0.unwrap_or(self.s0),
            k: self.k,
            t: overrides.t.unwrap_or(self.t),
            r: overrides.r.unwrap_or(self.r),
            sigma: overrides.sigma.unwrap_or(self.sigma),
        }
    }

    pub fn discount_factor(&self) -> f64 {
        (-self.r * self.t).exp()
    }
}

impl Default for MarketParams {
    fn default() -> Self {
        MarketParams {
            s0: 100.0,
            k: 100.0,
            t: 1.0,
            r: 0.05,
            sigma: 0.2,
        }
    }
}

/// Explicit per-call replacement of market inputs.
///
/// `None` keeps the baseline value. Each finite-difference reprice is fully
/// described by its baseline plus one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParamOverrides {
    pub s0: Option<f64>,
    pub r: Option<f64>,
    pub sigma: Option<f64>,
    pub t: Option<f64>,
}

impl ParamOverrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn spot(s0: f64) -> Self {
        ParamOverrides {
            s0: Some(s0),
            ..Self::default()
        }
    }

    pub fn rate(r: f64) -> Self {
        ParamOverrides {
            r: Some(r),
            ..Self::default()
        }
    }

    pub fn volatility(sigma: f64) -> Self {
        ParamOverrides {
            sigma: Some(sigma),
            ..Self::default()
        }
    }

    pub fn maturity(t: f64) -> Self {
        ParamOverrides {
            t: Some(t),
            ..Self::default()
        }
    }
}

/// Monte Carlo discretisation and sampling settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    pub steps: usize,
    pub paths: usize,
    pub antithetic: bool,
    /// `None` draws a fresh seed from OS entropy on every run
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn new(steps: usize, paths: usize) -> Self {
        SimConfig {
            steps,
            paths,
            ..Self::default()
        }
    }

    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Validate the simulation configuration
    pub fn validate(&self) -> Result<()> {
        validate_steps(self.steps)?;
        validate_paths(self.paths)?;
        if self.antithetic {
            validate_antithetic_paths(self.paths)?;
        }
        Ok(())
    }

    pub fn dt(&self, t: f64) -> f64 {
        t / self.steps as f64
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            steps: 252,
            paths: 10_000,
            antithetic: true,
            seed: Some(12345),
        }
    }
}
