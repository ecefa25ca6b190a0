// src/mc/pricer.rs
//! European option pricing: closed form and Monte Carlo
//!
//! # Monte Carlo Estimator
//!
//! For terminal prices S_T^(i), i = 1..M:
//! ```text
//! Y_i   = e^(-rT) * payoff(S_T^(i))
//! price = mean(Y)
//! SE    = stdev(Y) / √M            (sample stdev, n - 1 denominator)
//! CI95  = price ± 1.96 * SE
//! ```
//!
//! The interval uses the normal approximation to the sampling distribution of
//! the mean. No small-sample correction is applied. With antithetic pairs the
//! per-path payoffs are not independent, so the reported SE is conservative
//! for monotone payoffs.

use crate::analytics::bs_analytic::{self, AnalyticGreeks};
use crate::config::{MarketParams, SimConfig};
use crate::error::{validation::*, PricingError, Result};
use crate::mc::payoffs::OptionType;
use crate::mc::simulator::{PathSimulator, PriceMatrix};
use crate::rng::{self, NormalDraws};
use ndarray::{Array1, ArrayView1, Zip};
use statrs::statistics::Statistics;
use tracing::{debug, trace};

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// Monte Carlo price with its sampling error and the paths it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult {
    pub price: f64,
    pub std_error: f64,
    pub confidence_interval: (f64, f64),
    pub paths: PriceMatrix,
}

impl PricingResult {
    pub fn ci_width(&self) -> f64 {
        self.confidence_interval.1 - self.confidence_interval.0
    }

    pub fn contains(&self, value: f64) -> bool {
        self.confidence_interval.0 <= value && value <= self.confidence_interval.1
    }
}

/// Sample statistics of discounted payoffs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McEstimate {
    pub mean: f64,
    pub std_error: f64,
}

impl McEstimate {
    /// Mean and standard error of a sample; SE is 0 for a single observation
    pub fn from_samples(samples: ArrayView1<'_, f64>) -> Result<Self> {
        let n = samples.len();
        let mean = samples.iter().mean();
        let std_error = if n > 1 {
            samples.iter().std_dev() / (n as f64).sqrt()
        } else {
            0.0
        };

        if !mean.is_finite() {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo".to_string(),
                reason: format!("Price estimate is not finite: {}", mean),
            });
        }
        if !std_error.is_finite() {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo".to_string(),
                reason: format!("Standard error is not finite: {}", std_error),
            });
        }

        Ok(McEstimate { mean, std_error })
    }

    pub fn confidence_interval(&self) -> (f64, f64) {
        (
            self.mean - Z_95 * self.std_error,
            self.mean + Z_95 * self.std_error,
        )
    }
}

/// Discounted payoff per path
pub fn discounted_payoffs(
    market: &MarketParams,
    option: OptionType,
    terminal: ArrayView1<'_, f64>,
) -> Array1<f64> {
    let discount = market.discount_factor();
    let k = market.k;
    Zip::from(terminal).par_map_collect(|&st| discount * option.payoff(st, k))
}

/// European option pricer for one market and simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OptionPricer {
    market: MarketParams,
    sim: SimConfig,
}

impl OptionPricer {
    pub fn new(market: MarketParams, sim: SimConfig) -> Result<Self> {
        market.validate()?;
        sim.validate()?;
        Ok(OptionPricer { market, sim })
    }

    pub fn market(&self) -> &MarketParams {
        &self.market
    }

    pub fn sim(&self) -> &SimConfig {
        &self.sim
    }

    /// Closed-form Black-Scholes-Merton price
    pub fn analytic_price(&self, option: OptionType) -> Result<f64> {
        analytic_price(&self.market, option)
    }

    /// Closed-form Greeks for cross-checking finite-difference estimates
    pub fn analytic_greeks(&self, option: OptionType) -> Result<AnalyticGreeks> {
        let m = &self.market;
        check_analytic_domain(m)?;
        Ok(bs_analytic::bs_greeks(option, m.s0, m.k, m.r, m.sigma, m.t))
    }

    /// Monte Carlo price from freshly simulated paths, antithetic per `sim.antithetic`
    pub fn monte_carlo_price(&self, option: OptionType) -> Result<PricingResult> {
        self.monte_carlo_price_antithetic(option, self.sim.antithetic)
    }

    /// Monte Carlo price with the antithetic choice made for this call only.
    ///
    /// An odd path count is rejected when `antithetic` is set, whatever the
    /// configuration says.
    pub fn monte_carlo_price_antithetic(
        &self,
        option: OptionType,
        antithetic: bool,
    ) -> Result<PricingResult> {
        let seed = rng::resolve_seed(self.sim.seed);
        let draws = NormalDraws::seeded(seed, self.sim.steps, self.sim.paths, antithetic)?;
        self.monte_carlo_price_with_draws(option, &draws)
    }

    /// Monte Carlo price from an explicit variate matrix
    pub fn monte_carlo_price_with_draws(
        &self,
        option: OptionType,
        draws: &NormalDraws,
    ) -> Result<PricingResult> {
        draws.ensure_shape(self.sim.steps, self.sim.paths)?;
        let paths = PathSimulator::generate_with_draws(&self.market, draws)?;
        let payoffs = discounted_payoffs(&self.market, option, paths.terminal_prices());
        let estimate = McEstimate::from_samples(payoffs.view())?;

        debug!(
            %option,
            price = estimate.mean,
            std_error = estimate.std_error,
            paths = self.sim.paths,
            "Monte Carlo price"
        );

        Ok(PricingResult {
            price: estimate.mean,
            std_error: estimate.std_error,
            confidence_interval: estimate.confidence_interval(),
            paths,
        })
    }
}

/// Closed-form price for an arbitrary parameter set
pub fn analytic_price(market: &MarketParams, option: OptionType) -> Result<f64> {
    check_analytic_domain(market)?;
    let m = market;
    let price = bs_analytic::bs_price(option, m.s0, m.k, m.r, m.sigma, m.t);
    trace!(%option, price, "analytic price");
    Ok(price)
}

fn check_analytic_domain(market: &MarketParams) -> Result<()> {
    validate_positive("t", market.t)?;
    validate_positive("sigma", market.sigma)?;
    validate_positive("s0", market.s0)?;
    validate_positive("k", market.k)?;
    validate_finite("r", market.r)?;
    Ok(())
}
