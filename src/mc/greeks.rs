// src/mc/greeks.rs
//! Finite-difference Greeks over Monte Carlo prices
//!
//! # Stencils
//!
//! ```text
//! Δ = [P(S0+ε) - P(S0-ε)] / 2ε
//! Γ = [P(S0+ε) - 2P(S0) + P(S0-ε)] / ε²
//! ν = [P(σ+ε) - P(σ-ε)] / 2ε
//! Θ = [P(T-ε) - P(T)] / ε
//! ρ = [P(r+ε) - P(r-ε)] / 2ε
//! ```
//!
//! Central differences (O(ε²) truncation error) are used wherever both
//! directions are valid. Theta is one-sided: shortening maturity is "time
//! passing", and T + ε is not the quantity of interest near expiry.
//!
//! # Common Random Numbers
//!
//! Every price inside one stencil is computed from the same [`NormalDraws`]
//! matrix. The estimator is then the path-wise stencil
//! ```text
//! G_i = Σ_j w_j * Y_j,i / denom      G = mean(G_i),  SE = stdev(G_i)/√M
//! ```
//! which equals the stencil applied to the mean prices, and comes with its
//! own standard error. With independent draws per price the sampling noise
//! would swamp the difference, gamma most of all.
//!
//! # Theta Convention
//!
//! Theta is reported per year of calendar time, with the sign of the price
//! change as time passes (negative for a typical long option). Use
//! [`GreekEstimate::per_day`] for per-day decay.

use crate::config::{MarketParams, ParamOverrides, SimConfig};
use crate::error::{validation::*, PricingError, Result};
use crate::mc::payoffs::OptionType;
use crate::mc::pricer::{discounted_payoffs, McEstimate};
use crate::mc::simulator::PathSimulator;
use crate::rng::{self, NormalDraws};
use bitflags::bitflags;
use ndarray::Array1;
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, trace, warn};

pub const DEFAULT_EPSILON: f64 = 1e-2;
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Bumps larger than this fraction of the parameter trigger a warning
const MAX_RELATIVE_BUMP: f64 = 0.1;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GreekSet: u32 {
        const NONE  = 0;
        const DELTA = 1 << 0;
        const GAMMA = 1 << 1;
        const VEGA  = 1 << 2;
        const THETA = 1 << 3;
        const RHO   = 1 << 4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Greek {
    Delta,
    Gamma,
    Vega,
    Theta,
    Rho,
}

impl Greek {
    pub const ALL: [Greek; 5] = [Greek::Delta, Greek::Gamma, Greek::Vega, Greek::Theta, Greek::Rho];

    pub fn flag(&self) -> GreekSet {
        match self {
            Greek::Delta => GreekSet::DELTA,
            Greek::Gamma => GreekSet::GAMMA,
            Greek::Vega => GreekSet::VEGA,
            Greek::Theta => GreekSet::THETA,
            Greek::Rho => GreekSet::RHO,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Greek::Delta => "delta",
            Greek::Gamma => "gamma",
            Greek::Vega => "vega",
            Greek::Theta => "theta",
            Greek::Rho => "rho",
        }
    }

    fn selected(set: GreekSet) -> Vec<Greek> {
        Greek::ALL
            .iter()
            .copied()
            .filter(|g| set.contains(g.flag()))
            .collect()
    }
}

impl fmt::Display for Greek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Finite-difference estimate with its Monte Carlo standard error
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GreekEstimate {
    pub value: f64,
    pub std_error: f64,
}

impl GreekEstimate {
    pub fn confidence_interval(&self) -> (f64, f64) {
        McEstimate {
            mean: self.value,
            std_error: self.std_error,
        }
        .confidence_interval()
    }

    /// Rescale a per-year theta to per-calendar-day decay
    pub fn per_day(&self) -> GreekEstimate {
        GreekEstimate {
            value: self.value / CALENDAR_DAYS_PER_YEAR,
            std_error: self.std_error / CALENDAR_DAYS_PER_YEAR,
        }
    }
}

/// Greeks requested in one batch; unrequested entries stay `None`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GreekEstimates {
    pub delta: Option<GreekEstimate>,
    pub gamma: Option<GreekEstimate>,
    pub vega: Option<GreekEstimate>,
    pub theta: Option<GreekEstimate>,
    pub rho: Option<GreekEstimate>,
}

impl GreekEstimates {
    pub fn get(&self, greek: Greek) -> Option<GreekEstimate> {
        match greek {
            Greek::Delta => self.delta,
            Greek::Gamma => self.gamma,
            Greek::Vega => self.vega,
            Greek::Theta => self.theta,
            Greek::Rho => self.rho,
        }
    }

    fn set(&mut self, greek: Greek, estimate: GreekEstimate) {
        let slot = match greek {
            Greek::Delta => &mut self.delta,
            Greek::Gamma => &mut self.gamma,
            Greek::Vega => &mut self.vega,
            Greek::Theta => &mut self.theta,
            Greek::Rho => &mut self.rho,
        };
        *slot = Some(estimate);
    }
}

#[derive(Clone, Copy, Debug)]
struct StencilPoint {
    overrides: ParamOverrides,
    weight: f64,
}

#[derive(Clone, Debug)]
struct Stencil {
    points: Vec<StencilPoint>,
    denominator: f64,
}

impl Stencil {
    fn central(up: ParamOverrides, down: ParamOverrides, epsilon: f64) -> Self {
        Stencil {
            points: vec![
                StencilPoint { overrides: up, weight: 1.0 },
                StencilPoint { overrides: down, weight: -1.0 },
            ],
            denominator: 2.0 * epsilon,
        }
    }
}

/// Finite-difference Greeks engine.
///
/// Holds immutable pricing inputs; every method is a pure function of them,
/// the option type and the variate matrix it draws or is given.
#[derive(Debug, Clone, PartialEq)]
pub struct GreeksEngine {
    market: MarketParams,
    sim: SimConfig,
    epsilon: f64,
}

impl GreeksEngine {
    pub fn new(market: MarketParams, sim: SimConfig, epsilon: f64) -> Result<Self> {
        market.validate()?;
        sim.validate()?;
        validate_positive("epsilon", epsilon)?;
        Ok(GreeksEngine { market, sim, epsilon })
    }

    pub fn with_default_epsilon(market: MarketParams, sim: SimConfig) -> Result<Self> {
        Self::new(market, sim, DEFAULT_EPSILON)
    }

    pub fn market(&self) -> &MarketParams {
        &self.market
    }

    pub fn sim(&self) -> &SimConfig {
        &self.sim
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn delta(&self, option: OptionType) -> Result<GreekEstimate> {
        self.estimate(Greek::Delta, option)
    }

    pub fn gamma(&self, option: OptionType) -> Result<GreekEstimate> {
        self.estimate(Greek::Gamma, option)
    }

    pub fn vega(&self, option: OptionType) -> Result<GreekEstimate> {
        self.estimate(Greek::Vega, option)
    }

    /// Per-year theta; see the module docs for the sign convention
    pub fn theta(&self, option: OptionType) -> Result<GreekEstimate> {
        self.estimate(Greek::Theta, option)
    }

    pub fn rho(&self, option: OptionType) -> Result<GreekEstimate> {
        self.estimate(Greek::Rho, option)
    }

    /// One Greek from a freshly drawn matrix shared by all of its reprices
    pub fn estimate(&self, greek: Greek, option: OptionType) -> Result<GreekEstimate> {
        // Fail on domain errors before paying for the draws
        self.stencil(greek)?;
        let draws = self.draw()?;
        self.estimate_with_draws(greek, option, &draws)
    }

    /// One Greek from a caller-supplied variate matrix
    pub fn estimate_with_draws(
        &self,
        greek: Greek,
        option: OptionType,
        draws: &NormalDraws,
    ) -> Result<GreekEstimate> {
        draws.ensure_shape(self.sim.steps, self.sim.paths)?;
        let stencil = self.stencil(greek)?;

        let payoffs = stencil
            .points
            .par_iter()
            .map(|point| self.reprice(option, &point.overrides, draws))
            .collect::<Result<Vec<_>>>()?;

        let mut per_path = Array1::<f64>::zeros(draws.paths());
        for (point, discounted) in stencil.points.iter().zip(&payoffs) {
            per_path.scaled_add(point.weight / stencil.denominator, discounted);
        }

        let stats = McEstimate::from_samples(per_path.view()).map_err(|_| {
            PricingError::NumericalInstability {
                method: format!("finite-difference {}", greek),
                reason: format!("non-finite estimate with epsilon = {}", self.epsilon),
            }
        })?;
        let estimate = GreekEstimate {
            value: stats.mean,
            std_error: stats.std_error,
        };

        debug!(
            %greek,
            %option,
            value = estimate.value,
            std_error = estimate.std_error,
            epsilon = self.epsilon,
            "finite-difference Greek"
        );
        if estimate.std_error > estimate.value.abs() {
            warn!(
                %greek,
                value = estimate.value,
                std_error = estimate.std_error,
                "Greek estimate dominated by Monte Carlo noise; increase paths or epsilon"
            );
        }

        Ok(estimate)
    }

    /// Several Greeks evaluated in parallel from one shared matrix
    pub fn compute(&self, option: OptionType, set: GreekSet) -> Result<GreekEstimates> {
        let greeks = Greek::selected(set);
        let mut out = GreekEstimates::default();
        if greeks.is_empty() {
            return Ok(out);
        }

        for greek in &greeks {
            self.stencil(*greek)?;
        }
        let draws = self.draw()?;

        let estimates = greeks
            .par_iter()
            .map(|&greek| {
                self.estimate_with_draws(greek, option, &draws)
                    .map(|estimate| (greek, estimate))
            })
            .collect::<Result<Vec<_>>>()?;

        for (greek, estimate) in estimates {
            out.set(greek, estimate);
        }
        Ok(out)
    }

    pub fn compute_all(&self, option: OptionType) -> Result<GreekEstimates> {
        self.compute(option, GreekSet::all())
    }

    /// Discounted payoff per path for the baseline market with `overrides` applied
    pub fn reprice(
        &self,
        option: OptionType,
        overrides: &ParamOverrides,
        draws: &NormalDraws,
    ) -> Result<Array1<f64>> {
        let market = self.market.with_overrides(overrides);
        trace!(?overrides, "finite-difference reprice");
        let terminal = PathSimulator::terminal_prices(&market, draws)?;
        Ok(discounted_payoffs(&market, option, terminal.view()))
    }

    /// Monte Carlo price for the baseline market with `overrides` applied
    pub fn price_with(
        &self,
        option: OptionType,
        overrides: &ParamOverrides,
        draws: &NormalDraws,
    ) -> Result<McEstimate> {
        let payoffs = self.reprice(option, overrides, draws)?;
        McEstimate::from_samples(payoffs.view())
    }

    fn draw(&self) -> Result<NormalDraws> {
        let seed = rng::resolve_seed(self.sim.seed);
        NormalDraws::seeded(seed, self.sim.steps, self.sim.paths, self.sim.antithetic)
    }

    fn stencil(&self, greek: Greek) -> Result<Stencil> {
        let eps = self.epsilon;
        let m = &self.market;

        let stencil = match greek {
            Greek::Delta => {
                self.check_bump("s0", m.s0)?;
                Stencil::central(
                    ParamOverrides::spot(m.s0 + eps),
                    ParamOverrides::spot(m.s0 - eps),
                    eps,
                )
            }
            Greek::Gamma => {
                self.check_bump("s0", m.s0)?;
                Stencil {
                    points: vec![
                        StencilPoint { overrides: ParamOverrides::spot(m.s0 + eps), weight: 1.0 },
                        StencilPoint { overrides: ParamOverrides::none(), weight: -2.0 },
                        StencilPoint { overrides: ParamOverrides::spot(m.s0 - eps), weight: 1.0 },
                    ],
                    denominator: eps * eps,
                }
            }
            Greek::Vega => {
                self.check_bump("sigma", m.sigma)?;
                Stencil::central(
                    ParamOverrides::volatility(m.sigma + eps),
                    ParamOverrides::volatility(m.sigma - eps),
                    eps,
                )
            }
            Greek::Theta => {
                self.check_bump("t", m.t)?;
                Stencil {
                    points: vec![
                        StencilPoint { overrides: ParamOverrides::maturity(m.t - eps), weight: 1.0 },
                        StencilPoint { overrides: ParamOverrides::none(), weight: -1.0 },
                    ],
                    denominator: eps,
                }
            }
            Greek::Rho => Stencil::central(
                ParamOverrides::rate(m.r + eps),
                ParamOverrides::rate(m.r - eps),
                eps,
            ),
        };
        Ok(stencil)
    }

    /// The downward bump must stay in the positive domain
    fn check_bump(&self, name: &str, value: f64) -> Result<()> {
        validate_bump_down(name, value, self.epsilon)?;
        if self.epsilon > MAX_RELATIVE_BUMP * value {
            warn!(
                parameter = name,
                value,
                epsilon = self.epsilon,
                "epsilon is large relative to the perturbed parameter"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn engine(epsilon: f64) -> GreeksEngine {
        GreeksEngine::new(
            MarketParams::default(),
            SimConfig::new(4, 2_000).with_seed(11),
            epsilon,
        )
        .expect("valid engine")
    }

    #[test]
    fn test_rejects_bad_epsilon() {
        let market = MarketParams::default();
        let sim = SimConfig::new(4, 100);
        assert!(GreeksEngine::new(market, sim, 0.0).is_err());
        assert!(GreeksEngine::new(market, sim, -0.01).is_err());
        assert!(GreeksEngine::new(market, sim, f64::NAN).is_err());
    }

    #[test]
    fn test_theta_bump_must_stay_before_expiry() {
        let market = MarketParams::new(100.0, 100.0, 0.005, 0.05, 0.2);
        let engine = GreeksEngine::new(market, SimConfig::new(4, 100), 0.01).expect("valid");
        assert!(matches!(
            engine.theta(OptionType::Call),
            Err(PricingError::InvalidParameters { .. })
        ));
        // Rho has no domain restriction on the bump
        assert!(engine.rho(OptionType::Call).is_ok());
    }

    #[test]
    fn test_vega_bump_must_keep_volatility_positive() {
        let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.005);
        let engine = GreeksEngine::new(market, SimConfig::new(4, 100), 0.01).expect("valid");
        assert!(engine.vega(OptionType::Put).is_err());
    }

    #[test]
    fn test_stencil_matches_mean_prices() {
        let engine = engine(0.5);
        let draws = NormalDraws::seeded(5, 4, 2_000, true).expect("valid shape");
        let option = OptionType::Call;
        let m = *engine.market();

        let up = engine.price_with(option, &ParamOverrides::spot(m.s0 + 0.5), &draws).unwrap();
        let mid = engine.price_with(option, &ParamOverrides::none(), &draws).unwrap();
        let down = engine.price_with(option, &ParamOverrides::spot(m.s0 - 0.5), &draws).unwrap();

        let delta = engine.estimate_with_draws(Greek::Delta, option, &draws).unwrap();
        let gamma = engine.estimate_with_draws(Greek::Gamma, option, &draws).unwrap();

        assert_abs_diff_eq!(delta.value, (up.mean - down.mean) / 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            gamma.value,
            (up.mean - 2.0 * mid.mean + down.mean) / 0.25,
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_compute_fills_only_requested() {
        let engine = engine(0.01);
        let out = engine
            .compute(OptionType::Call, GreekSet::DELTA | GreekSet::RHO)
            .expect("greeks");
        assert!(out.delta.is_some());
        assert!(out.rho.is_some());
        assert!(out.gamma.is_none());
        assert!(out.vega.is_none());
        assert!(out.theta.is_none());

        let none = engine.compute(OptionType::Call, GreekSet::NONE).expect("greeks");
        assert_eq!(none, GreekEstimates::default());
    }

    #[test]
    fn test_compute_matches_individual_calls_for_fixed_seed() {
        let engine = engine(0.01);
        let all = engine.compute_all(OptionType::Put).expect("greeks");
        for greek in Greek::ALL {
            let single = engine.estimate(greek, OptionType::Put).expect("greek");
            assert_eq!(all.get(greek), Some(single), "{} differs", greek);
        }
    }

    #[test]
    fn test_per_day_theta() {
        let theta = GreekEstimate { value: -6.57, std_error: 0.365 };
        let daily = theta.per_day();
        assert_abs_diff_eq!(daily.value, -0.018, epsilon = 1e-12);
        assert_abs_diff_eq!(daily.std_error, 0.001, epsilon = 1e-12);
    }
}
