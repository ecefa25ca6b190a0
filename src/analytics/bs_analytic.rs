// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options and Greeks
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying asset follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! For European options, this has closed-form solutions involving
//! the cumulative normal distribution function Φ(x).
//!
//! These functions are raw formulas: they assume `s, k, sigma, t > 0` and do
//! no validation. [`crate::mc::pricer::OptionPricer`] validates before calling.

use crate::math_utils::{norm_cdf, norm_pdf};
use crate::mc::payoffs::OptionType;

/// ```text
/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C(S,K,r,σ,T) = S*Φ(d₁) - K*e^(-rT)*Φ(d₂)
/// ```
///
/// # Parameters
/// - `s`: Current stock price
/// - `k`: Strike price
/// - `r`: Risk-free rate
/// - `sigma`: Volatility
/// - `t`: Time to expiration
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Black-Scholes European put option price
///
/// # Formula
/// ```text
/// P(S,K,r,σ,T) = K*e^(-rT)*Φ(-d₂) - S*Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    k * (-r * t).exp() * norm_cdf(-d2) - s * norm_cdf(-d1)
}

pub fn bs_price(option: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    match option {
        OptionType::Call => bs_call_price(s, k, r, sigma, t),
        OptionType::Put => bs_put_price(s, k, r, sigma, t),
    }
}

/// Black-Scholes Delta (∂V/∂S)
///
/// # Formula
/// ```text
/// Δ_call = Φ(d₁)
/// Δ_put  = Φ(d₁) - 1
/// ```
pub fn bs_delta(option: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    match option {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    }
}

/// Black-Scholes Gamma (∂²V/∂S²), identical for calls and puts
///
/// # Formula
/// ```text
/// Γ = φ(d₁) / (S * σ * √T)
/// ```
pub fn bs_gamma(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    norm_pdf(d1) / (s * sigma * t.sqrt())
}

/// Black-Scholes Vega (∂V/∂σ), identical for calls and puts
///
/// # Formula
/// ```text
/// ν = S * φ(d₁) * √T
/// ```
///
/// Units: price change per unit (100 vol points) change in σ.
pub fn bs_vega(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, r, sigma, t);
    s * norm_pdf(d1) * t.sqrt()
}

/// Black-Scholes Theta (∂V/∂t, calendar time)
///
/// # Formula
/// ```text
/// Θ_call = -S*φ(d₁)*σ/(2√T) - r*K*e^(-rT)*Φ(d₂)
/// Θ_put  = -S*φ(d₁)*σ/(2√T) + r*K*e^(-rT)*Φ(-d₂)
/// ```
///
/// # Interpretation
/// - Time decay of option value, usually negative for long options
/// - Units: price change per year; divide by 365 for per-day decay
pub fn bs_theta(option: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    let decay = (-s * norm_pdf(d1) * sigma) / (2.0 * t.sqrt());
    let carry = r * k * (-r * t).exp();
    match option {
        OptionType::Call => decay - carry * norm_cdf(d2),
        OptionType::Put => decay + carry * norm_cdf(-d2),
    }
}

/// Black-Scholes Rho (∂V/∂r)
///
/// # Formula
/// ```text
/// ρ_call =  K * T * e^(-rT) * Φ(d₂)
/// ρ_put  = -K * T * e^(-rT) * Φ(-d₂)
/// ```
pub fn bs_rho(option: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let (_, d2) = d1_d2(s, k, r, sigma, t);
    let scale = k * t * (-r * t).exp();
    match option {
        OptionType::Call => scale * norm_cdf(d2),
        OptionType::Put => -scale * norm_cdf(-d2),
    }
}

/// Closed-form Greeks bundle used to cross-check finite-difference estimates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyticGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

pub fn bs_greeks(option: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> AnalyticGreeks {
    AnalyticGreeks {
        delta: bs_delta(option, s, k, r, sigma, t),
        gamma: bs_gamma(s, k, r, sigma, t),
        vega: bs_vega(s, k, r, sigma, t),
        theta: bs_theta(option, s, k, r, sigma, t),
        rho: bs_rho(option, s, k, r, sigma, t),
    }
}
