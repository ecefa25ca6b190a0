//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! European options depend only on the terminal price S_T:
//! - **Call**: max(S_T - K, 0) - right to buy at strike K
//! - **Put**: max(K - S_T, 0) - right to sell at strike K

use crate::error::PricingError;
use std::fmt;
use std::str::FromStr;

/// Direction of a European option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff at maturity for terminal price `st` and strike `k`
    #[inline]
    pub fn payoff(&self, st: f64, k: f64) -> f64 {
        match self {
            OptionType::Call => (st - k).max(0.0),
            OptionType::Put => (k - st).max(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(PricingError::InvalidConfiguration {
                field: "option_type".to_string(),
                reason: format!("expected 'call' or 'put', got '{}'", other),
            }),
        }
    }
}
