// src/error.rs
use thiserror::Error;

/// Error type for option pricing and Greeks computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// Parameter outside its mathematical domain (T ≤ 0, σ ≤ 0, non-finite, ...)
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Simulation configuration that cannot be honoured
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Aggregated result is not finite
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },
}

/// Result type alias for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{PricingError, Result};

    /// Upper bound on simulated paths per run
    pub const MAX_PATHS: usize = 1_000_000_000;
    /// Upper bound on time steps per path
    pub const MAX_STEPS: usize = 100_000;

    /// Validate that a parameter is finite and strictly positive
    pub fn validate_positive(name: &str, value: f64) -> Result<()> {
        validate_finite(name, value)?;
        if value <= 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that `value - bump` stays inside the positive domain
    pub fn validate_bump_down(name: &str, value: f64, bump: f64) -> Result<()> {
        if value - bump <= 0.0 {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: format!(
                    "perturbation by epsilon = {} leaves the positive domain",
                    bump
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> Result<()> {
        if paths == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > MAX_PATHS {
            Err(PricingError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> Result<()> {
        if steps == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > MAX_STEPS {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Antithetic pairing splits the paths into two mirrored halves
    pub fn validate_antithetic_paths(paths: usize) -> Result<()> {
        if paths % 2 != 0 {
            Err(PricingError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: format!(
                    "antithetic variates need an even path count, got {}",
                    paths
                ),
            })
        } else {
            Ok(())
        }
    }
}
