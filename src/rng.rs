// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! Finite-difference Greeks compare prices computed from the same random
//! draws, so randomness is never hidden inside the simulator. Instead a
//! [`NormalDraws`] matrix is produced up front and handed to every pricing
//! call that must share it:
//! 1. **Reproducibility**: Same seed → same matrix
//! 2. **Thread-count independence**: each path owns its own stream
//! 3. **Injectability**: tests and callers can supply the matrix directly
//!
//! # Per-Path Streams
//!
//! Path `i` is driven by a `StdRng` seeded from a splitmix64 mix of
//! `(base_seed, i)`, so neighbouring base seeds do not share streams.
//!
//! # Antithetic Variates
//!
//! Only `M/2` independent columns are drawn; column `M/2 + i` is `-column i`:
//! ```text
//! Z = [ Z_half | -Z_half ]
//! ```

use crate::error::{validation::*, PricingError, Result};
use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

/// splitmix64 finaliser
fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Create a standard RNG for a specific path
    pub fn create_std_rng(&self, path_id: u64) -> StdRng {
        let mixed = splitmix64(
            self.base_seed
                .wrapping_add(path_id.wrapping_mul(0x9e3779b97f4a7c15u64)),
        );
        StdRng::seed_from_u64(mixed)
    }
}

/// Use the supplied seed, or draw one from OS entropy
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::thread_rng().gen();
            debug!(seed, "drew fresh simulation seed");
            seed
        }
    }
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Matrix of standard-normal variates with shape `[steps][paths]`.
///
/// Row `t` drives the move from price row `t` to price row `t + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalDraws {
    z: Array2<f64>,
    antithetic: bool,
    seed: Option<u64>,
}

impl NormalDraws {
    /// Draw a fresh matrix from per-path seeded streams, in parallel
    pub fn seeded(seed: u64, steps: usize, paths: usize, antithetic: bool) -> Result<Self> {
        let independent = Self::independent_columns(steps, paths, antithetic)?;
        let factory = RngFactory::new(seed);

        let mut z = Array2::<f64>::zeros((steps, paths));
        z.slice_mut(s![.., ..independent])
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut column)| {
                let mut rng = factory.create_std_rng(i as u64);
                column.map_inplace(|x| *x = get_normal_draw(&mut rng));
            });

        if antithetic {
            Self::mirror(&mut z, independent);
        }

        debug!(seed, steps, paths, antithetic, "drew normal variates");
        Ok(NormalDraws {
            z,
            antithetic,
            seed: Some(seed),
        })
    }

    /// Draw a matrix sequentially from a caller-supplied random source
    pub fn from_rng<R: Rng + ?Sized>(
        rng: &mut R,
        steps: usize,
        paths: usize,
        antithetic: bool,
    ) -> Result<Self> {
        let independent = Self::independent_columns(steps, paths, antithetic)?;

        let mut z = Array2::<f64>::zeros((steps, paths));
        for i in 0..independent {
            for t in 0..steps {
                z[[t, i]] = get_normal_draw(rng);
            }
        }

        if antithetic {
            Self::mirror(&mut z, independent);
        }

        Ok(NormalDraws {
            z,
            antithetic,
            seed: None,
        })
    }

    /// Wrap an explicit variate matrix (no antithetic structure assumed)
    pub fn from_array(z: Array2<f64>) -> Result<Self> {
        let (steps, paths) = z.dim();
        validate_steps(steps)?;
        validate_paths(paths)?;
        Self::validate_entries(z.view())?;
        Ok(NormalDraws {
            z,
            antithetic: false,
            seed: None,
        })
    }

    /// Build an antithetic matrix `[half | -half]` from explicit independent draws
    pub fn antithetic_from_half(half: Array2<f64>) -> Result<Self> {
        let (steps, independent) = half.dim();
        validate_steps(steps)?;
        validate_paths(independent)?;
        Self::validate_entries(half.view())?;

        let mut z = Array2::<f64>::zeros((steps, 2 * independent));
        z.slice_mut(s![.., ..independent]).assign(&half);
        Self::mirror(&mut z, independent);

        Ok(NormalDraws {
            z,
            antithetic: true,
            seed: None,
        })
    }

    fn independent_columns(steps: usize, paths: usize, antithetic: bool) -> Result<usize> {
        validate_steps(steps)?;
        validate_paths(paths)?;
        if antithetic {
            validate_antithetic_paths(paths)?;
            Ok(paths / 2)
        } else {
            Ok(paths)
        }
    }

    fn validate_entries(z: ArrayView2<f64>) -> Result<()> {
        if let Some(bad) = z.iter().find(|x| !x.is_finite()) {
            return Err(PricingError::InvalidParameters {
                parameter: "normal_draws".to_string(),
                value: *bad,
                constraint: "every variate must be finite".to_string(),
            });
        }
        Ok(())
    }

    fn mirror(z: &mut Array2<f64>, independent: usize) {
        let (left, mut right) = z.view_mut().split_at(Axis(1), independent);
        Zip::from(&mut right)
            .and(&left)
            .par_for_each(|mirrored, &original| *mirrored = -original);
    }

    pub fn steps(&self) -> usize {
        self.z.nrows()
    }

    pub fn paths(&self) -> usize {
        self.z.ncols()
    }

    pub fn is_antithetic(&self) -> bool {
        self.antithetic
    }

    /// Seed the matrix was drawn from, if it came from [`NormalDraws::seeded`]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.z.view()
    }

    /// Variates driving path `i`, one per step
    pub fn path(&self, i: usize) -> ArrayView1<'_, f64> {
        self.z.column(i)
    }

    /// Fail unless the matrix matches the requested simulation shape
    pub fn ensure_shape(&self, steps: usize, paths: usize) -> Result<()> {
        if self.steps() != steps || self.paths() != paths {
            return Err(PricingError::InvalidConfiguration {
                field: "normal_draws".to_string(),
                reason: format!(
                    "shape [{}][{}] does not match configured [{}][{}]",
                    self.steps(),
                    self.paths(),
                    steps,
                    paths
                ),
            });
        }
        Ok(())
    }
}
