// tests/greeks_test.rs
use approx::assert_abs_diff_eq;
use mc_greeks::config::{MarketParams, ParamOverrides, SimConfig};
use mc_greeks::error::PricingError;
use mc_greeks::mc::greeks::{Greek, GreekEstimate, GreekSet, GreeksEngine};
use mc_greeks::mc::payoffs::OptionType;
use mc_greeks::mc::pricer::OptionPricer;
use mc_greeks::rng::NormalDraws;

fn engine(market: MarketParams, epsilon: f64) -> GreeksEngine {
    GreeksEngine::new(market, SimConfig::new(12, 20_000).with_seed(42), epsilon).expect("Valid configuration")
}

fn report(name: &str, estimate: GreekEstimate, analytic: f64) {
    println!(
        "{:<6} FD {:>10.5} (SE {:.5})  analytic {:>10.5}  diff {:+.5}",
        name,
        estimate.value,
        estimate.std_error,
        analytic,
        estimate.value - analytic
    );
}

#[test]
fn test_delta_limits_deep_in_and_out_of_the_money() {
    let deep_itm = MarketParams::new(200.0, 100.0, 1.0, 0.05, 0.2);
    let deep_otm = MarketParams::new(50.0, 100.0, 1.0, 0.05, 0.2);

    let itm = GreeksEngine::with_default_epsilon(deep_itm, SimConfig::default())
        .and_then(|e| e.delta(OptionType::Call))
        .expect("Valid configuration");
    let otm = GreeksEngine::with_default_epsilon(deep_otm, SimConfig::default())
        .and_then(|e| e.delta(OptionType::Call))
        .expect("Valid configuration");

    println!("\nDelta S0=200: {:.4}, S0=50: {:.4}", itm.value, otm.value);
    assert!(itm.value > 0.9);
    assert!(otm.value < 0.1);
}

#[test]
fn test_gamma_non_negative() {
    let markets = [
        MarketParams::default(),
        MarketParams::new(80.0, 100.0, 0.5, 0.02, 0.3),
        MarketParams::new(130.0, 100.0, 2.0, 0.07, 0.15),
    ];
    for market in markets {
        let engine = engine(market, 1.0);
        for option in [OptionType::Call, OptionType::Put] {
            let gamma = engine.gamma(option).expect("Valid bump");
            assert!(gamma.value >= -1e-6, "{} gamma {} negative for {:?}", option, gamma.value, market);
        }
    }
}

#[test]
fn test_finite_difference_greeks_match_analytic() {
    let market = MarketParams::default();
    let analytic_pricer = OptionPricer::new(market, SimConfig::default()).expect("Valid configuration");

    for option in [OptionType::Call, OptionType::Put] {
        let analytic = analytic_pricer.analytic_greeks(option).expect("Valid parameters");
        println!("\n=== {} ===", option);

        let fd = engine(market, 0.01).compute(option, GreekSet::DELTA | GreekSet::VEGA | GreekSet::THETA | GreekSet::RHO)
            .expect("Valid configuration");
        // Gamma needs a wider bump to see enough paths cross the kink
        let gamma = engine(market, 1.0).gamma(option).expect("Valid bump");

        let checks = [
            ("delta", fd.delta, analytic.delta, 0.02),
            ("gamma", Some(gamma), analytic.gamma, 0.05),
            ("vega", fd.vega, analytic.vega, 0.02),
            ("theta", fd.theta, analytic.theta, 0.03),
            ("rho", fd.rho, analytic.rho, 0.02),
        ];
        for (name, estimate, exact, rel_tol) in checks {
            let estimate = estimate.expect("Greek was requested");
            report(name, estimate, exact);
            let tol = 4.0 * estimate.std_error + rel_tol * exact.abs();
            assert!(
                (estimate.value - exact).abs() < tol,
                "{} {}: FD {} vs analytic {} (tol {})",
                option,
                name,
                estimate.value,
                exact,
                tol
            );
        }
    }
}

#[test]
fn test_theta_negative_for_atm_call() {
    let theta = GreeksEngine::with_default_epsilon(MarketParams::default(), SimConfig::default())
        .and_then(|e| e.theta(OptionType::Call))
        .expect("Valid configuration");

    let daily = theta.per_day();
    println!("\nTheta: {:.4}/year, {:.5}/day", theta.value, daily.value);
    assert!(theta.value < 0.0);
    assert_abs_diff_eq!(daily.value * 365.0, theta.value, epsilon = 1e-12);
}

#[test]
fn test_common_random_numbers_beat_independent_draws() {
    let market = MarketParams::default();
    let sim = SimConfig::new(12, 10_000).with_seed(42);
    let eps = 1.0;
    let engine = GreeksEngine::new(market, sim, eps).expect("Valid configuration");
    let crn = engine.gamma(OptionType::Call).expect("Valid bump");

    // Same stencil, each price from its own draws
    let draw = |seed| NormalDraws::seeded(seed, sim.steps, sim.paths, sim.antithetic).expect("Valid shape");
    let up = engine
        .price_with(OptionType::Call, &ParamOverrides::spot(market.s0 + eps), &draw(1))
        .expect("Valid price");
    let mid = engine
        .price_with(OptionType::Call, &ParamOverrides::none(), &draw(2))
        .expect("Valid price");
    let down = engine
        .price_with(OptionType::Call, &ParamOverrides::spot(market.s0 - eps), &draw(3))
        .expect("Valid price");
    let independent_se = (up.std_error.powi(2) + 4.0 * mid.std_error.powi(2) + down.std_error.powi(2)).sqrt()
        / (eps * eps);

    println!("\nGamma SE with CRN: {:.6}, independent draws: {:.6}", crn.std_error, independent_se);
    assert!(independent_se > 10.0 * crn.std_error);
}

#[test]
fn test_greeks_reproducible_for_fixed_seed() {
    let engine = engine(MarketParams::default(), 0.01);
    let first = engine.compute_all(OptionType::Call).expect("Valid configuration");
    let second = engine.compute_all(OptionType::Call).expect("Valid configuration");
    assert_eq!(first, second);
}

#[test]
fn test_tiny_epsilon_still_returns_estimate() {
    let engine = engine(MarketParams::default(), 1e-7);
    let delta = engine.delta(OptionType::Call).expect("Valid bump");
    assert!(delta.value.is_finite());
    assert!(delta.std_error.is_finite());
}

#[test]
fn test_out_of_domain_bumps_rejected() {
    let sim = SimConfig::new(4, 100);
    let cases = [
        (MarketParams::new(0.005, 100.0, 1.0, 0.05, 0.2), Greek::Delta),
        (MarketParams::new(0.005, 100.0, 1.0, 0.05, 0.2), Greek::Gamma),
        (MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.01), Greek::Vega),
        (MarketParams::new(100.0, 100.0, 0.01, 0.05, 0.2), Greek::Theta),
    ];
    for (market, greek) in cases {
        let engine = GreeksEngine::new(market, sim, 0.01).expect("Valid configuration");
        assert!(
            matches!(engine.estimate(greek, OptionType::Call), Err(PricingError::InvalidParameters { .. })),
            "{} accepted for {:?}",
            greek,
            market
        );
    }

    // A failing Greek fails the whole batch before any draws are made
    let engine = GreeksEngine::new(MarketParams::new(100.0, 100.0, 0.01, 0.05, 0.2), sim, 0.01).expect("Valid configuration");
    assert!(engine.compute_all(OptionType::Put).is_err());
    assert!(engine.compute(OptionType::Put, GreekSet::DELTA | GreekSet::RHO).is_ok());
}

#[test]
#[ignore] // Expensive: cargo test -- --ignored
fn test_delta_convergence_with_paths() {
    let market = MarketParams::default();
    let analytic = OptionPricer::new(market, SimConfig::default())
        .and_then(|p| p.analytic_greeks(OptionType::Call))
        .expect("Valid parameters")
        .delta;

    println!("\n{:>10} | {:>10} | {:>10} | {:>10}", "Paths", "Delta", "SE", "Error");
    let mut last_se = f64::INFINITY;
    for paths in [10_000, 40_000, 160_000, 640_000] {
        let engine = GreeksEngine::new(market, SimConfig::new(12, paths).with_seed(7), 0.01)
            .expect("Valid configuration");
        let delta = engine.delta(OptionType::Call).expect("Valid bump");
        println!(
            "{:>10} | {:>10.6} | {:>10.6} | {:>10.6}",
            paths,
            delta.value,
            delta.std_error,
            (delta.value - analytic).abs()
        );
        assert!(delta.std_error < last_se);
        assert!((delta.value - analytic).abs() < 4.0 * delta.std_error + 1e-3);
        last_se = delta.std_error;
    }
}
