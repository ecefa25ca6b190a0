// tests/pricing_test.rs
use approx::assert_abs_diff_eq;
use mc_greeks::analytics::bs_analytic;
use mc_greeks::config::{MarketParams, SimConfig};
use mc_greeks::mc::payoffs::OptionType;
use mc_greeks::mc::pricer::{analytic_price, OptionPricer};
use proptest::prelude::*;

#[test]
fn test_analytic_reference_scenario() {
    let pricer = OptionPricer::new(MarketParams::default(), SimConfig::default()).expect("Valid configuration");
    let call = pricer.analytic_price(OptionType::Call).expect("Valid parameters");

    println!("\nAnalytic call price: {}", call);
    assert!((call - 10.45).abs() < 0.01, "Analytic call price {} not ≈ 10.45", call);
}

#[test]
fn test_put_call_parity_reference() {
    let market = MarketParams::default();
    let call = analytic_price(&market, OptionType::Call).expect("Valid parameters");
    let put = analytic_price(&market, OptionType::Put).expect("Valid parameters");
    let forward_gap = market.s0 - market.k * (-market.r * market.t).exp();

    assert_abs_diff_eq!(call - put, forward_gap, epsilon = 1e-9);
}

proptest! {
    #[test]
    fn prop_put_call_parity(
        s0 in 1.0f64..500.0,
        k in 1.0f64..500.0,
        t in 0.01f64..5.0,
        r in -0.05f64..0.2,
        sigma in 0.01f64..1.0,
    ) {
        let market = MarketParams::new(s0, k, t, r, sigma);
        let call = analytic_price(&market, OptionType::Call).unwrap();
        let put = analytic_price(&market, OptionType::Put).unwrap();
        let forward_gap = s0 - k * (-r * t).exp();
        prop_assert!((call - put - forward_gap).abs() < 1e-9,
            "parity gap {} for {:?}", call - put - forward_gap, market);
    }
}

#[test]
fn test_mc_converges_to_analytic() {
    let market = MarketParams::default();
    let sim = SimConfig::new(10, 200_000).with_antithetic(true).with_seed(42);
    let pricer = OptionPricer::new(market, sim).expect("Valid configuration");

    for option in [OptionType::Call, OptionType::Put] {
        let analytic = pricer.analytic_price(option).expect("Valid parameters");
        let mc = pricer.monte_carlo_price(option).expect("Valid configuration");
        let abs_error = (mc.price - analytic).abs();

        println!("\n=== {} ===", option);
        println!("MC Price: {:.6} (SE {:.6})", mc.price, mc.std_error);
        println!("Analytic Price: {:.6}", analytic);
        println!("Absolute Error: {:.6}", abs_error);

        assert!(
            abs_error < 3.0 * mc.std_error,
            "{} error {} exceeds 3 standard errors ({})",
            option,
            abs_error,
            3.0 * mc.std_error
        );
    }
}

#[test]
fn test_confidence_interval_brackets_price() {
    let pricer = OptionPricer::new(MarketParams::default(), SimConfig::new(4, 2_000).with_seed(5))
        .expect("Valid configuration");

    for option in [OptionType::Call, OptionType::Put] {
        let mc = pricer.monte_carlo_price(option).expect("Valid configuration");
        let (low, high) = mc.confidence_interval;
        assert!(low < mc.price && mc.price < high, "{:?} does not bracket {}", mc.confidence_interval, mc.price);
        assert_abs_diff_eq!(high - low, 2.0 * 1.96 * mc.std_error, epsilon = 1e-12);
    }
}

#[test]
fn test_confidence_interval_shrinks_with_paths() {
    let market = MarketParams::default();
    let width = |paths: usize| {
        let sim = SimConfig::new(1, paths).with_seed(2024);
        let pricer = OptionPricer::new(market, sim).expect("Valid configuration");
        pricer.monte_carlo_price(OptionType::Call).expect("Valid configuration").ci_width()
    };

    let narrow = width(40_000);
    let wide = width(10_000);
    let ratio = wide / narrow;

    println!("\nCI width 10k: {:.5}, 40k: {:.5}, ratio {:.3}", wide, narrow, ratio);
    assert!((1.8..2.2).contains(&ratio), "Quadrupling paths should halve the CI, ratio {}", ratio);
}

#[test]
fn test_end_to_end_ci_coverage_across_seeds() {
    let market = MarketParams::default();
    let analytic = bs_analytic::bs_call_price(market.s0, market.k, market.r, market.sigma, market.t);
    let trials = 20;

    let covered = (0..trials)
        .filter(|&seed| {
            let sim = SimConfig::new(252, 10_000).with_seed(1_000 + seed as u64);
            let pricer = OptionPricer::new(market, sim).expect("Valid configuration");
            let mc = pricer.monte_carlo_price(OptionType::Call).expect("Valid configuration");
            mc.contains(analytic)
        })
        .count();

    println!("\nCI covered analytic price in {}/{} trials", covered, trials);
    // 95% nominal coverage; allow for sampling variation across 20 trials
    assert!(covered >= 18, "coverage {}/{} too low", covered, trials);
}

#[test]
fn test_result_carries_paths() {
    let market = MarketParams::default();
    let sim = SimConfig::new(252, 1_000).with_seed(9);
    let pricer = OptionPricer::new(market, sim).expect("Valid configuration");
    let mc = pricer.monte_carlo_price(OptionType::Call).expect("Valid configuration");

    assert_eq!(mc.paths.steps(), 252);
    assert_eq!(mc.paths.paths(), 1_000);
    assert!(mc.paths.initial_prices().iter().all(|&s| s == market.s0));
}

#[test]
fn test_unseeded_runs_are_stochastic() {
    let sim = SimConfig::new(4, 1_000).unseeded();
    let pricer = OptionPricer::new(MarketParams::default(), sim).expect("Valid configuration");
    let a = pricer.monte_carlo_price(OptionType::Call).expect("Valid configuration");
    let b = pricer.monte_carlo_price(OptionType::Call).expect("Valid configuration");
    assert_ne!(a.price, b.price);
}

#[test]
fn test_invalid_inputs_rejected_before_simulation() {
    let bad = [
        MarketParams::new(0.0, 100.0, 1.0, 0.05, 0.2),
        MarketParams::new(100.0, -1.0, 1.0, 0.05, 0.2),
        MarketParams::new(100.0, 100.0, 0.0, 0.05, 0.2),
        MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.0),
        MarketParams::new(100.0, 100.0, 1.0, f64::INFINITY, 0.2),
    ];
    for market in bad {
        assert!(OptionPricer::new(market, SimConfig::default()).is_err(), "{:?} accepted", market);
    }

    // Odd path count is rejected only when antithetic pairing is requested
    let odd = SimConfig::new(252, 10_001);
    assert!(OptionPricer::new(MarketParams::default(), odd).is_err());
    assert!(OptionPricer::new(MarketParams::default(), odd.with_antithetic(false)).is_ok());
}
