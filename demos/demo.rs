// demos/demo.rs
//! Console report for one European option: closed form, Monte Carlo with a
//! 95% interval, the five finite-difference Greeks and a payoff histogram.
//!
//! ```text
//! cargo run --release --example demo -- [call|put] [--export]
//! RUST_LOG=mc_greeks=debug cargo run --example demo
//! ```

use mc_greeks::config::{MarketParams, SimConfig};
use mc_greeks::mc::greeks::GreeksEngine;
use mc_greeks::mc::payoffs::OptionType;
use mc_greeks::mc::pricer::OptionPricer;
use mc_greeks::output::{write_paths_to_csv, write_summary_to_csv};
use std::env;
use std::error::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HISTOGRAM_BINS: usize = 20;
const HISTOGRAM_WIDTH: usize = 50;
const EXPORTED_PATHS: usize = 8;

fn print_histogram(payoffs: &[f64]) {
    let max = payoffs.iter().cloned().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        println!("All payoffs are zero");
        return;
    }

    let width = max / HISTOGRAM_BINS as f64;
    let mut counts = [0usize; HISTOGRAM_BINS];
    for &p in payoffs {
        let bin = ((p / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }

    let tallest = counts.iter().copied().max().unwrap_or(1).max(1);
    for (i, &count) in counts.iter().enumerate() {
        let bar = count * HISTOGRAM_WIDTH / tallest;
        println!(
            "{:>7.2} - {:>7.2} | {:<width$} {}",
            i as f64 * width,
            (i + 1) as f64 * width,
            "#".repeat(bar),
            count,
            width = HISTOGRAM_WIDTH
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let export = args.iter().any(|a| a == "--export");
    let option = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(|a| a.parse::<OptionType>())
        .transpose()?
        .unwrap_or(OptionType::Call);

    let market = MarketParams::default();
    let sim = SimConfig::default();

    let pricer = OptionPricer::new(market, sim)?;
    let bs_price = pricer.analytic_price(option)?;
    let mc = pricer.monte_carlo_price(option)?;
    let (ci_low, ci_high) = mc.confidence_interval;

    println!("\n========== OPTION PRICING ==========");
    println!("Option              : European {}", option);
    println!("Black-Scholes Price : {:.4}", bs_price);
    println!("Monte Carlo Price   : {:.4}", mc.price);
    println!("Standard Error      : {:.4}", mc.std_error);
    println!("95% Confidence Int. : ({:.4}, {:.4})", ci_low, ci_high);
    println!("====================================\n");

    let engine = GreeksEngine::with_default_epsilon(market, sim)?;
    let greeks = engine.compute_all(option)?;
    let analytic = pricer.analytic_greeks(option)?;

    println!("============== GREEKS ==============");
    println!("{:<6} {:>10} {:>9} {:>10}", "", "MC", "SE", "Analytic");
    let rows = [
        ("Delta", greeks.delta, analytic.delta),
        ("Gamma", greeks.gamma, analytic.gamma),
        ("Vega", greeks.vega, analytic.vega),
        ("Theta", greeks.theta, analytic.theta),
        ("Rho", greeks.rho, analytic.rho),
    ];
    for (name, estimate, exact) in rows {
        if let Some(g) = estimate {
            println!("{:<6} {:>10.4} {:>9.4} {:>10.4}", name, g.value, g.std_error, exact);
        }
    }
    if let Some(theta) = greeks.theta {
        println!("Theta per day: {:.5}", theta.per_day().value);
    }
    println!("====================================\n");

    println!("Payoff distribution ({} paths):", mc.paths.paths());
    let payoffs: Vec<f64> = mc
        .paths
        .terminal_prices()
        .iter()
        .map(|&st| option.payoff(st, market.k))
        .collect();
    print_histogram(&payoffs);

    if export {
        write_paths_to_csv("demo_paths.csv", &mc.paths, EXPORTED_PATHS)?;
        let mut summary = vec![
            ("option", option.to_string()),
            ("bs_price", format!("{:.6}", bs_price)),
            ("mc_price", format!("{:.6}", mc.price)),
            ("std_error", format!("{:.6}", mc.std_error)),
            ("ci_low", format!("{:.6}", ci_low)),
            ("ci_high", format!("{:.6}", ci_high)),
        ];
        for (name, estimate, _) in rows {
            if let Some(g) = estimate {
                summary.push((name, format!("{:.6}", g.value)));
            }
        }
        write_summary_to_csv("demo_summary.csv", &summary)?;
        println!("\nWrote demo_paths.csv and demo_summary.csv");
    }

    Ok(())
}
