// scripts/benchmark.rs
use mc_greeks::config::{MarketParams, SimConfig};
use mc_greeks::error::PricingError;
use mc_greeks::math_utils::Timer;
use mc_greeks::mc::greeks::{Greek, GreeksEngine};
use mc_greeks::mc::payoffs::OptionType;
use mc_greeks::mc::pricer::OptionPricer;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::Command;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rust_version: String,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::cpu_model(),
            cpu_cores: num_cpus::get(),
            rust_version: Self::rust_version(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn cpu_model() -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/cpuinfo")
                .ok()
                .and_then(|content| {
                    content
                        .lines()
                        .find(|line| line.starts_with("model name"))
                        .and_then(|line| line.split(':').nth(1))
                        .map(|s| s.trim().to_string())
                })
                .unwrap_or_else(|| "Unknown CPU".to_string())
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("sysctl")
                .args(["-n", "machdep.cpu.brand_string"])
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown CPU".to_string())
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "Unknown CPU".to_string()
        }
    }

    fn rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    steps: usize,
    paths: usize,
    time_ms: f64,
    value: f64,
    std_error: f64,
    analytic_value: f64,
}

impl BenchmarkResult {
    fn throughput(&self) -> f64 {
        self.paths as f64 / (self.time_ms / 1000.0)
    }

    /// Distance from the closed form in units of the Monte Carlo standard error
    fn z_score(&self) -> Option<f64> {
        (self.std_error > 0.0).then(|| (self.value - self.analytic_value) / self.std_error)
    }
}

fn run_pricing_benchmarks(market: MarketParams) -> Result<Vec<BenchmarkResult>, PricingError> {
    let mut results = Vec::new();
    let analytic = OptionPricer::new(market, SimConfig::default())?.analytic_price(OptionType::Call)?;

    let configs = [(1, 10_000), (1, 100_000), (1, 1_000_000), (252, 10_000), (252, 100_000)];
    for (steps, paths) in configs {
        info!(steps, paths, "pricing benchmark");
        let pricer = OptionPricer::new(market, SimConfig::new(steps, paths).with_seed(42))?;

        let mut timer = Timer::new();
        timer.start();
        let mc = pricer.monte_carlo_price(OptionType::Call)?;
        let time_ms = timer.elapsed_ms();

        results.push(BenchmarkResult {
            name: "European Call Price".to_string(),
            steps,
            paths,
            time_ms,
            value: mc.price,
            std_error: mc.std_error,
            analytic_value: analytic,
        });
    }

    Ok(results)
}

fn run_greeks_benchmarks(market: MarketParams, paths: usize) -> Result<Vec<BenchmarkResult>, PricingError> {
    let mut results = Vec::new();
    let sim = SimConfig::new(252, paths).with_seed(42);
    let analytic = OptionPricer::new(market, sim)?.analytic_greeks(OptionType::Call)?;

    for greek in Greek::ALL {
        // Gamma needs a wider bump for the kink to be sampled
        let epsilon = if greek == Greek::Gamma { 1.0 } else { 0.01 };
        let engine = GreeksEngine::new(market, sim, epsilon)?;
        info!(%greek, paths, epsilon, "greeks benchmark");

        let mut timer = Timer::new();
        timer.start();
        let estimate = engine.estimate(greek, OptionType::Call)?;
        let time_ms = timer.elapsed_ms();

        let analytic_value = match greek {
            Greek::Delta => analytic.delta,
            Greek::Gamma => analytic.gamma,
            Greek::Vega => analytic.vega,
            Greek::Theta => analytic.theta,
            Greek::Rho => analytic.rho,
        };

        results.push(BenchmarkResult {
            name: format!("European Call {} (FD, eps={})", greek, epsilon),
            steps: sim.steps,
            paths,
            time_ms,
            value: estimate.value,
            std_error: estimate.std_error,
            analytic_value,
        });
    }

    Ok(results)
}

fn write_results_to_csv(results: &[BenchmarkResult], system_info: &SystemInfo, filename: &str) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# Rust Version: {}", system_info.rust_version)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(file, "# Benchmark Date: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(file, "#")?;

    writeln!(file, "Benchmark,Steps,Paths,Time_ms,Throughput_paths_per_sec,Value,Std_Error,Analytic_Value,Z_Score")?;
    for result in results {
        writeln!(
            file,
            "{},{},{},{:.2},{:.0},{:.6},{:.6},{:.6},{}",
            result.name,
            result.steps,
            result.paths,
            result.time_ms,
            result.throughput(),
            result.value,
            result.std_error,
            result.analytic_value,
            result
                .z_score()
                .map(|z| format!("{:.3}", z))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }

    file.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("mc-greeks Benchmark Suite");
    println!("=========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let greek_paths = env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()?
        .unwrap_or(100_000);

    let market = MarketParams::default();
    let mut all_results = run_pricing_benchmarks(market)?;
    all_results.extend(run_greeks_benchmarks(market, greek_paths)?);

    println!("\n{:=<112}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<112}", "");
    println!(
        "{:<38} {:>5} {:>9} {:>10} {:>13} {:>10} {:>9} {:>10} {:>7}",
        "Benchmark", "Steps", "Paths", "Time (ms)", "Paths/sec", "Value", "SE", "Analytic", "Z"
    );
    println!("{:-<112}", "");

    for result in &all_results {
        println!(
            "{:<38} {:>5} {:>9} {:>10.2} {:>13.0} {:>10.4} {:>9.5} {:>10.4} {:>7}",
            result.name,
            result.steps,
            result.paths,
            result.time_ms,
            result.throughput(),
            result.value,
            result.std_error,
            result.analytic_value,
            result
                .z_score()
                .map(|z| format!("{:.2}", z))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    println!("{:=<112}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    write_results_to_csv(&all_results, &system_info, &filename)?;

    println!("\nResults saved to: {}", filename);
    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!("3. Run: cargo run --bin benchmark --release [greek_paths]");
    println!("4. Ensure {} CPU threads available", system_info.rayon_threads);

    Ok(())
}
