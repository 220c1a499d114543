// Benchmark Report Types
// Structured output for independent analysis of economy runs

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let stderr = variance.sqrt() / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev: variance.sqrt(),
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn of<T>(items: &[T], metric: impl Fn(&T) -> f64) -> Self {
        Self::from_samples(&items.iter().map(metric).collect::<Vec<_>>())
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub seed: u64,
    pub pass: bool,
    pub days: u64,
    pub halted: bool,
    pub conservation_error: f64,
    pub normalized_conservation_error: f64,
    pub start_price: f64,
    pub final_price: Option<f64>,
    pub min_price: f64,
    pub max_price: f64,
    pub final_volatility: f64,
    pub final_fair_value: f64,
    pub pool_k_growth: f64,
    pub added_emission: f64,
    pub accounts: usize,
    pub user_buys: u64,
    pub user_sells: u64,
    pub mm_reactive_trades: u32,
    pub mm_proactive_trades: u32,
    pub mm_panic_days: u32,
    pub mm_coin_end: f64,
    pub mm_fiat_end: f64,
    pub site_coins_distributed: f64,
    pub elapsed_ms: u128,
    pub days_per_sec: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub conservation_error: Stats,
    pub normalized_conservation_error: Stats,
    pub final_price: Stats,
    pub min_price: Stats,
    pub max_price: Stats,
    pub final_volatility: Stats,
    pub pool_k_growth: Stats,
    pub mm_reactive_trades: Stats,
    pub mm_panic_days: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub summary: Summary,
    pub max_normalized_conservation: f64,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
