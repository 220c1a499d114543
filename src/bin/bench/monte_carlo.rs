// Monte Carlo Infrastructure: N runs per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N, computing mean ± 95% CI

use tokensim_engine::conservation::tolerance_for;
use tokensim_engine::*;

use crate::report::*;
use crate::scenarios::Scenario;
use crate::time_series::TimeSeriesRecorder;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    time_series_dir: Option<&std::path::Path>,
) -> Result<BenchResult, SimError> {
    let start = Instant::now();

    let mut config = SimConfig::default();
    if let Some(configure) = scenario.configure {
        configure(&mut config);
    }
    config.seed = seed;
    let mut sim = EconomySimulation::from_config(config)?;

    if let Some(setup) = &scenario.setup {
        setup(&mut sim);
    }

    let start_k = sim.pool().invariant_k();
    let start_price = sim.spot_price().unwrap_or(0.0);
    let mut min_price = f64::INFINITY;
    let mut max_price: f64 = 0.0;
    let mut max_conservation_error: f64 = 0.0;
    let mut user_buys = 0u64;
    let mut user_sells = 0u64;
    let mut mm_reactive_trades = 0u32;
    let mut mm_proactive_trades = 0u32;
    let mut mm_panic_days = 0u32;
    let mut site_coins = 0.0;
    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());

    for day in 1..=scenario.days {
        if let Some(event) = &scenario.day_event {
            event(&mut sim, day);
        }
        if sim.is_halted() {
            break;
        }
        let report = sim.step_day();

        if let Some(p) = report.price {
            min_price = min_price.min(p);
            max_price = max_price.max(p);
        }
        user_buys += u64::from(report.trading.buys);
        user_sells += u64::from(report.trading.sells);
        mm_reactive_trades += u32::from(report.market_maker.reactive.is_some());
        mm_proactive_trades += u32::from(report.market_maker.proactive.is_some());
        mm_panic_days += u32::from(report.market_maker.panic);
        site_coins += report.site.coins_distributed;
        max_conservation_error = max_conservation_error.max(sim.conservation_error());

        if let Some(ts) = time_series.as_mut() {
            ts.record(&report, &sim.snapshot());
        }
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            eprintln!("  Warning: failed to write time series: {}", e);
        }
    }

    let elapsed = start.elapsed();
    let snap = sim.snapshot();
    let normalized = max_conservation_error / snap.total_emission.max(1.0);
    let final_price = snap.spot_price;

    let c = &scenario.criteria;
    let mut pass = normalized <= c.max_normalized_conservation
        && max_conservation_error <= tolerance_for(snap.total_emission);
    if c.require_not_halted && snap.circuit_breaker_tripped {
        pass = false;
    }
    if c.require_price_defined && final_price.is_none() {
        pass = false;
    }
    if let (Some(floor), Some(p)) = (c.min_final_price, final_price) {
        if p < floor {
            pass = false;
        }
    }

    Ok(BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        days: snap.day,
        halted: snap.circuit_breaker_tripped,
        conservation_error: max_conservation_error,
        normalized_conservation_error: normalized,
        start_price,
        final_price,
        min_price: if min_price.is_finite() { min_price } else { 0.0 },
        max_price,
        final_volatility: snap.volatility,
        final_fair_value: snap.fair_value,
        pool_k_growth: if start_k > 0.0 { snap.pool_k / start_k } else { 0.0 },
        added_emission: snap.added_emission,
        accounts: snap.account_count,
        user_buys,
        user_sells,
        mm_reactive_trades,
        mm_proactive_trades,
        mm_panic_days,
        mm_coin_end: snap.mm_coin,
        mm_fiat_end: snap.mm_fiat,
        site_coins_distributed: site_coins,
        elapsed_ms: elapsed.as_millis(),
        days_per_sec: snap.day as f64 / elapsed.as_secs_f64().max(0.001),
    })
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    time_series_base: Option<&std::path::Path>,
) -> Result<MonteCarloReport, SimError> {
    let ts_dir = time_series_base.map(|base| base.join(scenario.name.to_lowercase()));

    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        results.push(run_single(scenario, seed, ts_dir.as_deref())?);
    }

    Ok(aggregate(scenario, results))
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate: if n > 0 { passed as f64 / n as f64 } else { 0.0 },
        conservation_error: Stats::of(&results, |r| r.conservation_error),
        normalized_conservation_error: Stats::of(&results, |r| r.normalized_conservation_error),
        final_price: Stats::of(&results, |r| r.final_price.unwrap_or(0.0)),
        min_price: Stats::of(&results, |r| r.min_price),
        max_price: Stats::of(&results, |r| r.max_price),
        final_volatility: Stats::of(&results, |r| r.final_volatility),
        pool_k_growth: Stats::of(&results, |r| r.pool_k_growth),
        mm_reactive_trades: Stats::of(&results, |r| r.mm_reactive_trades as f64),
        mm_panic_days: Stats::of(&results, |r| r.mm_panic_days as f64),
        elapsed_ms: Stats::of(&results, |r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}
