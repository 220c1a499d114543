// Per-Day JSONL Time Series Recorder
// Outputs one JSON line per simulated day for independent analysis

use serde::Serialize;
use std::io::Write;
use tokensim_engine::{DayReport, EconomySnapshot};

#[derive(Debug, Serialize)]
pub struct DaySnapshot {
    pub day: u64,
    pub price: Option<f64>,
    pub pool_coin: f64,
    pub pool_fiat: f64,
    pub pool_k: f64,
    pub emission: f64,
    pub unallocated: f64,
    pub treasury_fiat: f64,
    pub accounts: usize,
    pub buys: u32,
    pub sells: u32,
    pub site_coins: f64,
    pub mm_panic: bool,
    pub mm_flow_coin: f64,
    pub mm_reactive_coin: Option<f64>,
    pub mm_proactive_coin: Option<f64>,
    pub mm_coin: f64,
    pub mm_fiat: f64,
    pub fair_value: f64,
    pub volatility: f64,
    pub conservation_error: f64,
}

impl DaySnapshot {
    pub fn from_day(report: &DayReport, snap: &EconomySnapshot) -> Self {
        Self {
            day: report.day,
            price: report.price,
            pool_coin: snap.pool_coin,
            pool_fiat: snap.pool_fiat,
            pool_k: snap.pool_k,
            emission: report.emission,
            unallocated: snap.unallocated,
            treasury_fiat: snap.treasury_fiat,
            accounts: snap.account_count,
            buys: report.trading.buys,
            sells: report.trading.sells,
            site_coins: report.site.coins_distributed,
            mm_panic: report.market_maker.panic,
            mm_flow_coin: report.market_maker.flow_coin,
            mm_reactive_coin: report.market_maker.reactive.map(|f| f.coin),
            mm_proactive_coin: report.market_maker.proactive.map(|f| f.coin),
            mm_coin: snap.mm_coin,
            mm_fiat: snap.mm_fiat,
            fair_value: snap.fair_value,
            volatility: snap.volatility,
            conservation_error: snap.conservation_error,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<DaySnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, report: &DayReport, snap: &EconomySnapshot) {
        self.snapshots.push(DaySnapshot::from_day(report, snap));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
