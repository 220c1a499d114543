// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Market Maker Controller

//! Daily market-maker feedback loop.
//!
//! Each evaluation compares the pool against the previous day's snapshot:
//!
//! 1. **Observe** the coin flow `Δcoin` and flag a panic on a sharp price
//!    drop or a large coin inflow.
//! 2. **React** against the flow: coin leaving the pool (users buying) is
//!    answered with a sell, coin entering it with a buy. Volume is a share of
//!    the flow, scaled by the price tier and capped by pool impact, balance
//!    usage and a reserve buffer.
//! 3. **Nudge** toward a fair value derived from user growth, but only on a
//!    calm day where no reactive trade happened.
//! 4. **Snapshot** the pool for tomorrow.

use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::types::{Holdings, MarketMakerReport, Side, TradeFill, EPSILON};

use super::params::MarketMakerParams;

const FAIR_VALUE_FLOOR: f64 = 0.0001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMaker {
    params: MarketMakerParams,
    holdings: Holdings,
    initial_accounts: usize,
    prev_pool_coin: f64,
    prev_pool_fiat: f64,
    prev_price: Option<f64>,
}

impl MarketMaker {
    /// Creates a market maker holding `holdings` and takes the first pool
    /// snapshot. `initial_accounts` anchors the fair-value growth curve.
    pub fn new(params: MarketMakerParams, holdings: Holdings, initial_accounts: usize, pool: &Pool) -> Self {
        let mut mm = Self {
            params,
            holdings,
            initial_accounts,
            prev_pool_coin: 0.0,
            prev_pool_fiat: 0.0,
            prev_price: None,
        };
        mm.observe(pool);
        mm
    }

    pub fn params(&self) -> &MarketMakerParams { &self.params }
    pub fn holdings(&self) -> Holdings { self.holdings }
    pub fn prev_pool_coin(&self) -> f64 { self.prev_pool_coin }
    pub fn prev_pool_fiat(&self) -> f64 { self.prev_pool_fiat }
    pub fn prev_price(&self) -> Option<f64> { self.prev_price }

    /// Records the pool's current balances and price as the baseline for the
    /// next evaluation.
    pub fn observe(&mut self, pool: &Pool) {
        self.prev_pool_coin = pool.coin_balance();
        self.prev_pool_fiat = pool.fiat_balance();
        self.prev_price = pool.spot_price();
    }

    // ── pure decisions ──────────────────────────────────────────────────

    /// Fair value grows with the log of account growth since start.
    pub fn fair_value(&self, account_count: usize) -> f64 {
        let p = &self.params;
        if account_count == 0 || self.initial_accounts == 0 {
            return p.fair_value_base;
        }
        let growth = (account_count as f64 / self.initial_accounts as f64).max(1.0);
        (p.fair_value_base + growth.log10() * p.fair_value_scaling).max(FAIR_VALUE_FLOOR)
    }

    /// Panic: the price fell more than the drop threshold since yesterday, or
    /// coin poured into the pool faster than the inflow ratio allows.
    pub fn detect_panic(&self, price: f64, delta_coin: f64) -> bool {
        let p = &self.params;
        if let Some(prev) = self.prev_price.filter(|v| *v > EPSILON) {
            if (price - prev) / prev < -p.panic_price_drop {
                return true;
            }
        }
        self.prev_pool_coin > EPSILON && delta_coin > self.prev_pool_coin * p.panic_inflow_ratio
    }

    /// Side that offsets the flow, if the flow is large enough to act on.
    pub fn reactive_side(&self, delta_coin: f64) -> Option<Side> {
        let eps = self.params.action_epsilon;
        if delta_coin < -eps {
            Some(Side::Sell)
        } else if delta_coin > eps {
            Some(Side::Buy)
        } else {
            None
        }
    }

    /// Reactive trade size: coin for a sell, fiat for a buy. Zero when the
    /// buffer or minimum-trade rules suppress the trade.
    pub fn reactive_volume(&self, side: Side, flow: f64, price: f64, pool: &Pool, panic: bool) -> f64 {
        let p = &self.params;
        let sized = flow * p.reaction_fraction * p.price_modifier(side, price);
        match side {
            Side::Sell => {
                let volume = sized
                    .min(pool.coin_balance() * p.pool_impact_fraction)
                    .min(self.holdings.coin * p.max_balance_usage);
                if self.holdings.coin - volume < p.min_coin_buffer || volume < p.min_trade_coin {
                    return 0.0;
                }
                volume
            }
            Side::Buy => {
                let usage = if panic { p.panic_balance_usage } else { p.max_balance_usage };
                let fiat = sized * price;
                if !(fiat.is_finite() && fiat > 0.0) {
                    return 0.0;
                }
                let volume = fiat
                    .min(pool.fiat_balance() * p.pool_impact_fraction)
                    .min(self.holdings.fiat * usage);
                if self.holdings.fiat - volume < p.min_fiat_buffer || volume < p.min_trade_fiat {
                    return 0.0;
                }
                volume
            }
        }
    }

    /// Small fixed trade toward fair value when the price has drifted past
    /// the deviation band. Returns the side and size (fiat for a buy, coin
    /// for a sell).
    pub fn proactive_trade(&self, price: f64, fair_value: f64) -> Option<(Side, f64)> {
        let p = &self.params;
        if fair_value <= EPSILON {
            return None;
        }
        let deviation = (fair_value - price) / fair_value;
        if deviation > p.fair_value_deviation
            && self.holdings.fiat - p.proactive_buy_fiat >= p.min_fiat_buffer
        {
            Some((Side::Buy, p.proactive_buy_fiat))
        } else if deviation < -p.fair_value_deviation
            && self.holdings.coin - p.proactive_sell_coin >= p.min_coin_buffer
        {
            Some((Side::Sell, p.proactive_sell_coin))
        } else {
            None
        }
    }

    // ── evaluation ──────────────────────────────────────────────────────

    fn execute(&mut self, pool: &mut Pool, side: Side, volume: f64) -> Option<TradeFill> {
        if volume <= 0.0 {
            return None;
        }
        let result = match side {
            Side::Sell => pool
                .system_sell(&mut self.holdings, volume)
                .map(|q| TradeFill { side, coin: q.coins_sold, fiat: q.fiat_received }),
            Side::Buy => pool
                .system_buy(&mut self.holdings, volume)
                .map(|q| TradeFill { side, coin: q.coins_received, fiat: q.fiat_spent }),
        };
        match result {
            Ok(fill) => Some(fill),
            Err(e) => {
                log::debug!("market maker {side:?} of {volume:.2} not filled: {e}");
                None
            }
        }
    }

    /// Runs one daily evaluation against `pool`.
    pub fn evaluate(&mut self, pool: &mut Pool, account_count: usize, day: u64) -> MarketMakerReport {
        let mut report = MarketMakerReport::default();
        if !self.params.enabled || pool.is_degenerate() {
            report.skipped = true;
            return report;
        }
        let price = match pool.spot_price().filter(|p| *p > EPSILON) {
            Some(p) => p,
            None => {
                self.observe(pool);
                report.skipped = true;
                return report;
            }
        };

        let delta_coin = pool.coin_balance() - self.prev_pool_coin;
        let flow = delta_coin.abs();
        report.flow_coin = delta_coin;
        report.panic = self.detect_panic(price, delta_coin);
        if report.panic {
            log::info!("day {day}: market maker panic flagged (price {price:.6}, flow {delta_coin:+.2})");
        }

        if let Some(side) = self.reactive_side(delta_coin) {
            let volume = self.reactive_volume(side, flow, price, pool, report.panic);
            report.reactive = self.execute(pool, side, volume);
        }

        if report.reactive.is_none() && flow < self.params.calm_flow_threshold() {
            let fv = self.fair_value(account_count);
            report.fair_value = Some(fv);
            if let Some((side, volume)) = self.proactive_trade(price, fv) {
                report.proactive = self.execute(pool, side, volume);
            }
        }

        if let Some(fill) = report.reactive.or(report.proactive) {
            log::info!(
                "day {day}: market maker {:?} {:.2} COIN for {:.2} fiat",
                fill.side, fill.coin, fill.fiat
            );
        }

        self.prev_pool_coin = pool.coin_balance();
        self.prev_pool_fiat = pool.fiat_balance();
        self.prev_price = Some(price);
        report
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool {
        Pool::new(30_000_000.0, 10_000_000.0, 0.003)
    }

    fn mm_with(coin: f64, fiat: f64, pool: &Pool) -> MarketMaker {
        MarketMaker::new(MarketMakerParams::default(), Holdings::new(coin, fiat), 10, pool)
    }

    /// Moves `coin` out of the pool the way a user buy would.
    fn user_buys(pool: &mut Pool, coin: f64) {
        let mut user = Holdings::new(0.0, 1.0e9);
        pool.buy_coins(&mut user, coin).expect("test: user buy settles");
    }

    #[test]
    fn test_fair_value_curve() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        assert_eq!(mm.fair_value(0), 0.30);
        assert_eq!(mm.fair_value(5), 0.30, "shrinking base never lowers fair value");
        assert!((mm.fair_value(10) - 0.30).abs() < 1e-12);
        assert!((mm.fair_value(100) - 1.30).abs() < 1e-12);
    }

    #[test]
    fn test_reactive_side_thresholds() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        assert_eq!(mm.reactive_side(-600_000.0), Some(Side::Sell));
        assert_eq!(mm.reactive_side(600_000.0), Some(Side::Buy));
        assert_eq!(mm.reactive_side(0.5), None);
        assert_eq!(mm.reactive_side(-1.0), None);
    }

    #[test]
    fn test_sell_volume_example() {
        // users took 600k coin out; half of it times the cheap-tier 1.1
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        let v = mm.reactive_volume(Side::Sell, 600_000.0, 0.34, &p, false);
        assert!((v - 330_000.0).abs() < 1e-6, "volume {v}");
    }

    #[test]
    fn test_buffer_suppresses_sell() {
        // usage cap gives 60k, which would leave 90k < 100k buffer
        let p = pool();
        let mm = mm_with(150_000.0, 5_000_000.0, &p);
        assert_eq!(mm.reactive_volume(Side::Sell, 600_000.0, 0.34, &p, false), 0.0);
    }

    #[test]
    fn test_buy_volume_caps_and_panic_usage() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 100_000.0, &p);
        // 1M flow * 0.5 * 0.9 * 0.34 = 153k fiat, capped at 40% of 100k
        let normal = mm.reactive_volume(Side::Buy, 1_000_000.0, 0.34, &p, false);
        assert!((normal - 40_000.0).abs() < 1e-6);
        let panic = mm.reactive_volume(Side::Buy, 1_000_000.0, 0.34, &p, true);
        assert!((panic - 60_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_tiny_trade_suppressed() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        assert_eq!(mm.reactive_volume(Side::Sell, 100.0, 0.34, &p, false), 0.0);
        assert_eq!(mm.reactive_volume(Side::Buy, 100.0, 0.34, &p, false), 0.0);
    }

    #[test]
    fn test_panic_on_price_drop_and_inflow() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        let prev = mm.prev_price().expect("test: seeded pool prices");
        assert!(mm.detect_panic(prev * 0.85, 0.0));
        assert!(!mm.detect_panic(prev * 0.95, 0.0));
        assert!(mm.detect_panic(prev, 300_001.0));
        assert!(!mm.detect_panic(prev, 299_000.0));
    }

    #[test]
    fn test_evaluate_sells_into_user_buying() {
        let mut p = pool();
        let mut mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        user_buys(&mut p, 600_000.0);
        let coin_before = p.coin_balance();
        let report = mm.evaluate(&mut p, 10, 1);
        let fill = report.reactive.expect("test: reactive sell");
        assert_eq!(fill.side, Side::Sell);
        assert!((fill.coin - 330_000.0).abs() < 1e-6);
        assert!((p.coin_balance() - (coin_before + 330_000.0)).abs() < 1e-6);
        assert!(report.proactive.is_none());
        assert_eq!(mm.prev_pool_coin(), p.coin_balance());
    }

    #[test]
    fn test_evaluate_calm_day_without_drift_does_nothing() {
        let mut p = pool();
        let mut mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        let report = mm.evaluate(&mut p, 10, 1);
        assert!(!report.skipped);
        assert!(report.reactive.is_none());
        // price 0.333 vs fair 0.30 is inside the 15% band
        assert!(report.proactive.is_none());
        assert_eq!(report.fair_value, Some(0.30));
    }

    #[test]
    fn test_proactive_buy_when_cheap() {
        let mut p = pool();
        let mut mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        // 100 accounts from 10 puts fair value at 1.30, far above 0.33
        let report = mm.evaluate(&mut p, 100, 1);
        let fill = report.proactive.expect("test: proactive buy");
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.fiat, 2_000.0);
        assert!((mm.holdings().fiat - 4_998_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_proactive_sell_when_rich() {
        let p = pool();
        let mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        assert_eq!(mm.proactive_trade(1.0, 0.30), Some((Side::Sell, 500.0)));
        // inside the band on either side
        assert_eq!(mm.proactive_trade(0.33, 0.30), None);
        assert_eq!(mm.proactive_trade(0.27, 0.30), None);
    }

    #[test]
    fn test_evaluate_proactive_sell_on_expensive_pool() {
        // price 10 against a fair value of 0.30
        let mut p = Pool::new(1_000_000.0, 10_000_000.0, 0.003);
        let mut mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        let report = mm.evaluate(&mut p, 10, 1);
        assert!(report.reactive.is_none());
        let fill = report.proactive.expect("test: proactive sell");
        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.coin, 500.0);
        assert_eq!(mm.holdings().coin, 50_000_000.0 - 500.0);
        assert_eq!(p.coin_balance(), 1_000_500.0);
    }

    #[test]
    fn test_proactive_sell_respects_coin_buffer() {
        let p = pool();
        let buffer = MarketMakerParams::default().min_coin_buffer;
        let short = mm_with(buffer + 499.0, 5_000_000.0, &p);
        assert_eq!(short.proactive_trade(1.0, 0.30), None);
        let exact = mm_with(buffer + 500.0, 5_000_000.0, &p);
        assert_eq!(exact.proactive_trade(1.0, 0.30), Some((Side::Sell, 500.0)));
    }

    #[test]
    fn test_proactive_buy_respects_fiat_buffer() {
        let p = pool();
        let buffer = MarketMakerParams::default().min_fiat_buffer;
        let short = mm_with(50_000_000.0, buffer + 1_999.0, &p);
        assert_eq!(short.proactive_trade(0.10, 1.30), None);
        let exact = mm_with(50_000_000.0, buffer + 2_000.0, &p);
        assert_eq!(exact.proactive_trade(0.10, 1.30), Some((Side::Buy, 2_000.0)));
    }

    #[test]
    fn test_degenerate_pool_skips_without_snapshot() {
        let mut p = Pool::new(0.0, 0.0, 0.003);
        let mut mm = mm_with(50_000_000.0, 5_000_000.0, &p);
        let report = mm.evaluate(&mut p, 10, 1);
        assert!(report.skipped);
        assert_eq!(mm.holdings(), Holdings::new(50_000_000.0, 5_000_000.0));
    }

    #[test]
    fn test_disabled_never_trades() {
        let mut p = pool();
        let params = MarketMakerParams { enabled: false, ..MarketMakerParams::default() };
        let mut mm = MarketMaker::new(params, Holdings::new(50_000_000.0, 5_000_000.0), 10, &p);
        user_buys(&mut p, 600_000.0);
        assert!(mm.evaluate(&mut p, 10, 1).skipped);
    }
}
