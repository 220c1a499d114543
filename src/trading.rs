// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Synthetic Trading

//! Daily synthetic user trading against the pool.
//!
//! A share of accounts wakes up each day and places a few random trades.
//! Buys that the account cannot afford fall back to spending most of its
//! fiat; sells are capped at a share of its coin. Trades that would fail
//! are skipped silently: a synthetic user simply does nothing that turn.

use rand::seq::index;
use rand::{Rng, RngCore};

use crate::accounts::AccountRegistry;
use crate::config::TradingConfig;
use crate::pool::Pool;
use crate::types::{Holdings, TradingReport};

/// Coin amount a buyer with `fiat` ends up purchasing when it wanted
/// `wanted`, or `None` if it cannot afford even the minimum trade.
fn affordable_buy(pool: &Pool, fiat: f64, wanted: f64, cfg: &TradingConfig) -> Option<f64> {
    if let Some(q) = pool.quote_buy_by_coin(wanted) {
        if q.net_cost <= fiat {
            return Some(wanted);
        }
    }
    let floor = pool.quote_buy_by_coin(cfg.min_trade_coins)?;
    if floor.net_cost > fiat {
        return None;
    }
    let spend = fiat * cfg.fallback_spend_fraction;
    if spend < cfg.min_fiat_to_buy {
        return None;
    }
    let by_fiat = pool.quote_buy_by_fiat(spend)?;
    (by_fiat.coins_received >= cfg.min_trade_coins).then_some(by_fiat.coins_received)
}

/// Sell size for a holder of `coin` that wanted to sell `wanted`.
fn capped_sell(coin: f64, wanted: f64, cfg: &TradingConfig) -> Option<f64> {
    let amount = wanted.min(coin * cfg.max_sell_fraction).min(coin);
    (amount >= cfg.min_trade_coins).then_some(amount)
}

fn try_buy(pool: &mut Pool, h: &mut Holdings, wanted: f64, cfg: &TradingConfig) -> Option<f64> {
    if h.fiat <= cfg.min_fiat_to_buy {
        return None;
    }
    let amount = affordable_buy(pool, h.fiat, wanted, cfg)?;
    pool.buy_coins(h, amount).ok().map(|q| q.coin_amount)
}

fn try_sell(pool: &mut Pool, h: &mut Holdings, wanted: f64, cfg: &TradingConfig) -> Option<f64> {
    if h.coin <= 0.0 {
        return None;
    }
    let amount = capped_sell(h.coin, wanted, cfg)?;
    pool.sell_coins(h, amount).ok().map(|q| q.coin_amount)
}

/// Runs one day of synthetic trading.
pub fn simulate_trading_day(
    pool: &mut Pool,
    accounts: &mut AccountRegistry,
    cfg: &TradingConfig,
    rng: &mut dyn RngCore,
) -> TradingReport {
    let mut report = TradingReport::default();
    if accounts.is_empty() || pool.is_degenerate() {
        return report;
    }
    let n = accounts.len();
    let active = ((n as f64 * cfg.active_user_fraction) as usize).clamp(1, n);
    report.active_accounts = active;

    for idx in index::sample(rng, n, active).into_vec() {
        for _ in 0..cfg.trades_per_active_user {
            let buy = rng.gen_bool(0.5);
            let wanted = rng.gen_range(cfg.min_trade_coins..=cfg.max_trade_coins);
            let Some(h) = accounts.holdings_at_mut(idx) else { continue };
            if buy {
                if let Some(coin) = try_buy(pool, h, wanted, cfg) {
                    report.buys += 1;
                    report.coin_bought += coin;
                }
            } else if let Some(coin) = try_sell(pool, h, wanted, cfg) {
                report.sells += 1;
                report.coin_sold += coin;
            }
        }
    }
    log::debug!(
        "trading: {} active, {} buys ({:.2} COIN), {} sells ({:.2} COIN)",
        report.active_accounts, report.buys, report.coin_bought, report.sells, report.coin_sold
    );
    report
}
