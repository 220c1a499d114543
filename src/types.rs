// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};

/// Tolerance for zero / near-zero comparisons across the engine.
pub const EPSILON: f64 = 1e-9;

/// Returns `true` for finite, non-negative values.
pub fn is_sane(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

// ─── Asset ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Asset {
    Coin = 0,
    Fiat = 1,
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coin => write!(f, "COIN"),
            Self::Fiat => write!(f, "fiat"),
        }
    }
}

// ─── Side ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

// ─── Holdings ───────────────────────────────────────────────────────────────

/// A coin/fiat balance pair. Every actor that trades against the pool
/// (accounts, the market maker, the treasury) settles through one of these.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Holdings {
    pub coin: f64,
    pub fiat: f64,
}

impl Holdings {
    pub fn new(coin: f64, fiat: f64) -> Self {
        Self { coin, fiat }
    }
}

// ─── Account ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub holdings: Holdings,
}

// ─── StakePosition ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePosition {
    pub initial_stake: f64,
    pub current_stake: f64,
    /// Operator commission as a fraction in [0, 1].
    pub commission: f64,
    pub accrued_reward: f64,
    pub active: bool,
    /// Operator-controlled stake (counts toward "our" stake and rewards).
    pub is_own: bool,
}

// ─── Reports ────────────────────────────────────────────────────────────────

/// One executed pool trade by a system actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TradeFill {
    pub side: Side,
    pub coin: f64,
    pub fiat: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketMakerReport {
    pub skipped: bool,
    pub panic: bool,
    pub flow_coin: f64,
    pub reactive: Option<TradeFill>,
    pub proactive: Option<TradeFill>,
    pub fair_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteActivityReport {
    pub visitors: usize,
    pub fiat_revenue: f64,
    pub coins_distributed: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradingReport {
    pub active_accounts: usize,
    pub buys: u32,
    pub sells: u32,
    pub coin_bought: f64,
    pub coin_sold: f64,
}

/// Everything that happened during one simulated day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayReport {
    pub day: u64,
    pub emission: f64,
    pub site: SiteActivityReport,
    pub trading: TradingReport,
    pub price: Option<f64>,
    pub market_maker: MarketMakerReport,
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// Read-only view of the simulation for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub day: u64,
    pub spot_price: Option<f64>,
    pub pool_coin: f64,
    pub pool_fiat: f64,
    pub pool_k: f64,
    pub fee_rate: f64,
    pub base_emission: f64,
    pub total_emission: f64,
    pub added_emission: f64,
    pub unallocated: f64,
    pub treasury_fiat: f64,
    pub staked: f64,
    pub own_stake: f64,
    pub own_rewards: f64,
    pub total_rewards: f64,
    pub node_count: usize,
    pub account_count: usize,
    pub account_coin: f64,
    pub account_fiat: f64,
    pub circulating_coin: f64,
    pub mm_coin: f64,
    pub mm_fiat: f64,
    pub fair_value: f64,
    pub volatility: f64,
    pub conservation_error: f64,
    pub circuit_breaker_tripped: bool,
    pub price_history: Vec<Option<f64>>,
}

// ─── Quote previews ─────────────────────────────────────────────────────────

/// Pre-trade quotes shown next to the trade inputs. `None` = unavailable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotePreview {
    pub user_buy_cost: Option<f64>,
    pub user_buy_fee: Option<f64>,
    pub user_sell_proceeds: Option<f64>,
    pub user_sell_fee: Option<f64>,
    pub system_buy_coins: Option<f64>,
    pub system_sell_fiat: Option<f64>,
}
