// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::market_maker::MarketMakerParams;

// ─── SimConfig ──────────────────────────────────────────────────────────────

/// Complete run configuration. Every section defaults independently, so a
/// JSON document only needs the fields it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub economy: EconomyConfig,
    pub pool: PoolConfig,
    pub trading: TradingConfig,
    pub site: SiteConfig,
    pub market_maker: MarketMakerParams,
    pub history: HistoryConfig,
    pub seed: u64,
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: SimConfig = serde_json::from_str(json)
            .map_err(|e| SimError::validation(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let e = &self.economy;
        non_negative("economy.total_coins", e.total_coins)?;
        fraction("economy.yearly_reward_rate", e.yearly_reward_rate)?;
        positive("economy.days_per_year", e.days_per_year)?;
        positive("economy.min_stake", e.min_stake)?;
        positive("economy.day_duration_secs", e.day_duration_secs)?;
        non_negative("economy.initial_user_fiat", e.initial_user_fiat)?;
        non_negative("economy.initial_treasury_fiat", e.initial_treasury_fiat)?;
        non_negative("economy.initial_node_stake", e.initial_node_stake)?;
        fraction("economy.initial_node_commission", e.initial_node_commission)?;
        if e.max_days_per_poll == 0 {
            return Err(SimError::validation("economy.max_days_per_poll must be > 0"));
        }
        if e.initial_users > e.max_accounts {
            return Err(SimError::validation("economy.initial_users exceeds economy.max_accounts"));
        }

        non_negative("pool.seed_coin", self.pool.seed_coin)?;
        non_negative("pool.seed_fiat", self.pool.seed_fiat)?;
        if !(self.pool.fee_rate.is_finite() && (0.0..1.0).contains(&self.pool.fee_rate)) {
            return Err(SimError::validation("pool.fee_rate must be in [0, 1)"));
        }

        let t = &self.trading;
        fraction("trading.active_user_fraction", t.active_user_fraction)?;
        positive("trading.min_trade_coins", t.min_trade_coins)?;
        positive("trading.max_trade_coins", t.max_trade_coins)?;
        if t.min_trade_coins > t.max_trade_coins {
            return Err(SimError::validation(
                "trading.min_trade_coins exceeds trading.max_trade_coins",
            ));
        }
        fraction("trading.max_sell_fraction", t.max_sell_fraction)?;
        fraction("trading.fallback_spend_fraction", t.fallback_spend_fraction)?;
        non_negative("trading.min_fiat_to_buy", t.min_fiat_to_buy)?;

        fraction("site.traffic_user_fraction", self.site.traffic_user_fraction)?;
        non_negative("site.revenue_per_visit", self.site.revenue_per_visit)?;
        match self.site.reward_mode {
            SiteRewardMode::RevenueShare { fraction: f } => fraction("site.reward_mode.fraction", f)?,
            SiteRewardMode::FixedPerUser { coins } => non_negative("site.reward_mode.coins", coins)?,
        }

        self.market_maker.validate()?;

        if self.history.display_window == 0 {
            return Err(SimError::validation("history.display_window must be > 0"));
        }
        Ok(())
    }
}

fn non_negative(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SimError::validation(format!("{name} must be finite and >= 0")))
    }
}

fn positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(SimError::validation(format!("{name} must be finite and > 0")))
    }
}

pub(crate) fn fraction(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(SimError::validation(format!("{name} must be in [0, 1]")))
    }
}

// ─── Sections ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub total_coins: f64,
    pub yearly_reward_rate: f64,
    pub days_per_year: f64,
    pub min_stake: f64,
    pub day_duration_secs: f64,
    pub initial_users: usize,
    pub initial_user_fiat: f64,
    pub initial_treasury_fiat: f64,
    pub initial_node_stake: f64,
    pub initial_node_commission: f64,
    /// Most days one clock poll may simulate; later polls run the rest.
    pub max_days_per_poll: u64,
    /// Ceiling on the account registry.
    pub max_accounts: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            total_coins: 5_000_000_000.0,
            yearly_reward_rate: 0.02,
            days_per_year: 365.0,
            min_stake: 100_000.0,
            day_duration_secs: 8.0,
            initial_users: 10,
            initial_user_fiat: 20.0,
            initial_treasury_fiat: 10_000_000.0,
            initial_node_stake: 100_000.0,
            initial_node_commission: 0.05,
            max_days_per_poll: 1_000,
            max_accounts: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Requested coin side; capped at half of the remainder left after the
    /// market maker allocation.
    pub seed_coin: f64,
    pub seed_fiat: f64,
    pub fee_rate: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            seed_coin: 30_000_000.0,
            seed_fiat: 10_000_000.0,
            fee_rate: 0.003,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub active_user_fraction: f64,
    pub trades_per_active_user: u32,
    pub min_trade_coins: f64,
    pub max_trade_coins: f64,
    /// Largest share of its coin holdings an account sells in one trade.
    pub max_sell_fraction: f64,
    /// Share of fiat an account commits when it can't afford its first pick.
    pub fallback_spend_fraction: f64,
    pub min_fiat_to_buy: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            active_user_fraction: 0.30,
            trades_per_active_user: 2,
            min_trade_coins: 10.0,
            max_trade_coins: 1_000_000.0,
            max_sell_fraction: 0.60,
            fallback_spend_fraction: 0.98,
            min_fiat_to_buy: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum SiteRewardMode {
    /// Convert `fraction` of the day's fiat revenue to coin at spot price.
    RevenueShare { fraction: f64 },
    /// Pay a fixed coin amount to every visitor.
    FixedPerUser { coins: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub traffic_user_fraction: f64,
    pub revenue_per_visit: f64,
    pub reward_mode: SiteRewardMode,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            traffic_user_fraction: 0.30,
            revenue_per_visit: 0.02,
            reward_mode: SiteRewardMode::RevenueShare { fraction: 0.80 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub display_window: usize,
    pub margin: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { display_window: 365, margin: 50 }
    }
}

impl HistoryConfig {
    pub fn capacity(&self) -> usize {
        self.display_window + self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = SimConfig::from_json(r#"{ "pool": { "fee_rate": 0.0 }, "seed": 7 }"#)
            .expect("test: partial config should parse");
        assert_eq!(cfg.pool.fee_rate, 0.0);
        assert_eq!(cfg.pool.seed_coin, 30_000_000.0);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.economy.initial_users, 10);
        assert_eq!(cfg.history.capacity(), 415);
    }

    #[test]
    fn fixed_reward_mode_parses() {
        let cfg = SimConfig::from_json(
            r#"{ "site": { "reward_mode": { "FixedPerUser": { "coins": 5.0 } } } }"#,
        )
        .expect("test: reward mode should parse");
        assert_eq!(cfg.site.reward_mode, SiteRewardMode::FixedPerUser { coins: 5.0 });
    }

    #[test]
    fn rejects_bad_fee() {
        let err = SimConfig::from_json(r#"{ "pool": { "fee_rate": 1.0 } }"#)
            .expect_err("test: fee of 100% must be rejected");
        assert!(err.to_string().contains("pool.fee_rate"));
    }

    #[test]
    fn rejects_inverted_trade_range() {
        let mut cfg = SimConfig::default();
        cfg.trading.min_trade_coins = 500.0;
        cfg.trading.max_trade_coins = 10.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_budget_and_oversized_population() {
        let mut cfg = SimConfig::default();
        cfg.economy.max_days_per_poll = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.economy.max_accounts = 5;
        let err = cfg.validate().expect_err("test: 10 initial users over a cap of 5");
        assert!(err.to_string().contains("max_accounts"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(SimConfig::from_json("{ not json").is_err());
    }
}
