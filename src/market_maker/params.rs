// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Market Maker Parameters

//! Tuning surface of the market maker: reaction sizing, price-tier
//! modifiers, risk limits, panic detection and fair-value nudging.

use serde::{Deserialize, Serialize};

use crate::config::fraction;
use crate::error::{Result, SimError};
use crate::types::Side;

// ---------------------------------------------------------------------------
// SideModifiers
// ---------------------------------------------------------------------------

/// Volume multipliers for each reactive side within one price tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SideModifiers {
    pub sell: f64,
    pub buy: f64,
}

impl SideModifiers {
    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Sell => self.sell,
            Side::Buy => self.buy,
        }
    }
}

// ---------------------------------------------------------------------------
// MarketMakerParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakerParams {
    pub enabled: bool,
    /// Coin taken from total supply for the market maker at start.
    pub initial_coin: f64,
    /// Fiat float handed to the market maker at start.
    pub initial_fiat: f64,

    /// Share of the day's pool coin flow the market maker offsets.
    pub reaction_fraction: f64,
    /// Price separating the "cheap" and "expensive" modifier tiers.
    pub price_target: f64,
    pub below_target: SideModifiers,
    pub at_or_above_target: SideModifiers,

    /// Cap on one trade as a share of the pool side it draws on.
    pub pool_impact_fraction: f64,
    /// Cap on one trade as a share of the market maker's own balance.
    pub max_balance_usage: f64,
    /// Balance-usage cap for buys while a panic is flagged.
    pub panic_balance_usage: f64,
    pub min_coin_buffer: f64,
    pub min_fiat_buffer: f64,
    pub min_trade_coin: f64,
    pub min_trade_fiat: f64,

    /// Pool coin flow at or below this is ignored.
    pub action_epsilon: f64,
    /// Flow below `action_epsilon * calm_flow_multiplier` counts as calm.
    pub calm_flow_multiplier: f64,

    /// Day-over-day price drop (fraction) that flags a panic.
    pub panic_price_drop: f64,
    /// Coin inflow, as a share of yesterday's pool coin, that flags a panic.
    pub panic_inflow_ratio: f64,

    pub fair_value_base: f64,
    pub fair_value_scaling: f64,
    pub fair_value_deviation: f64,
    pub proactive_buy_fiat: f64,
    pub proactive_sell_coin: f64,
}

impl Default for MarketMakerParams {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_coin: 50_000_000.0,
            initial_fiat: 5_000_000.0,
            reaction_fraction: 0.50,
            price_target: 2.0,
            below_target: SideModifiers { sell: 1.1, buy: 0.9 },
            at_or_above_target: SideModifiers { sell: 0.8, buy: 1.2 },
            pool_impact_fraction: 0.4,
            max_balance_usage: 0.40,
            panic_balance_usage: 0.60,
            min_coin_buffer: 100_000.0,
            min_fiat_buffer: 10_000.0,
            min_trade_coin: 100.0,
            min_trade_fiat: 50.0,
            action_epsilon: 1.0,
            calm_flow_multiplier: 10.0,
            panic_price_drop: 0.10,
            panic_inflow_ratio: 0.01,
            fair_value_base: 0.30,
            fair_value_scaling: 1.0,
            fair_value_deviation: 0.15,
            proactive_buy_fiat: 2_000.0,
            proactive_sell_coin: 500.0,
        }
    }
}

impl MarketMakerParams {
    /// Modifier for `side` given where `price` sits against the target.
    pub fn price_modifier(&self, side: Side, price: f64) -> f64 {
        if price < self.price_target {
            self.below_target.for_side(side)
        } else {
            self.at_or_above_target.for_side(side)
        }
    }

    pub fn calm_flow_threshold(&self) -> f64 {
        self.action_epsilon * self.calm_flow_multiplier
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("market_maker.initial_coin", self.initial_coin),
            ("market_maker.initial_fiat", self.initial_fiat),
            ("market_maker.price_target", self.price_target),
            ("market_maker.below_target.sell", self.below_target.sell),
            ("market_maker.below_target.buy", self.below_target.buy),
            ("market_maker.at_or_above_target.sell", self.at_or_above_target.sell),
            ("market_maker.at_or_above_target.buy", self.at_or_above_target.buy),
            ("market_maker.min_coin_buffer", self.min_coin_buffer),
            ("market_maker.min_fiat_buffer", self.min_fiat_buffer),
            ("market_maker.min_trade_coin", self.min_trade_coin),
            ("market_maker.min_trade_fiat", self.min_trade_fiat),
            ("market_maker.action_epsilon", self.action_epsilon),
            ("market_maker.calm_flow_multiplier", self.calm_flow_multiplier),
            ("market_maker.fair_value_scaling", self.fair_value_scaling),
            ("market_maker.proactive_buy_fiat", self.proactive_buy_fiat),
            ("market_maker.proactive_sell_coin", self.proactive_sell_coin),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SimError::validation(format!("{name} must be finite and >= 0")));
            }
        }
        fraction("market_maker.reaction_fraction", self.reaction_fraction)?;
        fraction("market_maker.pool_impact_fraction", self.pool_impact_fraction)?;
        fraction("market_maker.max_balance_usage", self.max_balance_usage)?;
        fraction("market_maker.panic_balance_usage", self.panic_balance_usage)?;
        fraction("market_maker.panic_price_drop", self.panic_price_drop)?;
        fraction("market_maker.panic_inflow_ratio", self.panic_inflow_ratio)?;
        fraction("market_maker.fair_value_deviation", self.fair_value_deviation)?;
        if self.panic_balance_usage < self.max_balance_usage {
            return Err(SimError::validation(
                "market_maker.panic_balance_usage must not be below max_balance_usage",
            ));
        }
        if !(self.fair_value_base.is_finite() && self.fair_value_base > 0.0) {
            return Err(SimError::validation("market_maker.fair_value_base must be > 0"));
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(MarketMakerParams::default().validate().is_ok());
    }

    #[test]
    fn price_tier_lookup() {
        let p = MarketMakerParams::default();
        assert_eq!(p.price_modifier(Side::Sell, 0.5), 1.1);
        assert_eq!(p.price_modifier(Side::Buy, 0.5), 0.9);
        assert_eq!(p.price_modifier(Side::Sell, 2.0), 0.8);
        assert_eq!(p.price_modifier(Side::Buy, 3.0), 1.2);
    }

    #[test]
    fn calm_threshold_scales_epsilon() {
        let p = MarketMakerParams { action_epsilon: 2.0, ..MarketMakerParams::default() };
        assert_eq!(p.calm_flow_threshold(), 20.0);
    }

    #[test]
    fn panic_usage_must_not_shrink_budget() {
        let p = MarketMakerParams {
            max_balance_usage: 0.4,
            panic_balance_usage: 0.3,
            ..MarketMakerParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        let p = MarketMakerParams { reaction_fraction: 1.5, ..MarketMakerParams::default() };
        assert!(p.validate().is_err());
        let p = MarketMakerParams { min_coin_buffer: f64::NAN, ..MarketMakerParams::default() };
        assert!(p.validate().is_err());
    }
}
