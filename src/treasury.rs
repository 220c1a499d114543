// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Treasury

//! Unallocated coin supply ("remainder") and treasury fiat.
//!
//! Every coin that is not staked, held by an account, sitting in the pool or
//! held by the market maker lives here. Site rewards and contests pay out of
//! it, node stakes are funded from it and stopped nodes return to it.

use rand::seq::index;
use rand::RngCore;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountRegistry;
use crate::adapter::{from_decimal, to_decimal};
use crate::config::{SiteConfig, SiteRewardMode};
use crate::error::{Result, SimError};
use crate::pool::{FiatBuyQuote, FiatSellQuote, Pool};
use crate::types::{is_sane, Asset, Holdings, SiteActivityReport, EPSILON};

/// Shares of the reward for the top-ranked contest winners.
const CONTEST_TIERS: [Decimal; 3] = [dec!(0.30), dec!(0.20), dec!(0.15)];
/// Payout precision; tier and even-split amounts are floored to this.
const PAYOUT_DP: u32 = 2;

/// Splits `total` across `winners` ranked places. The tiers cover the top
/// places as long as at least one place is left after them; the rest of the
/// reward is split evenly and the last place absorbs rounding, so the
/// payouts always sum to `total` exactly.
pub fn contest_payouts(total: Decimal, winners: usize) -> Vec<Decimal> {
    if winners == 0 || total <= Decimal::ZERO {
        return Vec::new();
    }
    let tiered = CONTEST_TIERS.len().min(winners - 1);
    let mut payouts: Vec<Decimal> = CONTEST_TIERS[..tiered]
        .iter()
        .map(|share| (total * *share).round_dp_with_strategy(PAYOUT_DP, RoundingStrategy::ToZero))
        .collect();

    let rest = total - payouts.iter().copied().sum::<Decimal>();
    let even_places = winners - tiered;
    let share = (rest / Decimal::from(even_places))
        .round_dp_with_strategy(PAYOUT_DP, RoundingStrategy::ToZero);
    payouts.extend(std::iter::repeat(share).take(even_places - 1));
    payouts.push(rest - share * Decimal::from(even_places - 1));
    payouts
}

/// Result of a contest: the winners' account ids in rank order with what
/// each received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestOutcome {
    pub reward: f64,
    pub payouts: Vec<(u64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasury {
    /// `coin` is the unallocated supply, `fiat` the treasury's fiat.
    holdings: Holdings,
}

impl Treasury {
    pub fn new(unallocated: f64, fiat: f64) -> Self {
        Self { holdings: Holdings::new(unallocated, fiat) }
    }

    pub fn unallocated(&self) -> f64 { self.holdings.coin }
    pub fn fiat(&self) -> f64 { self.holdings.fiat }
    pub fn holdings(&self) -> Holdings { self.holdings }

    /// Takes `coin` out of the unallocated supply.
    pub fn reserve(&mut self, coin: f64) -> Result<()> {
        if !is_sane(coin) {
            return Err(SimError::validation("coin amount must be finite and >= 0"));
        }
        if coin > self.holdings.coin {
            return Err(SimError::insufficient(Asset::Coin, self.holdings.coin, coin));
        }
        self.holdings.coin -= coin;
        Ok(())
    }

    /// Returns `coin` to the unallocated supply.
    pub fn release(&mut self, coin: f64) {
        if is_sane(coin) {
            self.holdings.coin += coin;
        }
    }

    // ─── Site activity ──────────────────────────────────────────────────

    /// A share of accounts visit the site: the treasury collects the visit
    /// revenue and pays the visitors a coin reward from the unallocated
    /// supply. The reward is skipped, not partially paid, if the supply
    /// cannot cover it.
    pub fn site_activity(
        &mut self,
        accounts: &mut AccountRegistry,
        price: Option<f64>,
        cfg: &SiteConfig,
        rng: &mut dyn RngCore,
    ) -> SiteActivityReport {
        let mut report = SiteActivityReport::default();
        let visitors = (accounts.len() as f64 * cfg.traffic_user_fraction) as usize;
        if visitors == 0 {
            return report;
        }
        let picked = index::sample(rng, accounts.len(), visitors);

        report.visitors = visitors;
        report.fiat_revenue = visitors as f64 * cfg.revenue_per_visit;
        self.holdings.fiat += report.fiat_revenue;

        let coins = match cfg.reward_mode {
            SiteRewardMode::RevenueShare { fraction } => match price.filter(|p| *p > EPSILON) {
                Some(p) => report.fiat_revenue * fraction / p,
                None => 0.0,
            },
            SiteRewardMode::FixedPerUser { coins } => visitors as f64 * coins,
        };
        if !(coins.is_finite() && coins > EPSILON) {
            return report;
        }
        if coins > self.holdings.coin {
            log::debug!("site reward of {coins:.2} skipped: unallocated supply too low");
            return report;
        }

        let per_visitor = coins / visitors as f64;
        for idx in picked.iter() {
            if let Some(h) = accounts.holdings_at_mut(idx) {
                h.coin += per_visitor;
            }
        }
        self.holdings.coin -= coins;
        report.coins_distributed = coins;
        report
    }

    // ─── Contest ────────────────────────────────────────────────────────

    /// Pays `reward` from the unallocated supply to up to `winners` random
    /// accounts on the tiered schedule of [`contest_payouts`].
    pub fn launch_contest(
        &mut self,
        accounts: &mut AccountRegistry,
        reward: f64,
        winners: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ContestOutcome> {
        if !(reward.is_finite() && reward > 0.0) {
            return Err(SimError::validation("contest reward must be > 0"));
        }
        if winners == 0 {
            return Err(SimError::validation("winner count must be > 0"));
        }
        if accounts.is_empty() {
            return Err(SimError::validation("no users for contest"));
        }
        if reward > self.holdings.coin {
            return Err(SimError::insufficient(Asset::Coin, self.holdings.coin, reward));
        }
        let winners = winners.min(accounts.len());
        let amounts = contest_payouts(to_decimal(reward), winners);

        self.holdings.coin -= reward;
        let picked = index::sample(rng, accounts.len(), winners);
        let mut payouts = Vec::with_capacity(winners);
        for (idx, amount) in picked.iter().zip(amounts) {
            let amount = from_decimal(amount);
            if let Some(h) = accounts.holdings_at_mut(idx) {
                h.coin += amount;
            }
            payouts.push((idx as u64 + 1, amount));
        }
        log::info!("contest paid {reward:.2} COIN to {winners} winner(s)");
        Ok(ContestOutcome { reward, payouts })
    }

    // ─── Manual trades ──────────────────────────────────────────────────

    /// Spends treasury fiat on coin; the coin lands in the unallocated supply.
    pub fn buy(&mut self, pool: &mut Pool, fiat: f64) -> Result<FiatBuyQuote> {
        pool.system_buy(&mut self.holdings, fiat)
    }

    /// Sells unallocated coin for treasury fiat.
    pub fn sell(&mut self, pool: &mut Pool, coin: f64) -> Result<FiatSellQuote> {
        pool.system_sell(&mut self.holdings, coin)
    }
}
