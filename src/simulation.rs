// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Simulation Core

use std::ops::RangeInclusive;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wasm_bindgen::prelude::*;

use crate::accounts::AccountRegistry;
use crate::clock::EconomicClock;
use crate::config::SimConfig;
use crate::conservation::{compute_conservation, ConservationLaw, SupplyBreakdown};
use crate::error::{Result, SimError};
use crate::history::PriceHistory;
use crate::market_maker::MarketMaker;
use crate::pool::{BuyQuote, FiatBuyQuote, FiatSellQuote, Pool, SellQuote};
use crate::stake::{Released, StakeLedger};
use crate::trading;
use crate::treasury::{ContestOutcome, Treasury};
use crate::types::*;

/// Window, in days, for the snapshot's rolling volatility.
const VOLATILITY_WINDOW: usize = 30;

// ─── EconomySimulation struct ───────────────────────────────────────────────

#[wasm_bindgen]
pub struct EconomySimulation {
    pub(crate) config: SimConfig,
    pub(crate) pool: Pool,
    pub(crate) accounts: AccountRegistry,
    pub(crate) stakes: StakeLedger,
    pub(crate) treasury: Treasury,
    pub(crate) market_maker: MarketMaker,
    pub(crate) clock: EconomicClock,
    pub(crate) history: PriceHistory,

    pub(crate) base_emission: f64,
    pub(crate) total_emission: f64,
    pub(crate) added_emission: f64,

    pub(crate) conservation_law: ConservationLaw,
    pub(crate) rng: Box<dyn RngCore>,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl EconomySimulation {
    /// Builds a simulation seeded from `config.seed`.
    pub fn from_config(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::build(config, Box::new(rng)))
    }

    /// Builds a simulation drawing randomness from `rng`.
    pub fn with_rng(config: SimConfig, rng: Box<dyn RngCore>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    /// Initial allocation. The market maker's coin comes off the total
    /// supply first, the pool is seeded from what remains and the rest is
    /// the unallocated supply that funds the operator's first node.
    pub(crate) fn build(config: SimConfig, rng: Box<dyn RngCore>) -> Self {
        let eco = &config.economy;
        let total = eco.total_coins;

        let mm_coin = config.market_maker.initial_coin.min(total);
        let mut remainder = total - mm_coin;
        let mut pool_coin = config.pool.seed_coin.min(remainder * 0.5);
        if pool_coin <= EPSILON {
            pool_coin = remainder.min(1.0);
        }
        remainder -= pool_coin;
        let pool = Pool::new(pool_coin, config.pool.seed_fiat, config.pool.fee_rate);

        let mut accounts = AccountRegistry::new(eco.initial_user_fiat, eco.max_accounts);
        for _ in 0..eco.initial_users {
            accounts.add();
        }

        let market_maker = MarketMaker::new(
            config.market_maker.clone(),
            Holdings::new(mm_coin, config.market_maker.initial_fiat),
            eco.initial_users,
            &pool,
        );
        let mut history = PriceHistory::new(config.history.capacity());
        history.record(pool.spot_price());

        let mut sim = Self {
            treasury: Treasury::new(remainder, eco.initial_treasury_fiat),
            clock: EconomicClock::new(eco.day_duration_secs, 0.0),
            stakes: StakeLedger::new(),
            base_emission: total,
            total_emission: total,
            added_emission: 0.0,
            conservation_law: ConservationLaw::default(),
            pool,
            accounts,
            market_maker,
            history,
            rng,
            config,
        };

        let stake = sim.config.economy.initial_node_stake;
        let commission = sim.config.economy.initial_node_commission;
        if stake > 0.0 {
            if let Err(e) = sim.open_stake(stake, commission, true) {
                log::warn!("initial node not opened: {e}");
            }
        }
        log::info!(
            "economy initialized: {:.0} COIN total, pool {:.0} COIN / {:.0} fiat, {:.0} unallocated",
            sim.total_emission,
            sim.pool.coin_balance(),
            sim.pool.fiat_balance(),
            sim.treasury.unallocated()
        );
        sim
    }
}

// ─── Internal Logic (Testable, pure Rust) ───────────────────────────────────

impl EconomySimulation {
    /// Processes the whole days due at `now_secs` (seconds since start).
    /// Returns one report per simulated day. A caller that fell behind
    /// catches up at most `economy.max_days_per_poll` days per call; the
    /// rest stay due for later polls.
    pub fn advance(&mut self, now_secs: f64) -> Vec<DayReport> {
        if self.conservation_law.is_tripped() {
            return Vec::new();
        }
        let due = self.clock.take_due_days(now_secs, self.config.economy.max_days_per_poll);
        if due > 1 {
            log::debug!("catching up {due} days");
        }
        let mut reports = Vec::new();
        for _ in 0..due {
            reports.push(self.step_day());
            if self.conservation_law.is_tripped() {
                break;
            }
        }
        reports
    }

    /// Simulates one day regardless of elapsed time: emission, site
    /// activity, synthetic trading, price recording, market maker.
    pub fn step_day(&mut self) -> DayReport {
        let day = self.clock.begin_day();

        let daily = self.base_emission * self.config.economy.yearly_reward_rate
            / self.config.economy.days_per_year;
        let emission = self.stakes.distribute(daily);
        self.total_emission += emission;
        self.added_emission += emission;

        let site = self.treasury.site_activity(
            &mut self.accounts,
            self.pool.spot_price(),
            &self.config.site,
            self.rng.as_mut(),
        );

        let trading_report = trading::simulate_trading_day(
            &mut self.pool,
            &mut self.accounts,
            &self.config.trading,
            self.rng.as_mut(),
        );
        self.history.record(self.pool.spot_price());
        let mm_report = self.market_maker.evaluate(&mut self.pool, self.accounts.len(), day);

        if let Err(e) = self.check_invariants() {
            log::error!("day {day}: {e}");
        }

        DayReport {
            day,
            emission,
            site,
            trading: trading_report,
            price: self.pool.spot_price(),
            market_maker: mm_report,
        }
    }

    // ─── Invariants ─────────────────────────────────────────────────────

    pub fn supply_breakdown(&self) -> SupplyBreakdown {
        SupplyBreakdown {
            unallocated: self.treasury.unallocated(),
            active_stake: self.stakes.total_active_stake(),
            accrued_rewards: self.stakes.total_accrued(),
            accounts: self.accounts.total_coin(),
            pool: self.pool.coin_balance(),
            market_maker: self.market_maker.holdings().coin,
        }
    }

    /// Verifies coin conservation. A violation trips the circuit breaker
    /// and every later mutating operation is refused.
    pub fn check_invariants(&mut self) -> Result<()> {
        let parts = self.supply_breakdown();
        let result = self.conservation_law.verify(self.total_emission, &parts);
        if result.balanced {
            Ok(())
        } else {
            Err(SimError::InvariantViolation(format!(
                "coin conservation off by {:.6} (circuit breaker {})",
                result.error,
                if result.circuit_breaker_tripped { "tripped" } else { "armed" }
            )))
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.conservation_law.is_tripped() {
            return Err(SimError::InvariantViolation(
                "simulation halted after a conservation failure".into(),
            ));
        }
        Ok(())
    }

    /// Runs a mutating operation behind the circuit breaker and verifies
    /// conservation after it succeeds.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.ensure_running()?;
        let value = op(self)?;
        self.check_invariants()?;
        Ok(value)
    }

    fn open_stake(&mut self, stake: f64, commission: f64, is_own: bool) -> Result<usize> {
        if stake.is_finite() && stake > self.treasury.unallocated() {
            return Err(SimError::insufficient(Asset::Coin, self.treasury.unallocated(), stake));
        }
        let index = self.stakes.open(stake, commission, self.config.economy.min_stake, is_own)?;
        self.treasury.reserve(stake)?;
        Ok(index)
    }

    // ─── Commands ───────────────────────────────────────────────────────

    pub fn add_account(&mut self) -> Result<u64> {
        self.guarded(|s| s.accounts.add_many(1).map(|ids| *ids.start()))
    }

    pub fn add_accounts(&mut self, count: usize) -> Result<RangeInclusive<u64>> {
        self.guarded(|s| s.accounts.add_many(count))
    }

    /// Opens a stake position funded from the unallocated supply.
    /// `commission` is a fraction in `[0, 1]`.
    pub fn add_stake(&mut self, stake: f64, commission: f64, is_own: bool) -> Result<usize> {
        self.guarded(|s| s.open_stake(stake, commission, is_own))
    }

    /// Stops the position at `index` (0-based) and returns its stake and
    /// accrued reward to the unallocated supply.
    pub fn stop_stake(&mut self, index: usize) -> Result<Released> {
        self.guarded(|s| {
            let released = s.stakes.stop(index)?;
            s.treasury.release(released.total());
            Ok(released)
        })
    }

    pub fn launch_contest(&mut self, reward: f64, winners: usize) -> Result<ContestOutcome> {
        self.guarded(|s| {
            s.treasury.launch_contest(&mut s.accounts, reward, winners, s.rng.as_mut())
        })
    }

    pub fn user_buy(&mut self, account: u64, coin_amount: f64) -> Result<BuyQuote> {
        self.guarded(|s| {
            let holdings = s.accounts.holdings_mut(account)?;
            s.pool.buy_coins(holdings, coin_amount)
        })
    }

    pub fn user_sell(&mut self, account: u64, coin_amount: f64) -> Result<SellQuote> {
        self.guarded(|s| {
            let holdings = s.accounts.holdings_mut(account)?;
            s.pool.sell_coins(holdings, coin_amount)
        })
    }

    /// Treasury buys coin with `fiat`; the coin joins the unallocated supply.
    pub fn system_buy(&mut self, fiat: f64) -> Result<FiatBuyQuote> {
        self.guarded(|s| s.treasury.buy(&mut s.pool, fiat))
    }

    /// Treasury sells unallocated coin for fiat.
    pub fn system_sell(&mut self, coin: f64) -> Result<FiatSellQuote> {
        self.guarded(|s| s.treasury.sell(&mut s.pool, coin))
    }

    // ─── Queries ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig { &self.config }
    pub fn pool(&self) -> &Pool { &self.pool }
    pub fn treasury(&self) -> &Treasury { &self.treasury }
    pub fn market_maker(&self) -> &MarketMaker { &self.market_maker }
    pub fn nodes(&self) -> &[StakePosition] { self.stakes.positions() }
    pub fn account_list(&self) -> &[Account] { self.accounts.as_slice() }
    pub fn account(&self, id: u64) -> Option<&Account> { self.accounts.get(id) }
    pub fn day(&self) -> u64 { self.clock.day() }
    pub fn spot_price(&self) -> Option<f64> { self.pool.spot_price() }
    pub fn total_emission(&self) -> f64 { self.total_emission }
    pub fn is_halted(&self) -> bool { self.conservation_law.is_tripped() }

    pub fn fair_value(&self) -> f64 {
        self.market_maker.fair_value(self.accounts.len())
    }

    pub fn conservation_error(&self) -> f64 {
        compute_conservation(self.total_emission, &self.supply_breakdown())
    }

    /// Quotes for the trade inputs: a user trade of `coin_amount`, a system
    /// buy spending `system_fiat` and a system sell of `system_coin`.
    pub fn quote_preview(&self, coin_amount: f64, system_fiat: f64, system_coin: f64) -> QuotePreview {
        let buy = self.pool.quote_buy_by_coin(coin_amount);
        let sell = self.pool.quote_sell_by_coin(coin_amount);
        QuotePreview {
            user_buy_cost: buy.map(|q| q.net_cost),
            user_buy_fee: buy.map(|q| q.fee),
            user_sell_proceeds: sell.map(|q| q.net_proceeds),
            user_sell_fee: sell.map(|q| q.fee),
            system_buy_coins: self.pool.quote_buy_by_fiat(system_fiat).map(|q| q.coins_received),
            system_sell_fiat: self.pool.quote_sell_for_fiat(system_coin).map(|q| q.fiat_received),
        }
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        let mm = self.market_maker.holdings();
        EconomySnapshot {
            day: self.clock.day(),
            spot_price: self.pool.spot_price(),
            pool_coin: self.pool.coin_balance(),
            pool_fiat: self.pool.fiat_balance(),
            pool_k: self.pool.invariant_k(),
            fee_rate: self.pool.fee_rate(),
            base_emission: self.base_emission,
            total_emission: self.total_emission,
            added_emission: self.added_emission,
            unallocated: self.treasury.unallocated(),
            treasury_fiat: self.treasury.fiat(),
            staked: self.stakes.total_active_stake(),
            own_stake: self.stakes.own_active_stake(),
            own_rewards: self.stakes.own_rewards(),
            total_rewards: self.stakes.total_accrued(),
            node_count: self.stakes.len(),
            account_count: self.accounts.len(),
            account_coin: self.accounts.total_coin(),
            account_fiat: self.accounts.total_fiat(),
            circulating_coin: self.total_emission - self.treasury.unallocated(),
            mm_coin: mm.coin,
            mm_fiat: mm.fiat,
            fair_value: self.fair_value(),
            volatility: self.history.volatility(VOLATILITY_WINDOW),
            conservation_error: self.conservation_error(),
            circuit_breaker_tripped: self.conservation_law.is_tripped(),
            price_history: self.history.snapshot(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> EconomySimulation {
        EconomySimulation::from_config(SimConfig::default()).expect("test: default config")
    }

    #[test]
    fn test_initial_allocation() {
        let s = sim();
        let snap = s.snapshot();
        assert_eq!(snap.mm_coin, 50_000_000.0);
        assert_eq!(snap.mm_fiat, 5_000_000.0);
        assert_eq!(snap.pool_coin, 30_000_000.0);
        assert_eq!(snap.pool_fiat, 10_000_000.0);
        assert_eq!(snap.treasury_fiat, 10_000_000.0);
        assert_eq!(snap.node_count, 1);
        assert_eq!(snap.own_stake, 100_000.0);
        assert_eq!(snap.account_count, 10);
        assert_eq!(snap.account_fiat, 200.0);
        assert_eq!(snap.unallocated, 5_000_000_000.0 - 50_000_000.0 - 30_000_000.0 - 100_000.0);
        assert_eq!(snap.price_history.len(), 1);
        assert!(snap.conservation_error < 1e-6);
        assert_eq!(s.market_maker().prev_price(), s.spot_price());
    }

    #[test]
    fn test_small_supply_caps_pool_seed() {
        let mut cfg = SimConfig::default();
        cfg.economy.total_coins = 50_000_100.0;
        cfg.economy.initial_node_stake = 0.0;
        let s = EconomySimulation::from_config(cfg).expect("test: valid config");
        assert_eq!(s.pool().coin_balance(), 50.0);
        assert!(s.conservation_error() < 1e-6);
    }

    #[test]
    fn test_step_day_pays_emission() {
        let mut s = sim();
        let report = s.step_day();
        let expected = 5_000_000_000.0 * 0.02 / 365.0;
        assert_eq!(report.day, 1);
        assert!((report.emission - expected).abs() < 1e-6);
        assert!((s.snapshot().added_emission - expected).abs() < 1e-6);
        assert!((s.snapshot().own_rewards - expected).abs() < 1e-6);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn test_advance_respects_day_duration() {
        let mut s = sim();
        assert!(s.advance(7.9).is_empty());
        assert_eq!(s.advance(8.0).len(), 1);
        assert_eq!(s.advance(40.0).len(), 4);
        assert_eq!(s.day(), 5);
        assert_eq!(s.snapshot().price_history.len(), 6);
    }

    #[test]
    fn test_huge_clock_jump_is_bounded() {
        let mut s = sim();
        let reports = s.advance(1.0e20);
        assert_eq!(reports.len(), 1_000);
        assert_eq!(s.day(), 1_000);
        assert!(s.check_invariants().is_ok());
        // the remainder stays due
        assert_eq!(s.advance(1.0e20).len(), 1_000);
        assert_eq!(s.day(), 2_000);
    }

    #[test]
    fn test_catch_up_spreads_over_polls() {
        let mut cfg = SimConfig::default();
        cfg.economy.max_days_per_poll = 3;
        let mut s = EconomySimulation::from_config(cfg).expect("test: valid config");
        let batches: Vec<usize> = (0..5).map(|_| s.advance(80.0).len()).collect();
        assert_eq!(batches, vec![3, 3, 3, 1, 0]);
        assert_eq!(s.day(), 10);
    }

    #[test]
    fn test_account_ceiling() {
        let mut cfg = SimConfig::default();
        cfg.economy.max_accounts = 12;
        let mut s = EconomySimulation::from_config(cfg).expect("test: valid config");
        assert_eq!(s.add_account().expect("test: room for one"), 11);
        let err = s.add_accounts(2).expect_err("test: only one slot left");
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(s.account_list().len(), 11);
        assert_eq!(s.add_account().expect("test: last slot"), 12);
        assert!(s.add_account().is_err());
    }

    #[test]
    fn test_no_emission_without_stake() {
        let mut s = sim();
        s.stop_stake(0).expect("test: own node stops");
        let before = s.total_emission();
        let report = s.step_day();
        assert_eq!(report.emission, 0.0);
        assert_eq!(s.total_emission(), before);
    }

    #[test]
    fn test_stop_stake_returns_funds() {
        let mut s = sim();
        s.step_day();
        let unallocated = s.treasury().unallocated();
        let released = s.stop_stake(0).expect("test: own node stops");
        assert_eq!(released.stake, 100_000.0);
        assert!(released.reward > 0.0);
        assert!((s.treasury().unallocated() - (unallocated + released.total())).abs() < 1e-6);
        assert!(s.stop_stake(0).is_err());
    }

    #[test]
    fn test_add_stake_validation() {
        let mut s = sim();
        assert!(s.add_stake(99_999.0, 0.05, true).is_err());
        assert!(s.add_stake(200_000.0, 1.2, true).is_err());
        assert!(s.add_stake(1.0e12, 0.05, true).is_err());
        assert_eq!(s.add_stake(200_000.0, 0.1, true).expect("test: valid node"), 1);
        assert_eq!(s.snapshot().own_stake, 300_000.0);
    }

    #[test]
    fn test_system_trades_move_unallocated() {
        let mut s = sim();
        let before = s.treasury().unallocated();
        let q = s.system_buy(10_000.0).expect("test: system buy settles");
        assert!((s.treasury().unallocated() - (before + q.coins_received)).abs() < 1e-6);
        s.system_sell(1_000.0).expect("test: system sell settles");
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn test_broken_conservation_halts() {
        let mut s = sim();
        s.total_emission += 1_000.0;
        assert!(s.check_invariants().is_err());
        assert!(s.is_halted());
        let err = s.add_account().expect_err("test: halted");
        assert_eq!(err.kind(), crate::error::ErrorKind::InvariantViolation);
        assert!(s.advance(1_000.0).is_empty());
    }

    #[test]
    fn test_quote_preview_unavailable_values() {
        let s = sim();
        let q = s.quote_preview(0.0, 100.0, -1.0);
        assert!(q.user_buy_cost.is_none());
        assert!(q.user_sell_proceeds.is_none());
        assert!(q.system_buy_coins.is_some());
        assert!(q.system_sell_fiat.is_none());
    }
}
