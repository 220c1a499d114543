// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Constant-Product Pool

//! Constant-product (`x * y = k`) exchange between COIN and fiat.
//!
//! Quotes are pure and return `None` whenever the pool cannot price the
//! trade: non-positive or non-finite input, a degenerate pool (`k == 0`),
//! a trade that would drain the opposing side, or a NaN/Inf/non-positive
//! result. Settlements re-quote, re-check the actor's balance and only then
//! mutate, so a failed settlement never leaves partial state behind.
//!
//! Two settlement pairs exist:
//!
//! * user-facing, sized in coin: the buyer pays `gross + fee`, the seller
//!   receives `gross - fee`;
//! * system-facing (treasury, market maker): buys are sized in fiat with the
//!   fee taken off the input, sells are sized in coin with the fee taken off
//!   the output.
//!
//! In every case the fee stays in the pool, so `k` never shrinks.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::types::{is_sane, Asset, Holdings, EPSILON};

// ─── Quotes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BuyQuote {
    pub coin_amount: f64,
    pub gross_cost: f64,
    pub fee: f64,
    /// Paid by the buyer.
    pub net_cost: f64,
    pub effective_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SellQuote {
    pub coin_amount: f64,
    pub gross_proceeds: f64,
    pub fee: f64,
    /// Paid to the seller.
    pub net_proceeds: f64,
    pub effective_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FiatBuyQuote {
    pub fiat_spent: f64,
    pub fee: f64,
    pub coins_received: f64,
    pub effective_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FiatSellQuote {
    pub coins_sold: f64,
    pub gross_proceeds: f64,
    pub fee: f64,
    pub fiat_received: f64,
    pub effective_price: f64,
}

fn valid_input(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn valid_output(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

// ─── Pool ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    coin: f64,
    fiat: f64,
    fee_rate: f64,
}

impl Pool {
    pub fn new(coin: f64, fiat: f64, fee_rate: f64) -> Self {
        let pool = Self {
            coin: if is_sane(coin) { coin } else { 0.0 },
            fiat: if is_sane(fiat) { fiat } else { 0.0 },
            fee_rate: if fee_rate.is_finite() { fee_rate.clamp(0.0, 1.0 - EPSILON) } else { 0.0 },
        };
        if pool.invariant_k() == 0.0 {
            log::warn!(
                "pool seeded with near-zero liquidity (coin {}, fiat {}); quotes unavailable",
                pool.coin, pool.fiat
            );
        }
        pool
    }

    pub fn coin_balance(&self) -> f64 { self.coin }
    pub fn fiat_balance(&self) -> f64 { self.fiat }
    pub fn fee_rate(&self) -> f64 { self.fee_rate }

    /// `coin * fiat`, or zero when either side is at or below epsilon.
    pub fn invariant_k(&self) -> f64 {
        if self.coin <= EPSILON || self.fiat <= EPSILON {
            return 0.0;
        }
        let k = self.coin * self.fiat;
        if k.is_finite() { k } else { 0.0 }
    }

    pub fn is_degenerate(&self) -> bool {
        self.invariant_k() == 0.0
    }

    /// Fiat per coin.
    pub fn spot_price(&self) -> Option<f64> {
        if self.is_degenerate() || self.coin.abs() < EPSILON {
            return None;
        }
        let price = self.fiat / self.coin;
        is_sane(price).then_some(price)
    }

    // ── quotes ──────────────────────────────────────────────────────────

    /// Cost of taking `coin_amount` out of the pool.
    pub fn quote_buy_by_coin(&self, coin_amount: f64) -> Option<BuyQuote> {
        let k = self.invariant_k();
        if !valid_input(coin_amount) || k == 0.0 {
            return None;
        }
        if coin_amount >= self.coin - EPSILON {
            return None;
        }
        let target_coin = self.coin - coin_amount;
        if target_coin <= EPSILON {
            return None;
        }
        let target_fiat = k / target_coin;
        let gross_cost = target_fiat - self.fiat;
        let fee = gross_cost * self.fee_rate;
        let net_cost = gross_cost + fee;
        if !valid_output(net_cost) || !valid_output(gross_cost) {
            return None;
        }
        Some(BuyQuote {
            coin_amount,
            gross_cost,
            fee,
            net_cost,
            effective_price: net_cost / coin_amount,
        })
    }

    /// Proceeds of putting `coin_amount` into the pool.
    pub fn quote_sell_by_coin(&self, coin_amount: f64) -> Option<SellQuote> {
        let k = self.invariant_k();
        if !valid_input(coin_amount) || k == 0.0 {
            return None;
        }
        let target_coin = self.coin + coin_amount;
        if target_coin <= EPSILON {
            return None;
        }
        let mut target_fiat = k / target_coin;
        if target_fiat < EPSILON {
            target_fiat = 0.0;
        }
        let gross_proceeds = self.fiat - target_fiat;
        let fee = gross_proceeds * self.fee_rate;
        let net_proceeds = gross_proceeds - fee;
        if !valid_output(net_proceeds) {
            return None;
        }
        if gross_proceeds > self.fiat + EPSILON {
            return None;
        }
        Some(SellQuote {
            coin_amount,
            gross_proceeds,
            fee,
            net_proceeds,
            effective_price: net_proceeds / coin_amount,
        })
    }

    /// Coins obtained for spending `fiat_amount`; the fee is taken off the
    /// input before it is priced.
    pub fn quote_buy_by_fiat(&self, fiat_amount: f64) -> Option<FiatBuyQuote> {
        let k = self.invariant_k();
        if !valid_input(fiat_amount) || k == 0.0 {
            return None;
        }
        let fee = fiat_amount * self.fee_rate;
        let target_fiat = self.fiat + (fiat_amount - fee);
        if target_fiat <= EPSILON {
            return None;
        }
        let mut target_coin = k / target_fiat;
        if target_coin < EPSILON {
            target_coin = 0.0;
        }
        let coins_received = self.coin - target_coin;
        if !valid_output(coins_received) || coins_received >= self.coin - EPSILON {
            return None;
        }
        let effective_price = fiat_amount / coins_received;
        if !valid_output(effective_price) {
            return None;
        }
        Some(FiatBuyQuote { fiat_spent: fiat_amount, fee, coins_received, effective_price })
    }

    /// Fiat obtained for putting `coin_amount` into the pool, net of fee.
    pub fn quote_sell_for_fiat(&self, coin_amount: f64) -> Option<FiatSellQuote> {
        let k = self.invariant_k();
        if !valid_input(coin_amount) || k == 0.0 {
            return None;
        }
        let target_coin = self.coin + coin_amount;
        if target_coin <= EPSILON {
            return None;
        }
        let mut target_fiat = k / target_coin;
        if target_fiat < EPSILON {
            target_fiat = 0.0;
        }
        let gross_proceeds = self.fiat - target_fiat;
        if !valid_output(gross_proceeds) || gross_proceeds >= self.fiat - EPSILON {
            return None;
        }
        let fee = gross_proceeds * self.fee_rate;
        let fiat_received = gross_proceeds - fee;
        if !valid_output(fiat_received) {
            return None;
        }
        Some(FiatSellQuote {
            coins_sold: coin_amount,
            gross_proceeds,
            fee,
            fiat_received,
            effective_price: fiat_received / coin_amount,
        })
    }

    // ── user-facing settlement ──────────────────────────────────────────

    pub fn buy_coins(&mut self, buyer: &mut Holdings, coin_amount: f64) -> Result<BuyQuote> {
        if !valid_input(coin_amount) {
            return Err(SimError::validation("coin amount must be > 0"));
        }
        let quote = self
            .quote_buy_by_coin(coin_amount)
            .ok_or_else(|| SimError::liquidity("cannot buy (check amount/liquidity)"))?;
        if buyer.fiat < quote.net_cost {
            return Err(SimError::insufficient(Asset::Fiat, buyer.fiat, quote.net_cost));
        }
        buyer.fiat -= quote.net_cost;
        buyer.coin += coin_amount;
        self.coin -= coin_amount;
        self.fiat += quote.net_cost;
        Ok(quote)
    }

    pub fn sell_coins(&mut self, seller: &mut Holdings, coin_amount: f64) -> Result<SellQuote> {
        if !valid_input(coin_amount) {
            return Err(SimError::validation("coin amount must be > 0"));
        }
        if seller.coin < coin_amount {
            return Err(SimError::insufficient(Asset::Coin, seller.coin, coin_amount));
        }
        let quote = self
            .quote_sell_by_coin(coin_amount)
            .ok_or_else(|| SimError::liquidity("cannot sell (check amount/liquidity)"))?;
        if quote.net_proceeds > self.fiat {
            return Err(SimError::liquidity("insufficient fiat in pool for payout"));
        }
        seller.coin -= coin_amount;
        seller.fiat += quote.net_proceeds;
        self.coin += coin_amount;
        self.fiat -= quote.net_proceeds;
        Ok(quote)
    }

    // ── system-facing settlement ────────────────────────────────────────

    pub fn system_buy(&mut self, actor: &mut Holdings, fiat_amount: f64) -> Result<FiatBuyQuote> {
        if !valid_input(fiat_amount) {
            return Err(SimError::validation("fiat amount must be > 0"));
        }
        if actor.fiat < fiat_amount {
            return Err(SimError::insufficient(Asset::Fiat, actor.fiat, fiat_amount));
        }
        let quote = self
            .quote_buy_by_fiat(fiat_amount)
            .ok_or_else(|| SimError::liquidity("cannot buy COIN (quote unavailable)"))?;
        if quote.coins_received > self.coin - EPSILON {
            return Err(SimError::liquidity("exchange coin pool too low"));
        }
        actor.fiat -= fiat_amount;
        actor.coin += quote.coins_received;
        self.coin -= quote.coins_received;
        self.fiat += fiat_amount;
        Ok(quote)
    }

    pub fn system_sell(&mut self, actor: &mut Holdings, coin_amount: f64) -> Result<FiatSellQuote> {
        if !valid_input(coin_amount) {
            return Err(SimError::validation("coin amount must be > 0"));
        }
        if actor.coin < coin_amount {
            return Err(SimError::insufficient(Asset::Coin, actor.coin, coin_amount));
        }
        let quote = self
            .quote_sell_for_fiat(coin_amount)
            .ok_or_else(|| SimError::liquidity("cannot sell COIN (quote unavailable)"))?;
        if quote.fiat_received > self.fiat - EPSILON {
            return Err(SimError::liquidity("exchange fiat pool too low"));
        }
        actor.coin -= coin_amount;
        actor.fiat += quote.fiat_received;
        self.coin += coin_amount;
        self.fiat -= quote.fiat_received;
        Ok(quote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Pool {
        Pool::new(30_000_000.0, 10_000_000.0, 0.003)
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn buy_quote_matches_reference_numbers() {
        let pool = seeded();
        assert_eq!(pool.invariant_k(), 3.0e14);
        let q = pool.quote_buy_by_coin(1_000_000.0).expect("test: quote available");
        assert!(close(q.gross_cost, 344_827.586_206_9, 1e-4), "gross {}", q.gross_cost);
        assert!(close(q.fee, 1_034.482_758_6, 1e-4), "fee {}", q.fee);
        assert!(close(q.net_cost, 345_862.068_965_5, 1e-4), "net {}", q.net_cost);
    }

    #[test]
    fn spot_price_is_fiat_over_coin() {
        let pool = seeded();
        let p = pool.spot_price().expect("test: price defined");
        assert!(close(p, 1.0 / 3.0, 1e-12));
    }

    #[test]
    fn degenerate_pool_fails_closed() {
        for pool in [Pool::new(0.0, 1_000.0, 0.003), Pool::new(1_000.0, 0.0, 0.003)] {
            assert_eq!(pool.invariant_k(), 0.0);
            assert!(pool.spot_price().is_none());
            assert!(pool.quote_buy_by_coin(1.0).is_none());
            assert!(pool.quote_sell_by_coin(1.0).is_none());
            assert!(pool.quote_buy_by_fiat(1.0).is_none());
            assert!(pool.quote_sell_for_fiat(1.0).is_none());
        }
    }

    #[test]
    fn non_finite_seed_is_treated_as_empty() {
        let pool = Pool::new(f64::NAN, f64::INFINITY, 0.003);
        assert!(pool.is_degenerate());
        assert_eq!(pool.coin_balance(), 0.0);
    }

    #[test]
    fn bad_inputs_are_unavailable() {
        let pool = seeded();
        for v in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(pool.quote_buy_by_coin(v).is_none());
            assert!(pool.quote_sell_by_coin(v).is_none());
            assert!(pool.quote_buy_by_fiat(v).is_none());
            assert!(pool.quote_sell_for_fiat(v).is_none());
        }
    }

    #[test]
    fn buy_cannot_drain_pool() {
        let pool = seeded();
        assert!(pool.quote_buy_by_coin(30_000_000.0).is_none());
        assert!(pool.quote_buy_by_coin(40_000_000.0).is_none());
        assert!(pool.quote_buy_by_coin(29_999_999.0).is_some());
    }

    #[test]
    fn round_trip_buy_consumes_quoted_cost() {
        let mut pool = seeded();
        let k0 = pool.invariant_k();
        let quote = pool.quote_buy_by_coin(250_000.0).expect("test: quote available");
        let mut buyer = Holdings::new(0.0, 1_000_000.0);
        let filled = pool.buy_coins(&mut buyer, 250_000.0).expect("test: buy settles");
        assert_eq!(filled, quote);
        assert!(close(buyer.fiat, 1_000_000.0 - quote.net_cost, 1e-6));
        assert_eq!(buyer.coin, 250_000.0);
        assert!(pool.invariant_k() >= k0);
    }

    #[test]
    fn fees_grow_k_on_every_settlement() {
        let mut pool = seeded();
        let mut actor = Holdings::new(5_000_000.0, 5_000_000.0);

        let k0 = pool.invariant_k();
        pool.sell_coins(&mut actor, 100_000.0).expect("test: sell settles");
        let k1 = pool.invariant_k();
        assert!(k1 > k0);

        pool.system_buy(&mut actor, 10_000.0).expect("test: system buy settles");
        let k2 = pool.invariant_k();
        assert!(k2 > k1);

        pool.system_sell(&mut actor, 10_000.0).expect("test: system sell settles");
        assert!(pool.invariant_k() > k2);
    }

    #[test]
    fn zero_fee_preserves_k() {
        let mut pool = Pool::new(30_000_000.0, 10_000_000.0, 0.0);
        let k0 = pool.invariant_k();
        let mut actor = Holdings::new(1_000_000.0, 1_000_000.0);
        pool.buy_coins(&mut actor, 50_000.0).expect("test: buy settles");
        pool.sell_coins(&mut actor, 20_000.0).expect("test: sell settles");
        pool.system_buy(&mut actor, 1_000.0).expect("test: system buy settles");
        pool.system_sell(&mut actor, 1_000.0).expect("test: system sell settles");
        assert!((pool.invariant_k() - k0).abs() / k0 < 1e-12);
    }

    #[test]
    fn insufficient_fiat_leaves_state_untouched() {
        let mut pool = seeded();
        let mut buyer = Holdings::new(0.0, 10.0);
        let err = pool.buy_coins(&mut buyer, 1_000.0).expect_err("test: buyer is short");
        assert!(matches!(err, SimError::InsufficientBalance { asset: Asset::Fiat, .. }));
        assert_eq!(buyer, Holdings::new(0.0, 10.0));
        assert_eq!(pool.coin_balance(), 30_000_000.0);
        assert_eq!(pool.fiat_balance(), 10_000_000.0);
    }

    #[test]
    fn insufficient_coin_on_sell() {
        let mut pool = seeded();
        let mut seller = Holdings::new(5.0, 0.0);
        let err = pool.sell_coins(&mut seller, 10.0).expect_err("test: seller is short");
        assert!(matches!(err, SimError::InsufficientBalance { asset: Asset::Coin, .. }));
        let err = pool.system_sell(&mut seller, 10.0).expect_err("test: seller is short");
        assert!(matches!(err, SimError::InsufficientBalance { asset: Asset::Coin, .. }));
    }

    #[test]
    fn oversized_sell_never_exceeds_fiat_side() {
        let pool = Pool::new(1_000.0, 1_000.0, 0.003);
        let q = pool.quote_sell_by_coin(1.0e12).expect("test: huge sell still prices");
        assert!(q.gross_proceeds < 1_000.0);
        assert!(q.net_proceeds < q.gross_proceeds);
    }

    #[test]
    fn buy_by_fiat_applies_fee_on_input() {
        let pool = seeded();
        let q = pool.quote_buy_by_fiat(10_000.0).expect("test: quote available");
        assert!(close(q.fee, 30.0, 1e-9));
        let k = pool.invariant_k();
        let expected = 30_000_000.0 - k / (10_000_000.0 + 9_970.0);
        assert!(close(q.coins_received, expected, 1e-6));
        // what those coins would cost through the coin-sized path never
        // exceeds the fiat committed
        let back = pool.quote_buy_by_coin(q.coins_received).expect("test: quote available");
        assert!(back.net_cost <= 10_000.0);
    }

    #[test]
    fn degenerate_settlement_is_liquidity_error() {
        let mut pool = Pool::new(0.0, 0.0, 0.003);
        let mut actor = Holdings::new(100.0, 100.0);
        let err = pool.buy_coins(&mut actor, 1.0).expect_err("test: empty pool");
        assert_eq!(err.kind(), crate::error::ErrorKind::LiquidityUnavailable);
        let err = pool.system_buy(&mut actor, 1.0).expect_err("test: empty pool");
        assert_eq!(err.kind(), crate::error::ErrorKind::LiquidityUnavailable);
    }
}
