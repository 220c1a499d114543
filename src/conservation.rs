// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Conservation Logic

use serde::{Deserialize, Serialize};

/// Absolute floor of the tolerance, in coins.
const ABS_TOLERANCE: f64 = 1e-6;
/// Tolerance relative to the total emission.
const REL_TOLERANCE: f64 = 1e-9;

/// Where every emitted coin currently sits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct SupplyBreakdown {
    pub unallocated: f64,
    pub active_stake: f64,
    pub accrued_rewards: f64,
    pub accounts: f64,
    pub pool: f64,
    pub market_maker: f64,
}

impl SupplyBreakdown {
    pub fn total(&self) -> f64 {
        self.unallocated
            + self.active_stake
            + self.accrued_rewards
            + self.accounts
            + self.pool
            + self.market_maker
    }

    pub fn any_negative(&self) -> bool {
        [
            self.unallocated,
            self.active_stake,
            self.accrued_rewards,
            self.accounts,
            self.pool,
            self.market_maker,
        ]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    }
}

/// Compute the conservation error (coins leaked or created).
///
/// In a closed supply:
///   total_emission = unallocated + active_stake + accrued_rewards
///                    + accounts + pool + market_maker
///
/// Returns the absolute difference.
pub fn compute_conservation(total_emission: f64, parts: &SupplyBreakdown) -> f64 {
    (total_emission - parts.total()).abs()
}

pub fn tolerance_for(total_emission: f64) -> f64 {
    ABS_TOLERANCE.max(total_emission.abs() * REL_TOLERANCE)
}

/// Outcome of a single conservation check.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConservationResult {
    pub balanced: bool,
    pub error: f64,
    pub circuit_breaker_tripped: bool,
}

/// Tracks conservation checks. The circuit breaker trips on the first
/// unbalanced check and never resets: a leak is a bug, not drift.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ConservationLaw {
    pub circuit_breaker_tripped: bool,
    pub violations: u32,
    pub last_error: f64,
    pub checks: u64,
}

impl ConservationLaw {
    /// Verify the supply identity. Negative or non-finite parts count as
    /// unbalanced regardless of the sum.
    pub fn verify(&mut self, total_emission: f64, parts: &SupplyBreakdown) -> ConservationResult {
        self.checks += 1;
        let error = compute_conservation(total_emission, parts);
        let balanced = error.is_finite()
            && error <= tolerance_for(total_emission)
            && !parts.any_negative();
        self.last_error = error;

        if !balanced {
            self.violations += 1;
            self.circuit_breaker_tripped = true;
        }

        ConservationResult {
            balanced,
            error,
            circuit_breaker_tripped: self.circuit_breaker_tripped,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.circuit_breaker_tripped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
