// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Stake Ledger

use serde::{Deserialize, Serialize};

use crate::config::fraction;
use crate::error::{Result, SimError};
use crate::types::{StakePosition, EPSILON};

/// Coins released when a position is stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Released {
    pub stake: f64,
    pub reward: f64,
}

impl Released {
    pub fn total(&self) -> f64 {
        self.stake + self.reward
    }
}

/// Stake positions ("nodes") earning pro-rata emission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeLedger {
    positions: Vec<StakePosition>,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a position. Funding it from the unallocated supply is the
    /// caller's job; this only validates and records.
    pub fn open(&mut self, stake: f64, commission: f64, min_stake: f64, is_own: bool) -> Result<usize> {
        if !(stake.is_finite() && stake > 0.0) {
            return Err(SimError::validation("stake must be > 0"));
        }
        fraction("commission", commission)
            .map_err(|_| SimError::validation("commission must be between 0 and 100%"))?;
        if stake < min_stake {
            return Err(SimError::validation(format!("stake below minimum ({min_stake:.0})")));
        }
        self.positions.push(StakePosition {
            initial_stake: stake,
            current_stake: stake,
            commission,
            accrued_reward: 0.0,
            active: true,
            is_own,
        });
        Ok(self.positions.len() - 1)
    }

    /// Checks that `index` names an active, operator-owned position.
    pub fn check_stoppable(&self, index: usize) -> Result<()> {
        let pos = self
            .positions
            .get(index)
            .ok_or_else(|| SimError::validation(format!("invalid node number {}", index + 1)))?;
        if !pos.active {
            return Err(SimError::validation(format!("node {} already stopped", index + 1)));
        }
        if !pos.is_own {
            return Err(SimError::validation(format!("node {} is not yours", index + 1)));
        }
        Ok(())
    }

    /// Zeroes stake and reward and deactivates the position. A stopped
    /// position never earns again.
    pub fn stop(&mut self, index: usize) -> Result<Released> {
        self.check_stoppable(index)?;
        let pos = &mut self.positions[index];
        let released = Released { stake: pos.current_stake, reward: pos.accrued_reward };
        pos.current_stake = 0.0;
        pos.accrued_reward = 0.0;
        pos.active = false;
        Ok(released)
    }

    pub fn total_active_stake(&self) -> f64 {
        self.positions.iter().filter(|p| p.active).map(|p| p.current_stake).sum()
    }

    pub fn total_accrued(&self) -> f64 {
        self.positions.iter().map(|p| p.accrued_reward).sum()
    }

    pub fn own_active_stake(&self) -> f64 {
        self.positions
            .iter()
            .filter(|p| p.active && p.is_own)
            .map(|p| p.current_stake)
            .sum()
    }

    pub fn own_rewards(&self) -> f64 {
        self.positions.iter().filter(|p| p.is_own).map(|p| p.accrued_reward).sum()
    }

    /// Splits `reward` across active positions by stake weight. Returns the
    /// amount actually paid (zero when nothing is staked; the reward is not
    /// banked).
    pub fn distribute(&mut self, reward: f64) -> f64 {
        let total = self.total_active_stake();
        if total <= EPSILON || !(reward.is_finite() && reward > 0.0) {
            return 0.0;
        }
        let per_unit = reward / total;
        for pos in self.positions.iter_mut().filter(|p| p.active) {
            pos.accrued_reward += pos.current_stake * per_unit;
        }
        reward
    }

    pub fn len(&self) -> usize { self.positions.len() }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }
    pub fn positions(&self) -> &[StakePosition] { &self.positions }
}
