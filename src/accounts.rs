// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Account Registry

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::types::{Account, Holdings};

/// Participant accounts. Ids start at 1 and are never reused; accounts are
/// never removed, so an id is also `index + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    next_id: u64,
    starting_fiat: f64,
    max_accounts: usize,
}

impl AccountRegistry {
    pub fn new(starting_fiat: f64, max_accounts: usize) -> Self {
        Self { accounts: Vec::new(), next_id: 1, starting_fiat, max_accounts }
    }

    /// Adds one account. The ceiling is not checked here.
    pub(crate) fn add(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.accounts.push(Account { id, holdings: Holdings::new(0.0, self.starting_fiat) });
        id
    }

    /// Adds `count` accounts and returns the id range created. Fails
    /// without adding any if the registry would exceed its ceiling.
    pub fn add_many(&mut self, count: usize) -> Result<std::ops::RangeInclusive<u64>> {
        if count == 0 {
            return Err(SimError::validation("account count must be > 0"));
        }
        let room = self.max_accounts.saturating_sub(self.accounts.len());
        if count > room {
            return Err(SimError::validation(format!(
                "cannot add {count} accounts: {room} of {} slots left",
                self.max_accounts
            )));
        }
        let first = self.next_id;
        for _ in 0..count {
            self.add();
        }
        Ok(first..=self.next_id - 1)
    }

    pub fn len(&self) -> usize { self.accounts.len() }
    pub fn max_accounts(&self) -> usize { self.max_accounts }
    pub fn is_empty(&self) -> bool { self.accounts.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Account> { self.accounts.iter() }
    pub fn as_slice(&self) -> &[Account] { &self.accounts }

    pub fn get(&self, id: u64) -> Option<&Account> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.accounts.get(idx)
    }

    pub fn holdings_mut(&mut self, id: u64) -> Result<&mut Holdings> {
        let idx = id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < self.accounts.len())
            .ok_or_else(|| SimError::validation(format!("unknown account {id}")))?;
        Ok(&mut self.accounts[idx].holdings)
    }

    /// Holdings by position, for samplers that pick indices.
    pub(crate) fn holdings_at_mut(&mut self, index: usize) -> Option<&mut Holdings> {
        self.accounts.get_mut(index).map(|a| &mut a.holdings)
    }

    pub fn total_coin(&self) -> f64 {
        self.accounts.iter().map(|a| a.holdings.coin).sum()
    }

    pub fn total_fiat(&self) -> f64 {
        self.accounts.iter().map(|a| a.holdings.fiat).sum()
    }
}
