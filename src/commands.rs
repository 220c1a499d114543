// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Command Layer

//! Text-input commands from the presentation layer. Every numeric field
//! arrives as loosely formatted text and goes through [`crate::adapter`]
//! before the typed operation on [`EconomySimulation`] runs.

use serde::{Deserialize, Serialize};

use crate::adapter::{parse_amount, parse_count, parse_percent};
use crate::error::{CommandOutcome, Result};
use crate::simulation::EconomySimulation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AddUser,
    AddUsers { count: String },
    /// `commission` is a percentage in `[0, 100]`.
    AddNode { stake: String, commission: String },
    /// 1-based node number as displayed.
    StopNode { number: String },
    LaunchContest { reward: String, winners: String },
    UserBuy { account: u64, amount: String },
    UserSell { account: u64, amount: String },
    SystemBuy { fiat: String },
    SystemSell { coins: String },
}

impl EconomySimulation {
    /// Parses and runs `command`. Failures leave the simulation untouched
    /// and come back as a classified outcome.
    pub fn execute(&mut self, command: &Command) -> CommandOutcome {
        let result = self.run_command(command);
        match &result {
            Ok(msg) => log::info!("{msg}"),
            Err(e) => log::warn!("{command:?} rejected: {e}"),
        }
        CommandOutcome::from(&result)
    }

    fn run_command(&mut self, command: &Command) -> Result<String> {
        match command {
            Command::AddUser => {
                let id = self.add_account()?;
                Ok(format!("user {id} added"))
            }
            Command::AddUsers { count } => {
                let ids = self.add_accounts(parse_count(count)?)?;
                Ok(format!("users {}..={} added", ids.start(), ids.end()))
            }
            Command::AddNode { stake, commission } => {
                let stake = parse_amount(stake)?;
                let commission = parse_percent(commission)?;
                let index = self.add_stake(stake, commission, true)?;
                Ok(format!(
                    "node {} added, {:.0} unallocated left",
                    index + 1,
                    self.treasury.unallocated()
                ))
            }
            Command::StopNode { number } => {
                let number = parse_count(number)?;
                let released = self.stop_stake(number - 1)?;
                Ok(format!(
                    "node {number} stopped, returned {:.2} stake + {:.2} reward",
                    released.stake, released.reward
                ))
            }
            Command::LaunchContest { reward, winners } => {
                let out = self.launch_contest(parse_amount(reward)?, parse_count(winners)?)?;
                Ok(format!("contest paid {:.2} COIN to {} winner(s)", out.reward, out.payouts.len()))
            }
            Command::UserBuy { account, amount } => {
                let q = self.user_buy(*account, parse_amount(amount)?)?;
                Ok(format!(
                    "user {account} bought {:.2} COIN for {:.2} (fee {:.2})",
                    q.coin_amount, q.net_cost, q.fee
                ))
            }
            Command::UserSell { account, amount } => {
                let q = self.user_sell(*account, parse_amount(amount)?)?;
                Ok(format!(
                    "user {account} sold {:.2} COIN for {:.2} (fee {:.2})",
                    q.coin_amount, q.net_proceeds, q.fee
                ))
            }
            Command::SystemBuy { fiat } => {
                let q = self.system_buy(parse_amount(fiat)?)?;
                Ok(format!("system bought {:.2} COIN for {:.2}", q.coins_received, q.fiat_spent))
            }
            Command::SystemSell { coins } => {
                let q = self.system_sell(parse_amount(coins)?)?;
                Ok(format!("system sold {:.2} COIN for {:.2}", q.coins_sold, q.fiat_received))
            }
        }
    }
}
