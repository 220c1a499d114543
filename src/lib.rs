// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite

pub mod types;
pub mod error;
pub mod config;
pub mod adapter;
pub mod pool;
pub mod accounts;
pub mod stake;
pub mod treasury;
pub mod trading;
pub mod market_maker;
pub mod clock;
pub mod history;
pub mod conservation;
pub mod simulation;
pub mod commands;

pub use commands::Command;
pub use config::SimConfig;
pub use error::{CommandOutcome, ErrorKind, SimError};
pub use simulation::EconomySimulation;
pub use types::*;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl EconomySimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = SimConfig { seed, ..SimConfig::default() };
        Self::build(config, Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    /// Builds a simulation from a JSON config; missing fields take defaults.
    #[wasm_bindgen(js_name = fromConfigJson)]
    pub fn from_config_json(json: &str) -> Result<EconomySimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        SimConfig::from_json(json)
            .and_then(EconomySimulation::from_config)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Polls the clock with seconds elapsed since start; returns the
    /// reports of every day that ran.
    pub fn tick(&mut self, now_secs: f64) -> JsValue {
        to_js(&self.advance(now_secs))
    }

    /// Run N days without returning results (fast batch mode for benchmarking)
    pub fn run_days(&mut self, days: u32) {
        for _ in 0..days {
            if self.is_halted() {
                break;
            }
            self.step_day();
        }
    }

    pub fn get_snapshot(&self) -> JsValue {
        to_js(&self.snapshot())
    }

    pub fn get_nodes(&self) -> JsValue {
        to_js(self.nodes())
    }

    pub fn get_accounts(&self) -> JsValue {
        to_js(self.account_list())
    }

    pub fn get_quotes(&self, coin_amount: f64, system_fiat: f64, system_coin: f64) -> JsValue {
        to_js(&self.quote_preview(coin_amount, system_fiat, system_coin))
    }

    pub fn get_fair_value(&self) -> f64 {
        self.fair_value()
    }

    /// Runs a JSON-tagged [`Command`] and returns its outcome.
    pub fn command(&mut self, command: JsValue) -> JsValue {
        let outcome = match serde_wasm_bindgen::from_value::<Command>(command) {
            Ok(cmd) => self.execute(&cmd),
            Err(e) => CommandOutcome::failure(&SimError::validation(format!("bad command: {e}"))),
        };
        to_js(&outcome)
    }

    pub fn add_user(&mut self) -> JsValue {
        to_js(&self.execute(&Command::AddUser))
    }

    pub fn add_users(&mut self, count: &str) -> JsValue {
        to_js(&self.execute(&Command::AddUsers { count: count.into() }))
    }

    pub fn add_node(&mut self, stake: &str, commission_percent: &str) -> JsValue {
        let cmd = Command::AddNode { stake: stake.into(), commission: commission_percent.into() };
        to_js(&self.execute(&cmd))
    }

    pub fn stop_node(&mut self, number: &str) -> JsValue {
        to_js(&self.execute(&Command::StopNode { number: number.into() }))
    }

    pub fn contest(&mut self, reward: &str, winners: &str) -> JsValue {
        let cmd = Command::LaunchContest { reward: reward.into(), winners: winners.into() };
        to_js(&self.execute(&cmd))
    }

    pub fn buy(&mut self, account: u64, amount: &str) -> JsValue {
        to_js(&self.execute(&Command::UserBuy { account, amount: amount.into() }))
    }

    pub fn sell(&mut self, account: u64, amount: &str) -> JsValue {
        to_js(&self.execute(&Command::UserSell { account, amount: amount.into() }))
    }

    pub fn treasury_buy(&mut self, fiat: &str) -> JsValue {
        to_js(&self.execute(&Command::SystemBuy { fiat: fiat.into() }))
    }

    pub fn treasury_sell(&mut self, coins: &str) -> JsValue {
        to_js(&self.execute(&Command::SystemSell { coins: coins.into() }))
    }

    /// Reset simulation to initial state
    pub fn reset(&mut self) {
        let config = self.config.clone();
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        *self = EconomySimulation::build(config, Box::new(rng));
    }
}
