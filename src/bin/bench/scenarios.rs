// Scenario Definitions: named economy stress cases
// Engine untouched: scenario logic lives in config tweaks and setup/event closures

use tokensim_engine::{EconomySimulation, SimConfig};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub days: u64,
    /// Adjusts the default config before the run (seed is set afterwards).
    pub configure: Option<fn(&mut SimConfig)>,
    pub criteria: PassCriteria,
    /// Pre-run setup (e.g., seed a larger population)
    pub setup: Option<Box<dyn Fn(&mut EconomySimulation) + Send + Sync>>,
    /// Commands issued before the given day is simulated
    pub day_event: Option<Box<dyn Fn(&mut EconomySimulation, u64) + Send + Sync>>,
}

pub struct PassCriteria {
    /// Largest acceptable |total_emission - Σ holdings| relative to supply.
    pub max_normalized_conservation: f64,
    pub require_price_defined: bool,
    pub require_not_halted: bool,
    /// Fail if the final price drops below this.
    pub min_final_price: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_normalized_conservation: 1e-9,
            require_price_defined: true,
            require_not_halted: true,
            min_final_price: None,
        }
    }
}

// ─── Event Functions ────────────────────────────────────────────────────────

fn log_rejection<T, E: std::fmt::Display>(day: u64, what: &str, r: Result<T, E>) {
    if let Err(e) = r {
        log::debug!("day {day}: {what} rejected: {e}");
    }
}

fn adoption_boom(sim: &mut EconomySimulation, day: u64) {
    // ramps from 5 to 50 new users per day over the first 120 days
    let per_day = 5 + (day.min(120) * 45 / 120) as usize;
    log_rejection(day, "add users", sim.add_accounts(per_day));
}

fn sell_off(sim: &mut EconomySimulation, day: u64) {
    match day {
        60 => log_rejection(day, "airdrop contest", sim.launch_contest(20_000_000.0, 200)),
        61..=90 => {
            let sellers: Vec<(u64, f64)> = sim
                .account_list()
                .iter()
                .filter(|a| a.holdings.coin > 100.0)
                .map(|a| (a.id, a.holdings.coin * 0.5))
                .collect();
            for (id, coin) in sellers {
                log_rejection(day, "user sell", sim.user_sell(id, coin));
            }
        }
        _ => {}
    }
}

fn treasury_dump(sim: &mut EconomySimulation, day: u64) {
    if (100..130).contains(&day) {
        log_rejection(day, "system sell", sim.system_sell(1_000_000.0));
    }
}

fn contest_storm(sim: &mut EconomySimulation, day: u64) {
    log_rejection(day, "add users", sim.add_accounts(10));
    if day % 7 == 0 {
        log_rejection(day, "contest", sim.launch_contest(1_000_000.0, 50));
    }
}

fn thin_pool(cfg: &mut SimConfig) {
    cfg.pool.seed_coin = 300_000.0;
    cfg.pool.seed_fiat = 100_000.0;
}

fn no_market_maker(cfg: &mut SimConfig) {
    cfg.market_maker.enabled = false;
}

fn populate(users: usize) -> Box<dyn Fn(&mut EconomySimulation) + Send + Sync> {
    Box::new(move |sim: &mut EconomySimulation| {
        if let Err(e) = sim.add_accounts(users) {
            log::warn!("setup: {e}");
        }
    })
}

// ─── Scenario Table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "BASELINE",
            label: "Baseline year",
            category: "core",
            days: 365,
            configure: None,
            criteria: PassCriteria::default(),
            setup: None,
            day_event: None,
        },
        Scenario {
            name: "BASELINE_NO_MM",
            label: "Baseline year, market maker off",
            category: "core",
            days: 365,
            configure: Some(no_market_maker),
            criteria: PassCriteria::default(),
            setup: None,
            day_event: None,
        },
        Scenario {
            name: "ADOPTION_BOOM",
            label: "Adoption boom",
            category: "growth",
            days: 240,
            configure: None,
            criteria: PassCriteria::default(),
            setup: None,
            day_event: Some(Box::new(adoption_boom)),
        },
        Scenario {
            name: "SELL_OFF",
            label: "Airdrop then sell-off",
            category: "stress",
            days: 180,
            configure: None,
            criteria: PassCriteria::default(),
            setup: Some(populate(490)),
            day_event: Some(Box::new(sell_off)),
        },
        Scenario {
            name: "TREASURY_DUMP",
            label: "Treasury dumps unallocated coin",
            category: "stress",
            days: 200,
            configure: None,
            criteria: PassCriteria::default(),
            setup: None,
            day_event: Some(Box::new(treasury_dump)),
        },
        Scenario {
            name: "TREASURY_DUMP_THIN",
            label: "Treasury dump into a thin pool",
            category: "stress",
            days: 200,
            configure: Some(thin_pool),
            criteria: PassCriteria::default(),
            setup: None,
            day_event: Some(Box::new(treasury_dump)),
        },
        Scenario {
            name: "CONTEST_STORM",
            label: "Weekly contests with steady signups",
            category: "growth",
            days: 365,
            configure: None,
            criteria: PassCriteria { min_final_price: Some(1e-6), ..PassCriteria::default() },
            setup: Some(populate(100)),
            day_event: Some(Box::new(contest_storm)),
        },
    ]
}
