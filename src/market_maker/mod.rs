//! Liquidity-providing market maker: tuning parameters and the daily
//! controller.

pub mod controller;
pub mod params;

pub use controller::MarketMaker;
pub use params::{MarketMakerParams, SideModifiers};
