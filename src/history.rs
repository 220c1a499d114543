// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Price History

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::is_sane;

/// Bounded per-day spot price series. The oldest entry is evicted once
/// `capacity` is exceeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    entries: VecDeque<Option<f64>>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity: capacity.max(1) }
    }

    /// Appends `price`, or carries the last valid price forward when it is
    /// undefined. `None` is stored only if no valid price was ever seen.
    pub fn record(&mut self, price: Option<f64>) {
        let entry = price.filter(|p| is_sane(*p)).or_else(|| self.last_valid());
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn last_valid(&self) -> Option<f64> {
        self.entries.iter().rev().find_map(|p| *p)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn snapshot(&self) -> Vec<Option<f64>> {
        self.entries.iter().copied().collect()
    }

    /// Coefficient of variation over the last `window` valid prices.
    pub fn volatility(&self, window: usize) -> f64 {
        let prices: Vec<f64> = self.entries.iter().rev().filter_map(|p| *p).take(window).collect();
        compute_rolling_volatility(&prices)
    }
}

/// Coefficient of variation (std dev / mean) of a price window.
pub(crate) fn compute_rolling_volatility(history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    if mean.abs() < 1e-12 {
        return 0.0;
    }
    let variance = history.iter().map(|&p| (p - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}
