// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Error Types

use serde::{Deserialize, Serialize};

use crate::types::Asset;

/// Failure classification exposed to the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InsufficientBalance,
    LiquidityUnavailable,
    InvariantViolation,
}

/// Errors raised by simulation operations. Every mutating operation
/// validates fully before it touches state, so an `Err` always means
/// "nothing changed".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("{0}")]
    Validation(String),

    #[error("insufficient {asset}: have {available:.2}, need {required:.2}")]
    InsufficientBalance {
        asset: Asset,
        available: f64,
        required: f64,
    },

    #[error("liquidity unavailable: {0}")]
    LiquidityUnavailable(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl SimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn liquidity(msg: impl Into<String>) -> Self {
        Self::LiquidityUnavailable(msg.into())
    }

    pub fn insufficient(asset: Asset, available: f64, required: f64) -> Self {
        Self::InsufficientBalance { asset, available, required }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::LiquidityUnavailable(_) => ErrorKind::LiquidityUnavailable,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

// ─── CommandOutcome ─────────────────────────────────────────────────────────

/// Result of a text command: success flag, classification on failure and a
/// short human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandOutcome {
    pub ok: bool,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl CommandOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self { ok: true, kind: None, message: message.into() }
    }

    pub fn failure(err: &SimError) -> Self {
        Self { ok: false, kind: Some(err.kind()), message: err.to_string() }
    }
}

impl<T> From<&Result<T>> for CommandOutcome
where
    T: std::fmt::Display,
{
    fn from(r: &Result<T>) -> Self {
        match r {
            Ok(v) => Self::success(v.to_string()),
            Err(e) => Self::failure(e),
        }
    }
}
