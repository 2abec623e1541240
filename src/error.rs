// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WagebookError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient balance for '{worker}': tried to debit {requested}, balance is {balance}")]
    InsufficientBalance {
        worker: String,
        requested: Decimal,
        balance: Decimal,
    },

    #[error("deposit {requested} exceeds gross bonus {gross} for '{worker}'")]
    ExceedsEntitlement {
        worker: String,
        requested: Decimal,
        gross: Decimal,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Internal(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, WagebookError>;
