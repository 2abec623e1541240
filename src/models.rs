// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WagebookError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    pub hourly_rate: Decimal,
    pub standard_daily_hours: Decimal,
    pub is_active: bool,
    /// Cached running advance balance; must equal the `balance_after` of the
    /// worker's most recent ledger transaction.
    pub balance: Decimal,
}

/// Kind of a ledger transaction. An advance raises the worker's outstanding
/// balance; repayments and deposits lower it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Advance,
    Repayment,
    Deposit,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Advance => "advance",
            TxKind::Repayment => "repayment",
            TxKind::Deposit => "deposit",
        }
    }

    pub fn parse(s: &str) -> Result<Self, WagebookError> {
        match s {
            "advance" => Ok(TxKind::Advance),
            "repayment" => Ok(TxKind::Repayment),
            "deposit" => Ok(TxKind::Deposit),
            other => Err(WagebookError::Validation(format!(
                "unknown transaction kind '{}'",
                other
            ))),
        }
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, TxKind::Repayment | TxKind::Deposit)
    }

    /// Signed effect on the running balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        if self.is_debit() { -amount } else { amount }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub worker_id: i64,
    pub kind: TxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub balance_after: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Holiday,
    HalfDay,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Holiday => "holiday",
            AttendanceStatus::HalfDay => "half-day",
        }
    }

    pub fn parse(s: &str) -> Result<Self, WagebookError> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "holiday" => Ok(AttendanceStatus::Holiday),
            "half-day" => Ok(AttendanceStatus::HalfDay),
            other => Err(WagebookError::Validation(format!(
                "unknown attendance status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub id: i64,
    pub worker_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub hours_worked: Decimal,
    pub total_pay: Decimal,
    pub note: Option<String>,
}

/// Per-worker sums over a period. `days_present` counts present and holiday
/// entries; `days_absent` counts absent entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceTotals {
    pub worker_id: i64,
    pub worker_name: String,
    pub hours_worked: Decimal,
    pub total_pay: Decimal,
    pub days_present: i64,
    pub days_absent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusRecord {
    pub id: i64,
    pub worker_id: i64,
    pub worker_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub days_present: i64,
    pub days_absent: i64,
    pub base_bonus: Decimal,
    pub penalty: Decimal,
    pub extra_bonus: Decimal,
    pub employee_deposit: Decimal,
    pub gross_bonus: Decimal,
    pub net_bonus: Decimal,
    pub is_paid: bool,
    pub amount_paid: Option<Decimal>,
    pub is_finalized: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRecord {
    pub id: i64,
    pub worker_id: i64,
    pub worker_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hours_worked: Decimal,
    pub total_pay: Decimal,
    pub days_present: i64,
    pub days_absent: i64,
    pub deposit: Decimal,
    pub new_advance: Decimal,
    pub final_amount: Decimal,
    pub is_finalized: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementKind {
    Bonus,
    Salary,
}

impl SettlementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementKind::Bonus => "bonus",
            SettlementKind::Salary => "salary",
        }
    }

    pub fn parse(s: &str) -> Result<Self, WagebookError> {
        match s {
            "bonus" => Ok(SettlementKind::Bonus),
            "salary" => Ok(SettlementKind::Salary),
            other => Err(WagebookError::Validation(format!(
                "unknown settlement kind '{}'",
                other
            ))),
        }
    }
}

/// Immutable per-worker snapshot taken at finalize time. `balance_after` is
/// the ledger balance observed once the worker's postings went through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementItem {
    pub worker_id: i64,
    pub worker_name: String,
    pub gross: Decimal,
    pub deposit: Decimal,
    pub new_advance: Decimal,
    pub net: Decimal,
    pub balance_after: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: i64,
    pub kind: SettlementKind,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub total_deposit: Decimal,
    pub total_advance: Decimal,
    pub items: Vec<SettlementItem>,
}
