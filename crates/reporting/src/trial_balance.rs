//! Trial balance: per-account beginning, movement and ending over a range.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_core::BranchId;
use corebank_chart::NormalSide;

/// Aggregation scope: one branch's book or the consolidated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchScope {
    Branch(BranchId),
    /// Head-office consolidation across every branch.
    All,
}

impl BranchScope {
    pub fn branch_filter(self) -> Option<BranchId> {
        match self {
            Self::Branch(id) => Some(id),
            Self::All => None,
        }
    }
}

/// One account's line in the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_number: String,
    pub account_name: String,
    /// Chart reference code, the balance-sheet mapping key.
    pub reference: String,
    pub branch_id: BranchId,
    /// Balance as of the range start.
    pub beginning_balance: Decimal,
    pub period_debit: Decimal,
    pub period_credit: Decimal,
    pub ending_balance: Decimal,
    pub normal_side: NormalSide,
}

/// Column sums over all rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub beginning_balance: Decimal,
    pub period_debit: Decimal,
    pub period_credit: Decimal,
    pub ending_balance: Decimal,
}

impl TrialBalanceTotals {
    pub fn accumulate(&mut self, row: &TrialBalanceRow) {
        self.beginning_balance += row.beginning_balance;
        self.period_debit += row.period_debit;
        self.period_credit += row.period_credit;
        self.ending_balance += row.ending_balance;
    }

    /// Period movement is balanced when the book is: every entry batch that
    /// reached the book carried equal debits and credits.
    pub fn movement_is_balanced(&self) -> bool {
        self.period_debit == self.period_credit
    }
}

/// A disposable, recomputed reporting snapshot for one scope and range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub scope: BranchScope,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub totals: TrialBalanceTotals,
}

impl TrialBalance {
    pub fn row_by_number(&self, account_number: &str) -> Option<&TrialBalanceRow> {
        self.rows.iter().find(|r| r.account_number == account_number)
    }
}
