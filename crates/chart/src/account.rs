//! Ledger account model and the normal-balance sign convention.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_core::{AccountId, BranchId, Entity, LedgerError, LedgerResult, PositionId};

use crate::numbering::AccountNumber;

/// High-level account class (determines normal balance side).
///
/// Classified by the leading digit of the account number per the national
/// chart numbering convention: 1–3 asset classes (financial/cash, fixed
/// assets, receivables), 4 liabilities, 5 equity/capital, 6 expenses,
/// 7 income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

/// Which side records an account's natural increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountCategory {
    /// Classify from the leading digit of an account/template number.
    pub fn from_leading_digit(digit: char) -> LedgerResult<Self> {
        match digit {
            '1' | '2' | '3' => Ok(Self::Asset),
            '4' => Ok(Self::Liability),
            '5' => Ok(Self::Equity),
            '6' => Ok(Self::Expense),
            '7' => Ok(Self::Income),
            other => Err(LedgerError::validation(format!(
                "account number leading digit {other:?} is outside the chart classes"
            ))),
        }
    }

    pub fn from_account_number(number: &str) -> LedgerResult<Self> {
        let digit = number.chars().next().ok_or_else(|| {
            LedgerError::validation("account number must not be empty")
        })?;
        Self::from_leading_digit(digit)
    }

    /// The single canonical sign rule. Applied identically by the posting
    /// engine and the balance aggregator.
    pub fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Expense => NormalSide::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalSide::Credit,
        }
    }
}

impl NormalSide {
    /// Ending balance for one period under this convention.
    ///
    /// Debit-normal: beginning + Σdebits − Σcredits.
    /// Credit-normal: beginning + Σcredits − Σdebits.
    pub fn ending_balance(self, beginning: Decimal, debits: Decimal, credits: Decimal) -> Decimal {
        match self {
            Self::Debit => beginning + debits - credits,
            Self::Credit => beginning + credits - debits,
        }
    }
}

/// A concrete general-ledger account owned by one branch.
///
/// Created on first resolution of a (template, branch) pair, mutated on every
/// posting, never deleted; only `active` is cleared. `version` backs the
/// optimistic concurrency check on balance updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub branch_id: BranchId,
    pub position_id: PositionId,
    pub number: AccountNumber,
    pub name: String,
    pub category: AccountCategory,
    /// Balance as of the last period close.
    pub beginning_balance: Decimal,
    pub beginning_debit: Decimal,
    pub beginning_credit: Decimal,
    /// Running sums since the last period close.
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub current_balance: Decimal,
    /// Reject postings that would take this account negative.
    pub enforce_funds: bool,
    /// Last value date folded into the beginning figures by a period close.
    /// Aggregation must not re-count entries dated on or before it.
    pub closed_through: Option<NaiveDate>,
    pub active: bool,
    pub version: u64,
}

impl Account {
    /// Provision a branch-local account from a chart template.
    ///
    /// `number` must already be derived through the numbering scheme so the
    /// category can be read off the reference number's leading digit.
    pub fn provision(
        id: AccountId,
        branch_id: BranchId,
        position_id: PositionId,
        number: AccountNumber,
        description: &str,
        branch_code: &str,
    ) -> LedgerResult<Self> {
        let category = AccountCategory::from_account_number(&number.reference)?;
        Ok(Self {
            id,
            branch_id,
            position_id,
            number,
            name: format!("{description} {branch_code}"),
            category,
            beginning_balance: Decimal::ZERO,
            beginning_debit: Decimal::ZERO,
            beginning_credit: Decimal::ZERO,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            enforce_funds: false,
            closed_through: None,
            active: true,
            version: 0,
        })
    }

    pub fn normal_side(&self) -> NormalSide {
        self.category.normal_side()
    }

    /// Apply a debit: bump the running debit total and recompute the balance.
    pub fn apply_debit(&mut self, amount: Decimal) {
        self.debit_total += amount;
        self.recompute_balance();
    }

    /// Apply a credit: bump the running credit total and recompute the balance.
    pub fn apply_credit(&mut self, amount: Decimal) {
        self.credit_total += amount;
        self.recompute_balance();
    }

    /// Balance this account would show after a debit of `amount`.
    pub fn balance_after_debit(&self, amount: Decimal) -> Decimal {
        self.normal_side().ending_balance(
            self.beginning_balance,
            self.debit_total + amount,
            self.credit_total,
        )
    }

    /// Balance this account would show after a credit of `amount`.
    pub fn balance_after_credit(&self, amount: Decimal) -> Decimal {
        self.normal_side().ending_balance(
            self.beginning_balance,
            self.debit_total,
            self.credit_total + amount,
        )
    }

    fn recompute_balance(&mut self) {
        self.current_balance = self.normal_side().ending_balance(
            self.beginning_balance,
            self.debit_total,
            self.credit_total,
        );
    }

    /// Invariant: the stored balance is reconstructable from its components.
    pub fn balance_invariant_holds(&self) -> bool {
        self.current_balance
            == self.normal_side().ending_balance(
                self.beginning_balance,
                self.debit_total,
                self.credit_total,
            )
    }

    /// Period close: roll the running totals into the beginning figures and
    /// record the close date, so reporting can skip the entries that are now
    /// inside the beginning balance.
    pub fn close_period(&mut self, through: NaiveDate) {
        self.beginning_balance = self.current_balance;
        self.beginning_debit += self.debit_total;
        self.beginning_credit += self.credit_total;
        self.debit_total = Decimal::ZERO;
        self.credit_total = Decimal::ZERO;
        self.closed_through = Some(through);
        self.recompute_balance();
    }

    /// Soft-mark: accounts are never deleted.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
