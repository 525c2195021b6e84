//! The cash-movement primitive: one balanced entry per leg.

use std::collections::HashMap;

use rust_decimal::Decimal;

use corebank_core::{AccountId, LedgerError, LedgerResult};
use corebank_chart::Account;

use crate::entry::{AccountingEntry, EntryDraft};

/// In-memory snapshots of every account one transaction touches.
///
/// Legs mutate the working copies, never the store, so N legs on the same
/// account accumulate correctly and nothing persists before the unit of
/// work commits. Each copy keeps the version it was read at for the
/// store's optimistic check.
#[derive(Debug, Default)]
pub struct WorkingSet {
    accounts: HashMap<AccountId, Account>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot; a later insert of the same account is ignored (the
    /// first snapshot read is the one the version check must be against).
    pub fn admit(&mut self, account: Account) {
        self.accounts.entry(account.id).or_insert(account);
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    fn get_mut(&mut self, id: AccountId) -> LedgerResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(format!("account {id} not in working set")))
    }

    /// Drain the mutated snapshots for the commit batch.
    pub fn into_accounts(self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.into_values().collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }
}

/// One leg to post: which accounts, how much, and the shared entry fields.
#[derive(Debug, Clone)]
pub struct LegRequest {
    pub debit_account: AccountId,
    pub credit_account: AccountId,
    pub amount: Decimal,
    pub draft: EntryDraft,
}

/// Produces exactly one debit and one credit entry per leg and applies the
/// movement to the working copies of both accounts.
pub struct PostingEngine;

impl PostingEngine {
    /// Post one leg.
    ///
    /// Preconditions: `amount > 0`, distinct resolved accounts, both present
    /// in the working set. Funds enforcement rejects the leg before either
    /// side is applied, so a failed leg leaves the working set untouched.
    pub fn post(leg: &LegRequest, working: &mut WorkingSet) -> LedgerResult<Vec<AccountingEntry>> {
        if leg.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "posting amount must be positive, got {}",
                leg.amount
            )));
        }
        if leg.debit_account == leg.credit_account {
            return Err(LedgerError::validation(
                "a leg cannot debit and credit the same account",
            ));
        }

        Self::ensure_funds(working, leg)?;

        let (debit_branch, debit_balance_after) = {
            let account = working.get_mut(leg.debit_account)?;
            account.apply_debit(leg.amount);
            (account.branch_id, account.current_balance)
        };
        let (credit_branch, credit_balance_after) = {
            let account = working.get_mut(leg.credit_account)?;
            account.apply_credit(leg.amount);
            (account.branch_id, account.current_balance)
        };

        Ok(vec![
            AccountingEntry::debit_line(
                &leg.draft,
                leg.debit_account,
                debit_branch,
                leg.amount,
                debit_balance_after,
            ),
            AccountingEntry::credit_line(
                &leg.draft,
                leg.credit_account,
                credit_branch,
                leg.amount,
                credit_balance_after,
            ),
        ])
    }

    /// Reject the leg when a funds-enforced account would go negative.
    /// Checked on both sides: a credit drains a debit-normal account and a
    /// debit drains a credit-normal one.
    fn ensure_funds(working: &WorkingSet, leg: &LegRequest) -> LedgerResult<()> {
        let debit_side = working
            .get(leg.debit_account)
            .ok_or_else(|| LedgerError::not_found("debit account not in working set"))?;
        let credit_side = working
            .get(leg.credit_account)
            .ok_or_else(|| LedgerError::not_found("credit account not in working set"))?;

        for (account, projected) in [
            (debit_side, debit_side.balance_after_debit(leg.amount)),
            (credit_side, credit_side.balance_after_credit(leg.amount)),
        ] {
            if account.enforce_funds && projected < Decimal::ZERO {
                return Err(LedgerError::InsufficientBalance {
                    account_number: account.number.network.clone(),
                    available: account.current_balance,
                    required: leg.amount,
                });
            }
        }
        Ok(())
    }
}
