//! Collaborator contracts the posting core consumes.
//!
//! These are boundaries, not a persistence design: the core needs lookups,
//! a race-safe create, and an all-or-nothing commit. Implementations live
//! in `corebank-infra`.

use std::sync::Arc;

use chrono::NaiveDate;

use corebank_core::{AccountId, BranchId, EntryId, LedgerResult, PositionId};
use corebank_chart::{Account, AccountingRule, ChartPosition, EventCode};

use crate::entry::{AccountingEntry, TransactionRef};

/// Account lookups and race-safe provisioning.
pub trait AccountRepository: Send + Sync {
    fn find_by_id(&self, id: AccountId) -> Option<Account>;

    /// The (template, branch) pair is the auto-provisioning identity.
    fn find_by_position_and_branch(
        &self,
        position_id: PositionId,
        branch_id: BranchId,
    ) -> Option<Account>;

    /// Create a new account. Must enforce uniqueness on
    /// (position_id, branch_id) and fail with `Conflict` when a concurrent
    /// resolution won the race; the caller then re-fetches the winner.
    fn create(&self, account: Account) -> LedgerResult<Account>;

    /// All accounts for one branch, or the whole network when `None`.
    fn list(&self, branch_id: Option<BranchId>) -> Vec<Account>;
}

/// Read-only access to the event-code rule table.
pub trait RuleRepository: Send + Sync {
    fn find_by_event_code(&self, event_code: &EventCode) -> Option<AccountingRule>;

    fn find_position(&self, position_id: PositionId) -> Option<ChartPosition>;
}

/// Entry lookups and inserts.
pub trait EntryRepository: Send + Sync {
    /// Surviving (non-deleted) entries carrying the reference.
    fn find_by_reference(&self, reference: &TransactionRef) -> Vec<AccountingEntry>;

    /// Surviving entries with value date in `[from, to]`, optionally scoped
    /// to one branch.
    fn find_in_range(
        &self,
        branch_id: Option<BranchId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AccountingEntry>;

    /// Surviving entries with value date strictly before `before` (beginning
    /// balance reconstruction for mid-period ranges).
    fn find_before(&self, branch_id: Option<BranchId>, before: NaiveDate) -> Vec<AccountingEntry>;

    /// Flip the reconciled status flag, the only in-place entry mutation.
    fn mark_reconciled(&self, entry_id: EntryId) -> LedgerResult<()>;
}

/// Everything one transaction persists, committed atomically.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// Accounts with updated running balances. Each carries the version it
    /// was read at; the store rejects the whole batch on any stale version.
    pub accounts: Vec<Account>,
    pub entries: Vec<AccountingEntry>,
    /// External request references cleared in the same commit (e.g. a cash
    /// replenishment request).
    pub cleared_requests: Vec<String>,
}

impl CommitBatch {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.entries.is_empty() && self.cleared_requests.is_empty()
    }
}

/// All-or-nothing commit across balances + entries + downstream statuses.
pub trait UnitOfWork: Send + Sync {
    /// Commit the batch atomically. A `Conflict` means a version check
    /// failed and the caller may rebuild the batch from fresh snapshots;
    /// `Persistence` means infrastructure failure (caller-side retry with
    /// the same transaction reference is safe; the deduplicator guards it).
    fn commit(&self, batch: CommitBatch) -> LedgerResult<()>;
}

impl<S> AccountRepository for &S
where
    S: AccountRepository + ?Sized,
{
    fn find_by_id(&self, id: AccountId) -> Option<Account> {
        (**self).find_by_id(id)
    }

    fn find_by_position_and_branch(
        &self,
        position_id: PositionId,
        branch_id: BranchId,
    ) -> Option<Account> {
        (**self).find_by_position_and_branch(position_id, branch_id)
    }

    fn create(&self, account: Account) -> LedgerResult<Account> {
        (**self).create(account)
    }

    fn list(&self, branch_id: Option<BranchId>) -> Vec<Account> {
        (**self).list(branch_id)
    }
}

impl<S> RuleRepository for &S
where
    S: RuleRepository + ?Sized,
{
    fn find_by_event_code(&self, event_code: &EventCode) -> Option<AccountingRule> {
        (**self).find_by_event_code(event_code)
    }

    fn find_position(&self, position_id: PositionId) -> Option<ChartPosition> {
        (**self).find_position(position_id)
    }
}

impl<S> EntryRepository for &S
where
    S: EntryRepository + ?Sized,
{
    fn find_by_reference(&self, reference: &TransactionRef) -> Vec<AccountingEntry> {
        (**self).find_by_reference(reference)
    }

    fn find_in_range(
        &self,
        branch_id: Option<BranchId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AccountingEntry> {
        (**self).find_in_range(branch_id, from, to)
    }

    fn find_before(&self, branch_id: Option<BranchId>, before: NaiveDate) -> Vec<AccountingEntry> {
        (**self).find_before(branch_id, before)
    }

    fn mark_reconciled(&self, entry_id: EntryId) -> LedgerResult<()> {
        (**self).mark_reconciled(entry_id)
    }
}

impl<S> UnitOfWork for &S
where
    S: UnitOfWork + ?Sized,
{
    fn commit(&self, batch: CommitBatch) -> LedgerResult<()> {
        (**self).commit(batch)
    }
}

impl<S> AccountRepository for Arc<S>
where
    S: AccountRepository + ?Sized,
{
    fn find_by_id(&self, id: AccountId) -> Option<Account> {
        (**self).find_by_id(id)
    }

    fn find_by_position_and_branch(
        &self,
        position_id: PositionId,
        branch_id: BranchId,
    ) -> Option<Account> {
        (**self).find_by_position_and_branch(position_id, branch_id)
    }

    fn create(&self, account: Account) -> LedgerResult<Account> {
        (**self).create(account)
    }

    fn list(&self, branch_id: Option<BranchId>) -> Vec<Account> {
        (**self).list(branch_id)
    }
}

impl<S> RuleRepository for Arc<S>
where
    S: RuleRepository + ?Sized,
{
    fn find_by_event_code(&self, event_code: &EventCode) -> Option<AccountingRule> {
        (**self).find_by_event_code(event_code)
    }

    fn find_position(&self, position_id: PositionId) -> Option<ChartPosition> {
        (**self).find_position(position_id)
    }
}

impl<S> EntryRepository for Arc<S>
where
    S: EntryRepository + ?Sized,
{
    fn find_by_reference(&self, reference: &TransactionRef) -> Vec<AccountingEntry> {
        (**self).find_by_reference(reference)
    }

    fn find_in_range(
        &self,
        branch_id: Option<BranchId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AccountingEntry> {
        (**self).find_in_range(branch_id, from, to)
    }

    fn find_before(&self, branch_id: Option<BranchId>, before: NaiveDate) -> Vec<AccountingEntry> {
        (**self).find_before(branch_id, before)
    }

    fn mark_reconciled(&self, entry_id: EntryId) -> LedgerResult<()> {
        (**self).mark_reconciled(entry_id)
    }
}

impl<S> UnitOfWork for Arc<S>
where
    S: UnitOfWork + ?Sized,
{
    fn commit(&self, batch: CommitBatch) -> LedgerResult<()> {
        (**self).commit(batch)
    }
}
