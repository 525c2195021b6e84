//! Accounting entries: immutable ledger lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_core::{AccountId, BranchId, Entity, EntryId, LedgerError, LedgerResult};

/// External transaction reference: the idempotency key shared by every
/// entry of one logical transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    pub fn new(reference: impl Into<String>) -> LedgerResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(LedgerError::validation(
                "transaction reference must not be blank",
            ));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ledger line. Carries a debit amount XOR a credit amount; the other
/// column is zero. Never updated in place once committed; corrections are
/// reversing entries. `reconciled` is the single status flag downstream
/// clearing workflows may flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    /// Branch owning the account this line posts against. For cross-branch
    /// movements the two lines of a bridge leg land in different books.
    pub branch_id: BranchId,
    /// Counterparty branch for cross-branch movements.
    pub external_branch_id: Option<BranchId>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub value_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub narrative: String,
    pub reference: TransactionRef,
    pub counterparty_reference: Option<String>,
    /// Name of the originating semantic command (audit trail).
    pub command: String,
    /// Account balance immediately after this entry was applied.
    pub balance_after: Decimal,
    pub reconciled: bool,
    pub deleted: bool,
}

/// Shared fields of the two entries one posting-engine call emits. The
/// branch is not shared: each line is stamped with the branch of the
/// account it posts against.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub external_branch_id: Option<BranchId>,
    pub value_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub narrative: String,
    pub reference: TransactionRef,
    pub counterparty_reference: Option<String>,
    pub command: String,
}

impl AccountingEntry {
    pub fn debit_line(
        draft: &EntryDraft,
        account_id: AccountId,
        branch_id: BranchId,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self::line(draft, account_id, branch_id, amount, Decimal::ZERO, balance_after)
    }

    pub fn credit_line(
        draft: &EntryDraft,
        account_id: AccountId,
        branch_id: BranchId,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self::line(draft, account_id, branch_id, Decimal::ZERO, amount, balance_after)
    }

    fn line(
        draft: &EntryDraft,
        account_id: AccountId,
        branch_id: BranchId,
        debit: Decimal,
        credit: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self {
            id: EntryId::new(),
            account_id,
            branch_id,
            external_branch_id: draft.external_branch_id,
            debit,
            credit,
            value_date: draft.value_date,
            entry_date: draft.entry_date,
            narrative: draft.narrative.clone(),
            reference: draft.reference.clone(),
            counterparty_reference: draft.counterparty_reference.clone(),
            command: draft.command.clone(),
            balance_after,
            reconciled: false,
            deleted: false,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.debit > Decimal::ZERO
    }

    /// The non-zero column.
    pub fn amount(&self) -> Decimal {
        if self.is_debit() { self.debit } else { self.credit }
    }

    /// Signed movement from the account's point of view: debits positive.
    pub fn signed_movement(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Surviving entries participate in dedup lookups and aggregation.
    pub fn survives(&self) -> bool {
        !self.deleted
    }
}

impl Entity for AccountingEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
