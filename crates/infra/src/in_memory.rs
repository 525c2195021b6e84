use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use corebank_core::{AccountId, BranchId, EntryId, LedgerError, LedgerResult, PositionId};
use corebank_chart::{Account, AccountingRule, ChartPosition, EventCode};
use corebank_posting::{
    AccountRepository, AccountingEntry, CommitBatch, EntryRepository, RuleRepository,
    TransactionRef, UnitOfWork,
};
use corebank_reporting::{SnapshotKey, SnapshotStore, TrialBalance};

use chrono::NaiveDate;

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    /// Auto-provisioning identity index.
    by_identity: HashMap<(PositionId, BranchId), AccountId>,
    entries: Vec<AccountingEntry>,
    rules: HashMap<EventCode, AccountingRule>,
    positions: HashMap<PositionId, ChartPosition>,
    cleared_requests: HashSet<String>,
}

/// In-memory ledger store behind one `RwLock`.
///
/// Intended for tests/dev. Commit is atomic by construction: version checks
/// run against every account in the batch before anything is applied, all
/// under the single write lock.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_position(&self, position: ChartPosition) -> LedgerResult<()> {
        let mut state = self.write()?;
        state.positions.insert(position.id, position);
        Ok(())
    }

    pub fn insert_rule(&self, rule: AccountingRule) -> LedgerResult<()> {
        let mut state = self.write()?;
        state.rules.insert(rule.event_code.clone(), rule);
        Ok(())
    }

    /// Seed an account directly, bypassing auto-provisioning. Used to load
    /// opening balances.
    pub fn insert_account(&self, account: Account) -> LedgerResult<()> {
        let mut state = self.write()?;
        state
            .by_identity
            .insert((account.position_id, account.branch_id), account.id);
        state.accounts.insert(account.id, account);
        Ok(())
    }

    pub fn request_is_cleared(&self, request_reference: &str) -> bool {
        self.state
            .read()
            .map(|s| s.cleared_requests.contains(request_reference))
            .unwrap_or(false)
    }

    fn write(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::persistence("ledger lock poisoned"))
    }

    fn read(&self) -> Option<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state.read().ok()
    }
}

impl AccountRepository for InMemoryLedger {
    fn find_by_id(&self, id: AccountId) -> Option<Account> {
        self.read()?.accounts.get(&id).cloned()
    }

    fn find_by_position_and_branch(
        &self,
        position_id: PositionId,
        branch_id: BranchId,
    ) -> Option<Account> {
        let state = self.read()?;
        let id = state.by_identity.get(&(position_id, branch_id))?;
        state.accounts.get(id).cloned()
    }

    fn create(&self, account: Account) -> LedgerResult<Account> {
        let mut state = self.write()?;
        let identity = (account.position_id, account.branch_id);
        if state.by_identity.contains_key(&identity) {
            return Err(LedgerError::conflict(format!(
                "account already provisioned for position {} at branch {}",
                account.position_id, account.branch_id
            )));
        }
        state.by_identity.insert(identity, account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn list(&self, branch_id: Option<BranchId>) -> Vec<Account> {
        let Some(state) = self.read() else {
            return Vec::new();
        };
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| branch_id.is_none_or(|b| a.branch_id == b))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.number.network.cmp(&b.number.network));
        accounts
    }
}

impl RuleRepository for InMemoryLedger {
    fn find_by_event_code(&self, event_code: &EventCode) -> Option<AccountingRule> {
        self.read()?.rules.get(event_code).cloned()
    }

    fn find_position(&self, position_id: PositionId) -> Option<ChartPosition> {
        self.read()?.positions.get(&position_id).cloned()
    }
}

impl EntryRepository for InMemoryLedger {
    fn find_by_reference(&self, reference: &TransactionRef) -> Vec<AccountingEntry> {
        let Some(state) = self.read() else {
            return Vec::new();
        };
        state
            .entries
            .iter()
            .filter(|e| e.survives() && e.reference == *reference)
            .cloned()
            .collect()
    }

    fn find_in_range(
        &self,
        branch_id: Option<BranchId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AccountingEntry> {
        let Some(state) = self.read() else {
            return Vec::new();
        };
        state
            .entries
            .iter()
            .filter(|e| {
                e.survives()
                    && e.value_date >= from
                    && e.value_date <= to
                    && branch_id.is_none_or(|b| e.branch_id == b)
            })
            .cloned()
            .collect()
    }

    fn find_before(&self, branch_id: Option<BranchId>, before: NaiveDate) -> Vec<AccountingEntry> {
        let Some(state) = self.read() else {
            return Vec::new();
        };
        state
            .entries
            .iter()
            .filter(|e| {
                e.survives()
                    && e.value_date < before
                    && branch_id.is_none_or(|b| e.branch_id == b)
            })
            .cloned()
            .collect()
    }

    fn mark_reconciled(&self, entry_id: EntryId) -> LedgerResult<()> {
        let mut state = self.write()?;
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| LedgerError::not_found(format!("entry {entry_id}")))?;
        entry.reconciled = true;
        Ok(())
    }
}

impl UnitOfWork for InMemoryLedger {
    fn commit(&self, batch: CommitBatch) -> LedgerResult<()> {
        let mut state = self.write()?;

        // Check everything before touching anything.
        for account in &batch.accounts {
            let stored = state.accounts.get(&account.id).ok_or_else(|| {
                LedgerError::persistence(format!("account {} vanished", account.id))
            })?;
            if stored.version != account.version {
                return Err(LedgerError::conflict(format!(
                    "account {} version {} does not match stored {}",
                    account.number.network, account.version, stored.version
                )));
            }
        }
        // A repeated clearing is a permanent failure, not a version race:
        // replaying the attempt would clear the same request twice.
        for request in &batch.cleared_requests {
            if state.cleared_requests.contains(request) {
                return Err(LedgerError::request_already_cleared(request.clone()));
            }
        }

        let (accounts, entries) = (batch.accounts.len(), batch.entries.len());
        for account in batch.accounts {
            let mut updated = account;
            updated.version += 1;
            state.accounts.insert(updated.id, updated);
        }
        state.entries.extend(batch.entries);
        state.cleared_requests.extend(batch.cleared_requests);

        tracing::debug!(accounts, entries, "batch committed");
        Ok(())
    }
}

/// Latest trial balance per (scope, range), replaced wholesale.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<SnapshotKey, TrialBalance>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn replace(&self, trial_balance: TrialBalance) -> LedgerResult<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| LedgerError::persistence("snapshot lock poisoned"))?;
        snapshots.insert(SnapshotKey::of(&trial_balance), trial_balance);
        Ok(())
    }

    fn find(&self, key: &SnapshotKey) -> LedgerResult<Option<TrialBalance>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| LedgerError::persistence("snapshot lock poisoned"))?;
        Ok(snapshots.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebank_chart::AccountNumberingScheme;
    use rust_decimal_macros::dec;

    fn scheme() -> AccountNumberingScheme {
        AccountNumberingScheme::new("10005", 5, 3).unwrap()
    }

    fn provisioned(position_id: PositionId, branch_id: BranchId, template: &str) -> Account {
        let number = scheme().derive(template, "00042", 1);
        Account::provision(
            AccountId::new(),
            branch_id,
            position_id,
            number,
            "Test account",
            "00042",
        )
        .unwrap()
    }

    #[test]
    fn create_enforces_identity_uniqueness() {
        let ledger = InMemoryLedger::new();
        let position_id = PositionId::new();
        let branch_id = BranchId::new();

        ledger
            .create(provisioned(position_id, branch_id, "371050"))
            .unwrap();
        let err = ledger
            .create(provisioned(position_id, branch_id, "371050"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
        assert_eq!(ledger.list(Some(branch_id)).len(), 1);
    }

    #[test]
    fn commit_rejects_stale_versions_without_applying_anything() {
        let ledger = InMemoryLedger::new();
        let account = provisioned(PositionId::new(), BranchId::new(), "371050");
        let ledger_account = ledger.create(account).unwrap();

        let mut fresh = ledger_account.clone();
        fresh.apply_debit(dec!(100));
        ledger
            .commit(CommitBatch {
                accounts: vec![fresh],
                ..CommitBatch::default()
            })
            .unwrap();

        // Replay the same snapshot: its version is now stale.
        let mut stale = ledger_account;
        stale.apply_debit(dec!(999));
        let err = ledger
            .commit(CommitBatch {
                accounts: vec![stale],
                ..CommitBatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        let stored = ledger.list(None).remove(0);
        assert_eq!(stored.current_balance, dec!(100));
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn commit_clears_each_request_exactly_once() {
        let ledger = InMemoryLedger::new();
        ledger
            .commit(CommitBatch {
                cleared_requests: vec!["REQ-77".to_string()],
                ..CommitBatch::default()
            })
            .unwrap();
        assert!(ledger.request_is_cleared("REQ-77"));

        let err = ledger
            .commit(CommitBatch {
                cleared_requests: vec!["REQ-77".to_string()],
                ..CommitBatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::RequestAlreadyCleared { .. }));
        assert!(!err.is_retryable());
    }
}
