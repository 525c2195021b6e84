//! Storage contract for aggregated trial-balance snapshots.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use corebank_core::LedgerResult;

use crate::trial_balance::{BranchScope, TrialBalance};

/// Identity of one stored snapshot: the scope and date range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub scope: BranchScope,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SnapshotKey {
    pub fn of(trial_balance: &TrialBalance) -> Self {
        Self {
            scope: trial_balance.scope,
            from: trial_balance.from,
            to: trial_balance.to,
        }
    }
}

/// Keeps the latest trial balance per (scope, range).
///
/// Replacement is wholesale: a re-aggregation overwrites whatever was stored
/// under the same key, never merges into it.
pub trait SnapshotStore {
    fn replace(&self, trial_balance: TrialBalance) -> LedgerResult<()>;

    fn find(&self, key: &SnapshotKey) -> LedgerResult<Option<TrialBalance>>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    fn replace(&self, trial_balance: TrialBalance) -> LedgerResult<()> {
        (**self).replace(trial_balance)
    }

    fn find(&self, key: &SnapshotKey) -> LedgerResult<Option<TrialBalance>> {
        (**self).find(key)
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn replace(&self, trial_balance: TrialBalance) -> LedgerResult<()> {
        (**self).replace(trial_balance)
    }

    fn find(&self, key: &SnapshotKey) -> LedgerResult<Option<TrialBalance>> {
        (**self).find(key)
    }
}
