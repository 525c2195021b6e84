//! Balance aggregation: trial balances and balance sheets.
//!
//! Aggregation reads committed accounts and entries, recomputes reporting
//! snapshots from scratch, and replaces any prior snapshot for the same
//! scope and range wholesale, so re-running is always safe.

pub mod aggregator;
pub mod balance_sheet;
pub mod snapshot;
pub mod trial_balance;

pub use aggregator::BalanceAggregator;
pub use balance_sheet::{
    BalanceSheet, BalanceSheetAccount, BalanceSheetSection, CorrespondingMapping, MappingTable,
};
pub use snapshot::{SnapshotKey, SnapshotStore};
pub use trial_balance::{BranchScope, TrialBalance, TrialBalanceRow, TrialBalanceTotals};
