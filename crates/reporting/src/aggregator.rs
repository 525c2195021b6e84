//! The balance aggregation fold.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use corebank_core::{AccountId, LedgerError, LedgerResult};
use corebank_posting::{AccountingEntry, AccountRepository, EntryRepository};

use crate::snapshot::SnapshotStore;
use crate::trial_balance::{BranchScope, TrialBalance, TrialBalanceRow, TrialBalanceTotals};

/// Per-account debit/credit sums over some entry slice.
#[derive(Debug, Default, Clone, Copy)]
struct Movement {
    debit: Decimal,
    credit: Decimal,
}

impl Movement {
    fn absorb(&mut self, entry: &AccountingEntry) {
        self.debit += entry.debit;
        self.credit += entry.credit;
    }
}

/// Folds committed accounts and entries into trial balances.
///
/// Pure recomputation: the aggregator never maintains incremental state, so
/// a re-run for the same scope/range produces (and replaces) the same
/// snapshot. The beginning balance of each row is the stored period-close
/// beginning plus the signed movement of entries dated before the range
/// start, applying the same normal-side rule as the posting engine.
pub struct BalanceAggregator<S> {
    store: S,
}

impl<S> BalanceAggregator<S>
where
    S: AccountRepository + EntryRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Build the trial balance for `scope` over `[from, to]`.
    pub fn aggregate(
        &self,
        scope: BranchScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<TrialBalance> {
        if from > to {
            return Err(LedgerError::validation(format!(
                "aggregation range start {from} is after its end {to}"
            )));
        }

        let filter = scope.branch_filter();
        let accounts = self.store.list(filter);

        // Entries dated on or before an account's period close already live
        // inside its stored beginning balance; folding them again would
        // double-count.
        let closed_through: HashMap<AccountId, NaiveDate> = accounts
            .iter()
            .filter_map(|a| a.closed_through.map(|d| (a.id, d)))
            .collect();
        let pre_range = Self::movements(
            self.store
                .find_before(filter, from)
                .into_iter()
                .filter(|e| {
                    closed_through
                        .get(&e.account_id)
                        .is_none_or(|closed| e.value_date > *closed)
                })
                .collect(),
        );
        let in_range = Self::movements(self.store.find_in_range(filter, from, to));

        let mut rows = Vec::with_capacity(accounts.len());
        let mut totals = TrialBalanceTotals::default();

        for account in &accounts {
            let side = account.normal_side();
            let pre = pre_range.get(&account.id).copied().unwrap_or_default();
            let period = in_range.get(&account.id).copied().unwrap_or_default();

            let beginning =
                side.ending_balance(account.beginning_balance, pre.debit, pre.credit);
            let ending = side.ending_balance(beginning, period.debit, period.credit);

            let row = TrialBalanceRow {
                account_number: account.number.network.clone(),
                account_name: account.name.clone(),
                reference: account.number.reference.clone(),
                branch_id: account.branch_id,
                beginning_balance: beginning,
                period_debit: period.debit,
                period_credit: period.credit,
                ending_balance: ending,
                normal_side: side,
            };
            totals.accumulate(&row);
            rows.push(row);
        }

        rows.sort_by(|a, b| a.account_number.cmp(&b.account_number));

        tracing::info!(
            ?scope,
            %from,
            %to,
            rows = rows.len(),
            "trial balance aggregated"
        );

        Ok(TrialBalance {
            scope,
            from,
            to,
            rows,
            totals,
        })
    }

    /// Aggregate and replace the stored snapshot for (scope, range).
    pub fn aggregate_into<Snap>(
        &self,
        snapshots: &Snap,
        scope: BranchScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<TrialBalance>
    where
        Snap: SnapshotStore,
    {
        let trial_balance = self.aggregate(scope, from, to)?;
        snapshots.replace(trial_balance.clone())?;
        Ok(trial_balance)
    }

    fn movements(entries: Vec<AccountingEntry>) -> HashMap<AccountId, Movement> {
        let mut by_account: HashMap<AccountId, Movement> = HashMap::new();
        for entry in entries.iter().filter(|e| e.survives()) {
            by_account.entry(entry.account_id).or_default().absorb(entry);
        }
        by_account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    use chrono::Utc;
    use corebank_core::{BranchId, EntryId, PositionId};
    use corebank_chart::{Account, AccountNumberingScheme};
    use corebank_posting::{AccountingEntry, EntryDraft, TransactionRef};
    use rust_decimal_macros::dec;

    /// Minimal fixed-content store for aggregation tests.
    struct FixedBook {
        accounts: Vec<Account>,
        entries: RwLock<Vec<AccountingEntry>>,
    }

    impl AccountRepository for FixedBook {
        fn find_by_id(&self, id: AccountId) -> Option<Account> {
            self.accounts.iter().find(|a| a.id == id).cloned()
        }

        fn find_by_position_and_branch(
            &self,
            position_id: PositionId,
            branch_id: BranchId,
        ) -> Option<Account> {
            self.accounts
                .iter()
                .find(|a| a.position_id == position_id && a.branch_id == branch_id)
                .cloned()
        }

        fn create(&self, _account: Account) -> LedgerResult<Account> {
            unimplemented!("aggregation tests never provision")
        }

        fn list(&self, branch_id: Option<BranchId>) -> Vec<Account> {
            self.accounts
                .iter()
                .filter(|a| branch_id.is_none_or(|b| a.branch_id == b))
                .cloned()
                .collect()
        }
    }

    impl EntryRepository for FixedBook {
        fn find_by_reference(&self, reference: &TransactionRef) -> Vec<AccountingEntry> {
            self.entries
                .read()
                .unwrap()
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
            self.entries
                .read()
                .unwrap()
                .iter()
                .filter(|e| {
                    e.survives()
                        && branch_id.is_none_or(|b| e.branch_id == b)
                        && e.value_date >= from
                        && e.value_date <= to
                })
                .cloned()
                .collect()
        }

        fn find_before(
            &self,
            branch_id: Option<BranchId>,
            before: NaiveDate,
        ) -> Vec<AccountingEntry> {
            self.entries
                .read()
                .unwrap()
                .iter()
                .filter(|e| {
                    e.survives()
                        && branch_id.is_none_or(|b| e.branch_id == b)
                        && e.value_date < before
                })
                .cloned()
                .collect()
        }

        fn mark_reconciled(&self, _entry_id: EntryId) -> LedgerResult<()> {
            unimplemented!("aggregation tests never reconcile")
        }
    }

    fn account(branch_id: BranchId, template: &str, beginning: Decimal) -> Account {
        let scheme = AccountNumberingScheme::new("10005", 5, 3).unwrap();
        let mut account = Account::provision(
            AccountId::new(),
            branch_id,
            PositionId::new(),
            scheme.derive(template, "001", 1),
            "Test",
            "001",
        )
        .unwrap();
        account.beginning_balance = beginning;
        account.current_balance = beginning;
        account
    }

    fn entry(
        account_id: AccountId,
        branch_id: BranchId,
        value_date: NaiveDate,
        debit: Decimal,
        credit: Decimal,
    ) -> AccountingEntry {
        let draft = EntryDraft {
            external_branch_id: None,
            value_date,
            entry_date: Utc::now(),
            narrative: "seed".into(),
            reference: TransactionRef::new(format!("SEED-{account_id}")).unwrap(),
            counterparty_reference: None,
            command: "Transfer".into(),
        };
        if debit > Decimal::ZERO {
            AccountingEntry::debit_line(&draft, account_id, branch_id, debit, Decimal::ZERO)
        } else {
            AccountingEntry::credit_line(&draft, account_id, branch_id, credit, Decimal::ZERO)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_entries_in_range_keeps_ending_equal_to_beginning() {
        let branch = BranchId::new();
        let teller = account(branch, "371050", dec!(50_000));
        let savings = account(branch, "451020", dec!(12_000));
        let book = FixedBook {
            accounts: vec![teller, savings],
            entries: RwLock::new(Vec::new()),
        };

        let tb = BalanceAggregator::new(&book)
            .aggregate(BranchScope::Branch(branch), date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();

        assert_eq!(tb.rows.len(), 2);
        for row in &tb.rows {
            assert_eq!(row.ending_balance, row.beginning_balance);
            assert_eq!(row.period_debit, Decimal::ZERO);
            assert_eq!(row.period_credit, Decimal::ZERO);
        }
        assert_eq!(tb.totals.beginning_balance, dec!(62_000));
        assert_eq!(tb.totals.ending_balance, dec!(62_000));
    }

    #[test]
    fn pre_range_entries_move_the_beginning_balance() {
        let branch = BranchId::new();
        let teller = account(branch, "371050", dec!(50_000));
        let teller_id = teller.id;
        let book = FixedBook {
            accounts: vec![teller],
            entries: RwLock::new(vec![
                // Before the range: 10,000 debit.
                entry(teller_id, branch, date(2026, 2, 10), dec!(10_000), Decimal::ZERO),
                // In range: 4,000 credit.
                entry(teller_id, branch, date(2026, 3, 5), Decimal::ZERO, dec!(4_000)),
            ]),
        };

        let tb = BalanceAggregator::new(&book)
            .aggregate(BranchScope::Branch(branch), date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();

        let row = &tb.rows[0];
        assert_eq!(row.beginning_balance, dec!(60_000));
        assert_eq!(row.period_credit, dec!(4_000));
        assert_eq!(row.ending_balance, dec!(56_000));
    }

    #[test]
    fn credit_normal_rows_use_the_mirrored_rule() {
        let branch = BranchId::new();
        let savings = account(branch, "451020", dec!(1_000));
        let savings_id = savings.id;
        let book = FixedBook {
            accounts: vec![savings],
            entries: RwLock::new(vec![
                entry(savings_id, branch, date(2026, 3, 2), Decimal::ZERO, dec!(500)),
                entry(savings_id, branch, date(2026, 3, 9), dec!(200), Decimal::ZERO),
            ]),
        };

        let tb = BalanceAggregator::new(&book)
            .aggregate(BranchScope::Branch(branch), date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();

        let row = &tb.rows[0];
        // beginning + credits − debits for a liability.
        assert_eq!(row.ending_balance, dec!(1_300));
    }

    #[test]
    fn closed_entries_are_not_counted_on_top_of_the_beginning_balance() {
        let branch = BranchId::new();
        let mut teller = account(branch, "371050", Decimal::ZERO);
        let teller_id = teller.id;

        // March activity, then a close: the 10,000 rolls into the beginning
        // figures but its entry stays in the book.
        teller.apply_debit(dec!(10_000));
        teller.close_period(date(2026, 3, 31));
        assert_eq!(teller.beginning_balance, dec!(10_000));

        let book = FixedBook {
            accounts: vec![teller],
            entries: RwLock::new(vec![
                entry(teller_id, branch, date(2026, 3, 10), dec!(10_000), Decimal::ZERO),
                entry(teller_id, branch, date(2026, 4, 6), dec!(2_000), Decimal::ZERO),
            ]),
        };

        let tb = BalanceAggregator::new(&book)
            .aggregate(BranchScope::Branch(branch), date(2026, 4, 1), date(2026, 4, 30))
            .unwrap();

        let row = &tb.rows[0];
        assert_eq!(row.beginning_balance, dec!(10_000));
        assert_eq!(row.period_debit, dec!(2_000));
        assert_eq!(row.ending_balance, dec!(12_000));
    }

    #[test]
    fn consolidated_scope_rolls_up_every_branch() {
        let branch_a = BranchId::new();
        let branch_b = BranchId::new();
        let book = FixedBook {
            accounts: vec![
                account(branch_a, "371050", dec!(10_000)),
                account(branch_b, "371050", dec!(25_000)),
            ],
            entries: RwLock::new(Vec::new()),
        };
        let aggregator = BalanceAggregator::new(&book);

        let consolidated = aggregator
            .aggregate(BranchScope::All, date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();
        assert_eq!(consolidated.rows.len(), 2);
        assert_eq!(consolidated.totals.beginning_balance, dec!(35_000));

        let only_a = aggregator
            .aggregate(BranchScope::Branch(branch_a), date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();
        assert_eq!(only_a.rows.len(), 1);
        assert_eq!(only_a.totals.beginning_balance, dec!(10_000));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let book = FixedBook {
            accounts: Vec::new(),
            entries: RwLock::new(Vec::new()),
        };
        let err = BalanceAggregator::new(&book)
            .aggregate(BranchScope::All, date(2026, 4, 1), date(2026, 3, 1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn deleted_entries_are_excluded_from_the_fold() {
        let branch = BranchId::new();
        let teller = account(branch, "371050", Decimal::ZERO);
        let teller_id = teller.id;
        let mut dead = entry(teller_id, branch, date(2026, 3, 5), dec!(7_000), Decimal::ZERO);
        dead.deleted = true;
        let book = FixedBook {
            accounts: vec![teller],
            entries: RwLock::new(vec![dead]),
        };

        let tb = BalanceAggregator::new(&book)
            .aggregate(BranchScope::Branch(branch), date(2026, 3, 1), date(2026, 3, 31))
            .unwrap();
        assert_eq!(tb.rows[0].ending_balance, Decimal::ZERO);
    }
}
