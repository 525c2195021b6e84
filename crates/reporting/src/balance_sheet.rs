//! Balance-sheet production from a trial balance.
//!
//! The corresponding-mapping table folds many trial-balance rows into one
//! balance-sheet bucket by chart reference code. Each bucket nets a gross
//! value against an offsetting exception value and a provision value, and
//! is classified into the asset side or the liability-and-equity side.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_core::{LedgerError, LedgerResult};

use crate::trial_balance::TrialBalance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSheetSection {
    Assets,
    LiabilitiesAndEquity,
}

/// One row of the corresponding-mapping table: which chart reference codes
/// feed a bucket's gross, exception and provision values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondingMapping {
    pub bucket: String,
    pub label: String,
    pub section: BalanceSheetSection,
    pub gross: Vec<String>,
    pub exception: Vec<String>,
    pub provision: Vec<String>,
}

impl CorrespondingMapping {
    pub fn new(
        bucket: impl Into<String>,
        label: impl Into<String>,
        section: BalanceSheetSection,
        gross: Vec<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            label: label.into(),
            section,
            gross,
            exception: Vec::new(),
            provision: Vec::new(),
        }
    }

    pub fn with_exception(mut self, references: Vec<String>) -> Self {
        self.exception = references;
        self
    }

    pub fn with_provision(mut self, references: Vec<String>) -> Self {
        self.provision = references;
        self
    }
}

/// The mapping table. Bucket codes are unique; a chart reference may feed
/// more than one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    rows: Vec<CorrespondingMapping>,
}

impl MappingTable {
    pub fn new(rows: Vec<CorrespondingMapping>) -> LedgerResult<Self> {
        for (i, row) in rows.iter().enumerate() {
            if rows[..i].iter().any(|r| r.bucket == row.bucket) {
                return Err(LedgerError::validation(format!(
                    "duplicate balance-sheet bucket code {:?}",
                    row.bucket
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CorrespondingMapping] {
        &self.rows
    }
}

/// One produced balance-sheet line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetAccount {
    pub bucket: String,
    pub label: String,
    pub section: BalanceSheetSection,
    pub gross: Decimal,
    pub exception: Decimal,
    pub provision: Decimal,
    /// gross − exception − provision.
    pub net: Decimal,
}

/// A produced balance sheet for one trial-balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub assets: Vec<BalanceSheetAccount>,
    pub liabilities_and_equity: Vec<BalanceSheetAccount>,
}

impl BalanceSheet {
    /// Fold a trial balance through the mapping table.
    ///
    /// Recomputed wholesale, like the trial balance it derives from.
    pub fn produce(table: &MappingTable, trial_balance: &TrialBalance) -> Self {
        let mut assets = Vec::new();
        let mut liabilities_and_equity = Vec::new();

        for mapping in table.rows() {
            let gross = Self::sum_references(trial_balance, &mapping.gross);
            let exception = Self::sum_references(trial_balance, &mapping.exception);
            let provision = Self::sum_references(trial_balance, &mapping.provision);

            let account = BalanceSheetAccount {
                bucket: mapping.bucket.clone(),
                label: mapping.label.clone(),
                section: mapping.section,
                gross,
                exception,
                provision,
                net: gross - exception - provision,
            };
            match mapping.section {
                BalanceSheetSection::Assets => assets.push(account),
                BalanceSheetSection::LiabilitiesAndEquity => {
                    liabilities_and_equity.push(account)
                }
            }
        }

        Self {
            assets,
            liabilities_and_equity,
        }
    }

    pub fn total_assets(&self) -> Decimal {
        self.assets.iter().map(|a| a.net).sum()
    }

    pub fn total_liabilities_and_equity(&self) -> Decimal {
        self.liabilities_and_equity.iter().map(|a| a.net).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_assets() == self.total_liabilities_and_equity()
    }

    fn sum_references(trial_balance: &TrialBalance, references: &[String]) -> Decimal {
        trial_balance
            .rows
            .iter()
            .filter(|row| references.iter().any(|r| *r == row.reference))
            .map(|row| row.ending_balance)
            .sum()
    }
}
