//! Double-entry invariant check over a transaction's full entry batch.

use rust_decimal::Decimal;

use corebank_core::{LedgerError, LedgerResult};

use crate::entry::AccountingEntry;

pub struct DoubleEntryValidator;

impl DoubleEntryValidator {
    /// Σdebits must equal Σcredits over the whole batch, and a balanced
    /// transaction needs at least two entries. Runs after all legs are
    /// generated and before commit; failure signals a configuration defect,
    /// not a retryable condition.
    pub fn validate(entries: &[AccountingEntry]) -> LedgerResult<()> {
        let reference = entries
            .first()
            .map(|e| e.reference.as_str().to_string())
            .unwrap_or_default();

        if entries.len() < 2 {
            tracing::warn!(%reference, count = entries.len(), "single-leg transaction cannot balance");
            return Err(LedgerError::ImbalancedEntries {
                reference,
                debit_total: entries.iter().map(|e| e.debit).sum(),
                credit_total: entries.iter().map(|e| e.credit).sum(),
            });
        }

        let debit_total: Decimal = entries.iter().map(|e| e.debit).sum();
        let credit_total: Decimal = entries.iter().map(|e| e.credit).sum();

        if debit_total != credit_total {
            tracing::warn!(
                %reference,
                %debit_total,
                %credit_total,
                "imbalanced entry batch rejected"
            );
            return Err(LedgerError::ImbalancedEntries {
                reference,
                debit_total,
                credit_total,
            });
        }

        Ok(())
    }
}
