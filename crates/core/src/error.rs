//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the ledger core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic posting/configuration failures. Callers
/// branch on the variant, never on message text: `DuplicateTransaction` and
/// the two `*NotConfigured` variants demand different operator actions, and
/// only `Persistence` is eligible for caller-side retry (guarded by the
/// deduplicator).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Transaction reference already posted; replay must not double-post.
    #[error("duplicate transaction reference: {reference}")]
    DuplicateTransaction { reference: String },

    /// No accounting rule row exists for the event code.
    #[error("no accounting rule configured for event code: {event_code}")]
    RuleNotConfigured { event_code: String },

    /// A rule exists but names no active determination account template.
    #[error("no determination account configured on rule for event code: {event_code}")]
    AccountNotConfigured { event_code: String },

    /// The produced entry batch does not satisfy the double-entry rule.
    #[error("imbalanced entries for {reference}: debits {debit_total}, credits {credit_total}")]
    ImbalancedEntries {
        reference: String,
        debit_total: Decimal,
        credit_total: Decimal,
    },

    /// A funds-enforced account would go negative.
    #[error("insufficient balance on account {account_number}: available {available}, required {required}")]
    InsufficientBalance {
        account_number: String,
        available: Decimal,
        required: Decimal,
    },

    /// A value failed validation (e.g. malformed event code, non-positive amount).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (e.g. stale account version / duplicate creation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A downstream request (e.g. a cash replenishment) was already cleared
    /// by an earlier commit. Permanent: replaying the attempt cannot succeed.
    #[error("request already cleared: {request}")]
    RequestAlreadyCleared { request: String },

    /// Commit/transport failure. Retryable by the caller with the same
    /// transaction reference.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn duplicate(reference: impl Into<String>) -> Self {
        Self::DuplicateTransaction {
            reference: reference.into(),
        }
    }

    pub fn request_already_cleared(request: impl Into<String>) -> Self {
        Self::RequestAlreadyCleared {
            request: request.into(),
        }
    }

    /// Whether the caller may retry the operation with the same reference.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Whether the failure requires administrator action on the chart setup.
    pub fn is_configuration_gap(&self) -> bool {
        matches!(
            self,
            Self::RuleNotConfigured { .. } | Self::AccountNotConfigured { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn retryability_is_limited_to_persistence_failures() {
        assert!(LedgerError::persistence("socket closed").is_retryable());
        assert!(!LedgerError::duplicate("TXN-1").is_retryable());
        assert!(!LedgerError::request_already_cleared("REQ-55").is_retryable());
        assert!(
            !LedgerError::ImbalancedEntries {
                reference: "TXN-1".into(),
                debit_total: dec!(10),
                credit_total: dec!(9),
            }
            .is_retryable()
        );
    }

    #[test]
    fn configuration_gaps_are_distinguished_from_missing_rules() {
        let no_rule = LedgerError::RuleNotConfigured {
            event_code: "SAV001@Principal_Saving_Account".into(),
        };
        let no_account = LedgerError::AccountNotConfigured {
            event_code: "SAV001@Principal_Saving_Account".into(),
        };
        assert!(no_rule.is_configuration_gap());
        assert!(no_account.is_configuration_gap());
        assert_ne!(no_rule, no_account);
    }

    #[test]
    fn error_display_carries_diagnostic_context() {
        let err = LedgerError::InsufficientBalance {
            account_number: "571100042001".into(),
            available: dec!(500),
            required: dec!(1000),
        };
        let msg = err.to_string();
        assert!(msg.contains("571100042001"));
        assert!(msg.contains("500"));
        assert!(msg.contains("1000"));
    }
}
