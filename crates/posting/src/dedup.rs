//! Transaction-reference idempotency boundary.

use corebank_core::{LedgerError, LedgerResult};

use crate::entry::TransactionRef;
use crate::repository::EntryRepository;

/// Rejects re-posting of an already-processed transaction reference.
///
/// Runs before any resolution or posting work so a rejected duplicate causes
/// no provisioning side effects.
pub struct Deduplicator<'a, E> {
    entries: &'a E,
}

impl<'a, E> Deduplicator<'a, E>
where
    E: EntryRepository,
{
    pub fn new(entries: &'a E) -> Self {
        Self { entries }
    }

    /// Ok when the reference has never been posted; `DuplicateTransaction`
    /// when any surviving entry already carries it.
    pub fn ensure_not_duplicate(&self, reference: &TransactionRef) -> LedgerResult<()> {
        let existing = self.entries.find_by_reference(reference);
        if existing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::duplicate(reference.as_str()))
        }
    }
}
