//! Posting core: turning semantic movements into balanced ledger entries.
//!
//! The pipeline composes, in order: deduplication (idempotency boundary),
//! account resolution (with auto-provisioning), liaison routing for
//! cross-branch movements, the posting engine (one debit + one credit per
//! leg), the double-entry validator, and an all-or-nothing unit-of-work
//! commit with bounded optimistic retry.

pub mod dedup;
pub mod engine;
pub mod entry;
pub mod liaison;
pub mod pipeline;
pub mod repository;
pub mod resolver;
pub mod validator;

pub use dedup::Deduplicator;
pub use engine::{LegRequest, PostingEngine, WorkingSet};
pub use entry::{AccountingEntry, EntryDraft, TransactionRef};
pub use liaison::{LegPlan, LiaisonPair, LiaisonRouter, MovementDirection};
pub use pipeline::{
    AncillaryLeg, OperationKind, Party, PostingOutcome, PostingRequest, TransactionProcessor,
};
pub use repository::{AccountRepository, CommitBatch, EntryRepository, RuleRepository, UnitOfWork};
pub use resolver::AccountResolver;
pub use validator::DoubleEntryValidator;
