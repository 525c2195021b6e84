//! `corebank-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use context::RequestContext;
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, ActorId, BranchId, EntryId, PositionId, RuleId};
pub use value_object::ValueObject;
