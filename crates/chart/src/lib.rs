//! Chart-of-accounts domain module.
//!
//! This crate contains the reference data and account model the posting core
//! resolves against: account categories and their normal balance side, the
//! account-numbering scheme, event codes, management-position templates and
//! the event-code → template rule table. Pure domain logic, no IO, no
//! storage.

pub mod account;
pub mod numbering;
pub mod rule;

pub use account::{Account, AccountCategory, NormalSide};
pub use numbering::{AccountNumber, AccountNumberingScheme};
pub use rule::{AccountingRule, ChartPosition, EventCode};
