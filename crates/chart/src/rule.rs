//! Event codes and the accounting rule table.
//!
//! Reference data only: the posting path reads rules and management-position
//! templates, never mutates them.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use corebank_core::{LedgerError, LedgerResult, PositionId, RuleId, ValueObject};

use crate::account::AccountCategory;

/// Rule key identifying a configured accounting movement, e.g.
/// `SAV001@Principal_Saving_Account` (product + purpose).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventCode {
    product: String,
    purpose: String,
}

/// Fixed rule key for the inter-branch liaison bridge. One rule row serves
/// every branch; branch scoping comes from the resolver's request context.
pub const LIAISON_EVENT_CODE: &str = "LIAISON@Inter_Branch_Bridge";

impl EventCode {
    pub fn new(product: impl Into<String>, purpose: impl Into<String>) -> LedgerResult<Self> {
        let product = product.into();
        let purpose = purpose.into();
        if product.is_empty() || purpose.is_empty() {
            return Err(LedgerError::validation(
                "event code requires both a product and a purpose segment",
            ));
        }
        if product.contains('@') || purpose.contains('@') {
            return Err(LedgerError::validation(
                "event code segments must not contain '@'",
            ));
        }
        Ok(Self { product, purpose })
    }

    /// The liaison bridge key used by the router.
    pub fn liaison() -> Self {
        LIAISON_EVENT_CODE
            .parse()
            .unwrap_or_else(|_| unreachable!("liaison event code constant is well-formed"))
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }
}

impl FromStr for EventCode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '@');
        let product = parts.next().unwrap_or_default();
        let purpose = parts.next().ok_or_else(|| {
            LedgerError::validation(format!("event code {s:?} is missing the '@' delimiter"))
        })?;
        Self::new(product, purpose)
    }
}

impl TryFrom<String> for EventCode {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventCode> for String {
    fn from(value: EventCode) -> Self {
        value.to_string()
    }
}

impl core::fmt::Display for EventCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.product, self.purpose)
    }
}

impl ValueObject for EventCode {}

/// Chart-of-accounts management position: the template a rule's event code
/// determines, from which branch-local accounts are provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPosition {
    pub id: PositionId,
    /// Template account number; its leading digit fixes the category.
    pub number: String,
    pub description: String,
    /// Management-position ordinal, zero-padded into derived numbers.
    pub suffix: u32,
}

impl ChartPosition {
    pub fn new(
        id: PositionId,
        number: impl Into<String>,
        description: impl Into<String>,
        suffix: u32,
    ) -> LedgerResult<Self> {
        let number = number.into();
        // Fails fast on numbers outside the chart classes.
        AccountCategory::from_account_number(&number)?;
        Ok(Self {
            id,
            number,
            description: description.into(),
            suffix,
        })
    }

    pub fn category(&self) -> AccountCategory {
        // Validated at construction.
        AccountCategory::from_account_number(&self.number)
            .unwrap_or_else(|_| unreachable!("position number validated at construction"))
    }
}

/// One row of the event-code → determination-account rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRule {
    pub id: RuleId,
    pub event_code: EventCode,
    /// Absent when the rule exists but no determination account has been
    /// configured yet, a distinct failure from a missing rule row.
    pub position_id: Option<PositionId>,
    pub active: bool,
}

impl AccountingRule {
    pub fn new(id: RuleId, event_code: EventCode, position_id: Option<PositionId>) -> Self {
        Self {
            id,
            event_code,
            position_id,
            active: true,
        }
    }

    /// The configured determination template, if any.
    pub fn determination_position(&self) -> Option<PositionId> {
        if self.active { self.position_id } else { None }
    }
}
