//! Event-code → account resolution with branch-local auto-provisioning.

use corebank_core::{AccountId, LedgerError, LedgerResult, RequestContext};
use corebank_chart::{Account, AccountNumberingScheme, ChartPosition, EventCode};

use crate::repository::{AccountRepository, RuleRepository};

/// Resolves an event code, in the scope of one branch, to a concrete ledger
/// account, creating the branch-local account from the rule's
/// management-position template on first use.
///
/// Resolution failures are split so callers can tell the operator actions
/// apart: `RuleNotConfigured` (no rule row at all, so create a rule) vs
/// `AccountNotConfigured` (rule exists but names no active determination
/// template, so configure the account).
pub struct AccountResolver<'a, S> {
    store: &'a S,
    scheme: &'a AccountNumberingScheme,
}

impl<'a, S> AccountResolver<'a, S>
where
    S: RuleRepository + AccountRepository,
{
    pub fn new(store: &'a S, scheme: &'a AccountNumberingScheme) -> Self {
        Self { store, scheme }
    }

    /// Resolve `event_code` for the calling branch.
    ///
    /// Idempotent under concurrency: creation races on the same
    /// (template, branch) pair collapse onto the winner via the store's
    /// uniqueness constraint.
    pub fn resolve(&self, event_code: &EventCode, ctx: &RequestContext) -> LedgerResult<Account> {
        let rule = self.store.find_by_event_code(event_code).ok_or_else(|| {
            LedgerError::RuleNotConfigured {
                event_code: event_code.to_string(),
            }
        })?;

        let position_id = rule.determination_position().ok_or_else(|| {
            LedgerError::AccountNotConfigured {
                event_code: event_code.to_string(),
            }
        })?;

        let position = self.store.find_position(position_id).ok_or_else(|| {
            LedgerError::AccountNotConfigured {
                event_code: event_code.to_string(),
            }
        })?;

        if let Some(existing) = self
            .store
            .find_by_position_and_branch(position_id, ctx.branch_id)
        {
            return Ok(existing);
        }

        self.provision(&position, ctx)
    }

    fn provision(&self, position: &ChartPosition, ctx: &RequestContext) -> LedgerResult<Account> {
        let number = self
            .scheme
            .derive(&position.number, &ctx.branch_code, position.suffix);
        let account = Account::provision(
            AccountId::new(),
            ctx.branch_id,
            position.id,
            number,
            &position.description,
            &ctx.branch_code,
        )?;

        match self.store.create(account) {
            Ok(created) => {
                tracing::info!(
                    account = %created.number.network,
                    branch = %ctx.branch_id,
                    "provisioned branch-local account"
                );
                Ok(created)
            }
            // Lost the creation race: the winner's account is the identity.
            Err(LedgerError::Conflict(_)) => self
                .store
                .find_by_position_and_branch(position.id, ctx.branch_id)
                .ok_or_else(|| {
                    LedgerError::persistence(
                        "creation conflict but no existing account for (template, branch)",
                    )
                }),
            Err(other) => Err(other),
        }
    }
}
