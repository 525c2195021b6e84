//! Transaction pipeline: dedup → resolve → post legs → validate → commit.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use corebank_core::{AccountId, BranchId, LedgerError, LedgerResult, RequestContext};
use corebank_chart::{Account, AccountNumberingScheme, EventCode};

use crate::dedup::Deduplicator;
use crate::engine::{LegRequest, PostingEngine, WorkingSet};
use crate::entry::{AccountingEntry, EntryDraft, TransactionRef};
use crate::liaison::{LegPlan, LiaisonRouter, MovementDirection};
use crate::repository::{
    AccountRepository, CommitBatch, EntryRepository, RuleRepository, UnitOfWork,
};
use crate::resolver::AccountResolver;
use crate::validator::DoubleEntryValidator;

/// Bounded optimistic retry on commit version conflicts.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// The semantic operations the ledger core posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Deposit,
    Withdrawal,
    Transfer,
    LoanDisbursement,
    CashReplenishment,
    BranchMovement,
}

impl OperationKind {
    /// Originating command name recorded on every entry.
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Transfer => "Transfer",
            Self::LoanDisbursement => "LoanDisbursement",
            Self::CashReplenishment => "CashReplenishment",
            Self::BranchMovement => "BranchMovement",
        }
    }

    /// Leg ordering for cross-branch movements: deposit-type pushes value
    /// toward the product end, withdrawal-type pulls it out.
    pub fn direction(self) -> MovementDirection {
        match self {
            Self::Deposit | Self::Transfer | Self::CashReplenishment | Self::BranchMovement => {
                MovementDirection::Deposit
            }
            Self::Withdrawal | Self::LoanDisbursement => MovementDirection::Withdrawal,
        }
    }
}

/// One side of a movement: a configured event code (resolved, possibly
/// auto-provisioned) or a concrete account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Event(EventCode),
    Existing(AccountId),
}

/// An ancillary leg (commission, VAT, interest split) posted after the
/// principal, in declared order, debiting the same source side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncillaryLeg {
    pub narrative: String,
    pub destination: Party,
    pub amount: Decimal,
}

/// One semantic movement to post as a single unit of work.
///
/// `source` is the side value leaves, `destination` the side it arrives;
/// every leg debits its source end and credits its destination end. When
/// `external_branch` is set, the product end of the movement (destination
/// for deposit-type, source for withdrawal-type) is resolved in that
/// branch and the legs bridge through the liaison pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRequest {
    pub operation: OperationKind,
    pub narrative: String,
    pub counterparty_reference: Option<String>,
    pub value_date: NaiveDate,
    pub source: Party,
    pub destination: Party,
    /// Principal amount.
    pub amount: Decimal,
    pub ancillary_legs: Vec<AncillaryLeg>,
    pub reference: TransactionRef,
    /// Counterparty branch id + numeric branch code.
    pub external_branch: Option<(BranchId, String)>,
    /// Downstream request cleared in the same commit (cash replenishment).
    pub cleared_request: Option<String>,
}

impl PostingRequest {
    pub fn new(
        operation: OperationKind,
        narrative: impl Into<String>,
        value_date: NaiveDate,
        source: Party,
        destination: Party,
        amount: Decimal,
        reference: TransactionRef,
    ) -> Self {
        Self {
            operation,
            narrative: narrative.into(),
            counterparty_reference: None,
            value_date,
            source,
            destination,
            amount,
            ancillary_legs: Vec::new(),
            reference,
            external_branch: None,
            cleared_request: None,
        }
    }

    pub fn with_counterparty_reference(mut self, reference: impl Into<String>) -> Self {
        self.counterparty_reference = Some(reference.into());
        self
    }

    pub fn with_ancillary(
        mut self,
        narrative: impl Into<String>,
        destination: Party,
        amount: Decimal,
    ) -> Self {
        self.ancillary_legs.push(AncillaryLeg {
            narrative: narrative.into(),
            destination,
            amount,
        });
        self
    }

    pub fn with_external_branch(
        mut self,
        branch_id: BranchId,
        branch_code: impl Into<String>,
    ) -> Self {
        self.external_branch = Some((branch_id, branch_code.into()));
        self
    }

    pub fn clearing_request(mut self, request_reference: impl Into<String>) -> Self {
        self.cleared_request = Some(request_reference.into());
        self
    }

    /// Total value debited from the source side across all legs.
    pub fn total_amount(&self) -> Decimal {
        self.amount + self.ancillary_legs.iter().map(|l| l.amount).sum::<Decimal>()
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone)]
pub struct PostingOutcome {
    pub entries: Vec<AccountingEntry>,
    /// Post-commit account states (balances already applied).
    pub accounts: Vec<Account>,
}

/// Executes posting requests end to end against the store contracts.
///
/// Each execution is one logical unit of work: nothing reaches the store
/// before `commit` except account auto-provisioning (which is idempotent by
/// identity), and a failure at any stage commits nothing.
pub struct TransactionProcessor<S> {
    store: S,
    scheme: AccountNumberingScheme,
}

impl<S> TransactionProcessor<S>
where
    S: AccountRepository + RuleRepository + EntryRepository + UnitOfWork,
{
    pub fn new(store: S, scheme: AccountNumberingScheme) -> Self {
        Self { store, scheme }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Post one semantic movement.
    ///
    /// On a commit version conflict the whole attempt is rebuilt from fresh
    /// account snapshots: legs are replayed, never re-applied to a stale
    /// copy.
    pub fn execute(
        &self,
        request: &PostingRequest,
        ctx: &RequestContext,
    ) -> LedgerResult<PostingOutcome> {
        self.validate_amounts(request)?;
        Deduplicator::new(&self.store).ensure_not_duplicate(&request.reference)?;

        let mut attempt = 1;
        loop {
            match self.attempt(request, ctx) {
                Err(LedgerError::Conflict(reason)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(
                        reference = %request.reference,
                        attempt,
                        %reason,
                        "commit conflict, replaying legs against fresh snapshots"
                    );
                    attempt += 1;
                }
                Ok(outcome) => {
                    tracing::info!(
                        reference = %request.reference,
                        command = request.operation.command_name(),
                        entries = outcome.entries.len(),
                        "transaction committed"
                    );
                    return Ok(outcome);
                }
                Err(other) => return Err(other),
            }
        }
    }

    fn validate_amounts(&self, request: &PostingRequest) -> LedgerResult<()> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "principal amount must be positive, got {}",
                request.amount
            )));
        }
        for leg in &request.ancillary_legs {
            if leg.amount <= Decimal::ZERO {
                return Err(LedgerError::validation(format!(
                    "ancillary amount must be positive, got {}",
                    leg.amount
                )));
            }
        }
        Ok(())
    }

    /// One full resolution + posting + commit attempt.
    fn attempt(&self, request: &PostingRequest, ctx: &RequestContext) -> LedgerResult<PostingOutcome> {
        let resolver = AccountResolver::new(&self.store, &self.scheme);
        let direction = request.operation.direction();

        // The product end lives in the external branch when one is named.
        let (source_ctx, destination_ctx) = match (&request.external_branch, direction) {
            (None, _) => (ctx.clone(), ctx.clone()),
            (Some((id, code)), MovementDirection::Deposit) => {
                (ctx.clone(), ctx.for_branch(*id, code.clone()))
            }
            (Some((id, code)), MovementDirection::Withdrawal) => {
                (ctx.for_branch(*id, code.clone()), ctx.clone())
            }
        };

        let source = self.resolve_party(&resolver, &request.source, &source_ctx)?;
        let destination = self.resolve_party(&resolver, &request.destination, &destination_ctx)?;
        if source.id == destination.id {
            return Err(LedgerError::validation(
                "source and destination resolve to the same account",
            ));
        }

        let mut working = WorkingSet::new();
        working.admit(source.clone());
        working.admit(destination.clone());

        // Principal leg plans, liaison-bridged when cross-branch.
        let principal_plans = match &request.external_branch {
            None => vec![LegPlan::new(source.id, destination.id)],
            Some((branch_id, branch_code)) => {
                let pair =
                    LiaisonRouter::resolve_pair(&resolver, ctx, *branch_id, branch_code)?;
                let (teller, product) = match direction {
                    MovementDirection::Deposit => (source.id, destination.id),
                    MovementDirection::Withdrawal => (destination.id, source.id),
                };
                working.admit(pair.home.clone());
                working.admit(pair.away.clone());
                LiaisonRouter::plan(direction, teller, product, &pair)
            }
        };

        let external_branch_id = request.external_branch.as_ref().map(|(id, _)| *id);
        let entry_date = Utc::now();
        let mut entries = Vec::with_capacity((principal_plans.len() + request.ancillary_legs.len()) * 2);

        // Principal first; leg order is part of the contract.
        for plan in &principal_plans {
            let leg = LegRequest {
                debit_account: plan.debit_account,
                credit_account: plan.credit_account,
                amount: request.amount,
                draft: self.draft(request, &request.narrative, external_branch_id, entry_date),
            };
            entries.extend(PostingEngine::post(&leg, &mut working)?);
        }

        // Ancillary legs in declared order, debiting the source end.
        for ancillary in &request.ancillary_legs {
            let destination = self.resolve_party(&resolver, &ancillary.destination, ctx)?;
            working.admit(destination.clone());
            let leg = LegRequest {
                debit_account: source.id,
                credit_account: destination.id,
                amount: ancillary.amount,
                draft: self.draft(request, &ancillary.narrative, external_branch_id, entry_date),
            };
            entries.extend(PostingEngine::post(&leg, &mut working)?);
        }

        DoubleEntryValidator::validate(&entries)?;

        let accounts = working.into_accounts();
        let batch = CommitBatch {
            accounts: accounts.clone(),
            entries: entries.clone(),
            cleared_requests: request.cleared_request.iter().cloned().collect(),
        };
        self.store.commit(batch)?;

        Ok(PostingOutcome { entries, accounts })
    }

    fn resolve_party(
        &self,
        resolver: &AccountResolver<'_, S>,
        party: &Party,
        ctx: &RequestContext,
    ) -> LedgerResult<Account> {
        match party {
            Party::Event(code) => resolver.resolve(code, ctx),
            Party::Existing(id) => self
                .store
                .find_by_id(*id)
                .ok_or_else(|| LedgerError::not_found(format!("account {id}"))),
        }
    }

    fn draft(
        &self,
        request: &PostingRequest,
        narrative: &str,
        external_branch_id: Option<BranchId>,
        entry_date: chrono::DateTime<Utc>,
    ) -> EntryDraft {
        EntryDraft {
            external_branch_id,
            value_date: request.value_date,
            entry_date,
            narrative: narrative.to_string(),
            reference: request.reference.clone(),
            counterparty_reference: request.counterparty_reference.clone(),
            command: request.operation.command_name().to_string(),
        }
    }
}
