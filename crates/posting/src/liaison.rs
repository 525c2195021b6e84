//! Inter-branch liaison routing.
//!
//! A movement spanning two branches never posts directly across books: each
//! branch stays individually balanced by bridging through its liaison
//! account. The router resolves the liaison pair (one account per branch,
//! both under the fixed liaison rule key) and orders the legs so every
//! intermediate liaison balance is individually auditable.

use serde::{Deserialize, Serialize};

use corebank_core::{AccountId, BranchId, LedgerResult, RequestContext};
use corebank_chart::{Account, EventCode};

use crate::repository::{AccountRepository, RuleRepository};
use crate::resolver::AccountResolver;

/// Whether the movement pushes value toward the product (deposit-type) or
/// out of it (withdrawal-type). Decides leg ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Deposit,
    Withdrawal,
}

/// The liaison bridge accounts of one cross-branch transaction.
#[derive(Debug, Clone)]
pub struct LiaisonPair {
    pub home: Account,
    pub away: Account,
}

/// One planned leg: which account is debited and which is credited. The
/// amount is the transaction's principal; the engine fills in the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegPlan {
    pub debit_account: AccountId,
    pub credit_account: AccountId,
}

impl LegPlan {
    pub fn new(debit_account: AccountId, credit_account: AccountId) -> Self {
        Self {
            debit_account,
            credit_account,
        }
    }
}

pub struct LiaisonRouter;

impl LiaisonRouter {
    /// Resolve the liaison accounts of both branches through the resolver,
    /// each scoped to its own branch context.
    pub fn resolve_pair<S>(
        resolver: &AccountResolver<'_, S>,
        home_ctx: &RequestContext,
        away_branch_id: BranchId,
        away_branch_code: &str,
    ) -> LedgerResult<LiaisonPair>
    where
        S: RuleRepository + AccountRepository,
    {
        let code = EventCode::liaison();
        let home = resolver.resolve(&code, home_ctx)?;
        let away_ctx = home_ctx.for_branch(away_branch_id, away_branch_code);
        let away = resolver.resolve(&code, &away_ctx)?;
        Ok(LiaisonPair { home, away })
    }

    /// Order the bridge legs.
    ///
    /// Deposit-type: Teller→HomeLiaison, HomeLiaison→AwayLiaison,
    /// AwayLiaison→Product. Withdrawal-type: the exact reverse. Summed over
    /// either sequence, each liaison account nets to zero.
    pub fn plan(
        direction: MovementDirection,
        teller: AccountId,
        product: AccountId,
        pair: &LiaisonPair,
    ) -> Vec<LegPlan> {
        match direction {
            MovementDirection::Deposit => vec![
                LegPlan::new(teller, pair.home.id),
                LegPlan::new(pair.home.id, pair.away.id),
                LegPlan::new(pair.away.id, product),
            ],
            MovementDirection::Withdrawal => vec![
                LegPlan::new(product, pair.away.id),
                LegPlan::new(pair.away.id, pair.home.id),
                LegPlan::new(pair.home.id, teller),
            ],
        }
    }
}
