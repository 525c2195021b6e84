//! Request context passed explicitly into every core call.
//!
//! The posting path never reads ambient "current user/branch" state; the
//! caller supplies branch identity and actor per request.

use serde::{Deserialize, Serialize};

use crate::id::{ActorId, BranchId};

/// Identity of the calling branch + actor for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub branch_id: BranchId,
    /// Numeric branch code used by account-number derivation (e.g. "042").
    pub branch_code: String,
    pub actor: ActorId,
}

impl RequestContext {
    pub fn new(branch_id: BranchId, branch_code: impl Into<String>, actor: ActorId) -> Self {
        Self {
            branch_id,
            branch_code: branch_code.into(),
            actor,
        }
    }

    /// Same actor operating against another branch (liaison resolution).
    pub fn for_branch(&self, branch_id: BranchId, branch_code: impl Into<String>) -> Self {
        Self {
            branch_id,
            branch_code: branch_code.into(),
            actor: self.actor,
        }
    }
}
