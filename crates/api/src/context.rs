use tracker_auth::{PrincipalId, Role};
use tracker_core::BranchId;

/// Branch context for a request.
///
/// Taken from the bearer token; every read and write is scoped to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BranchContext {
    branch_id: BranchId,
}

impl BranchContext {
    pub fn new(branch_id: BranchId) -> Self {
        Self { branch_id }
    }

    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    display_name: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, display_name: String, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            display_name,
            roles,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Recorded as `reported_by` / `added_by` on order events.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
