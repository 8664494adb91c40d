//! API-side authorization guard.
//!
//! Enforced at the request boundary (before any command is dispatched), so
//! aggregates and infra stay auth-agnostic.

use tracker_auth::{
    AuthzError, BranchMembership, CommandAuthorization, Permission, Principal, authorize,
    permissions_for_roles,
};

use crate::context::{BranchContext, PrincipalContext};

/// Permissions required by one request.
#[derive(Debug, Clone)]
pub struct Requires(Vec<Permission>);

impl Requires {
    pub fn one(permission: &'static str) -> Self {
        Self(vec![Permission::new(permission)])
    }
}

impl CommandAuthorization for Requires {
    fn required_permissions(&self) -> &[Permission] {
        &self.0
    }
}

/// Check authorization for a command in the current request context.
pub fn authorize_command<C: CommandAuthorization>(
    branch: &BranchContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let membership = BranchMembership {
        branch_id: branch.branch_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_for_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_branch_id: branch.branch_id(),
        membership,
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_auth::{PrincipalId, Role};
    use tracker_core::BranchId;

    fn ctx(role: &'static str) -> (BranchContext, PrincipalContext) {
        (
            BranchContext::new(BranchId::new()),
            PrincipalContext::new(PrincipalId::new(), "tester".into(), vec![Role::new(role)]),
        )
    }

    #[test]
    fn clerk_may_update_but_not_create_from_modal() {
        let (b, p) = ctx("clerk");
        assert!(authorize_command(&b, &p, &Requires::one(Permission::ORDERS_UPDATE)).is_ok());
        assert!(matches!(
            authorize_command(&b, &p, &Requires::one(Permission::ORDERS_CREATE)),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_wildcard_covers_everything() {
        let (b, p) = ctx("admin");
        assert!(authorize_command(&b, &p, &Requires::one(Permission::CUSTOMERS_UPDATE)).is_ok());
    }
}
