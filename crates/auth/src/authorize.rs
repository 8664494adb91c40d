use thiserror::Error;

use tracker_core::BranchId;

use crate::{BranchMembership, Permission, PrincipalId};

/// A caller resolved for an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_branch_id: BranchId,
    pub membership: BranchMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("branch mismatch")]
    BranchMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Commands that declare the permissions needed to run them.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Pure policy check; no IO.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_branch_id != principal.membership.branch_id {
        return Err(AuthzError::BranchMismatch);
    }

    let granted = principal
        .membership
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p.as_str() == required.as_str());

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn principal(branch: BranchId, active: BranchId, perms: &[&'static str]) -> Principal {
        Principal {
            principal_id: PrincipalId::new(),
            active_branch_id: active,
            membership: BranchMembership {
                branch_id: branch,
                roles: vec![Role::new("clerk")],
                permissions: perms.iter().map(|p| Permission::new(*p)).collect(),
            },
        }
    }

    #[test]
    fn grants_listed_and_wildcard_permissions() {
        let b = BranchId::new();
        let need = Permission::new(Permission::ORDERS_UPDATE);
        assert!(authorize(&principal(b, b, &["orders.update"]), &need).is_ok());
        assert!(authorize(&principal(b, b, &["*"]), &need).is_ok());
        assert_eq!(
            authorize(&principal(b, b, &["orders.read"]), &need),
            Err(AuthzError::Forbidden("orders.update".into()))
        );
    }

    #[test]
    fn branch_mismatch_wins_over_permissions() {
        let p = principal(BranchId::new(), BranchId::new(), &["*"]);
        assert_eq!(
            authorize(&p, &Permission::new(Permission::ORDERS_READ)),
            Err(AuthzError::BranchMismatch)
        );
    }
}
