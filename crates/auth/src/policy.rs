//! Built-in role → permission mapping.

use crate::{Permission, Role};

const MANAGER: &[&str] = &[
    Permission::ORDERS_READ,
    Permission::ORDERS_START,
    Permission::ORDERS_UPDATE,
    Permission::ORDERS_COMPLETE,
    Permission::ORDERS_CREATE,
    Permission::CUSTOMERS_READ,
    Permission::CUSTOMERS_UPDATE,
    Permission::CATALOG_READ,
];

const CLERK: &[&str] = &[
    Permission::ORDERS_READ,
    Permission::ORDERS_START,
    Permission::ORDERS_UPDATE,
    Permission::ORDERS_COMPLETE,
    Permission::CUSTOMERS_READ,
    Permission::CUSTOMERS_UPDATE,
    Permission::CATALOG_READ,
];

const VIEWER: &[&str] = &[Permission::ORDERS_READ, Permission::CATALOG_READ];

pub fn default_role_permissions(role: &str) -> Vec<String> {
    let granted: &[&str] = match role {
        Role::ADMIN => &["*"],
        Role::MANAGER => MANAGER,
        Role::CLERK => CLERK,
        Role::VIEWER => VIEWER,
        _ => &[],
    };
    granted.iter().map(|p| p.to_string()).collect()
}

/// Union of the permissions granted by `roles`, deduplicated, in first-seen order.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for role in roles {
        for perm in default_role_permissions(role.as_str()) {
            if !out.iter().any(|p| p.as_str() == perm) {
                out.push(Permission::new(perm));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_wildcard_and_unknown_roles_get_nothing() {
        assert_eq!(default_role_permissions("admin"), vec!["*".to_string()]);
        assert!(default_role_permissions("mechanic").is_empty());
    }

    #[test]
    fn clerk_cannot_create_from_modal_but_manager_can() {
        let clerk = default_role_permissions("clerk");
        assert!(clerk.iter().any(|p| p == "orders.update"));
        assert!(!clerk.iter().any(|p| p == "orders.create"));
        assert!(default_role_permissions("manager").iter().any(|p| p == "orders.create"));
    }

    #[test]
    fn role_union_is_deduplicated() {
        let perms = permissions_for_roles(&[Role::new("viewer"), Role::new("clerk")]);
        let reads = perms.iter().filter(|p| p.as_str() == "orders.read").count();
        assert_eq!(reads, 1);
    }
}
