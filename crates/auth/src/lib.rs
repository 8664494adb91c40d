//! `tracker-auth`: who is calling, for which branch, and what they may do.
//!
//! Independent of HTTP and storage; the API layer feeds it bearer tokens.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use policy::{default_role_permissions, permissions_for_roles};
pub use principal::{BranchMembership, PrincipalId};
pub use roles::Role;
