use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in tokens (`admin`, `manager`, `clerk`, `viewer`).
///
/// Opaque at this layer; [`crate::policy`] maps roles to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const MANAGER: &'static str = "manager";
    pub const CLERK: &'static str = "clerk";
    pub const VIEWER: &'static str = "viewer";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
