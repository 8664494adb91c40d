use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier such as `"orders.update"`.
///
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ORDERS_READ: &'static str = "orders.read";
    pub const ORDERS_START: &'static str = "orders.start";
    pub const ORDERS_UPDATE: &'static str = "orders.update";
    pub const ORDERS_COMPLETE: &'static str = "orders.complete";
    pub const ORDERS_CREATE: &'static str = "orders.create";
    pub const CUSTOMERS_READ: &'static str = "customers.read";
    pub const CUSTOMERS_UPDATE: &'static str = "customers.update";
    pub const CATALOG_READ: &'static str = "catalog.read";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
