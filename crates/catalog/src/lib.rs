//! `tracker-catalog`: reference data shared by every branch.
//!
//! Service types and add-ons drive duration estimates, inventory items and
//! labour codes feed order item details, delay reasons are required when an
//! order runs past the overdue threshold.

pub mod catalog;
pub mod model;
pub mod seed;

pub use catalog::{Catalog, CatalogCounts};
pub use model::{
    Brand, CatalogId, DelayReason, DelayReasonCategory, InventoryItem, LabourCategory, LabourCode,
    ServiceAddon, ServiceType,
};
pub use seed::{SeedReport, seed};
