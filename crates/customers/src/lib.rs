//! `tracker-customers`: customers and their vehicles.
//!
//! Plain branch-scoped records (not event-sourced); storage lives in `tracker-infra`.

pub mod customer;
pub mod vehicle;

pub use customer::{
    Customer, CustomerId, CustomerProfile, CustomerType, PersonalSubtype, walk_in_profile,
};
pub use vehicle::{Vehicle, VehicleId, normalize_plate};
