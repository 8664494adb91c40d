//! `tracker-core`: domain building blocks shared by every workshop module.
//!
//! Pure types only: identifiers, the domain error model and the aggregate/entity
//! traits. Nothing in here performs IO.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, BranchId, UserId};
