//! `staffroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! entity identity, the domain error model and paging types shared by the
//! repositories.

pub mod entity;
pub mod error;
pub mod paging;

pub use entity::{Entity, EntityId, same_identity};
pub use error::{DomainError, DomainResult};
pub use paging::{Page, PageRequest};
