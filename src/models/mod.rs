//! Database models and DTOs for all domain entities.

pub mod automation;
pub mod item;
pub mod notification;
pub mod order;
pub mod organization;
pub mod pagination;
pub mod user;
