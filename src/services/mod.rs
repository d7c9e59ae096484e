//! Business logic services.

pub mod auth;
pub mod automation;
pub mod dispatcher;
pub mod evaluator;
pub mod executor;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod template;
