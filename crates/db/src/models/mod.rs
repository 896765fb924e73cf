//! Row models and DTOs, one module per table.

pub mod audit;
pub mod notification;
pub mod user;
