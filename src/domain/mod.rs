//! Domain layer - core business logic and entities

pub mod execution;
pub mod fees;
pub mod orders;
pub mod risk;
