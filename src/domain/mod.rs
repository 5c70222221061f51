//! Core domain types and logic.

pub mod allocation;
pub mod config_validation;
pub mod error;
pub mod linalg;
pub mod model;
pub mod optimizer;
pub mod price_series;
pub mod retry;
pub mod returns;
pub mod universe;
