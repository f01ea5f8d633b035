//! Core domain types and logic.

pub mod price;
pub mod indicator;
pub mod monthly;
pub mod trajectory;
pub mod strategy;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
