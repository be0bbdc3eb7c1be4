//! Core domain types and logic.

pub mod panel;
pub mod align;
pub mod fee;
pub mod solver;
pub mod simulation;
pub mod stats;
pub mod turnover;
pub mod report;
pub mod config_validation;
pub mod error;
