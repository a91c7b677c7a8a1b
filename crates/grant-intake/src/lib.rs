#![recursion_limit = "256"]
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
