// Common library for shared code across the issuer binary and tests

pub mod config;
pub mod errors;
pub mod gitlab;
pub mod issuer;
pub mod models;
pub mod schedule;
pub mod telemetry;
pub mod template;
