// Issuer module for recurring issue creation

pub mod engine;

pub use engine::{IssuerConfig, IssuerEngine, RunSummary};
