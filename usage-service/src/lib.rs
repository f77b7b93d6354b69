//! Usage metering core: append-only cost ledger, per-period quota
//! enforcement, usage projection, and plan recommendation.

pub mod config;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod services;
pub mod startup;
