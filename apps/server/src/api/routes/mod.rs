//! Route tables

pub mod companies;
pub mod metrics;
pub mod saved;
