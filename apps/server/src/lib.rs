//! Company Directory server
//!
//! Company search with structured filters and natural-language queries:
//! - filter compilation into parameterized SQL
//! - generated SQL behind a textual safety gate, with fallback to filter search
//! - deterministic pagination over any result set
//! - generated company summaries from website text

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
