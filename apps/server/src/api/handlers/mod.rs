//! Request handlers for API endpoints
//!
//! Handlers extract request data, call the services and shape the JSON
//! response; errors are rendered by `Error`'s `IntoResponse`.

pub mod companies;
pub mod enrichment;
pub mod metrics;
pub mod saved;
pub mod search;

pub use companies::*;
pub use enrichment::*;
pub use metrics::*;
pub use saved::*;
pub use search::*;
