//! Domain models for the company directory

pub mod company;
pub mod filters;
pub mod saved;

pub use company::{
    Company, NewCompany, Record, COMPANY_COLUMNS, COMPANY_PRIMARY_KEY, COMPANY_TABLE,
};
pub use filters::{FilterField, FilterValue, SearchFilters};
pub use saved::{SavedCompany, DEFAULT_USER_ID};
