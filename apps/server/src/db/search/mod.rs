//! Company search: filter compilation, SQL safety, query building and paged execution

pub mod escape;
pub mod executor;
pub mod paging;
pub mod predicate;
pub mod query_builder;
pub mod safety;

pub use executor::{PagedExecutor, RawSqlPage};
pub use paging::{Pagination, ResultPage};
pub use predicate::CompiledPredicate;
pub use safety::{RejectionReason, SqlSafetyValidator, ValidationVerdict};
