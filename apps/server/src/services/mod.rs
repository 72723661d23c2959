//! Service layer - search orchestration, query generation, enrichment and
//! saved companies

pub mod enrichment;
pub mod page_text;
pub mod query_generator;
pub mod saved;
pub mod search;
pub mod text_generation;

pub use enrichment::{BatchEnrichment, BatchItemError, EnrichmentService};
pub use page_text::{HttpPageFetcher, PageFetchError, PageTextSource};
pub use query_generator::{FilterHint, GeneratedQuery, QueryGenerator};
pub use saved::SavedCompanyService;
pub use search::{SearchOutcome, SearchService, SearchStrategy};
pub use text_generation::{GenerationError, OpenAiClient, TextGenerator};
