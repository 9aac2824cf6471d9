mod enricher;
mod error;
mod fetcher;

pub use enricher::{DEFAULT_MAX_CONCURRENCY, EnrichReport, Enriched, EntryEnricher};
pub use error::{Error, Result};
pub use fetcher::{FetchRequest, FetchResponse, Fetcher, HttpFetcher};
