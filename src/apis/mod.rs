use crate::error::Result;
use crate::types::RawProductRecord;

pub mod open_food_facts;

pub use open_food_facts::OpenFoodFactsApi;

/// Parameters for a product search. The page size is clamped by the gateway
/// to the API's maximum of 100; only the first page is ever requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: u32,
}

/// Outcome of a barcode lookup. `NotFound` is a normal result, distinct from
/// a network failure: the upstream answers successfully with a status flag.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(RawProductRecord),
    NotFound,
}

/// Core trait for product data gateways.
///
/// Implementations fetch complete raw payloads and hand them to the pipeline
/// untouched; no retrying, no partial or streaming input.
#[async_trait::async_trait]
pub trait ProductApi: Send + Sync {
    /// Unique identifier for this gateway
    fn api_name(&self) -> &'static str;

    /// Search products by keyword with optional country/category filters
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawProductRecord>>;

    /// Fetch a single product by barcode
    async fn lookup_by_barcode(&self, barcode: &str) -> Result<LookupOutcome>;
}
