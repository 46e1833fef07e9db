use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::apis::{LookupOutcome, ProductApi, SearchQuery};
use crate::config::ApiConfig;
use crate::constants::MAX_PAGE_SIZE;
use crate::error::Result;
use crate::types::RawProductRecord;

/// Gateway to the public Open Food Facts API.
///
/// Responses are cached in-memory for a time-boxed window, keyed on the
/// normalized request parameters. The cache lives inside the client, so every
/// session owns its own; it affects latency only, never core semantics.
pub struct OpenFoodFactsApi {
    client: reqwest::Client,
    config: ApiConfig,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    stored_at: Instant,
    response: CachedResponse,
}

#[derive(Clone)]
enum CachedResponse {
    Search(Vec<RawProductRecord>),
    Lookup(LookupOutcome),
}

/// Search response envelope: a product list plus paging fields we ignore.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    products: Vec<RawProductRecord>,
}

/// Barcode response envelope. `status` is 1 when the product exists.
#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    #[serde(default)]
    status: i64,
    product: Option<RawProductRecord>,
}

impl OpenFoodFactsApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_get(&self, key: &str) -> Option<CachedResponse> {
        let ttl = Duration::from_secs(self.config.cache_ttl_minutes * 60);
        if ttl.is_zero() {
            return None;
        }
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(key)?;
        if entry.stored_at.elapsed() < ttl {
            debug!(key, "cache hit");
            Some(entry.response.clone())
        } else {
            None
        }
    }

    fn cache_put(&self, key: String, response: CachedResponse) {
        if self.config.cache_ttl_minutes == 0 {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            let ttl = Duration::from_secs(self.config.cache_ttl_minutes * 60);
            cache.retain(|_, entry| entry.stored_at.elapsed() < ttl);
            cache.insert(
                key,
                CacheEntry {
                    stored_at: Instant::now(),
                    response,
                },
            );
        }
    }
}

#[async_trait::async_trait]
impl ProductApi for OpenFoodFactsApi {
    fn api_name(&self) -> &'static str {
        "open_food_facts"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawProductRecord>> {
        let params = search_params(query);
        let cache_key = cache_key("search", &params);
        if let Some(CachedResponse::Search(records)) = self.cache_get(&cache_key) {
            return Ok(records);
        }

        let envelope: SearchEnvelope = self
            .client
            .get(&self.config.search_base)
            .query(&params)
            .timeout(Duration::from_secs(self.config.search_timeout_seconds))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(
            keyword = %query.keyword,
            count = envelope.products.len(),
            "fetched products"
        );
        self.cache_put(cache_key, CachedResponse::Search(envelope.products.clone()));
        Ok(envelope.products)
    }

    #[instrument(skip(self))]
    async fn lookup_by_barcode(&self, barcode: &str) -> Result<LookupOutcome> {
        let barcode = barcode.trim();
        let url = self.config.product_base.replace("{barcode}", barcode);
        let cache_key = format!("lookup|{barcode}");
        if let Some(CachedResponse::Lookup(outcome)) = self.cache_get(&cache_key) {
            return Ok(outcome);
        }

        let envelope: ProductEnvelope = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.lookup_timeout_seconds))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let outcome = match envelope.product {
            Some(product) if envelope.status == 1 => LookupOutcome::Found(product),
            _ => LookupOutcome::NotFound,
        };
        self.cache_put(cache_key, CachedResponse::Lookup(outcome.clone()));
        Ok(outcome)
    }
}

/// Build the search query string pairs, clamping the page size and only
/// including the optional filters when set.
fn search_params(query: &SearchQuery) -> Vec<(String, String)> {
    let page_size = query.page_size.min(MAX_PAGE_SIZE);
    let mut params = vec![
        ("search_terms".to_string(), query.keyword.clone()),
        ("search_simple".to_string(), "1".to_string()),
        ("action".to_string(), "process".to_string()),
        ("json".to_string(), "1".to_string()),
        ("page_size".to_string(), page_size.to_string()),
        ("page".to_string(), "1".to_string()),
    ];
    if let Some(country) = &query.country {
        params.push(("countries".to_string(), country.clone()));
    }
    if let Some(category) = &query.category {
        params.push(("tagtype_0".to_string(), "categories".to_string()));
        params.push(("tag_contains_0".to_string(), "contains".to_string()));
        params.push(("tag_0".to_string(), category.clone()));
    }
    params
}

fn cache_key(kind: &str, params: &[(String, String)]) -> String {
    let mut key = kind.to_string();
    for (name, value) in params {
        key.push('|');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> SearchQuery {
        SearchQuery {
            keyword: "chocolate".to_string(),
            country: None,
            category: None,
            page_size: 50,
        }
    }

    #[test]
    fn page_size_is_clamped_to_api_maximum() {
        let mut q = query();
        q.page_size = 500;
        let params = search_params(&q);
        assert!(params.contains(&("page_size".to_string(), "100".to_string())));
    }

    #[test]
    fn optional_filters_only_appear_when_set() {
        let params = search_params(&query());
        assert!(!params.iter().any(|(k, _)| k == "countries" || k == "tag_0"));

        let mut q = query();
        q.country = Some("France".to_string());
        q.category = Some("biscuits".to_string());
        let params = search_params(&q);
        assert!(params.contains(&("countries".to_string(), "France".to_string())));
        assert!(params.contains(&("tag_0".to_string(), "biscuits".to_string())));
        assert!(params.contains(&("tagtype_0".to_string(), "categories".to_string())));
    }

    #[test]
    fn cache_key_reflects_all_parameters() {
        let mut q = query();
        let base = cache_key("search", &search_params(&q));
        q.country = Some("Italy".to_string());
        let with_country = cache_key("search", &search_params(&q));
        assert_ne!(base, with_country);
    }

    #[test]
    fn search_envelope_tolerates_missing_product_list() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({ "count": 0 })).unwrap();
        assert!(envelope.products.is_empty());
    }

    #[test]
    fn lookup_envelope_distinguishes_found_from_not_found() {
        let envelope: ProductEnvelope =
            serde_json::from_value(json!({ "status": 0, "status_verbose": "product not found" }))
                .unwrap();
        assert_eq!(envelope.status, 0);
        assert!(envelope.product.is_none());

        let envelope: ProductEnvelope = serde_json::from_value(
            json!({ "status": 1, "product": { "product_name": "Nutella" } }),
        )
        .unwrap();
        assert_eq!(envelope.status, 1);
        assert!(envelope.product.is_some());
    }
}
