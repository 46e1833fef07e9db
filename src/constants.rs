/// Endpoint and cleaning constants shared across the codebase.

// Open Food Facts endpoints. The `{barcode}` placeholder in the product URL
// is substituted by the gateway.
pub const API_SEARCH_BASE: &str = "https://world.openfoodfacts.org/cgi/search.pl";
pub const API_PRODUCT_BASE: &str = "https://world.openfoodfacts.org/api/v0/product/{barcode}.json";

/// The search endpoint rejects larger pages; requests are clamped to this.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Values above this coming from the unit-ambiguous `energy_100g` field are
/// assumed to be kilojoules. Heuristic: the source sometimes reports kJ under
/// the generic key with no unit marker, and 1000 kcal/100g is already past the
/// plausibility ceiling. May misfire for genuinely energy-dense items.
pub const ENERGY_KJ_SUSPECT_THRESHOLD: f64 = 1000.0;

/// Kilojoules per kilocalorie.
pub const KJ_PER_KCAL: f64 = 4.184;

/// Per-100g plausibility ceiling for energy in kcal.
pub const ENERGY_KCAL_MAX: f64 = 900.0;

/// Per-100g plausibility ceiling for mass-based macronutrients (grams).
pub const MACRONUTRIENT_GRAMS_MAX: f64 = 100.0;
