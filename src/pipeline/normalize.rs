use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::types::{Grade, Nutrient, RawProductRecord};

/// A raw record converted into a typed, nullable row.
///
/// Every field is independently optional: `None` means "absent or invalid at
/// the source", never a coerced default. Nutrient values are still the raw
/// JSON values here; numeric coercion and plausibility filtering happen in
/// the dataset builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub name: Option<String>,
    /// Raw, possibly comma-separated brand text. Splitting into a primary
    /// brand is deferred to aggregation time.
    pub brands: Option<String>,
    pub categories: Option<String>,
    pub countries: Option<String>,
    pub nutriscore: Option<Grade>,
    pub ecoscore: Option<Grade>,
    pub ingredients_text: Option<String>,
    /// Taxonomy tags as delivered (e.g. `en:palm-oil`). Empty lists stay
    /// absent so "no ingredients known" is distinguishable.
    pub ingredient_tags: Option<Vec<String>>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    /// Uncoerced nutrient readings, keyed by canonical nutrient. Missing keys
    /// mean the source did not report that nutrient; partial data is normal.
    pub nutrients: BTreeMap<Nutrient, Value>,
    /// Which source field supplied the energy reading, when one did.
    pub energy_source: Option<EnergySource>,
}

/// The upstream source exposes energy under two keys: an explicit
/// kcal-denominated one, and a generic one whose unit is ambiguous. The
/// builder needs to know which one fed the row to apply the kJ correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergySource {
    KcalField,
    GenericField,
}

/// Convert one raw product record into a typed row.
///
/// Returns `None` when the record has neither a name nor a barcode: such rows
/// carry no identifying information and are silently dropped.
pub fn normalize(raw: &RawProductRecord) -> Option<NormalizedProduct> {
    let name = clean_text(raw, "product_name").or_else(|| clean_text(raw, "generic_name"));
    let barcode = extract_barcode(raw);

    if name.is_none() && barcode.is_none() {
        debug!("dropping record with neither name nor barcode");
        return None;
    }

    let (nutrients, energy_source) = extract_nutrients(raw);

    Some(NormalizedProduct {
        name,
        brands: clean_text(raw, "brands"),
        categories: clean_text(raw, "categories"),
        countries: clean_text(raw, "countries"),
        // The grade historically lived under two keys across schema versions
        nutriscore: extract_grade(raw, &["nutrition_grade_fr", "nutrition_grades"]),
        ecoscore: extract_grade(raw, &["ecoscore_grade"]),
        ingredients_text: clean_text(raw, "ingredients_text"),
        ingredient_tags: extract_tags(raw),
        barcode,
        image_url: clean_text(raw, "image_front_small_url").or_else(|| clean_text(raw, "image_url")),
        nutrients,
        energy_source,
    })
}

/// A text field is present only if it exists, is a string, and trims
/// non-empty.
fn clean_text(raw: &RawProductRecord, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve a grade from the first key that holds present text, then validate
/// against the five-letter enumeration. Present-but-invalid text (e.g.
/// "unknown") resolves to absent rather than falling through or being kept
/// raw.
fn extract_grade(raw: &RawProductRecord, keys: &[&str]) -> Option<Grade> {
    keys.iter()
        .find_map(|key| clean_text(raw, key))
        .and_then(|text| Grade::parse(&text))
}

/// Barcodes are text identifiers, but the source occasionally delivers the
/// `code` field as a bare JSON number.
fn extract_barcode(raw: &RawProductRecord) -> Option<String> {
    match raw.get("code") {
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => clean_text(raw, "code"),
    }
}

fn extract_tags(raw: &RawProductRecord) -> Option<Vec<String>> {
    let tags: Vec<String> = raw
        .get("ingredients_tags")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Pull the eight tracked nutrients out of the `nutriments` object, each
/// independently. Values are carried as-is; only null and missing keys count
/// as absent at this stage.
fn extract_nutrients(raw: &RawProductRecord) -> (BTreeMap<Nutrient, Value>, Option<EnergySource>) {
    let mut nutrients = BTreeMap::new();
    let mut energy_source = None;

    let Some(table) = raw.get("nutriments").filter(|v| v.is_object()) else {
        return (nutrients, energy_source);
    };

    for nutrient in Nutrient::ALL {
        if nutrient == Nutrient::EnergyKcal {
            if let Some(value) = non_null(table.get(nutrient.source_key())) {
                energy_source = Some(EnergySource::KcalField);
                nutrients.insert(nutrient, value.clone());
            } else if let Some(value) = non_null(table.get("energy_100g")) {
                energy_source = Some(EnergySource::GenericField);
                nutrients.insert(nutrient, value.clone());
            }
        } else if let Some(value) = non_null(table.get(nutrient.source_key())) {
            nutrients.insert(nutrient, value.clone());
        }
    }

    (nutrients, energy_source)
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
