use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::constants::{ENERGY_KJ_SUSPECT_THRESHOLD, KJ_PER_KCAL};
use crate::pipeline::normalize::{normalize, EnergySource, NormalizedProduct};
use crate::types::{coerce_f64, Grade, Nutrient, RawProductRecord};

/// One cleaned row of the tabular dataset. Nutrient values are coerced,
/// unit-corrected and plausibility-filtered floats; absent keys stay absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub name: Option<String>,
    pub brands: Option<String>,
    pub categories: Option<String>,
    pub countries: Option<String>,
    pub nutriscore: Option<Grade>,
    pub ecoscore: Option<Grade>,
    pub ingredients_text: Option<String>,
    pub ingredient_tags: Option<Vec<String>>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub nutrients: BTreeMap<Nutrient, f64>,
}

impl ProductRow {
    fn from_normalized(product: NormalizedProduct) -> Self {
        let nutrients = clean_nutrients(&product.nutrients, product.energy_source);
        Self {
            name: product.name,
            brands: product.brands,
            categories: product.categories,
            countries: product.countries,
            nutriscore: product.nutriscore,
            ecoscore: product.ecoscore,
            ingredients_text: product.ingredients_text,
            ingredient_tags: product.ingredient_tags,
            barcode: product.barcode,
            image_url: product.image_url,
            nutrients,
        }
    }

    pub fn nutrient(&self, nutrient: Nutrient) -> Option<f64> {
        self.nutrients.get(&nutrient).copied()
    }

    pub fn is_present(&self, column: Column) -> bool {
        match column {
            Column::Name => self.name.is_some(),
            Column::Brands => self.brands.is_some(),
            Column::Categories => self.categories.is_some(),
            Column::Countries => self.countries.is_some(),
            Column::Nutriscore => self.nutriscore.is_some(),
            Column::Ecoscore => self.ecoscore.is_some(),
            Column::IngredientsText => self.ingredients_text.is_some(),
            Column::IngredientTags => self.ingredient_tags.is_some(),
            Column::Barcode => self.barcode.is_some(),
            Column::ImageUrl => self.image_url.is_some(),
            Column::Nutrient(n) => self.nutrients.contains_key(&n),
        }
    }
}

/// Every column of the tabular dataset, for per-field reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Brands,
    Categories,
    Countries,
    Nutriscore,
    Ecoscore,
    IngredientsText,
    IngredientTags,
    Barcode,
    ImageUrl,
    Nutrient(Nutrient),
}

impl Column {
    pub fn all() -> Vec<Column> {
        let mut columns = vec![
            Column::Name,
            Column::Brands,
            Column::Categories,
            Column::Countries,
            Column::Nutriscore,
            Column::Ecoscore,
            Column::IngredientsText,
            Column::IngredientTags,
            Column::Barcode,
            Column::ImageUrl,
        ];
        columns.extend(Nutrient::ALL.map(Column::Nutrient));
        columns
    }

    pub fn name(self) -> &'static str {
        match self {
            Column::Name => "product_name",
            Column::Brands => "brands",
            Column::Categories => "categories",
            Column::Countries => "countries",
            Column::Nutriscore => "nutriscore",
            Column::Ecoscore => "ecoscore",
            Column::IngredientsText => "ingredients_text",
            Column::IngredientTags => "ingredients_tags",
            Column::Barcode => "barcode",
            Column::ImageUrl => "image_url",
            Column::Nutrient(n) => n.column_name(),
        }
    }
}

/// An immutable snapshot of normalized rows from one fetch. Replaced
/// wholesale on a new search, never merged incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Dataset {
    rows: Vec<ProductRow>,
}

impl Dataset {
    /// Normalize a batch of raw records into a dataset, in input order.
    ///
    /// Records lacking both name and barcode are dropped silently; every
    /// other per-field problem resolves to an absent value. Building never
    /// fails, and rebuilding from the same input yields an identical dataset.
    pub fn build(records: &[RawProductRecord]) -> Dataset {
        let rows: Vec<ProductRow> = records
            .iter()
            .filter_map(normalize)
            .map(ProductRow::from_normalized)
            .collect();
        info!(
            total = records.len(),
            kept = rows.len(),
            dropped = records.len() - rows.len(),
            "built dataset"
        );
        Dataset { rows }
    }

    pub fn rows(&self) -> &[ProductRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Coerce raw nutrient readings to floats and discard implausible values.
///
/// Order matters: coerce, then the kJ correction for generic-field energy,
/// then the plausibility bounds. Values outside a bound become absent, never
/// clamped.
fn clean_nutrients(
    raw: &BTreeMap<Nutrient, serde_json::Value>,
    energy_source: Option<EnergySource>,
) -> BTreeMap<Nutrient, f64> {
    let mut cleaned = BTreeMap::new();
    for (&nutrient, value) in raw {
        let Some(mut value) = coerce_f64(value) else {
            continue;
        };
        if nutrient == Nutrient::EnergyKcal
            && energy_source == Some(EnergySource::GenericField)
            && value > ENERGY_KJ_SUSPECT_THRESHOLD
        {
            value /= KJ_PER_KCAL;
        }
        if value < 0.0 {
            continue;
        }
        if let Some(bound) = nutrient.upper_bound() {
            if value > bound {
                continue;
            }
        }
        cleaned.insert(nutrient, value);
    }
    cleaned
}
