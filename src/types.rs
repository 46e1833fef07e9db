use serde::{Deserialize, Serialize};

use crate::constants::{ENERGY_KCAL_MAX, MACRONUTRIENT_GRAMS_MAX};

/// Raw product data as returned by the external API, schema-less and read-only.
pub type RawProductRecord = serde_json::Value;

/// Nutritional/ecological quality grade assigned by the upstream source.
/// A is best, E is worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Parse a raw grade string, case-insensitively. Anything outside the
    /// five-letter enumeration (e.g. "unknown", "not-applicable") is `None`;
    /// out-of-range input is never stored raw.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            "c" => Some(Self::C),
            "d" => Some(Self::D),
            "e" => Some(Self::E),
            _ => None,
        }
    }

    /// Numeric scale used for averaging: a=1 (best) through e=5 (worst).
    pub fn to_numeric(self) -> f64 {
        match self {
            Self::A => 1.0,
            Self::B => 2.0,
            Self::C => 3.0,
            Self::D => 4.0,
            Self::E => 5.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
            Self::E => "e",
        }
    }
}

/// The fixed set of per-100g nutrient columns tracked in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    EnergyKcal,
    Fat,
    SaturatedFat,
    Carbohydrates,
    Sugars,
    Fiber,
    Proteins,
    Salt,
}

impl Nutrient {
    pub const ALL: [Nutrient; 8] = [
        Nutrient::EnergyKcal,
        Nutrient::Fat,
        Nutrient::SaturatedFat,
        Nutrient::Carbohydrates,
        Nutrient::Sugars,
        Nutrient::Fiber,
        Nutrient::Proteins,
        Nutrient::Salt,
    ];

    /// Column name used in the tabular dataset and reports.
    pub fn column_name(self) -> &'static str {
        match self {
            Self::EnergyKcal => "energy_100g_kcal",
            Self::Fat => "fat_100g",
            Self::SaturatedFat => "saturated_fat_100g",
            Self::Carbohydrates => "carbohydrates_100g",
            Self::Sugars => "sugars_100g",
            Self::Fiber => "fiber_100g",
            Self::Proteins => "proteins_100g",
            Self::Salt => "salt_100g",
        }
    }

    /// Key under the raw record's `nutriments` object. Energy has a second,
    /// unit-ambiguous fallback key handled by the normalizer.
    pub fn source_key(self) -> &'static str {
        match self {
            Self::EnergyKcal => "energy-kcal_100g",
            Self::Fat => "fat_100g",
            Self::SaturatedFat => "saturated-fat_100g",
            Self::Carbohydrates => "carbohydrates_100g",
            Self::Sugars => "sugars_100g",
            Self::Fiber => "fiber_100g",
            Self::Proteins => "proteins_100g",
            Self::Salt => "salt_100g",
        }
    }

    /// Per-100g plausibility ceiling, where one is safe to assume.
    ///
    /// Energy above 900 kcal/100g is implausible for food; fat, carbohydrates
    /// and proteins cannot exceed the 100-gram basis. The remaining nutrients
    /// only get the shared negative-value floor: no universal ceiling is safe
    /// (salt substitutes, concentrated fibers).
    pub fn upper_bound(self) -> Option<f64> {
        match self {
            Self::EnergyKcal => Some(ENERGY_KCAL_MAX),
            Self::Fat | Self::Carbohydrates | Self::Proteins => Some(MACRONUTRIENT_GRAMS_MAX),
            Self::SaturatedFat | Self::Sugars | Self::Fiber | Self::Salt => None,
        }
    }
}

/// Coerce a loosely-typed JSON value to a finite float.
///
/// The source mixes numbers and numeric strings for the same fields. Anything
/// that does not coerce is absent: not zero, and not an error.
pub fn coerce_f64(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grade_parse_is_case_insensitive() {
        assert_eq!(Grade::parse("A"), Some(Grade::A));
        assert_eq!(Grade::parse(" e "), Some(Grade::E));
        assert_eq!(Grade::parse("unknown"), None);
        assert_eq!(Grade::parse(""), None);
    }

    #[test]
    fn grade_numeric_scale() {
        assert_eq!(Grade::A.to_numeric(), 1.0);
        assert_eq!(Grade::E.to_numeric(), 5.0);
    }

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_f64(&json!("3.2")), Some(3.2));
        assert_eq!(coerce_f64(&json!(" 7 ")), Some(7.0));
    }

    #[test]
    fn coerce_rejects_non_numeric_values() {
        assert_eq!(coerce_f64(&json!("twelve")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1.0])), None);
        assert_eq!(coerce_f64(&json!({"value": 1.0})), None);
    }
}
