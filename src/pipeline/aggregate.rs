use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::pipeline::dataset::{Column, Dataset};
use crate::types::Nutrient;

/// Tag display forms that carry no ingredient information, compared
/// case-insensitively after title-casing.
static INGREDIENT_BLACKLIST: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["unknown", "n/a", "none", ""]));

// All aggregations are pure functions of a dataset snapshot and are total
// over any well-formed dataset, including the empty one.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientCount {
    pub ingredient: String,
    pub count: usize,
}

/// Derived, read-only brand rollup. Recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSummaryRow {
    pub primary_brand: String,
    pub product_count: usize,
    /// Mean of the 1..=5 nutriscore scale over products whose grade is
    /// present. `None` when the whole group has no grades, never zero.
    pub mean_nutriscore: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientStatistics {
    pub nutrient: Nutrient,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` below two present values.
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletenessReport {
    pub total_rows: usize,
    pub fields: Vec<FieldCompleteness>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCompleteness {
    pub field: &'static str,
    pub valid_count: usize,
    pub missing_count: usize,
    pub completeness_percent: f64,
}

/// Count ingredient occurrences across all products, by display form.
///
/// Two raw tags that title-case to the same display form are merged. Results
/// are ordered by descending count; ties keep first-encountered order.
pub fn top_ingredients(dataset: &Dataset, n: usize) -> Vec<IngredientCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<IngredientCount> = Vec::new();

    for row in dataset.rows() {
        let Some(tags) = &row.ingredient_tags else {
            continue;
        };
        for tag in tags {
            let name = display_tag(tag);
            if INGREDIENT_BLACKLIST.contains(name.to_lowercase().as_str()) {
                continue;
            }
            match index.get(&name) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(name.clone(), counts.len());
                    counts.push(IngredientCount {
                        ingredient: name,
                        count: 1,
                    });
                }
            }
        }
    }

    // Stable sort keeps insertion order within equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

/// Convert a taxonomy tag to its display form: only the last `:`/`/` path
/// segment is meaningful, dashes become spaces, words are title-cased.
pub fn display_tag(tag: &str) -> String {
    let last = tag
        .rsplit(|c| c == ':' || c == '/')
        .next()
        .unwrap_or(tag);
    title_case(&last.replace('-', " "))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Group products by primary brand and roll up counts and mean nutriscore.
///
/// The primary brand is the text before the first comma, trimmed; grouping is
/// exact-string and case-sensitive ("Acme" and "acme" are distinct groups, a
/// known limitation carried over from the source system). Sorted by product
/// count descending, ties by brand name ascending.
pub fn brand_summary(dataset: &Dataset, n: usize) -> Vec<BrandSummaryRow> {
    struct Group {
        product_count: usize,
        grade_sum: f64,
        grade_count: usize,
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Group)> = Vec::new();

    for row in dataset.rows() {
        let Some(primary) = row.brands.as_deref().and_then(primary_brand) else {
            continue;
        };
        let i = *index.entry(primary.to_string()).or_insert_with(|| {
            groups.push((
                primary.to_string(),
                Group {
                    product_count: 0,
                    grade_sum: 0.0,
                    grade_count: 0,
                },
            ));
            groups.len() - 1
        });
        let group = &mut groups[i].1;
        group.product_count += 1;
        if let Some(grade) = row.nutriscore {
            group.grade_sum += grade.to_numeric();
            group.grade_count += 1;
        }
    }

    let mut summary: Vec<BrandSummaryRow> = groups
        .into_iter()
        .map(|(primary_brand, group)| BrandSummaryRow {
            primary_brand,
            product_count: group.product_count,
            mean_nutriscore: (group.grade_count > 0)
                .then(|| group.grade_sum / group.grade_count as f64),
        })
        .collect();

    summary.sort_by(|a, b| {
        b.product_count
            .cmp(&a.product_count)
            .then_with(|| a.primary_brand.cmp(&b.primary_brand))
    });
    summary.truncate(n);
    summary
}

/// First comma-separated token of the raw brand text, trimmed. `None` when
/// that token is empty, so no empty-brand group can ever form.
fn primary_brand(brands: &str) -> Option<&str> {
    let primary = brands.split(',').next().unwrap_or(brands).trim();
    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

/// Descriptive statistics per nutrient column, over present values only.
/// Zero present values yields all-absent statistics, never a division by
/// zero or a fabricated zero.
pub fn descriptive_statistics(dataset: &Dataset, nutrients: &[Nutrient]) -> Vec<NutrientStatistics> {
    nutrients
        .iter()
        .map(|&nutrient| {
            let mut values: Vec<f64> = dataset
                .rows()
                .iter()
                .filter_map(|row| row.nutrient(nutrient))
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            statistics_for(nutrient, &values)
        })
        .collect()
}

fn statistics_for(nutrient: Nutrient, sorted: &[f64]) -> NutrientStatistics {
    let count = sorted.len();
    if count == 0 {
        return NutrientStatistics {
            nutrient,
            count,
            mean: None,
            std_dev: None,
            min: None,
            median: None,
            max: None,
        };
    }

    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let sum_sq = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (sum_sq / (count - 1) as f64).sqrt()
    });
    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    };

    NutrientStatistics {
        nutrient,
        count,
        mean: Some(mean),
        std_dev,
        min: Some(sorted[0]),
        median: Some(median),
        max: Some(sorted[count - 1]),
    }
}

/// Per-field present/missing counts. On an empty dataset every field reports
/// 0% by convention; the operation never fails.
pub fn completeness_report(dataset: &Dataset, columns: &[Column]) -> CompletenessReport {
    let total_rows = dataset.len();
    let fields = columns
        .iter()
        .map(|&column| {
            let valid_count = dataset
                .rows()
                .iter()
                .filter(|row| row.is_present(column))
                .count();
            FieldCompleteness {
                field: column.name(),
                valid_count,
                missing_count: total_rows - valid_count,
                completeness_percent: if total_rows == 0 {
                    0.0
                } else {
                    valid_count as f64 * 100.0 / total_rows as f64
                },
            }
        })
        .collect();

    CompletenessReport { total_rows, fields }
}
