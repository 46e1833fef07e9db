use anyhow::Result;
use serde_json::json;

use nutrilens::pipeline::aggregate::{
    brand_summary, completeness_report, descriptive_statistics, top_ingredients,
};
use nutrilens::pipeline::{Column, Dataset};
use nutrilens::types::{Grade, Nutrient};

/// A small search payload covering the interesting cleaning cases: grade
/// fallback keys, kJ-denominated energy under the generic key, implausible
/// values, numeric strings, and an unidentifiable record.
fn sample_products() -> Vec<serde_json::Value> {
    vec![
        json!({
            "product_name": "Choco Spread",
            "code": "3017620422003",
            "brands": "Ferroni, Gruppo Ferroni",
            "nutrition_grade_fr": "E",
            "ecoscore_grade": "d",
            "ingredients_tags": ["en:sugar", "en:palm-oil", "en:hazelnut"],
            "ingredients_text": "Sugar, palm oil, hazelnuts",
            "nutriments": {
                "energy-kcal_100g": 539,
                "fat_100g": 30.9,
                "saturated-fat_100g": 10.6,
                "carbohydrates_100g": 57.5,
                "sugars_100g": 56.3,
                "proteins_100g": "6.3",
                "salt_100g": 0.107
            },
            "image_url": "https://example.org/choco.jpg"
        }),
        json!({
            "generic_name": "Dark Chocolate Bar",
            "brands": "Ferroni",
            "nutrition_grades": "d",
            "ingredients_tags": ["en:sugar", "en:cocoa-butter"],
            "nutriments": {
                // kJ under the unit-ambiguous generic key
                "energy_100g": 2250,
                "fat_100g": 42.0,
                "sugars_100g": 29.0
            }
        }),
        json!({
            "product_name": "Mystery Snack",
            "brands": "  , Nobody",
            "nutrition_grade_fr": "not-applicable",
            "nutriments": {
                "fat_100g": 150,
                "proteins_100g": -2,
                "salt_100g": 120.0
            }
        }),
        // No name, no barcode: dropped
        json!({
            "nutrition_grade_fr": "A",
            "nutriments": { "energy_100g": 1800 }
        }),
    ]
}

#[test]
fn raw_payload_to_dataset_and_aggregates() -> Result<()> {
    let records = sample_products();
    let dataset = Dataset::build(&records);

    // One record had neither name nor barcode
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset, Dataset::build(&records));

    let rows = dataset.rows();
    assert_eq!(rows[0].name.as_deref(), Some("Choco Spread"));
    assert_eq!(rows[0].nutriscore, Some(Grade::E));
    assert_eq!(rows[0].ecoscore, Some(Grade::D));
    assert_eq!(rows[0].nutrient(Nutrient::Proteins), Some(6.3));

    // Fallback name and fallback grade key
    assert_eq!(rows[1].name.as_deref(), Some("Dark Chocolate Bar"));
    assert_eq!(rows[1].nutriscore, Some(Grade::D));
    // 2250 kJ -> ~537.7 kcal, retained after conversion
    let energy = rows[1].nutrient(Nutrient::EnergyKcal).unwrap();
    assert!((energy - 2250.0 / 4.184).abs() < 0.01);

    // Implausible and negative values are absent; salt has no ceiling
    assert_eq!(rows[2].nutriscore, None);
    assert_eq!(rows[2].nutrient(Nutrient::Fat), None);
    assert_eq!(rows[2].nutrient(Nutrient::Proteins), None);
    assert_eq!(rows[2].nutrient(Nutrient::Salt), Some(120.0));

    Ok(())
}

#[test]
fn aggregates_over_the_sample_payload() -> Result<()> {
    let dataset = Dataset::build(&sample_products());

    let top = top_ingredients(&dataset, 3);
    assert_eq!(top[0].ingredient, "Sugar");
    assert_eq!(top[0].count, 2);
    // Ties keep first-encountered order
    assert_eq!(top[1].ingredient, "Palm Oil");

    let brands = brand_summary(&dataset, 10);
    // "Ferroni, Gruppo Ferroni" and "Ferroni" share a primary brand; the
    // row with the empty first token is discarded entirely
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].primary_brand, "Ferroni");
    assert_eq!(brands[0].product_count, 2);
    assert_eq!(brands[0].mean_nutriscore, Some(4.5));

    let stats = descriptive_statistics(&dataset, &[Nutrient::Sugars, Nutrient::Fiber]);
    assert_eq!(stats[0].count, 2);
    assert_eq!(stats[0].min, Some(29.0));
    assert_eq!(stats[0].max, Some(56.3));
    assert_eq!(stats[1].count, 0);
    assert_eq!(stats[1].mean, None);

    let report = completeness_report(&dataset, &Column::all());
    assert_eq!(report.total_rows, 3);
    let barcode = report.fields.iter().find(|f| f.field == "barcode").unwrap();
    assert_eq!(barcode.valid_count, 1);
    let name = report
        .fields
        .iter()
        .find(|f| f.field == "product_name")
        .unwrap();
    assert_eq!(name.valid_count, 3);

    Ok(())
}

#[test]
fn empty_payload_yields_empty_but_working_aggregates() {
    let dataset = Dataset::build(&[]);
    assert!(dataset.is_empty());
    assert!(top_ingredients(&dataset, 10).is_empty());
    assert!(brand_summary(&dataset, 10).is_empty());
    let report = completeness_report(&dataset, &Column::all());
    assert!(report.fields.iter().all(|f| f.completeness_percent == 0.0));
}
