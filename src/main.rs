use clap::{Parser, Subcommand};
use tracing::{error, info};

mod apis;
mod config;
mod constants;
mod error;
mod logging;
mod pipeline;
mod types;

use crate::apis::{LookupOutcome, OpenFoodFactsApi, ProductApi, SearchQuery};
use crate::config::Config;
use crate::pipeline::aggregate::{
    brand_summary, completeness_report, descriptive_statistics, top_ingredients,
};
use crate::pipeline::{Column, Dataset};
use crate::types::Nutrient;

#[derive(Parser)]
#[command(name = "nutrilens")]
#[command(about = "Food & nutrition insights from Open Food Facts")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products and print the analytics summary
    Search {
        /// Product name or keyword
        keyword: String,
        /// Restrict results to a country (e.g. "France")
        #[arg(long)]
        country: Option<String>,
        /// Restrict results to a category (e.g. "biscuits")
        #[arg(long)]
        category: Option<String>,
        /// Number of products to fetch (max 100)
        #[arg(long, default_value_t = 50)]
        page_size: u32,
        /// How many brands/ingredients to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Look up a single product by barcode
    Lookup {
        /// Product barcode, e.g. 3017620422003
        barcode: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let config = Config::load()?;
    let api = OpenFoodFactsApi::new(config.api);

    let result = match cli.command {
        Commands::Search {
            keyword,
            country,
            category,
            page_size,
            top,
        } => {
            let query = SearchQuery {
                keyword,
                country,
                category,
                page_size,
            };
            run_search(&api, &query, top).await
        }
        Commands::Lookup { barcode } => run_lookup(&api, &barcode).await,
    };

    if let Err(e) = &result {
        error!("command failed: {e}");
    }
    result.map_err(Into::into)
}

async fn run_search(api: &dyn ProductApi, query: &SearchQuery, top: usize) -> error::Result<()> {
    info!(keyword = %query.keyword, "searching products");
    let records = api.search(query).await?;
    let dataset = Dataset::build(&records);

    if dataset.is_empty() {
        println!("No products found. Try different search terms.");
        return Ok(());
    }

    let all_brands = brand_summary(&dataset, usize::MAX);
    let with_nutriscore = dataset
        .rows()
        .iter()
        .filter(|row| row.nutriscore.is_some())
        .count();

    println!("\n📊 Results for \"{}\"", query.keyword);
    println!("   Products:        {}", dataset.len());
    println!("   With NutriScore: {with_nutriscore}");
    println!("   Unique brands:   {}", all_brands.len());

    println!("\n🏭 Top brands (avg NutriScore: 1=best, 5=worst):");
    for row in brand_summary(&dataset, top) {
        println!(
            "   {:<30} {:>4} products   avg {}",
            row.primary_brand,
            row.product_count,
            format_opt(row.mean_nutriscore)
        );
    }

    println!("\n🥕 Top ingredients:");
    for entry in top_ingredients(&dataset, top) {
        println!("   {:<30} {:>4}", entry.ingredient, entry.count);
    }

    println!("\n📈 Summary statistics (per 100g):");
    println!(
        "   {:<22} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Nutrient", "Count", "Mean", "Std Dev", "Min", "Median", "Max"
    );
    for stats in descriptive_statistics(&dataset, &Nutrient::ALL) {
        println!(
            "   {:<22} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9}",
            stats.nutrient.column_name(),
            stats.count,
            format_opt(stats.mean),
            format_opt(stats.std_dev),
            format_opt(stats.min),
            format_opt(stats.median),
            format_opt(stats.max)
        );
    }

    println!("\n🧮 Field completeness:");
    let report = completeness_report(&dataset, &Column::all());
    for field in report.fields {
        println!(
            "   {:<22} {:>4}/{:<4} ({:.0}%)",
            field.field, field.valid_count, report.total_rows, field.completeness_percent
        );
    }

    Ok(())
}

async fn run_lookup(api: &dyn ProductApi, barcode: &str) -> error::Result<()> {
    info!(barcode, "looking up product");
    match api.lookup_by_barcode(barcode).await? {
        LookupOutcome::NotFound => {
            println!("❌ Product not found in database");
        }
        LookupOutcome::Found(raw) => {
            // Run the single record through the same cleaning pipeline the
            // search path uses; no field semantics live in the renderer.
            let dataset = Dataset::build(std::slice::from_ref(&raw));
            let Some(row) = dataset.rows().first() else {
                println!("❌ Product record carries no identifying information");
                return Ok(());
            };

            println!("\n📦 {}", row.name.as_deref().unwrap_or("Unknown product"));
            println!("   Brand:      {}", row.brands.as_deref().unwrap_or("-"));
            println!("   Barcode:    {}", row.barcode.as_deref().unwrap_or(barcode));
            println!(
                "   NutriScore: {}",
                row.nutriscore
                    .map(|g| g.as_str().to_uppercase())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!(
                "   EcoScore:   {}",
                row.ecoscore
                    .map(|g| g.as_str().to_uppercase())
                    .unwrap_or_else(|| "-".to_string())
            );

            println!("\n   Nutrition facts (per 100g):");
            for nutrient in Nutrient::ALL {
                println!(
                    "   {:<22} {}",
                    nutrient.column_name(),
                    format_opt(row.nutrient(nutrient))
                );
            }

            if let Some(text) = &row.ingredients_text {
                println!("\n   Ingredients: {text}");
            }
            if let Some(url) = &row.image_url {
                println!("   Image: {url}");
            }
        }
    }
    Ok(())
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}
