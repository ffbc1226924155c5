//! Catalog command handlers: product listing, categories, and facets.
//!
//! Server-side query options narrow what `GET /products` returns; the filter
//! flags are applied locally afterwards, exactly as a storefront filter panel
//! would apply them.

use std::collections::{BTreeMap, BTreeSet};

use clap::Args;
use vitrine_catalog::{filter, sort_products, Facets, FilterSpec, PriceRange, SortKey};
use vitrine_client::{ApiClient, Normalized, ProductQuery};
use vitrine_core::{Category, Product};

#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Keep products in this category id (repeatable)
    #[arg(long = "category", value_name = "ID")]
    pub categories: Vec<String>,
    /// Keep products from this country (repeatable)
    #[arg(long = "country", value_name = "COUNTRY")]
    pub countries: Vec<String>,
    /// Inclusive lower price bound
    #[arg(long)]
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    #[arg(long)]
    pub max_price: Option<f64>,
    /// Attribute filter, e.g. `--attr frameMaterial=metal` (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub attributes: Vec<(String, String)>,
    /// Ordering applied after filtering
    #[arg(long, default_value_t = SortKey::Featured)]
    pub sort: SortKey,
    /// Server-side full-text search
    #[arg(long)]
    pub search: Option<String>,
    /// Only products flagged as on sale
    #[arg(long)]
    pub on_sale: bool,
    /// Only products flagged as brand new
    #[arg(long)]
    pub new: bool,
    /// Result page to request from the server
    #[arg(long)]
    pub page: Option<u32>,
    /// Page size to request from the server
    #[arg(long)]
    pub limit: Option<u32>,
}

impl ProductsArgs {
    pub(crate) fn query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            is_brand_new: self.new.then_some(true),
            is_on_sale: self.on_sale.then_some(true),
            page: self.page,
            limit: self.limit,
            ..ProductQuery::default()
        }
    }

    pub(crate) fn filter_spec(&self) -> FilterSpec {
        let mut selected_filters: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, value) in &self.attributes {
            selected_filters
                .entry(key.clone())
                .or_default()
                .insert(value.clone());
        }
        FilterSpec {
            price_range: PriceRange {
                low: self.min_price,
                high: self.max_price,
            },
            selected_categories: self.categories.iter().cloned().collect(),
            selected_countries: self.countries.iter().cloned().collect(),
            selected_filters,
        }
    }
}

pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{raw}\""))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected KEY=VALUE, got \"{raw}\""));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Prints normalizer diagnostics so a drifting API is visible from the CLI.
fn report_diagnostics<T>(resource: &str, normalized: &Normalized<T>) {
    for diagnostic in &normalized.diagnostics {
        eprintln!("warning: {resource}: {diagnostic}");
    }
}

fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

async fn load_categories(client: &ApiClient) -> anyhow::Result<Vec<Category>> {
    let categories = client.fetch_categories().await?;
    report_diagnostics("categories", &categories);
    Ok(categories.items)
}

/// Fetch, filter, and sort the catalog, then print one product per line.
///
/// # Errors
///
/// Returns an error if the products (or, when a category filter is given,
/// the categories) cannot be fetched.
pub(crate) async fn run_products(
    client: &ApiClient,
    args: &ProductsArgs,
    json: bool,
) -> anyhow::Result<()> {
    let fetched = client.fetch_products(&args.query()).await?;
    report_diagnostics("products", &fetched);

    let spec = args.filter_spec();
    let categories = if spec.selected_categories.is_empty() {
        Vec::new()
    } else {
        load_categories(client).await?
    };

    let matched = filter(&fetched.items, &categories, &spec);
    let sorted = sort_products(&matched, args.sort);
    tracing::debug!(
        fetched = fetched.items.len(),
        matched = sorted.len(),
        sort = %args.sort,
        "product listing ready"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&sorted)?);
        return Ok(());
    }

    for product in &sorted {
        println!("{}", product_line(product));
    }
    if let Some(pagination) = fetched.pagination {
        if let (Some(page), Some(pages)) = (pagination.page, pagination.pages) {
            println!("page {page} of {pages}");
        }
    }
    println!("{} of {} products shown", sorted.len(), fetched.items.len());
    Ok(())
}

pub(crate) fn product_line(product: &Product) -> String {
    let mut line = format!(
        "{:<26} {:<32} {:>10}",
        product.id,
        product.name,
        format_price(product.price)
    );
    if let Some(percent) = product.discount_percent() {
        line.push_str(&format!("  -{percent}%"));
    }
    if !product.is_in_stock() {
        line.push_str("  (out of stock)");
    }
    line
}

/// # Errors
///
/// Returns an error if the categories cannot be fetched.
pub(crate) async fn run_categories(client: &ApiClient, json: bool) -> anyhow::Result<()> {
    let categories = load_categories(client).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }
    print_category_tree(&categories, 0);
    Ok(())
}

fn print_category_tree(categories: &[Category], depth: usize) {
    for category in categories {
        let inactive = if category.active { "" } else { "  (inactive)" };
        println!(
            "{:indent$}{}  {} [{}]{inactive}",
            "",
            category.id,
            category.name,
            category.slug,
            indent = depth * 2
        );
        print_category_tree(&category.children, depth + 1);
    }
}

/// # Errors
///
/// Returns an error if the products cannot be fetched.
pub(crate) async fn run_facets(client: &ApiClient, json: bool) -> anyhow::Result<()> {
    let fetched = client.fetch_products(&ProductQuery::default()).await?;
    report_diagnostics("products", &fetched);
    let facets = Facets::from_products(&fetched.items);

    if json {
        println!("{}", serde_json::to_string_pretty(&facets)?);
        return Ok(());
    }

    match (facets.price_min, facets.price_max) {
        (Some(min), Some(max)) => {
            println!("price: {} .. {}", format_price(min), format_price(max));
        }
        _ => println!("price: n/a"),
    }
    let countries: Vec<&str> = facets.countries.iter().map(String::as_str).collect();
    println!("countries: {}", countries.join(", "));
    for (category, count) in &facets.categories {
        println!("category {category}: {count}");
    }
    for (key, values) in &facets.attributes {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        println!("{key}: {}", values.join(", "));
    }
    Ok(())
}
