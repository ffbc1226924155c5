use super::*;
use clap::CommandFactory;
use vitrine_catalog::SortKey;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["vitrine"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(!cli.json);
}

#[test]
fn parses_categories_and_facets() {
    let cli = Cli::try_parse_from(["vitrine", "categories"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Categories)));

    let cli = Cli::try_parse_from(["vitrine", "facets", "--json"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Facets)));
    assert!(cli.json);
}

#[test]
fn products_defaults_to_featured_and_no_constraints() {
    let cli = Cli::try_parse_from(["vitrine", "products"]).unwrap();
    let Some(Commands::Products(args)) = cli.command else {
        panic!("expected products command");
    };
    assert_eq!(args.sort, SortKey::Featured);
    assert!(args.filter_spec().is_unconstrained());
    assert_eq!(args.query(), vitrine_client::ProductQuery::default());
}

#[test]
fn products_collects_repeated_filters() {
    let cli = Cli::try_parse_from([
        "vitrine",
        "products",
        "--category",
        "c1",
        "--category",
        "c2",
        "--country",
        "Italy",
        "--min-price",
        "0",
        "--max-price",
        "3000",
        "--attr",
        "frameMaterial=metal",
        "--attr",
        "frameMaterial=acetate",
        "--attr",
        "lensType=polarized",
        "--sort",
        "price-desc",
    ])
    .unwrap();
    let Some(Commands::Products(args)) = cli.command else {
        panic!("expected products command");
    };

    let spec = args.filter_spec();
    assert_eq!(spec.selected_categories.len(), 2);
    assert!(spec.selected_countries.contains("Italy"));
    assert_eq!(spec.price_range.low, Some(0.0));
    assert_eq!(spec.price_range.high, Some(3000.0));
    assert_eq!(spec.selected_filters["frameMaterial"].len(), 2);
    assert!(spec.selected_filters["lensType"].contains("polarized"));
    assert_eq!(args.sort, SortKey::PriceDesc);
}

#[test]
fn products_server_flags_map_to_query() {
    let cli = Cli::try_parse_from([
        "vitrine", "products", "--search", "aviator", "--on-sale", "--page", "2", "--limit", "24",
    ])
    .unwrap();
    let Some(Commands::Products(args)) = cli.command else {
        panic!("expected products command");
    };
    let query = args.query();
    assert_eq!(query.search.as_deref(), Some("aviator"));
    assert_eq!(query.is_on_sale, Some(true));
    assert_eq!(query.is_brand_new, None);
    assert_eq!(query.page, Some(2));
    assert_eq!(query.limit, Some(24));
}

#[test]
fn products_rejects_unknown_sort_and_bad_attr() {
    assert!(Cli::try_parse_from(["vitrine", "products", "--sort", "random"]).is_err());
    assert!(Cli::try_parse_from(["vitrine", "products", "--attr", "novalue"]).is_err());
    assert!(Cli::try_parse_from(["vitrine", "products", "--attr", "=x"]).is_err());
}

#[test]
fn parse_key_value_trims_parts() {
    assert_eq!(
        catalog::parse_key_value(" color = red ").unwrap(),
        ("color".to_owned(), "red".to_owned())
    );
}

#[test]
fn parses_cart_add_with_defaults() {
    let cli = Cli::try_parse_from(["vitrine", "cart", "add", "p1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add {
                ref product_id,
                qty: 1,
                size: None,
                color: None,
            }
        }) if product_id == "p1"
    ));
}

#[test]
fn parses_cart_add_with_variant() {
    let cli = Cli::try_parse_from([
        "vitrine", "cart", "add", "p1", "--qty", "3", "--size", "M", "--color", "red",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add {
                qty: 3,
                size: Some(ref s),
                color: Some(ref c),
                ..
            }
        }) if s == "M" && c == "red"
    ));
}

#[test]
fn parses_cart_update_with_negative_quantity() {
    let cli = Cli::try_parse_from(["vitrine", "cart", "update", "p1", "-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Update { qty: -1, .. }
        })
    ));
}

#[test]
fn parses_cart_remove_show_and_clear() {
    let cli = Cli::try_parse_from(["vitrine", "cart", "remove", "p1", "--size", "L"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Remove { size: Some(ref s), color: None, .. }
        }) if s == "L"
    ));

    let cli = Cli::try_parse_from(["vitrine", "cart", "show"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Show
        })
    ));

    let cli = Cli::try_parse_from(["vitrine", "cart", "clear"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Clear
        })
    ));
}

#[test]
fn parses_favorites_commands() {
    let cli = Cli::try_parse_from(["vitrine", "favorites", "toggle", "p7"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Favorites {
            command: FavoritesCommands::Toggle { ref product_id }
        }) if product_id == "p7"
    ));

    let cli = Cli::try_parse_from(["vitrine", "favorites", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Favorites {
            command: FavoritesCommands::List
        })
    ));
}

#[test]
fn cart_add_requires_product_id() {
    assert!(Cli::try_parse_from(["vitrine", "cart", "add"]).is_err());
}
