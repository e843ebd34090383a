use std::io::Write;

use super::*;

const PRODUCTS: &str = r#"[
    {"id": 1, "name": "Awning-X", "category": "Awnings", "image": "a.png",
     "features": {"fabric": "acrylic", "frame": {"material": "aluminium"}}},
    {"id": 2, "name": "Awning Lite", "category": "Awnings"},
    {"id": 3, "name": "Pergola Max", "category": "Pergolas"},
    {"id": 4, "name": "Blind Basic", "category": "Blinds"}
]"#;

fn catalog() -> Catalog {
    Catalog::from_json(PRODUCTS).unwrap()
}

#[test]
fn test_search_is_case_insensitive() {
    let catalog = catalog();
    let names: Vec<_> = catalog.search("AWNING").iter().map(|p| p.id).collect();
    assert_eq!(names, vec![1, 2]);
    assert!(catalog.search("zzz").is_empty());
    assert_eq!(catalog.search("").len(), 4);
}

#[test]
fn test_category_filter() {
    let catalog = catalog();
    assert_eq!(catalog.by_category("Awnings").len(), 2);
    assert_eq!(catalog.by_category(ALL_CATEGORIES).len(), 4);
    assert!(catalog.by_category("Doors").is_empty());
}

#[test]
fn test_categories_first_seen_order() {
    assert_eq!(catalog().categories(), vec!["Awnings", "Pergolas", "Blinds"]);
}

#[test]
fn test_find_and_features() {
    let catalog = catalog();
    let product = catalog.find(1).unwrap();
    assert_eq!(product.features["frame"]["material"], "aluminium");
    assert!(catalog.find(2).unwrap().features.is_empty());
    assert!(catalog.find(99).is_none());
}

#[test]
fn test_page() {
    let catalog = catalog();
    let page = Catalog::page(catalog.by_category(ALL_CATEGORIES), 2, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, 4);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PRODUCTS.as_bytes()).unwrap();
    let catalog = Catalog::load(file.path()).unwrap();
    assert_eq!(catalog.len(), 4);

    assert!(matches!(
        Catalog::from_json("{not json"),
        Err(CatalogError::Json(_))
    ));
}

#[test]
fn test_from_config() {
    let empty = Catalog::from_config(&CatalogConfig::default()).unwrap();
    assert!(empty.is_empty());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PRODUCTS.as_bytes()).unwrap();
    let config = CatalogConfig {
        path: Some(file.path().to_string_lossy().into_owned()),
    };
    assert_eq!(Catalog::from_config(&config).unwrap().len(), 4);

    let missing = CatalogConfig {
        path: Some("/nonexistent/products.json".to_string()),
    };
    assert!(matches!(
        Catalog::from_config(&missing),
        Err(CatalogError::Io(_))
    ));
}
