//! In-memory product search.
//!
//! Three flavours share one matcher:
//! - [`search_all`] - name and description, blank term returns everything
//! - [`search_suggestions`] - adds category, blank term returns nothing, capped
//! - [`search_results`] - the search page: category filter and sort order

use std::collections::HashSet;
use std::str::FromStr;

use bazaar_core::Product;

use super::aggregate::compare_names;

/// Sort order for the search page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSort {
    /// Name matches before description/category matches, then by name.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Name,
}

impl FromStr for SearchSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "price-low" | "price-asc" => Ok(Self::PriceAsc),
            "price-high" | "price-desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Options for [`search_results`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Keep only products in this category (exact match).
    pub category: Option<String>,
    pub sort: SearchSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fields {
    NameDescription,
    NameDescriptionCategory,
}

fn matches(product: &Product, needle: &str, fields: Fields) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || (fields == Fields::NameDescriptionCategory
            && product.category.to_lowercase().contains(needle))
}

/// Case-insensitive substring match over name and description.
///
/// A blank term returns the full list.
#[must_use]
pub fn search_all(products: &[Product], term: &str) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| matches(p, &needle, Fields::NameDescription))
        .cloned()
        .collect()
}

/// Inline suggestions: name, description or category, at most `limit`.
///
/// A blank term returns nothing.
#[must_use]
pub fn search_suggestions(products: &[Product], term: &str, limit: usize) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| matches(p, &needle, Fields::NameDescriptionCategory))
        .take(limit)
        .cloned()
        .collect()
}

/// Full search page results.
///
/// A blank term returns nothing, as the page only searches once something
/// was typed.
#[must_use]
pub fn search_results(products: &[Product], term: &str, options: &SearchOptions) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<Product> = products
        .iter()
        .filter(|p| matches(p, &needle, Fields::NameDescriptionCategory))
        .filter(|p| {
            options
                .category
                .as_deref()
                .is_none_or(|category| p.category == category)
        })
        .cloned()
        .collect();

    match options.sort {
        SearchSort::Relevance => results.sort_by(|a, b| {
            let a_name = a.name.to_lowercase().contains(&needle);
            let b_name = b.name.to_lowercase().contains(&needle);
            b_name
                .cmp(&a_name)
                .then_with(|| compare_names(&a.name, &b.name))
        }),
        SearchSort::PriceAsc => results.sort_by_key(|p| p.price),
        SearchSort::PriceDesc => results.sort_by(|a, b| b.price.cmp(&a.price)),
        SearchSort::Name => results.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }
    results
}

/// Distinct categories of `results`, in first-seen order.
#[must_use]
pub fn result_categories(results: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|p| !p.category.is_empty() && seen.insert(p.category.as_str()))
        .map(|p| p.category.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Price, ProductId};

    use super::*;

    fn product(id: i64, name: &str, description: &str, category: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            price: Price::from_minor_units(price),
            stock: 3,
            images: vec![],
            image: None,
            created_at: None,
            user_id: None,
            created_by: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Mate de calabaza", "Curado a mano", "Hogar", 9_000),
            product(2, "Termo", "Acero inoxidable, ideal para mate", "Hogar", 25_000),
            product(3, "Yerba", "Molienda gruesa", "Almacén", 3_250),
            product(4, "Remera", "Algodón", "Ropa", 12_000),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_blank_term_semantics_differ() {
        let products = catalog();
        assert_eq!(search_all(&products, "").len(), 4);
        assert_eq!(search_all(&products, "   ").len(), 4);
        assert!(search_suggestions(&products, "", 5).is_empty());
        assert!(search_results(&products, "", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_search_all_ignores_category() {
        let products = catalog();
        assert_eq!(ids(&search_all(&products, "MATE")), [1, 2]);
        assert!(search_all(&products, "almacén").is_empty());
    }

    #[test]
    fn test_suggestions_match_category_and_cap() {
        let products = catalog();
        assert_eq!(ids(&search_suggestions(&products, "hogar", 5)), [1, 2]);
        assert_eq!(ids(&search_suggestions(&products, "hogar", 1)), [1]);
    }

    #[test]
    fn test_results_relevance_puts_name_matches_first() {
        let mut products = catalog();
        products.insert(0, product(5, "Bombilla", "Para tomar mate", "Hogar", 4_000));
        let results = search_results(&products, "mate", &SearchOptions::default());
        assert_eq!(ids(&results), [1, 5, 2]);
    }

    #[test]
    fn test_results_category_filter_and_price_sort() {
        let products = catalog();
        let options = SearchOptions {
            category: Some("Hogar".to_string()),
            sort: SearchSort::PriceDesc,
        };
        assert_eq!(ids(&search_results(&products, "a", &options)), [2, 1]);

        let options = SearchOptions {
            category: None,
            sort: SearchSort::PriceAsc,
        };
        assert_eq!(ids(&search_results(&products, "a", &options)), [3, 1, 4, 2]);
    }

    #[test]
    fn test_result_categories_first_seen() {
        let products = catalog();
        assert_eq!(result_categories(&products), ["Hogar", "Almacén", "Ropa"]);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("price-low".parse::<SearchSort>().unwrap(), SearchSort::PriceAsc);
        assert_eq!("Name".parse::<SearchSort>().unwrap(), SearchSort::Name);
        assert!("cheapest".parse::<SearchSort>().is_err());
    }
}
