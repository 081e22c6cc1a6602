//! Product ordering and per-category counts.
//!
//! Both are recomputed from scratch after every load and every mutation.

use std::cmp::Ordering;
use std::collections::HashMap;

use bazaar_core::{Category, Product};

/// Fold a name for locale-aware comparison: lowercase, Latin accents removed.
#[must_use]
pub fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Compare two names the way a shopper expects them listed.
///
/// Names that fold to the same key (`"Mate"` and `"mate"`, `"Ñandú"` and
/// `"nandu"`) compare equal.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Sort products by name, ascending. Stable: equal names keep source order.
pub fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// Set every category's `product_count` from `products`.
pub fn recount_categories(categories: &mut [Category], products: &[Product]) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_insert(0) += 1;
    }
    for category in categories {
        category.product_count = counts.get(category.name.as_str()).copied().unwrap_or(0);
    }
}
