//! Seller listing input and its validation.
//!
//! A [`ListingDraft`] holds the raw text a seller typed. Parsing it yields a
//! [`NewProduct`] or every problem found, keyed by field.

use std::fmt;

use thiserror::Error;

use super::id::UserId;
use super::price::Price;
use super::product::NewProduct;

/// Descriptions shorter than this (after trimming) are rejected.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All invalid fields of one input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Whether `field` has an error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

/// Raw listing form input.
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Major units, e.g. `"19.99"`.
    pub price: String,
    pub stock: String,
    pub images: Vec<String>,
    pub user_id: Option<UserId>,
}

impl ListingDraft {
    /// Parse and validate the draft.
    ///
    /// # Errors
    ///
    /// Returns every field that failed, not just the first.
    pub fn parse(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = Vec::new();

        let price = match Price::parse_major(&self.price) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.push(ValidationError::new("price", e.to_string()));
                None
            }
        };

        let stock = match parse_stock_count(&self.stock) {
            Ok(stock) => Some(stock),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let (Some(price), Some(stock)) = (price, stock) else {
            // Still report the text-field problems alongside the numeric ones.
            errors.extend(text_field_errors(&self.name, &self.category, &self.description));
            return Err(ValidationErrors(errors));
        };

        let product = NewProduct {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            price,
            stock,
            images: self.images,
            user_id: self.user_id,
            created_at: None,
        };

        match validate_new_product(&product) {
            Ok(()) => Ok(product),
            Err(ValidationErrors(more)) => {
                errors.extend(more);
                Err(ValidationErrors(errors))
            }
        }
    }
}

/// Validate an already-typed listing.
///
/// # Errors
///
/// Returns every rule the listing breaks.
pub fn validate_new_product(product: &NewProduct) -> Result<(), ValidationErrors> {
    let mut errors = text_field_errors(&product.name, &product.category, &product.description);
    if !product.price.is_positive() {
        errors.push(ValidationError::new("price", "price must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Parse a stock count typed by a seller.
///
/// # Errors
///
/// Rejects blank, non-integer, negative, and out-of-range input.
pub fn parse_stock_count(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("stock", "stock is required"));
    }
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::new("stock", "stock must be a whole number"))?;
    stock_from_i64(value)
}

/// Convert a signed stock figure, rejecting negatives.
///
/// # Errors
///
/// Rejects negative values and values above `u32::MAX`.
pub fn stock_from_i64(value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(
            "stock",
            "stock must be greater than or equal to 0",
        ));
    }
    u32::try_from(value).map_err(|_| ValidationError::new("stock", "stock is too large"))
}

fn text_field_errors(name: &str, category: &str, description: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(ValidationError::new("name", "name is required"));
    }
    if category.trim().is_empty() {
        errors.push(ValidationError::new("category", "choose or create a category"));
    }
    let description = description.trim();
    if description.is_empty() {
        errors.push(ValidationError::new("description", "description is required"));
    } else if description.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.push(ValidationError::new(
            "description",
            format!("description must be at least {MIN_DESCRIPTION_CHARS} characters"),
        ));
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ListingDraft {
        ListingDraft {
            name: "  Auriculares inalámbricos ".to_string(),
            description: "Auriculares bluetooth con estuche de carga".to_string(),
            category: "Electrónica".to_string(),
            price: "45999.90".to_string(),
            stock: "12".to_string(),
            images: vec!["/img/a.jpg".to_string()],
            user_id: Some(UserId::new(8)),
        }
    }

    #[test]
    fn test_parse_valid_draft() {
        let product = draft().parse().unwrap();
        assert_eq!(product.name, "Auriculares inalámbricos");
        assert_eq!(product.price.minor_units(), 4_599_990);
        assert_eq!(product.stock, 12);
        assert_eq!(product.user_id, Some(UserId::new(8)));
    }

    #[test]
    fn test_parse_collects_every_error() {
        let bad = ListingDraft {
            name: " ".to_string(),
            description: "corta".to_string(),
            category: String::new(),
            price: "gratis".to_string(),
            stock: "-3".to_string(),
            ..ListingDraft::default()
        };
        let errors = bad.parse().unwrap_err();
        for field in ["name", "description", "category", "price", "stock"] {
            assert!(errors.has(field), "missing error for {field}: {errors}");
        }
    }

    #[test]
    fn test_zero_price_rejected() {
        let mut d = draft();
        d.price = "0".to_string();
        let errors = d.parse().unwrap_err();
        assert!(errors.has("price"));
        assert_eq!(errors.0.len(), 1);
    }

    #[test]
    fn test_parse_stock_count() {
        assert_eq!(parse_stock_count(" 7 ").unwrap(), 7);
        assert_eq!(parse_stock_count("0").unwrap(), 0);
        assert!(parse_stock_count("2.5").is_err());
        assert!(parse_stock_count("-1").is_err());
        assert!(parse_stock_count("").is_err());
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors(vec![
            ValidationError::new("name", "name is required"),
            ValidationError::new("price", "price must be greater than 0"),
        ]);
        assert_eq!(
            errors.to_string(),
            "name: name is required; price: price must be greater than 0"
        );
    }
}
