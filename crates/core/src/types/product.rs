//! Catalog products and their size and category tags.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Cents, ProductId};

/// A size a sized product can be ordered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
}

impl Size {
    /// All sizes, smallest first.
    pub const ALL: [Self; 5] = [Self::Xs, Self::S, Self::M, Self::L, Self::Xl];

    /// Size picked when a sized product is added without a selection.
    pub const DEFAULT: Self = Self::M;

    /// The label shown to shoppers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown size label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown size '{0}' (expected one of XS, S, M, L, XL)")]
pub struct UnknownSize(pub String);

impl FromStr for Size {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|size| size.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSize(s.to_owned()))
    }
}

/// Department a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mens,
    Womens,
    Kids,
    Jewelry,
    Accessories,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Self; 5] = [
        Self::Mens,
        Self::Womens,
        Self::Kids,
        Self::Jewelry,
        Self::Accessories,
    ];

    /// The category slug used in URLs and JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mens => "mens",
            Self::Womens => "womens",
            Self::Kids => "kids",
            Self::Jewelry => "jewelry",
            Self::Accessories => "accessories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category slug.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// A catalog product.
///
/// Products are immutable and owned by the backend catalog. Field names
/// serialize in camelCase to match the `/products` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in cents.
    pub price: Cents,
    /// Image path relative to the storefront's static assets.
    pub image: String,
    pub category: Category,
    /// Whether a size must be chosen before adding to the cart.
    pub has_sizes: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Product {
    /// Normalise a size selection for this product.
    ///
    /// Sized products without a selection get [`Size::DEFAULT`]; unsized
    /// products never carry a size.
    #[must_use]
    pub fn resolve_size(&self, size: Option<Size>) -> Option<Size> {
        if self.has_sizes {
            Some(size.unwrap_or(Size::DEFAULT))
        } else {
            None
        }
    }

    /// Case-insensitive substring match over name and description.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(has_sizes: bool) -> Product {
        Product {
            id: ProductId::new("1"),
            name: "Cozy Sweater".to_string(),
            description: "Soft wool sweater for cold days".to_string(),
            price: Cents::new(4999),
            image: "images/sweater.jpg".to_string(),
            category: Category::Womens,
            has_sizes,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_size_parse_is_case_insensitive() {
        assert_eq!("xl".parse::<Size>(), Ok(Size::Xl));
        assert_eq!(" M ".parse::<Size>(), Ok(Size::M));
        assert!("XXL".parse::<Size>().is_err());
    }

    #[test]
    fn test_size_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Size::Xs).unwrap(), "\"XS\"");
        assert_eq!(serde_json::from_str::<Size>("\"XL\"").unwrap(), Size::Xl);
    }

    #[test]
    fn test_resolve_size_defaults_for_sized_products() {
        let product = sample(true);
        assert_eq!(product.resolve_size(None), Some(Size::M));
        assert_eq!(product.resolve_size(Some(Size::L)), Some(Size::L));
    }

    #[test]
    fn test_resolve_size_drops_size_for_unsized_products() {
        let product = sample(false);
        assert_eq!(product.resolve_size(Some(Size::L)), None);
    }

    #[test]
    fn test_product_json_uses_camel_case() {
        let json = serde_json::to_value(sample(true)).unwrap();
        assert_eq!(json["hasSizes"], true);
        assert_eq!(json["price"], 4999);
        assert_eq!(json["category"], "womens");
        assert!(json.get("tags").is_none());
    }

    #[test]
    fn test_matches_name_and_description() {
        let product = sample(true);
        assert!(product.matches("sweater"));
        assert!(product.matches("COLD"));
        assert!(product.matches(""));
        assert!(!product.matches("scarf"));
    }
}
