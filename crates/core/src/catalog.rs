//! The fixed product catalog and browsing helpers.
//!
//! The backend owns the catalog and serves it from `GET /products`. Clients
//! wrap whatever the backend returned in a [`Catalog`] to browse it.

use crate::{Category, Cents, Product, ProductId};

/// An immutable list of products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wrap a list of products.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The storefront's standard knitwear catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            item("1", "Cozy Sweater", "Soft wool sweater for cold days", 4999, "images/sweater.jpg", Category::Womens, true),
            item("2", "Comfy Socks", "Warm and breathable cotton socks", 1999, "images/socks.jpg", Category::Accessories, true),
            item("3", "Chunky Knit Scarf", "Thick, oversized knit scarf to keep you warm", 3499, "images/scarf.jpg", Category::Accessories, false),
            item("4", "Classic Beanie", "Snug fit to keep your head warm", 1999, "images/beanie.jpg", Category::Accessories, false),
            item("5", "Pearl Earrings", "Classic earrings for a night out", 2499, "images/earrings.jpg", Category::Jewelry, false),
            item("6", "Fuzzy Slippers", "Goes well with some Comfy Socks", 3999, "images/slippers.jpg", Category::Accessories, true),
            item("7", "Heritage Knit Sweater", "Perfect for layering on chilly days", 4999, "images/mensweater.jpg", Category::Mens, true),
            item("8", "Cozy Kids\u{2019} Cardigan", "Made with breathable, durable fabric for all-day comfort", 3999, "images/kidsweater.jpg", Category::Kids, true),
        ])
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Consume the catalog, returning its products.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == *id)
    }

    /// Products in a category (or all of them) whose name or description
    /// contains `query`.
    #[must_use]
    pub fn browse(&self, category: Option<Category>, query: Option<&str>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| category.is_none_or(|c| product.category == c))
            .filter(|product| query.is_none_or(|q| product.matches(q)))
            .collect()
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}

fn item(
    id: &str,
    name: &str,
    description: &str,
    price: u64,
    image: &str,
    category: Category,
    has_sizes: bool,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        price: Cents::new(price),
        image: image.to_owned(),
        category,
        has_sizes,
        tags: Vec::new(),
    }
}
