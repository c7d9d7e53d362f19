//! Terminal output.
//!
//! Formatting functions return strings so they can be tested; [`out`],
//! [`notice`] and [`error`] are the only places that print.

use std::fmt::Write as _;

use woolery_client::OrderSummary;
use woolery_client::confirmation::ConfirmationView;
use woolery_core::{Cart, Product};

#[allow(clippy::print_stdout)]
pub fn out(text: &str) {
    println!("{text}");
}

#[allow(clippy::print_stderr)]
pub fn notice(text: &str) {
    eprintln!("note: {text}");
}

#[allow(clippy::print_stderr)]
pub fn error(text: &str) {
    eprintln!("error: {text}");
}

/// The catalog grid as a table.
pub fn product_list(products: &[&Product]) -> String {
    if products.is_empty() {
        return "No products match.".to_string();
    }

    let mut text = String::new();
    for product in products {
        let sizes = if product.has_sizes { "  [sized]" } else { "" };
        let _ = writeln!(
            text,
            "{:>3}  {:<28} {:>8}  {}{sizes}",
            product.id,
            product.name,
            product.price.display(),
            product.category,
        );
    }
    text.truncate(text.trim_end().len());
    text
}

/// The slide-out cart panel.
pub fn cart_panel(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut text = format!("Cart ({})\n", cart.total_item_count());
    for line in cart.lines() {
        let size = line.size.map(|s| format!(" ({s})")).unwrap_or_default();
        let _ = writeln!(
            text,
            "{:>3}  {}{size} x{}  {}",
            line.product.id,
            line.product.name,
            line.quantity(),
            line.line_total().display(),
        );
    }
    let _ = write!(text, "Total: {}", cart.total_price().display());
    text
}

/// The checkout screen's order summary.
pub fn order_summary(summary: &OrderSummary) -> String {
    let mut text = String::from("Order summary\n");
    for line in &summary.lines {
        let size = line.size.map(|s| format!(" ({s})")).unwrap_or_default();
        let _ = writeln!(
            text,
            "  {}{size}  {} x {} = {}",
            line.name, line.quantity, line.unit_price, line.line_total,
        );
    }
    let _ = write!(
        text,
        "{} item(s), total {}",
        summary.item_count,
        summary.total.display()
    );
    text
}

pub fn confirmation(view: &ConfirmationView) -> String {
    format!(
        "Thank you! Your order has been placed.\nOrder reference: {}\nConfirmed at: {}\nReturning to the catalog in {} seconds...",
        view.reference,
        view.confirmed_at.format("%Y-%m-%d %H:%M UTC"),
        view.redirect_in.as_secs(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use woolery_core::{Catalog, ProductId, Size};

    use super::*;

    #[test]
    fn test_empty_states() {
        assert_eq!(product_list(&[]), "No products match.");
        assert_eq!(cart_panel(&Cart::new()), "Your cart is empty.");
    }

    #[test]
    fn test_cart_panel_shows_badge_and_total() {
        let catalog = Catalog::standard();
        let mut cart = Cart::new();
        let socks = catalog.get(&ProductId::new("2")).unwrap();
        cart.add(socks, Some(Size::L));
        cart.add(socks, Some(Size::L));
        cart.add(catalog.get(&ProductId::new("4")).unwrap(), None);

        let text = cart_panel(&cart);
        assert!(text.starts_with("Cart (3)"));
        assert!(text.contains("Comfy Socks (L) x2  $39.98"));
        assert!(text.ends_with("Total: $59.97"));
    }

    #[test]
    fn test_product_list_marks_sized_products() {
        let catalog = Catalog::standard();
        let products = catalog.browse(None, Some("scarf"));
        let text = product_list(&products);
        assert!(text.contains("Chunky Knit Scarf"));
        assert!(text.contains("$34.99"));
        assert!(!text.contains("[sized]"));
    }
}
